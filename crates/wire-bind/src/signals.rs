//! Signals
//!
//! Observable cells with explicit subscriptions. Reads made while a
//! [`computed`] value is evaluating are collected as its dependencies, and
//! the collection is rebuilt on every evaluation so branches that stop
//! reading a signal stop depending on it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Subscriber<T> = Rc<dyn Fn(&T)>;

thread_local! {
    static COLLECTORS: RefCell<Vec<Vec<Rc<dyn Dependency>>>> = const { RefCell::new(Vec::new()) };
}

/// Type-erased view of a signal, used for dependency collection
trait Dependency {
    fn key(&self) -> *const ();

    fn on_change(self: Rc<Self>, f: Rc<dyn Fn()>) -> Subscription;
}

/// Observable value
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

struct SignalInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(u64, Subscriber<T>)>>,
    next_id: Cell<u64>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Current value; recorded as a dependency of an evaluating `computed`
    pub fn get(&self) -> T {
        let dependency: Rc<dyn Dependency> = self.inner.clone();
        COLLECTORS.with(|collectors| {
            if let Some(group) = collectors.borrow_mut().last_mut() {
                group.push(dependency);
            }
        });
        self.get_untracked()
    }

    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Store `value` and notify every subscriber
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.notify();
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.inner.notify();
    }

    /// Call `f` with every new value until unsubscribed
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        SignalInner::subscribe(&self.inner, Rc::new(f))
    }

    pub fn watch(&self, f: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe(f)
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: Clone + 'static> SignalInner<T> {
    fn notify(&self) {
        let value = self.value.borrow().clone();
        let subscribers: Vec<Subscriber<T>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for subscriber in subscribers {
            subscriber(&value);
        }
    }

    fn subscribe(this: &Rc<Self>, f: Subscriber<T>) -> Subscription {
        let id = this.next_id.get();
        this.next_id.set(id + 1);
        this.subscribers.borrow_mut().push((id, f));

        let weak: Weak<Self> = Rc::downgrade(this);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|(other, _)| *other != id);
            }
        })
    }
}

impl<T: Clone + 'static> Dependency for SignalInner<T> {
    fn key(&self) -> *const () {
        self as *const Self as *const ()
    }

    fn on_change(self: Rc<Self>, f: Rc<dyn Fn()>) -> Subscription {
        SignalInner::subscribe(&self, Rc::new(move |_: &T| f()))
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.inner.value.borrow()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.value.borrow().fmt(f)
    }
}

/// Handle returned by `subscribe`; the subscription stays active until
/// [`unsubscribe`](Subscription::unsubscribe) is called
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Pops the collection group even when the evaluation panics
struct Collection {
    open: bool,
}

impl Collection {
    fn open() -> Self {
        COLLECTORS.with(|collectors| collectors.borrow_mut().push(Vec::new()));
        Self { open: true }
    }

    fn close(mut self) -> Vec<Rc<dyn Dependency>> {
        self.open = false;
        let group = COLLECTORS.with(|collectors| collectors.borrow_mut().pop()).unwrap_or_default();

        let mut seen = Vec::with_capacity(group.len());
        group
            .into_iter()
            .filter(|dependency| {
                let key = dependency.key();
                let fresh = !seen.contains(&key);
                seen.push(key);
                fresh
            })
            .collect()
    }
}

impl Drop for Collection {
    fn drop(&mut self) {
        if self.open {
            COLLECTORS.with(|collectors| collectors.borrow_mut().pop());
        }
    }
}

/// Run `f`, returning its result and the signals it read
fn collect<R>(f: impl FnOnce() -> R) -> (R, Vec<Rc<dyn Dependency>>) {
    let collection = Collection::open();
    let result = f();
    (result, collection.close())
}

struct Computed<T> {
    output: Signal<T>,
    f: Box<dyn Fn() -> T>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl<T: Clone + 'static> Computed<T> {
    fn watch(self: &Rc<Self>, dependencies: Vec<Rc<dyn Dependency>>) {
        let subscriptions = dependencies
            .into_iter()
            .map(|dependency| {
                let computed = Rc::clone(self);
                dependency.on_change(Rc::new(move || computed.evaluate()))
            })
            .collect();
        *self.subscriptions.borrow_mut() = subscriptions;
    }

    fn evaluate(self: &Rc<Self>) {
        let previous = std::mem::take(&mut *self.subscriptions.borrow_mut());
        for subscription in previous {
            subscription.unsubscribe();
        }

        let (value, dependencies) = collect(|| (self.f)());
        self.watch(dependencies);
        self.output.set(value);
    }
}

/// Signal holding the result of `f`, re-evaluated whenever a signal read
/// during the last evaluation changes
pub fn computed<T: Clone + 'static>(f: impl Fn() -> T + 'static) -> Signal<T> {
    let (value, dependencies) = collect(&f);
    let computed = Rc::new(Computed {
        output: Signal::new(value),
        f: Box::new(f),
        subscriptions: RefCell::new(Vec::new()),
    });
    computed.watch(dependencies);
    computed.output.clone()
}

/// Piece of a [`reactive`] string
pub enum Part {
    Text(String),
    Signal(Rc<dyn Source>),
}

/// Signal rendered into a [`reactive`] string
pub trait Source {
    fn render(&self) -> String;

    fn on_change(&self, f: Rc<dyn Fn()>) -> Subscription;
}

impl<T: Clone + fmt::Display + 'static> Source for Signal<T> {
    fn render(&self) -> String {
        self.get_untracked().to_string()
    }

    fn on_change(&self, f: Rc<dyn Fn()>) -> Subscription {
        self.subscribe(move |_| f())
    }
}

impl From<&str> for Part {
    fn from(text: &str) -> Self {
        Part::Text(text.to_string())
    }
}

impl From<String> for Part {
    fn from(text: String) -> Self {
        Part::Text(text)
    }
}

impl<T: Clone + fmt::Display + 'static> From<Signal<T>> for Part {
    fn from(signal: Signal<T>) -> Self {
        Part::Signal(Rc::new(signal))
    }
}

impl<T: Clone + fmt::Display + 'static> From<&Signal<T>> for Part {
    fn from(signal: &Signal<T>) -> Self {
        Part::Signal(Rc::new(signal.clone()))
    }
}

fn render(parts: &[Part]) -> String {
    parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => text.clone(),
            Part::Signal(source) => source.render(),
        })
        .collect()
}

/// String signal concatenating `parts`, re-rendered when any signal part
/// changes
pub fn reactive(parts: Vec<Part>) -> Signal<String> {
    let parts = Rc::new(parts);
    let output = Signal::new(render(&parts));
    for part in parts.iter() {
        if let Part::Signal(source) = part {
            let parts = Rc::clone(&parts);
            let output = output.clone();
            // Stays subscribed for as long as the part lives
            let _subscription = source.on_change(Rc::new(move || output.set(render(&parts))));
        }
    }
    output
}

/// Interleave literal segments with interpolated parts
pub fn interleave<S: AsRef<str>>(segments: &[S], args: Vec<Part>) -> Vec<Part> {
    let mut parts = Vec::with_capacity(segments.len() + args.len());
    let mut args = args.into_iter();
    for segment in segments {
        parts.push(Part::from(segment.as_ref()));
        if let Some(arg) = args.next() {
            parts.push(arg);
        }
    }
    parts
}

/// Build a [`reactive`] string from a `{}`-holed template.
///
/// ```ignore
/// let name = Signal::new("world".to_string());
/// let greeting = reactive!("Hello, {}.", &name);
/// ```
#[macro_export]
macro_rules! reactive {
    ($template:expr $(, $arg:expr)* $(,)?) => {
        $crate::signals::reactive($crate::signals::interleave(
            &$crate::template::segments($template),
            vec![$($crate::signals::Part::from($arg)),*],
        ))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_watch() {
        let variable = Signal::new("a".to_string());
        let observed = Rc::new(RefCell::new(String::new()));
        let sink = observed.clone();
        let _watch = variable.watch(move |v| *sink.borrow_mut() = v.clone());

        variable.set("b".to_string());
        assert_eq!(variable.get(), "b");
        assert_eq!(*observed.borrow(), "b");
        assert_eq!(variable.to_string(), "b");
    }

    #[test]
    fn test_unsubscribe() {
        let count = Signal::new(0);
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let subscription = count.subscribe(move |_| seen.set(seen.get() + 1));

        count.set(1);
        subscription.unsubscribe();
        count.update(|n| *n += 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(count.get(), 2);
        assert_eq!(count.subscriber_count(), 0);
    }

    #[test]
    fn test_computed_tracks_branches() {
        let flag = Signal::new(true);
        let a = Signal::new(1);
        let b = Signal::new(10);
        let (f, x, y) = (flag.clone(), a.clone(), b.clone());
        let sum = computed(move || if f.get() { x.get() } else { y.get() });

        assert_eq!(sum.get(), 1);
        a.set(2);
        assert_eq!(sum.get(), 2);
        assert_eq!(b.subscriber_count(), 0);

        flag.set(false);
        assert_eq!(sum.get(), 10);
        assert_eq!(a.subscriber_count(), 0);
        b.set(20);
        assert_eq!(sum.get(), 20);
    }

    #[test]
    fn test_collection_is_deduplicated() {
        let n = Signal::new(2);
        let m = n.clone();
        let square = computed(move || m.get() * m.get());
        assert_eq!(n.subscriber_count(), 1);
        n.set(3);
        assert_eq!(square.get(), 9);
    }

    #[test]
    fn test_reactive_strings() {
        let first = Signal::new("Bob".to_string());
        let last = Signal::new("???".to_string());
        let name = crate::reactive!("{} {}", &first, &last);
        let greeting = crate::reactive!("Hello, {}.", &name);
        assert_eq!(greeting.get(), "Hello, Bob ???.");

        last.set("Jones".to_string());
        assert_eq!(greeting.get(), "Hello, Bob Jones.");
        assert_eq!(reactive(vec![Part::from("plain")]).get(), "plain");
    }
}
