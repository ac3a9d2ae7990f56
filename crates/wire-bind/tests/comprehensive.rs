//! Comprehensive binding tests for wire-bind

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wire_bind::hooks::{attribute, handle, id, list, node, text};
use wire_bind::hydration::{self, Hydration, Replacement};
use wire_bind::signals::Signal;
use wire_bind::{Assignment, Event, Interpolation, LiveNode, Namespace, Runtime, Value, html};

fn counter() -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    (count.clone(), count)
}

// ============================================================================
// TEMPLATES AND TEXT
// ============================================================================

#[test]
fn test_text_hook_greeting() {
    let rt = Runtime::default();
    let greeting = html!(rt, "<div>Hello, {}!</div>", text("name").value("person")).unwrap();
    assert_eq!(greeting.outer_html(), "<div>Hello, person!</div>");
    assert_eq!(greeting.data().get("name"), Value::from("person"));

    greeting.data().set("name", "World");
    assert_eq!(greeting.inner_html(), "Hello, World!");
    assert_eq!(greeting.data().get("name"), Value::from("World"));
}

#[test]
fn test_text_is_never_markup() {
    let rt = Runtime::default();
    let node = html!(rt, "<p>{}</p>", text("t").value("<b>bold</b>")).unwrap();
    assert_eq!(node.inner_html(), "&lt;b&gt;bold&lt;/b&gt;");
    assert_eq!(node.text_content(), "<b>bold</b>");
}

#[test]
fn test_mapping_order_invariance() {
    let rt = Runtime::default();
    let double = |v: &Value| v.as_f64().unwrap_or(0.0) * 2.0;
    let a = html!(rt, "<p>{}</p>", text("n").value(21).map(double)).unwrap();
    let b = html!(rt, "<p>{}</p>", text("n").map(double).value(21)).unwrap();
    assert_eq!(a.outer_html(), "<p>42</p>");
    assert_eq!(a.outer_html(), b.outer_html());
    assert_eq!(a.data().get("n"), b.data().get("n"));
}

#[test]
fn test_contextual_template_root() {
    let rt = Runtime::default();
    let row = html!(rt, "<tr><td>{}</td></tr>", text("cell").value("x")).unwrap();
    assert_eq!(row.outer_html(), "<tr><td>x</td></tr>");
}

#[test]
fn test_nodes_are_spliced_in_order() {
    let rt = Runtime::default();
    let items = vec![
        html!(rt, "<li>a</li>").unwrap(),
        html!(rt, "<li>b</li>").unwrap(),
    ];
    let list = html!(rt, "<ul>{}<li>c</li></ul>", items).unwrap();
    assert_eq!(list.inner_html(), "<li>a</li><li>b</li><li>c</li>");
}

#[test]
fn test_stylesheet_goes_to_head() {
    let rt = Runtime::default();
    let sheet = rt.css("p { color: red; }");
    let node = html!(rt, "<p>{}styled</p>", sheet).unwrap();
    assert_eq!(node.outer_html(), "<p>styled</p>");
    assert_eq!(rt.inner_html(rt.head()), "<style>p { color: red; }</style>");
}

// ============================================================================
// AGGREGATION
// ============================================================================

#[test]
fn test_shared_property_broadcasts() {
    let rt = Runtime::default();
    let node = html!(
        rt,
        "<div><span>{}</span><b>{}</b></div>",
        text("x").value("first"),
        text("x").value("second")
    )
    .unwrap();
    assert_eq!(node.inner_html(), "<span>first</span><b>second</b>");
    assert_eq!(node.data().get("x"), Value::from("first"));

    node.data().set("x", "both");
    assert_eq!(node.inner_html(), "<span>both</span><b>both</b>");
}

#[test]
fn test_attribute_and_text_share_a_property() {
    let rt = Runtime::default();
    let node = html!(
        rt,
        "<a title={}>{}</a>",
        attribute("label").value("home"),
        text("label").value("home")
    )
    .unwrap();
    node.data().set("label", "away");
    assert_eq!(node.outer_html(), "<a title=\"away\">away</a>");
}

// ============================================================================
// ATTRIBUTES AND INPUT
// ============================================================================

#[test]
fn test_attribute_values() {
    let rt = Runtime::default();
    let node = html!(rt, "<button disabled={}>go</button>", attribute("off").value(true)).unwrap();
    assert_eq!(node.outer_html(), "<button disabled=\"\">go</button>");

    node.data().set("off", false);
    assert_eq!(node.outer_html(), "<button>go</button>");

    node.data().set("off", "yes");
    assert_eq!(node.get_attribute("disabled").as_deref(), Some("yes"));
}

#[test]
fn test_input_feedback() {
    let rt = Runtime::default();
    let input = html!(rt, "<input type=\"text\" value={} />", attribute("t").value("x")).unwrap();
    assert_eq!(rt.value(&input).as_deref(), Some("x"));

    rt.set_value(&input, "typed").unwrap();
    rt.dispatch_event(&Event::input(input.id()));
    assert_eq!(input.data().get("t"), Value::from("typed"));

    input.data().set("t", "reset");
    assert_eq!(rt.value(&input).as_deref(), Some("reset"));
}

#[test]
fn test_input_feedback_is_mapped() {
    let rt = Runtime::default();
    let input = html!(
        rt,
        "<input value={}>",
        attribute("t").map(|v: &Value| v.to_text().to_uppercase()).value("a")
    )
    .unwrap();
    assert_eq!(rt.value(&input).as_deref(), Some("A"));

    rt.set_value(&input, "bc").unwrap();
    rt.dispatch_event(&Event::input(input.id()));
    assert_eq!(input.data().get("t"), Value::from("BC"));
}

// ============================================================================
// HANDLERS
// ============================================================================

#[test]
fn test_handle_hook() {
    let rt = Runtime::default();
    let (clicks, seen) = counter();
    let button = html!(
        rt,
        "<div><button onclick={}>go</button></div>",
        handle(move |_| seen.set(seen.get() + 1))
    )
    .unwrap();
    assert_eq!(button.inner_html(), "<button>go</button>");

    let inner = rt.with_dom(|tree| tree.first_child(button.id())).unwrap();
    rt.dispatch_event(&Event::click(inner));
    assert_eq!(clicks.get(), 1);
    assert!(button.data().is_empty());
}

#[test]
fn test_handler_interpolation_sees_data() {
    let rt = Runtime::default();
    let slot: Rc<RefCell<Option<LiveNode>>> = Rc::new(RefCell::new(None));
    let target = slot.clone();
    let node = html!(
        rt,
        "<button onclick={}>{}</button>",
        Interpolation::handler(move |_| {
            if let Some(node) = target.borrow().as_ref() {
                let n = node.data().get("n").as_f64().unwrap_or(0.0);
                node.data().set("n", n + 1.0);
            }
        }),
        text("n").value(0)
    )
    .unwrap();
    *slot.borrow_mut() = Some(node.clone());

    rt.dispatch_event(&Event::click(node.id()));
    rt.dispatch_event(&Event::click(node.id()));
    assert_eq!(node.outer_html(), "<button>2</button>");
    slot.borrow_mut().take();
}

// ============================================================================
// NODE AND ID
// ============================================================================

#[test]
fn test_node_hook_swaps_nodes() {
    let rt = Runtime::default();
    let frame = html!(rt, "<div>[{}]</div>", node("slot").value("plain")).unwrap();
    assert_eq!(frame.inner_html(), "[plain]");

    let child = html!(rt, "<em>rich</em>").unwrap();
    frame.data().set("slot", &child);
    assert_eq!(frame.inner_html(), "[<em>rich</em>]");
    assert!(frame.data().get("slot").as_live().unwrap().ptr_eq(&child));

    frame.data().set("slot", Value::Null);
    assert_eq!(frame.inner_html(), "[]");
}

#[test]
fn test_node_hook_mapper() {
    let rt = Runtime::default();
    let mapper_rt = rt.clone();
    let frame = html!(
        rt,
        "<div>{}</div>",
        node("user")
            .map(move |v: &Value| html!(mapper_rt, "<b>{}</b>", text("name").value(v.clone())))
            .value("ann")
    )
    .unwrap();
    assert_eq!(frame.inner_html(), "<b>ann</b>");
    frame.data().set("user", "bob");
    assert_eq!(frame.inner_html(), "<b>bob</b>");
    assert_eq!(frame.data().get("user"), Value::from("bob"));
}

#[test]
fn test_id_hook() {
    let rt = Runtime::default();
    let node = html!(rt, "<div>Hello, <span {}>person</span>!</div>", id("name")).unwrap();
    assert_eq!(
        node.outer_html(),
        "<div>Hello, <span data-id=\"name\">person</span>!</div>"
    );
    let span = node.data().get("name").as_node().unwrap();
    assert_eq!(rt.with_dom(|tree| tree.tag_name(span).map(str::to_string)).as_deref(), Some("span"));

    let replacement = html!(rt, "<strong>friend</strong>").unwrap();
    node.data().set("name", &replacement);
    assert_eq!(node.inner_html(), "Hello, <strong>friend</strong>!");

    node.data().set("name", Value::Null);
    assert_eq!(node.inner_html(), "Hello, !");
}

// ============================================================================
// LIST
// ============================================================================

#[test]
fn test_list_splice() {
    let rt = Runtime::default();
    let node = html!(rt, "<section>{}</section>", list("items").value(["a", "b", "c"])).unwrap();
    let items = node.data().list("items").unwrap();

    let removed = items.splice(1, Some(1), Vec::<Value>::new());
    assert_eq!(removed, vec![Value::from("b")]);
    assert_eq!(node.data().get("items"), Value::from(vec!["a", "c"]));
    assert_eq!(node.inner_html(), "<div>a</div><div>c</div>");
}

#[test]
fn test_list_invariant_over_verbs() {
    let rt = Runtime::default();
    let node = html!(rt, "<ol>{}</ol>", list("xs")).unwrap();
    let xs = node.data().list("xs").unwrap();

    let check = |xs: &wire_bind::ListBinding| {
        assert_eq!(xs.rendered().len(), xs.len());
        let expected: String = xs.items().iter().map(|v| format!("<div>{}</div>", v.to_text())).collect();
        assert_eq!(node.inner_html(), expected);
    };

    xs.push([5, 1]);
    check(&xs);
    xs.unshift([9]);
    check(&xs);
    xs.splice(1, Some(1), [7, 8]);
    check(&xs);
    xs.sort(None);
    check(&xs);
    xs.reverse();
    check(&xs);
    xs.pop();
    check(&xs);
    xs.shift();
    check(&xs);
    xs.set(0, 3);
    check(&xs);
    xs.remove(0);
    check(&xs);
}

#[test]
fn test_list_wholesale_replacement() {
    let rt = Runtime::default();
    let node = html!(rt, "<ul>{}</ul>", list("xs").value(["a", "b"])).unwrap();
    node.data().set("xs", vec!["c"]);
    assert_eq!(node.inner_html(), "<div>c</div>");
}

// ============================================================================
// PENDING VALUES
// ============================================================================

#[test]
fn test_pending_value_applies_later() {
    let rt = Runtime::default();
    let node = html!(rt, "<p>{}</p>", text("status").value("loading")).unwrap();
    let (tx, rx) = smol::channel::bounded::<String>(1);

    node.data().set(
        "status",
        Assignment::pending(async move { rx.recv().await.unwrap_or_default() }),
    );
    rt.run_until_idle();
    assert_eq!(node.inner_html(), "loading");
    assert_eq!(node.data().get("status"), Value::from("loading"));

    tx.try_send("ready".to_string()).unwrap();
    rt.run_until_idle();
    assert_eq!(node.inner_html(), "ready");
}

#[test]
fn test_pending_values_resolve_independently() {
    let rt = Runtime::default();
    let writes = Rc::new(Cell::new(0));
    let seen = writes.clone();
    let node = html!(
        rt,
        "<p>{}</p>",
        text("status").value("idle").map(move |v: &Value| {
            seen.set(seen.get() + 1);
            v.clone()
        })
    )
    .unwrap();
    assert_eq!(writes.get(), 1);

    let (first_tx, first_rx) = smol::channel::bounded::<String>(1);
    let (second_tx, second_rx) = smol::channel::bounded::<String>(1);
    node.data().set(
        "status",
        Assignment::pending(async move { first_rx.recv().await.unwrap_or_default() }),
    );
    node.data().set(
        "status",
        Assignment::pending(async move { second_rx.recv().await.unwrap_or_default() }),
    );
    rt.run_until_idle();
    assert_eq!(node.inner_html(), "idle");
    assert_eq!(writes.get(), 1);

    second_tx.try_send("two".to_string()).unwrap();
    rt.run_until_idle();
    assert_eq!(node.inner_html(), "two");
    assert_eq!(writes.get(), 2);

    first_tx.try_send("one".to_string()).unwrap();
    rt.run_until_idle();
    assert_eq!(node.inner_html(), "one");
    assert_eq!(node.data().get("status"), Value::from("one"));
    assert_eq!(writes.get(), 3);
}

#[test]
fn test_pending_list_replacement() {
    let rt = Runtime::default();
    let node = html!(rt, "<ul>{}</ul>", list("xs").value(["old"])).unwrap();
    node.data().set("xs", Assignment::pending(async { vec!["new", "items"] }));
    assert_eq!(node.inner_html(), "<div>old</div>");

    rt.run_until_idle();
    assert_eq!(node.inner_html(), "<div>new</div><div>items</div>");
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_on_add_on_remove() {
    let rt = Runtime::default();
    let (added, on_add) = counter();
    let (removed, on_remove) = counter();
    let node = html!(rt, "<p>watched</p>")
        .unwrap()
        .on_add(move |_| on_add.set(on_add.get() + 1))
        .on_remove(move |_| on_remove.set(on_remove.get() + 1));

    rt.append_to_body(&node).unwrap();
    rt.run_until_idle();
    assert_eq!((added.get(), removed.get()), (1, 0));

    rt.remove(&node);
    rt.run_until_idle();
    assert_eq!((added.get(), removed.get()), (1, 1));
}

#[test]
fn test_same_batch_add_remove_is_silent() {
    let rt = Runtime::default();
    let (added, on_add) = counter();
    let (removed, on_remove) = counter();
    let node = html!(rt, "<p>blink</p>")
        .unwrap()
        .on_add(move |_| on_add.set(on_add.get() + 1))
        .on_remove(move |_| on_remove.set(on_remove.get() + 1));

    rt.append_to_body(&node).unwrap();
    rt.remove(&node);
    rt.run_until_idle();
    assert_eq!((added.get(), removed.get()), (0, 0));
}

#[test]
fn test_nested_node_is_observed() {
    let rt = Runtime::default();
    let (added, on_add) = counter();
    let child = html!(rt, "<b>child</b>").unwrap().on_add(move |_| on_add.set(on_add.get() + 1));
    let parent = html!(rt, "<div>{}</div>", &child).unwrap();

    rt.append_to_body(&parent).unwrap();
    rt.run_until_idle();
    assert_eq!(added.get(), 1);
}

// ============================================================================
// EXTENSIONS
// ============================================================================

#[test]
fn test_extend_and_invoke() {
    let rt = Runtime::default();
    let node = html!(rt, "<p>{}</p>", text("count").value(0)).unwrap();
    node.extend(|_| {
        Namespace::new()
            .method("increment", |node, _| {
                let n = node.data().get("count").as_f64().unwrap_or(0.0) + 1.0;
                node.data().set("count", n);
                Value::from(n)
            })
            .namespace(
                "data",
                Namespace::new().value("label", "counter").method("double", |node, _| {
                    Value::from(node.data().get("count").as_f64().unwrap_or(0.0) * 2.0)
                }),
            )
    });

    assert_eq!(node.invoke("increment", &[]), Some(Value::from(1)));
    assert_eq!(node.inner_html(), "1");
    assert_eq!(node.data().get("label"), Value::from("counter"));
    assert_eq!(node.data().invoke("double", &[]), Some(Value::from(2)));
}

#[test]
fn test_extend_merges_namespaces() {
    let rt = Runtime::default();
    let node = html!(rt, "<p>x</p>").unwrap();
    node.extend(|_| Namespace::new().namespace("math", Namespace::new().value("one", 1)));
    node.extend(|_| {
        Namespace::new().namespace(
            "math",
            Namespace::new().method("sum", |_, args| {
                Value::from(args.iter().filter_map(Value::as_f64).sum::<f64>())
            }),
        )
    });

    assert!(node.extension("math.one").is_some());
    assert_eq!(
        node.invoke("math.sum", &[Value::from(2), Value::from(3)]),
        Some(Value::from(5))
    );
    assert_eq!(node.invoke("math.one", &[]), None);
}

// ============================================================================
// HYDRATION
// ============================================================================

#[test]
fn test_dehydrate_text() {
    let rt = Runtime::default();
    let node = html!(rt, "<div>Hello, {}!</div>", text("name").value("person")).unwrap();
    hydration::dehydrate(&node);
    assert_eq!(
        node.outer_html(),
        "<div wire-data=\"{&quot;name&quot;:&quot;person&quot;}\">Hello, person!</div>"
    );
}

#[test]
fn test_dehydrate_empty_node_and_id() {
    let rt = Runtime::default();
    let empty = html!(rt, "<div>Hello, {}!</div>", node("name")).unwrap();
    hydration::dehydrate(&empty);
    assert_eq!(empty.get_attribute("wire-data").as_deref(), Some("{}"));

    let tagged = html!(rt, "<div><span {}>x</span></div>", id("name")).unwrap();
    assert_eq!(
        hydration::dehydrated(&tagged).unwrap().to_string(),
        r#"{"name":{"data":{}}}"#
    );
}

#[test]
fn test_dehydrate_nested() {
    let rt = Runtime::default();
    let grandchild = html!(rt, "<div>grandchild</div>").unwrap();
    let child = html!(rt, "<div>{}</div>", node("grandchild").value(&grandchild)).unwrap();
    let root = html!(rt, "<div>Hello, {}!</div>", node("child").value(&child)).unwrap();
    hydration::dehydrate(&root);
    assert_eq!(
        root.outer_html(),
        "<div wire-data=\"{&quot;child&quot;:{&quot;data&quot;:{&quot;grandchild&quot;:{&quot;data&quot;:{}}}}}\">Hello, <div><div>grandchild</div></div>!</div>"
    );
}

#[test]
fn test_hydrate_replaces_rendered_node() {
    let rt = Runtime::default();
    let base = html!(rt, "<div>Hello, {}!</div>", text("name").value("person")).unwrap();
    base.data().set("name", "World");
    hydration::dehydrate(&base);
    rt.append_to_body(&base).unwrap();

    let replacement = html!(rt, "<div>Hello, {}!</div>", text("name").value("person")).unwrap();
    let hydrated = hydration::hydrate(&rt, &base, &replacement).unwrap();
    assert!(matches!(hydrated, Hydration::Ready(_)));
    assert_eq!(replacement.outer_html(), "<div>Hello, World!</div>");
    assert!(replacement.is_connected());
    assert!(!base.is_connected());
}

#[test]
fn test_hydrate_by_element_id_with_builder() {
    let rt = Runtime::default();
    let base = html!(rt, "<div id=\"app\">{}</div>", text("greeting").value("hi")).unwrap();
    hydration::dehydrate(&base);
    rt.append_to_body(&base).unwrap();

    let builder_rt = rt.clone();
    let seen = Rc::new(RefCell::new(None));
    let record = seen.clone();
    let hydrated = hydration::hydrate(
        &rt,
        "app",
        Replacement::build(move |data| {
            *record.borrow_mut() = data.get("greeting").cloned();
            html!(builder_rt, "<main>{}</main>", text("greeting")).unwrap()
        }),
    )
    .unwrap();

    let Hydration::Ready(live) = hydrated else {
        panic!("builder hydration completes immediately");
    };
    assert_eq!(*seen.borrow(), Some(Value::from("hi")));
    assert_eq!(live.outer_html(), "<main>hi</main>");
    assert_eq!(rt.inner_html(rt.body()), "<main>hi</main>");
}

#[test]
fn test_hydrate_async_builder() {
    let rt = Runtime::default();
    let base = html!(rt, "<p>{}</p>", text("n").value(7)).unwrap();
    hydration::dehydrate(&base);
    rt.append_to_body(&base).unwrap();

    let builder_rt = rt.clone();
    let hydrated = hydration::hydrate(
        &rt,
        &base,
        Replacement::build_async(move |_| async move {
            html!(builder_rt, "<p>{}</p>", text("n")).unwrap()
        }),
    )
    .unwrap();
    let live = rt.block_on(hydrated.finish());
    assert_eq!(live.outer_html(), "<p>7</p>");
    assert!(live.is_connected());
}

#[test]
fn test_nested_hydration_keeps_components() {
    fn make_greeting(rt: &Runtime) -> LiveNode {
        let name = html!(rt, "<span>{}</span>", text("name").value("name placeholder")).unwrap();
        let interjection =
            html!(rt, "<span>{}</span>", text("interjection").value("interjection placeholder")).unwrap();
        html!(
            rt,
            "<div>{}{}</div>",
            node("interjectionChild").value(interjection),
            node("nameChild").value(name)
        )
        .unwrap()
    }

    let rt = Runtime::default();
    let original = make_greeting(&rt);
    let interjection = original.data().get("interjectionChild");
    interjection.as_live().unwrap().data().set("interjection", "Hello, ");
    hydration::dehydrate(&original);

    let copied = make_greeting(&rt);
    copied.data().assign(hydration::data_from(&rt, &original));
    assert_eq!(copied.inner_html(), "<span>Hello, </span><span>name placeholder</span>");

    let child = copied.data().get("nameChild");
    assert_eq!(child.as_live().unwrap().data().get("name"), Value::from("name placeholder"));
}

// ============================================================================
// SIGNALS
// ============================================================================

#[test]
fn test_signal_drives_data() {
    let rt = Runtime::default();
    let node = html!(rt, "<p>{}</p>", text("name").value("?")).unwrap();
    let name = Signal::new("ann".to_string());
    let data = node.data();
    let subscription = name.subscribe(move |v| data.set("name", v.clone()));

    name.set("bob".to_string());
    assert_eq!(node.inner_html(), "bob");

    subscription.unsubscribe();
    name.set("cy".to_string());
    assert_eq!(node.inner_html(), "bob");
}
