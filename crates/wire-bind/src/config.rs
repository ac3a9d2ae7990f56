//! Runtime Configuration

use serde::{Deserialize, Serialize};

/// Runtime configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attribute carrying dehydrated `data`
    pub hydration_attribute: String,

    /// Prefix of comment sentinels (`<!--wire:123-->`)
    pub placeholder_prefix: String,

    /// Log stylesheets injected into the document head
    pub log_stylesheets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hydration_attribute: "wire-data".into(),
            placeholder_prefix: "wire:".into(),
            log_stylesheets: true,
        }
    }
}
