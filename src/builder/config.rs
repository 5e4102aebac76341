//! Declarative transition configuration.
//!
//! A [`TransitionConfig`] names states by their [`State::name`](crate::core::State::name)
//! and can be loaded from JSON. [`RegistryBuilder::configured`](crate::builder::RegistryBuilder::configured)
//! resolves it against the declared field and returns a pre-filled
//! [`TransitionBuilder`](crate::builder::TransitionBuilder); conditions and
//! logic are attached in code.
//!
//! ```rust
//! use fsmguard::builder::{DestinationConfig, SourceConfig, TransitionConfig};
//!
//! let config = TransitionConfig::from_json(
//!     r#"{"src": "+", "dest": {"one_of": ["approved", "denied"]}, "custom": {"label": "Review"}}"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.src, SourceConfig::One("+".to_string()));
//! assert!(matches!(config.dest, Some(DestinationConfig::OneOf { .. })));
//! assert_eq!(config.field, "state");
//! ```

use crate::builder::rule::Metadata;
use serde::{Deserialize, Serialize};

/// Source token meaning "every state".
pub const ANY_SOURCE: &str = "*";
/// Source token meaning "every state, destination must differ".
pub const ANY_BUT_SAME_SOURCE: &str = "+";

/// `src`: a single name (or `"*"` / `"+"`), or a list of names.
///
/// A list holding only `"*"` or `"+"` means the same as the bare token.
/// Wildcards mixed with names are not resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceConfig {
    One(String),
    Many(Vec<String>),
}

impl SourceConfig {
    pub fn names(&self) -> &[String] {
        match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        }
    }
}

/// `dest`: a single name, or `{"one_of": [...]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DestinationConfig {
    Fixed(String),
    OneOf { one_of: Vec<String> },
}

/// Label-level description of one rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    #[serde(default = "default_source")]
    pub src: SourceConfig,

    /// Absent means the destination is whatever the logic returns.
    #[serde(default)]
    pub dest: Option<DestinationConfig>,

    #[serde(default = "default_field")]
    pub field: String,

    #[serde(default)]
    pub on_error: Option<String>,

    #[serde(default)]
    pub custom: Metadata,
}

fn default_source() -> SourceConfig {
    SourceConfig::One(ANY_SOURCE.to_string())
}

fn default_field() -> String {
    "state".to_string()
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            src: default_source(),
            dest: None,
            field: default_field(),
            on_error: None,
            custom: Metadata::new(),
        }
    }
}

impl TransitionConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a JSON object mapping operation names to configs.
    pub fn table_from_json(json: &str) -> Result<Vec<(String, Self)>, serde_json::Error> {
        let table: std::collections::BTreeMap<String, Self> = serde_json::from_str(json)?;
        Ok(table.into_iter().collect())
    }
}
