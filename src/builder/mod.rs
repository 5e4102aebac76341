//! Registration API.
//!
//! Rules are described with [`TransitionBuilder`] (or resolved from a
//! [`TransitionConfig`]) and validated into a per-type
//! [`TransitionRegistry`] by [`RegistryBuilder`]. Every check happens here,
//! before any instance exists.

pub mod config;
pub mod error;
pub mod macros;
pub mod registry;
pub mod rule;

pub use config::{DestinationConfig, SourceConfig, TransitionConfig};
pub use error::{ConfigurationError, RuleViolation, StateRole};
pub use registry::{RegistryBuilder, TransitionRegistry};
pub use rule::{DestinationSpec, Logic, Metadata, SourceSpec, TransitionBuilder, TransitionRule};
