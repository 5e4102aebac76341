//! Core types: state labels, state fields, conditions and history.
//!
//! Nothing in this module runs business logic; it holds the values the
//! engine validates against and the records it produces.

mod field;
mod guard;
mod history;
mod owner;
mod state;

pub use field::{FieldError, FieldSchema, StateField};
pub use guard::Condition;
pub use history::{Outcome, TransitionHistory, TransitionRecord};
pub use owner::Stateful;
pub use state::State;
