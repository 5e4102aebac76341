//! fsmguard: guarded state transitions for field-backed state machines.
//!
//! An owning type declares one or more state fields and a set of guarded
//! operations. Each operation only runs when the field's current value
//! satisfies the operation's source, every condition holds, and the business
//! logic yields an acceptable destination. Outcomes are reported to a single
//! injected notifier.
//!
//! # Core Concepts
//!
//! - **State fields** (`core`): a value that is always one of its allowed labels
//! - **Rules** (`builder`): source, destination, conditions, error fallback,
//!   metadata and logic, validated once per type
//! - **Executor** (`engine`): runs guarded calls and emits notifications
//! - **Snapshots** (`snapshot`): what a persistence layer stores and restores
//!
//! # Example
//!
//! ```rust
//! use fsmguard::builder::{RegistryBuilder, TransitionBuilder};
//! use fsmguard::core::{FieldSchema, StateField, Stateful};
//! use fsmguard::engine::{HistoryRecorder, TransitionExecutor};
//! use fsmguard::state_enum;
//! use std::sync::Arc;
//!
//! state_enum! {
//!     enum Review {
//!         Pending,
//!         Approved,
//!         Denied,
//!     }
//! }
//!
//! struct Application {
//!     score: u32,
//!     state: StateField<Review>,
//! }
//!
//! impl Stateful for Application {
//!     type State = Review;
//!     type Args = ();
//!     type Error = String;
//!
//!     fn state_field(&self, name: &str) -> Option<&StateField<Review>> {
//!         (name == "state").then_some(&self.state)
//!     }
//!
//!     fn state_field_mut(&mut self, name: &str) -> Option<&mut StateField<Review>> {
//!         (name == "state").then_some(&mut self.state)
//!     }
//! }
//!
//! let registry = RegistryBuilder::<Application>::new()
//!     .field(FieldSchema::new("state", Review::all(), Review::Pending))
//!     .unwrap()
//!     .transition(
//!         TransitionBuilder::<Application>::new("decide")
//!             .from_any_but_same()
//!             .to_one_of([Review::Approved, Review::Denied])
//!             .logic(|app: &mut Application, _: &()| {
//!                 Ok(Some(if app.score > 50 { Review::Approved } else { Review::Denied }))
//!             }),
//!     )
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let recorder: HistoryRecorder<Review> = HistoryRecorder::new();
//! let executor = TransitionExecutor::new(Arc::new(registry)).notifier(recorder.clone());
//!
//! let mut app = Application {
//!     score: 80,
//!     state: executor.registry().new_field("state").unwrap(),
//! };
//! executor.execute(&mut app, "decide", &()).unwrap();
//!
//! assert_eq!(app.state.value(), &Review::Approved);
//! assert_eq!(recorder.history().len(), 1);
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod snapshot;

// Re-export commonly used types
pub use builder::{ConfigurationError, RegistryBuilder, TransitionBuilder, TransitionRegistry};
pub use core::{Condition, FieldError, FieldSchema, State, StateField, Stateful};
pub use engine::{Notifier, TransitionError, TransitionEvent, TransitionExecutor};
pub use snapshot::FieldSnapshot;
