//! Runtime side of guarded operations.
//!
//! [`TransitionExecutor`] runs calls against an immutable
//! [`TransitionRegistry`](crate::builder::TransitionRegistry):
//!
//! 1. find the rule whose source matches the field's current value
//! 2. evaluate its conditions in order
//! 3. run the business logic
//! 4. resolve and commit the destination, or the `on_error` state on failure
//! 5. notify the injected [`Notifier`]
//!
//! The engine is synchronous and takes no locks of its own. Calls on one
//! instance are serialized by `&mut T`; sharing an instance across threads
//! means wrapping it in the caller's own lock.

mod error;
mod executor;
mod notify;

pub use error::{DestinationFault, TransitionError};
pub use executor::{GuardedOperation, TransitionExecutor};
pub use notify::{EventKind, HistoryRecorder, Notifier, TransitionEvent};
