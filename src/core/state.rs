//! The `State` trait for state labels.
//!
//! Every value a [`StateField`](super::StateField) can hold implements this
//! trait. Labels are compared by value and reported by name.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state labels.
///
/// # Required Traits
///
/// - `Clone`: labels are copied into events and snapshots
/// - `PartialEq`: source and destination matching compares labels
/// - `Debug`: labels show up in diagnostics
/// - `Serialize` + `Deserialize`: labels travel through snapshots and configs
///
/// `String` implements `State`, so free-form labels work without an enum.
///
/// # Example
///
/// ```rust
/// use fsmguard::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Payment {
///     Unpaid,
///     Paid,
///     Refunded,
/// }
///
/// impl State for Payment {
///     fn name(&self) -> &str {
///         match self {
///             Self::Unpaid => "unpaid",
///             Self::Paid => "paid",
///             Self::Refunded => "refunded",
///         }
///     }
/// }
///
/// assert_eq!(Payment::Paid.name(), "paid");
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// The label's name, used for logging, errors and name-based config lookup.
    fn name(&self) -> &str;
}

impl State for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}
