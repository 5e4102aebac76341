//! The `Stateful` trait for types that own state fields.

use super::field::StateField;
use super::state::State;
use std::fmt::{Debug, Display};

/// A type whose instances own one or more [`StateField`]s and expose
/// guarded operations over them.
///
/// `Args` is the argument type shared by the type's guarded operations and
/// their conditions; use `()` when operations take nothing, or an enum when
/// they differ. `Error` is what the business logic returns on failure.
///
/// # Example
///
/// ```rust
/// use fsmguard::core::{StateField, Stateful};
///
/// struct Ticket {
///     state: StateField<String>,
/// }
///
/// impl Stateful for Ticket {
///     type State = String;
///     type Args = ();
///     type Error = String;
///
///     fn state_field(&self, name: &str) -> Option<&StateField<String>> {
///         (name == "state").then_some(&self.state)
///     }
///
///     fn state_field_mut(&mut self, name: &str) -> Option<&mut StateField<String>> {
///         (name == "state").then_some(&mut self.state)
///     }
/// }
/// ```
pub trait Stateful {
    type State: State;
    type Args;
    type Error: Debug + Display;

    /// Look up a field by its declared name.
    fn state_field(&self, name: &str) -> Option<&StateField<Self::State>>;

    fn state_field_mut(&mut self, name: &str) -> Option<&mut StateField<Self::State>>;
}
