//! Macros for declaring state label enums.

/// Declare a plain enum of state labels and implement
/// [`State`](crate::core::State) for it.
///
/// Each variant is named after its identifier. The enum also gets an
/// `all()` constructor listing every variant in declaration order, which is
/// handy as a field's allowed set.
///
/// # Example
///
/// ```
/// use fsmguard::core::State;
/// use fsmguard::state_enum;
///
/// state_enum! {
///     pub enum Review {
///         Pending,
///         Approved,
///         Denied,
///     }
/// }
///
/// assert_eq!(Review::Approved.name(), "Approved");
/// assert_eq!(Review::all().len(), 3);
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            #[allow(dead_code)]
            $vis fn all() -> ::std::vec::Vec<Self> {
                ::std::vec![$(Self::$variant),*]
            }
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
