//! Macros for declaring closed sets of state identifiers.

/// Declare an enum of state identifiers and implement `StateId` for it.
///
/// The enum derives `Clone, Copy, PartialEq, Eq, Hash, Debug` and serde's
/// `Serialize`/`Deserialize`; each variant is named after itself.
///
/// # Example
///
/// ```
/// use statequeue::core::StateId;
/// use statequeue::state_ids;
///
/// state_ids! {
///     pub enum Prompt {
///         Get,
///         Output,
///         Exit,
///     }
/// }
///
/// assert_eq!(Prompt::Output.name(), "Output");
/// ```
#[macro_export]
macro_rules! state_ids {
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
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            serde::Serialize,
            serde::Deserialize
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::StateId for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
