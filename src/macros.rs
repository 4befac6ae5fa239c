//! Public macros for constructing option structs without relying on struct literal syntax.
//!
//! Call sites stay valid when [`crate::Options`] gains fields.

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// use saphyr_schema::DuplicateKeyPolicy;
///
/// let options = saphyr_schema::options! {
///     duplicate_keys: DuplicateKeyPolicy::LastWins,
///     resolve_roots: vec!["config".into()],
/// };
/// assert_eq!(options.resolve_roots.len(), 1);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            {
                opt.$field = $value;
            }
        )*
        opt
    }};
}
