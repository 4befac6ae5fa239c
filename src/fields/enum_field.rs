use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::loaded::Loaded;

use super::{Field, FieldOptions, field_builders, scalar_node};

/// Maps a fixed set of names to values of `E`.
///
/// ```rust
/// use saphyr_schema::{EnumField, Loaded, load_with_field, Options};
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Level { Low, High }
///
/// let field = EnumField::new([("low", Level::Low), ("high", Level::High)]);
/// let loaded = load_with_field(&field, "high", Options::default()).unwrap();
/// assert_eq!(loaded, Loaded::Success(Level::High));
/// ```
pub struct EnumField<E> {
    options: FieldOptions<E>,
    variants: Vec<(String, E)>,
}

impl<E: Clone> Clone for EnumField<E> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            variants: self.variants.clone(),
        }
    }
}

impl<E: Clone + 'static> EnumField<E> {
    pub fn new<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = (S, E)>,
        S: Into<String>,
    {
        Self {
            options: FieldOptions::default(),
            variants: variants
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    field_builders!();
}

impl<E: Clone + 'static> Field for EnumField<E> {
    type Output = E;

    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<E>, Error> {
        let Some(node) = scalar_node(ctx)? else {
            return Ok(Loaded::Failed);
        };
        let text = node.as_scalar().unwrap_or_default();
        match self.variants.iter().find(|(name, _)| name == text) {
            Some((_, value)) => self.options.finish(ctx, Loaded::Success(value.clone())),
            None => {
                let names: Vec<&str> = self.variants.iter().map(|(name, _)| name.as_str()).collect();
                ctx.error(
                    ErrorCode::ValueError,
                    format!("`{text}` is not one of: {}", names.join(", ")),
                )?;
                Ok(Loaded::Failed)
            }
        }
    }

    fn required(&self) -> bool {
        self.options.required
    }
}
