use std::any::type_name;
use std::fmt::Display;

use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::loaded::Loaded;
use crate::parse_scalars::parse_int;

use super::{Field, FieldOptions, field_builders, scalar_node};

/// Loads any primitive integer type, with optional inclusive bounds.
///
/// Accepts decimal, `0x`, `0o` and `0b` literals with an optional sign and `_`
/// separators. Text that is not an integer, or does not fit `T`, is a
/// [`ErrorCode::ValueError`]; a value outside the bounds is a
/// [`ErrorCode::ValidationError`].
pub struct IntField<T> {
    options: FieldOptions<T>,
    minimum: Option<T>,
    maximum: Option<T>,
}

impl<T> Default for IntField<T> {
    fn default() -> Self {
        Self {
            options: FieldOptions::default(),
            minimum: None,
            maximum: None,
        }
    }
}

impl<T: Clone> Clone for IntField<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            minimum: self.minimum.clone(),
            maximum: self.maximum.clone(),
        }
    }
}

impl<T> IntField<T>
where
    T: TryFrom<i128> + PartialOrd + Copy + Display + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimum(mut self, minimum: T) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: T) -> Self {
        self.maximum = Some(maximum);
        self
    }

    field_builders!();
}

impl<T> Field for IntField<T>
where
    T: TryFrom<i128> + PartialOrd + Copy + Display + 'static,
{
    type Output = T;

    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<T>, Error> {
        let Some(node) = scalar_node(ctx)? else {
            return Ok(Loaded::Failed);
        };
        let text = node.as_scalar().unwrap_or_default();
        let Some(value) = parse_int(text).and_then(|v| T::try_from(v).ok()) else {
            ctx.error(
                ErrorCode::ValueError,
                format!("`{text}` is not a valid {}", type_name::<T>()),
            )?;
            return Ok(Loaded::Failed);
        };
        if let Some(minimum) = self.minimum.filter(|minimum| value < *minimum) {
            ctx.error(
                ErrorCode::ValidationError,
                format!("{value} is below the minimum of {minimum}"),
            )?;
            return Ok(Loaded::Failed);
        }
        if let Some(maximum) = self.maximum.filter(|maximum| value > *maximum) {
            ctx.error(
                ErrorCode::ValidationError,
                format!("{value} is above the maximum of {maximum}"),
            )?;
            return Ok(Loaded::Failed);
        }
        self.options.finish(ctx, Loaded::Success(value))
    }

    fn required(&self) -> bool {
        self.options.required
    }
}
