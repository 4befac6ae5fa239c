use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::loaded::Loaded;
use crate::parse_scalars::{FALSE_LITERALS, TRUE_LITERALS, parse_bool};

use super::{Field, FieldOptions, field_builders, scalar_node};

/// Loads `bool` from the usual YAML 1.1 literals (`yes`, `Off`, `TRUE`, ...).
#[derive(Clone, Default)]
pub struct BoolField {
    options: FieldOptions<bool>,
    strict: bool,
}

impl BoolField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only `true` and `false`.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    field_builders!();
}

impl Field for BoolField {
    type Output = bool;

    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<bool>, Error> {
        let Some(node) = scalar_node(ctx)? else {
            return Ok(Loaded::Failed);
        };
        let text = node.as_scalar().unwrap_or_default();
        match parse_bool(text, self.strict) {
            Some(value) => self.options.finish(ctx, Loaded::Success(value)),
            None => {
                let accepted = if self.strict {
                    "true, false".to_owned()
                } else {
                    TRUE_LITERALS
                        .iter()
                        .chain(FALSE_LITERALS)
                        .copied()
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                ctx.error(
                    ErrorCode::ValueError,
                    format!("`{text}` is not a boolean, expected one of: {accepted}"),
                )?;
                Ok(Loaded::Failed)
            }
        }
    }

    fn required(&self) -> bool {
        self.options.required
    }
}
