use regex::Regex;

use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::loaded::Loaded;

use super::{Field, FieldOptions, field_builders, scalar_node};

/// Loads a scalar as text, optionally checked against a pattern.
#[derive(Clone, Default)]
pub struct StringField {
    options: FieldOptions<String>,
    pattern: Option<Regex>,
}

impl StringField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the whole text to match `pattern`.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(Regex::new(&format!("^(?:{pattern})$"))?);
        Ok(self)
    }

    field_builders!();
}

impl Field for StringField {
    type Output = String;

    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<String>, Error> {
        let Some(node) = scalar_node(ctx)? else {
            return Ok(Loaded::Failed);
        };
        let text = node.as_scalar().unwrap_or_default();
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                ctx.error(
                    ErrorCode::ValidationError,
                    format!("`{text}` does not match the pattern {}", pattern.as_str()),
                )?;
                return Ok(Loaded::Failed);
            }
        }
        self.options.finish(ctx, Loaded::Success(text.to_owned()))
    }

    fn required(&self) -> bool {
        self.options.required
    }
}
