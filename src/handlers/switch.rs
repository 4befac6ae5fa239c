use std::any::Any;
use std::rc::Rc;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::fields::AnyField;
use crate::loaded::Loaded;

use super::TagHandler;

/// `!switch`: a sequence of candidates, loaded left to right until one succeeds.
///
/// Later candidates are never visited. When every candidate fails the node fails,
/// with only the candidates' own diagnostics reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct SwitchHandler;

impl TagHandler for SwitchHandler {
    fn tag_pattern(&self) -> &str {
        "^switch$"
    }

    fn load(
        &self,
        ctx: &mut LoadingContext<'_>,
        field: &dyn AnyField,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        if !ctx.expect_sequence()? {
            return Ok(Loaded::Failed);
        }
        let node = Rc::clone(ctx.current_node());
        for candidate in node.as_sequence().unwrap_or_default() {
            let loaded = ctx.load_any(field, candidate, None)?;
            if loaded.is_success() {
                return Ok(loaded);
            }
        }
        Ok(Loaded::Failed)
    }
}
