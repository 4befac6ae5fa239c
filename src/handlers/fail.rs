use std::any::Any;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::fields::AnyField;
use crate::loaded::Loaded;

use super::TagHandler;

/// `!fail`: the node always fails to load, without reporting anything.
///
/// Handy in tests and as a placeholder that keeps an entry out of its container.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailHandler;

impl TagHandler for FailHandler {
    fn tag_pattern(&self) -> &str {
        "^fail$"
    }

    fn load(
        &self,
        _ctx: &mut LoadingContext<'_>,
        _field: &dyn AnyField,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        Ok(Loaded::Failed)
    }
}
