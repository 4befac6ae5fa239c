use std::any::Any;
use std::rc::Rc;

use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::fields::AnyField;
use crate::loaded::Loaded;
use crate::resolver::Documents;

use super::TagHandler;

/// `!glob`: a list built from every document matching a pattern.
///
/// Each matching document is loaded with the list's item field under its own location;
/// documents that fail are left out. The assembled list then goes through the list's
/// validation hook. Only list fields accept `!glob`.
pub struct GlobHandler {
    documents: Rc<Documents>,
}

impl GlobHandler {
    pub(crate) fn new(documents: Rc<Documents>) -> Self {
        Self { documents }
    }
}

impl TagHandler for GlobHandler {
    fn tag_pattern(&self) -> &str {
        "^glob$"
    }

    fn load(
        &self,
        ctx: &mut LoadingContext<'_>,
        field: &dyn AnyField,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        let Some(item) = field.sequence_item() else {
            ctx.error(
                ErrorCode::UnexpectedNodeType,
                "!glob can only be used for a list",
            )?;
            return Ok(Loaded::Failed);
        };
        if !ctx.expect_scalar()? {
            return Ok(Loaded::Failed);
        }
        let node = Rc::clone(ctx.current_node());
        let pattern = node.as_scalar().unwrap_or_default().trim();

        let mut items = Vec::new();
        for (resolver, location) in self.documents.expand(ctx, pattern)? {
            let Some(document) = self.documents.open(ctx, resolver.as_ref(), &location)? else {
                continue;
            };
            if let Loaded::Success(value) = self.documents.load(ctx, item, &document)? {
                items.push(value);
            }
        }
        field.collect_sequence(ctx, items)
    }
}
