use std::any::Any;
use std::rc::Rc;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::fields::AnyField;
use crate::loaded::Loaded;
use crate::resolver::Documents;

use super::TagHandler;

/// `!include` / `!import`: replace the node with the root of the referenced document.
///
/// Everything loaded from that document reports the document's location.
pub struct IncludeHandler {
    documents: Rc<Documents>,
}

impl IncludeHandler {
    pub(crate) fn new(documents: Rc<Documents>) -> Self {
        Self { documents }
    }
}

impl TagHandler for IncludeHandler {
    fn tag_pattern(&self) -> &str {
        "^(include|import)$"
    }

    fn load(
        &self,
        ctx: &mut LoadingContext<'_>,
        field: &dyn AnyField,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        if !ctx.expect_scalar()? {
            return Ok(Loaded::Failed);
        }
        let node = Rc::clone(ctx.current_node());
        let reference = node.as_scalar().unwrap_or_default().trim();
        let Some((resolver, location)) = self.documents.resolve(ctx, reference)? else {
            return Ok(Loaded::Failed);
        };
        crate::trace!(reference, location = location.as_str(), "including document");
        let Some(document) = self.documents.open(ctx, resolver.as_ref(), &location)? else {
            return Ok(Loaded::Failed);
        };
        self.documents.load(ctx, field, &document)
    }
}
