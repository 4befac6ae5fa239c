use std::any::Any;
use std::rc::Rc;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::fields::AnyField;
use crate::loaded::Loaded;
use crate::node::Node;

use super::TagHandler;

type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// `!env`: the value of an environment variable, loaded with the node's field.
///
/// An unset variable fails the node without reporting, so `!switch [!env PORT, 8080]`
/// falls back to the default.
pub struct EnvHandler {
    lookup: Lookup,
}

impl EnvHandler {
    /// Read variables from the process environment.
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Read variables through `lookup` instead of the process environment.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TagHandler for EnvHandler {
    fn tag_pattern(&self) -> &str {
        "^env$"
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
        let name = node.as_scalar().unwrap_or_default().trim();
        let Some(value) = (self.lookup)(name) else {
            crate::trace!(variable = name, "environment variable not set");
            return Ok(Loaded::Failed);
        };
        let replacement = Rc::new(Node::scalar(value, node.location()));
        ctx.load_any(field, &replacement, None)
    }
}
