//! Tag handlers: intercept tagged nodes before the field protocol runs.
//!
//! A handler declares a regular expression matched against the tag name (the text after
//! the `!`). When exactly one handler matches a node's tag, [`LoadingContext::load`]
//! hands the node to it together with the field that would otherwise have loaded it.
//! The handler may substitute another node, try several candidates, or give up.

use std::any::Any;
use std::rc::Rc;

use regex::Regex;
use smallvec::SmallVec;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::fields::AnyField;
use crate::loaded::Loaded;

mod env;
mod fail;
mod glob;
mod include;
mod switch;

pub use self::env::EnvHandler;
pub use self::fail::FailHandler;
pub use self::glob::GlobHandler;
pub use self::include::IncludeHandler;
pub use self::switch::SwitchHandler;

/// Custom loading behaviour for tagged nodes.
pub trait TagHandler {
    /// Regular expression matched against the tag name, without the leading `!`.
    fn tag_pattern(&self) -> &str;

    /// Load [`LoadingContext::current_node`] on behalf of `field`.
    ///
    /// A successful value must be the `field`'s output type, as produced by
    /// [`AnyField::load_any`].
    fn load(
        &self,
        ctx: &mut LoadingContext<'_>,
        field: &dyn AnyField,
    ) -> Result<Loaded<Box<dyn Any>>, Error>;
}

/// Registered handlers with their compiled patterns.
#[derive(Default)]
pub struct TagHandlers {
    entries: Vec<(Regex, Rc<dyn TagHandler>)>,
}

impl TagHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handler`. Fails when its pattern is not a valid regular expression.
    pub fn register(&mut self, handler: Rc<dyn TagHandler>) -> Result<&mut Self, Error> {
        let pattern = Regex::new(handler.tag_pattern()).map_err(|e| {
            Error::msg(format!(
                "invalid tag pattern `{}`: {e}",
                handler.tag_pattern()
            ))
        })?;
        self.entries.push((pattern, handler));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every handler whose pattern matches `name`, in registration order.
    pub(crate) fn matching(&self, name: &str) -> SmallVec<[&dyn TagHandler; 2]> {
        self.entries
            .iter()
            .filter(|(pattern, _)| pattern.is_match(name))
            .map(|(_, handler)| handler.as_ref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_match_the_tag_name() {
        let mut handlers = TagHandlers::new();
        handlers.register(Rc::new(SwitchHandler)).unwrap();
        handlers.register(Rc::new(FailHandler)).unwrap();
        assert_eq!(handlers.matching("switch").len(), 1);
        assert_eq!(handlers.matching("fail").len(), 1);
        assert!(handlers.matching("switchy").is_empty());
    }

    struct Broken;

    impl TagHandler for Broken {
        fn tag_pattern(&self) -> &str {
            "("
        }

        fn load(
            &self,
            _ctx: &mut LoadingContext<'_>,
            _field: &dyn AnyField,
        ) -> Result<Loaded<Box<dyn Any>>, Error> {
            Ok(Loaded::Failed)
        }
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut handlers = TagHandlers::new();
        assert!(handlers.register(Rc::new(Broken)).is_err());
        assert!(handlers.is_empty());
    }
}
