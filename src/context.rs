//! Traversal state shared by fields and tag handlers during one load.

use std::any::{Any, type_name};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::{Diagnostic, Error, ErrorCode};
use crate::fields::{AnyField, Field};
use crate::handlers::{TagHandler, TagHandlers};
use crate::loaded::Loaded;
use crate::node::{Node, NodeKind};
use crate::options::DuplicateKeyPolicy;
use crate::sink::{ErrorSink, FailFast};

/// One entry of the traversal stack.
struct Frame {
    node: Rc<Node>,
    /// Set when the node is the root of a document with its own logical location.
    location: Option<Rc<str>>,
}

/// How a node is going to be loaded, decided from its tag.
enum Dispatch<'h> {
    Field,
    Handler(&'h dyn TagHandler),
    Ambiguous,
}

/// The state of one load: the stack of nodes being visited, the registered tag handlers
/// and the error-reporting strategy.
///
/// Every value is loaded through [`LoadingContext::load`], which pushes the node for the
/// duration of the call. While a field or handler runs, [`current_node`] is the node it
/// is responsible for and [`current_location`] is the document that node came from.
///
/// [`current_node`]: LoadingContext::current_node
/// [`current_location`]: LoadingContext::current_location
pub struct LoadingContext<'h> {
    handlers: &'h TagHandlers,
    sink: Box<dyn ErrorSink + 'h>,
    stack: Vec<Frame>,
    duplicate_keys: DuplicateKeyPolicy,
}

impl<'h> LoadingContext<'h> {
    pub fn new(handlers: &'h TagHandlers, sink: impl ErrorSink + 'h) -> Self {
        Self {
            handlers,
            sink: Box::new(sink),
            stack: Vec::new(),
            duplicate_keys: DuplicateKeyPolicy::default(),
        }
    }

    /// Context that aborts on the first reported problem.
    pub fn fail_fast(handlers: &'h TagHandlers) -> Self {
        Self::new(handlers, FailFast)
    }

    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// What mapping-backed fields do with a repeated key.
    pub fn duplicate_keys(&self) -> DuplicateKeyPolicy {
        self.duplicate_keys
    }

    /// Load `node` with `field`, dispatching to a tag handler when the node's tag
    /// matches one.
    ///
    /// `location` names the document `node` belongs to when it differs from the
    /// enclosing one, as for the root of an included file. The node is the current node
    /// while the field runs and is popped again on every exit path.
    ///
    /// Returns `Err` only in fail-fast mode. Otherwise problems have been reported and
    /// the result is [`Loaded::Failed`].
    pub fn load<F: Field>(
        &mut self,
        field: &F,
        node: &Rc<Node>,
        location: Option<&str>,
    ) -> Result<Loaded<F::Output>, Error> {
        self.with_node(node, location, |ctx| match ctx.dispatch()? {
            Dispatch::Field => field.load(ctx),
            Dispatch::Handler(handler) => {
                let loaded = handler.load(ctx, field)?;
                ctx.downcast(loaded)
            }
            Dispatch::Ambiguous => Ok(Loaded::Failed),
        })
    }

    /// Type-erased [`LoadingContext::load`], used by tag handlers that forward to the
    /// field they were given.
    pub fn load_any(
        &mut self,
        field: &dyn AnyField,
        node: &Rc<Node>,
        location: Option<&str>,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        self.with_node(node, location, |ctx| match ctx.dispatch()? {
            Dispatch::Field => field.load_any(ctx),
            Dispatch::Handler(handler) => handler.load(ctx, field),
            Dispatch::Ambiguous => Ok(Loaded::Failed),
        })
    }

    /// Run `f` with `node` pushed on the stack.
    ///
    /// The frame is popped when `f` returns, whatever it returns.
    pub fn with_node<R>(
        &mut self,
        node: &Rc<Node>,
        location: Option<&str>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        debug_assert!(
            self.stack
                .last()
                .is_none_or(|top| !Rc::ptr_eq(&top.node, node)),
            "the same node pushed twice in a row"
        );
        self.stack.push(Frame {
            node: Rc::clone(node),
            location: location.map(Rc::from),
        });
        let result = f(self);
        self.stack.pop();
        result
    }

    /// The node being loaded.
    ///
    /// # Panics
    ///
    /// Panics when called outside of [`LoadingContext::load`] or
    /// [`LoadingContext::with_node`], where no node is active.
    pub fn current_node(&self) -> &Rc<Node> {
        match self.stack.last() {
            Some(frame) => &frame.node,
            None => panic!("no node is being loaded"),
        }
    }

    /// Logical location of the document the current node belongs to: the nearest
    /// location pushed along the stack.
    pub fn current_location(&self) -> Option<&str> {
        self.stack.iter().rev().find_map(|frame| frame.location.as_deref())
    }

    /// Number of documents on the stack, counting each frame that carries a location.
    pub fn location_depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|frame| frame.location.is_some())
            .count()
    }

    /// Number of nodes on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// `Ok(true)` when the current node is a scalar, else reports
    /// [`ErrorCode::UnexpectedNodeType`] and yields `Ok(false)`.
    pub fn expect_scalar(&mut self) -> Result<bool, Error> {
        self.expect_kind(NodeKind::Scalar)
    }

    /// Sequence counterpart of [`LoadingContext::expect_scalar`].
    pub fn expect_sequence(&mut self) -> Result<bool, Error> {
        self.expect_kind(NodeKind::Sequence)
    }

    /// Mapping counterpart of [`LoadingContext::expect_scalar`].
    pub fn expect_mapping(&mut self) -> Result<bool, Error> {
        self.expect_kind(NodeKind::Mapping)
    }

    fn expect_kind(&mut self, expected: NodeKind) -> Result<bool, Error> {
        let found = self.current_node().kind();
        if found == expected {
            return Ok(true);
        }
        self.error(
            ErrorCode::UnexpectedNodeType,
            format!("expected a {expected}, found a {found}"),
        )?;
        Ok(false)
    }

    /// Report a problem at the current node.
    ///
    /// In fail-fast mode this is the `Err` to propagate; with an error handler installed
    /// the handler is called and `Ok(())` is returned.
    ///
    /// # Panics
    ///
    /// Panics when no node is active, like [`LoadingContext::current_node`].
    pub fn error(&mut self, code: ErrorCode, message: impl Into<String>) -> Result<(), Error> {
        let node = Rc::clone(self.current_node());
        let diagnostic = Diagnostic {
            code,
            message: message.into(),
            location: node.location(),
            document: self.current_location().map(str::to_owned),
        };
        crate::debug!(
            code = %diagnostic.code,
            line = diagnostic.location.line(),
            column = diagnostic.location.column(),
            "{}",
            diagnostic.message
        );
        self.sink.report(&node, diagnostic)
    }

    fn dispatch(&mut self) -> Result<Dispatch<'h>, Error> {
        let handlers = self.handlers;
        let node = Rc::clone(self.current_node());
        let Some(name) = node.extension_tag() else {
            return Ok(Dispatch::Field);
        };
        let matching: SmallVec<[&'h dyn TagHandler; 2]> = handlers.matching(name);
        match matching.as_slice() {
            [] => Ok(Dispatch::Field),
            [handler] => {
                crate::trace!(tag = name, "dispatching to tag handler");
                Ok(Dispatch::Handler(*handler))
            }
            _ => {
                self.error(
                    ErrorCode::MultipleMatchingHandlers,
                    format!("{} tag handlers match the tag !{name}", matching.len()),
                )?;
                Ok(Dispatch::Ambiguous)
            }
        }
    }

    fn downcast<T: 'static>(&self, loaded: Loaded<Box<dyn Any>>) -> Result<Loaded<T>, Error> {
        match loaded {
            Loaded::Failed => Ok(Loaded::Failed),
            Loaded::Success(value) => match value.downcast::<T>() {
                Ok(value) => Ok(Loaded::Success(*value)),
                Err(_) => Err(Error::msg(format!(
                    "tag handler produced a value that is not a {}",
                    type_name::<T>()
                ))
                .with_location(self.current_node().location())),
            },
        }
    }
}
