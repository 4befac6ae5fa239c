//! Error-reporting strategies for [`crate::LoadingContext`].
//!
//! The context hands every [`Diagnostic`] to exactly one sink chosen at construction:
//!
//! - [`FailFast`] turns the first diagnostic into an `Err`, which unwinds the in-flight
//!   load through `?`.
//! - [`Collect`] passes each diagnostic to a callback and lets loading continue, so one
//!   pass surfaces every problem it can find.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Diagnostic, Error, ErrorCode};
use crate::node::Node;

/// Receives diagnostics reported during a load.
pub trait ErrorSink {
    /// Returning `Err` aborts the current load; returning `Ok` lets the caller substitute
    /// [`crate::Loaded::Failed`] and carry on.
    fn report(&mut self, node: &Node, diagnostic: Diagnostic) -> Result<(), Error>;
}

/// Fail on the first reported problem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailFast;

impl ErrorSink for FailFast {
    fn report(&mut self, _node: &Node, diagnostic: Diagnostic) -> Result<(), Error> {
        Err(Error::from_diagnostic(diagnostic))
    }
}

/// Hand every problem to a callback and keep going.
pub struct Collect<F>(pub F);

impl<F> ErrorSink for Collect<F>
where
    F: FnMut(&Node, &Diagnostic),
{
    fn report(&mut self, node: &Node, diagnostic: Diagnostic) -> Result<(), Error> {
        (self.0)(node, &diagnostic);
        Ok(())
    }
}

/// Shared error callback stored in [`crate::Options`].
pub type ErrorHandler = Rc<RefCell<dyn FnMut(&Node, &Diagnostic) + 'static>>;

/// Ready-made collector: every diagnostic ends up in a shared list.
///
/// ```rust
/// use saphyr_schema::{load, options, Diagnostics, ErrorCode, Loaded};
///
/// let diagnostics = Diagnostics::new();
/// let options = options! { error_handler: Some(diagnostics.handler()) };
///
/// let loaded = load::<Vec<i32>>("[1, two, 3]", options).unwrap();
/// assert_eq!(loaded, Loaded::Success(vec![1, 3]));
/// assert_eq!(diagnostics.codes(), vec![ErrorCode::ValueError]);
/// ```
#[derive(Clone, Default)]
pub struct Diagnostics {
    records: Rc<RefCell<Vec<Diagnostic>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback appending to this collector, for [`crate::Options::error_handler`].
    pub fn handler(&self) -> ErrorHandler {
        let records = Rc::clone(&self.records);
        Rc::new(RefCell::new(move |_node: &Node, diagnostic: &Diagnostic| {
            records.borrow_mut().push(diagnostic.clone());
        }))
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Codes of the collected diagnostics, in report order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.records.borrow().iter().map(|d| d.code).collect()
    }

    /// Snapshot of the collected diagnostics.
    pub fn to_vec(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    /// Remove and return everything collected so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.records.borrow_mut())
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.records.borrow().iter()).finish()
    }
}
