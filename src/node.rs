//! The composed document tree.
//!
//! Nodes are immutable and shared through `Rc`, so a tag handler can splice the
//! root of another document into the traversal without copying it, and an alias
//! is simply another reference to its anchored node. Identity comparisons use
//! [`Rc::ptr_eq`].

use std::fmt;
use std::rc::Rc;

use crate::location::Location;

/// The three node shapes of the YAML representation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Scalar => write!(f, "scalar"),
            NodeKind::Sequence => write!(f, "sequence"),
            NodeKind::Mapping => write!(f, "mapping"),
        }
    }
}

/// Node payload.
#[derive(Debug, PartialEq)]
pub enum NodeValue {
    Scalar(String),
    Sequence(Vec<Rc<Node>>),
    Mapping(Vec<(Rc<Node>, Rc<Node>)>),
}

/// A node of a composed document.
#[derive(Debug, PartialEq)]
pub struct Node {
    tag: String,
    value: NodeValue,
    location: Location,
}

impl Node {
    pub fn new(tag: impl Into<String>, value: NodeValue, location: Location) -> Self {
        Self {
            tag: tag.into(),
            value,
            location,
        }
    }

    /// Untagged scalar node.
    pub fn scalar(text: impl Into<String>, location: Location) -> Self {
        Self::new(String::new(), NodeValue::Scalar(text.into()), location)
    }

    /// Full tag text: empty, a local `!name` tag, or a resolved global tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The name of a local extension tag (`!name` → `name`).
    ///
    /// Returns `None` for untagged nodes, secondary-handle tags (`!!str`) and
    /// global tags, which are never dispatched to tag handlers.
    pub fn extension_tag(&self) -> Option<&str> {
        let name = self.tag.strip_prefix('!')?;
        if name.is_empty() || name.starts_with('!') {
            return None;
        }
        Some(name)
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Scalar(_) => NodeKind::Scalar,
            NodeValue::Sequence(_) => NodeKind::Sequence,
            NodeValue::Mapping(_) => NodeKind::Mapping,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Rc<Node>]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Rc<Node>, Rc<Node>)]> {
        match &self.value {
            NodeValue::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }
}
