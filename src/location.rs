//! Source location utilities.

use saphyr_parser::Span as ParserSpan;
use serde::{Deserialize, Serialize};

/// A span within the source YAML document.
///
/// `offset` and `len` count Unicode scalar values, matching what `saphyr-parser`
/// reports. Byte offsets are carried alongside when the parser knows them
/// (string sources); `(0, 0)` means unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub(crate) offset: u32,
    pub(crate) len: u32,
    pub(crate) byte_info: (u32, u32),
}

impl Span {
    /// Sentinel span meaning "unknown".
    pub const UNKNOWN: Self = Self {
        offset: 0,
        len: 0,
        byte_info: (0, 0),
    };

    /// Returns the character offset within the source YAML document.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset as u64
    }

    /// Returns the character length within the source YAML document.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the byte offset within the source YAML document.
    /// Returns `None` if byte info is unavailable.
    #[inline]
    pub fn byte_offset(&self) -> Option<u64> {
        if self.byte_info == (0, 0) {
            None
        } else {
            Some(self.byte_info.0 as u64)
        }
    }
}

/// Row/column location of a node within its source document (1-indexed, character-based).
///
/// Every [`crate::Node`] carries one, and every [`crate::Diagnostic`] and
/// [`crate::Error`] reports the location of the node that was active when the
/// problem was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// 1-indexed row number in the input stream.
    pub(crate) line: u32,
    /// 1-indexed column number in the input stream.
    pub(crate) column: u32,
    /// Character-based span within the document.
    #[serde(default)]
    pub(crate) span: Span,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    pub const UNKNOWN: Self = Self {
        line: 0,
        column: 0,
        span: Span::UNKNOWN,
    };

    /// Create a new location record from 1-indexed coordinates.
    pub const fn new(line: usize, column: usize) -> Self {
        Self {
            line: line as u32,
            column: column as u32,
            span: Span::UNKNOWN,
        }
    }

    pub(crate) const fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[inline]
    pub fn line(&self) -> u64 {
        self.line as u64
    }

    #[inline]
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    /// Character-based span within the source document.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        self.line != 0 && self.column != 0
    }
}

/// Convert a `saphyr_parser::Span` to a 1-indexed [`Location`].
///
/// Called by the composer for each raw parser event.
pub(crate) fn location_from_span(span: &ParserSpan) -> Location {
    let start = &span.start;
    let end = &span.end;

    let byte_info = match (start.byte_offset(), end.byte_offset()) {
        (Some(start_byte), Some(end_byte)) => {
            let len = end_byte.saturating_sub(start_byte);
            // Past 4 GiB the byte info is simply dropped.
            if start_byte > (u32::MAX as usize) || len > (u32::MAX as usize) {
                (0, 0)
            } else {
                (start_byte as u32, len as u32)
            }
        }
        _ => (0, 0),
    };

    Location::new(start.line(), start.col() + 1).with_span(Span {
        offset: start.index() as u32,
        len: span.len() as u32,
        byte_info,
    })
}
