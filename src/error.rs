//! Defines error codes, diagnostic records and the crate error type.
use std::fmt;

use saphyr_parser::ScanError;
use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::snippet::Snippet;

/// Kind of problem found while mapping a document onto fields.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Node kind (scalar/sequence/mapping) does not match what the field or handler needs.
    UnexpectedNodeType,
    /// A scalar could not be converted to the target type.
    ValueError,
    /// A value or a fully built object failed a declared validation rule.
    ValidationError,
    /// A mapping key has no declared field.
    FieldNotDeclared,
    /// A declared required field was never present in the mapping.
    MissingRequiredField,
    /// A node tag matched more than one registered tag handler.
    MultipleMatchingHandlers,
    /// A referenced document could not be resolved or read.
    IncludeError,
    /// A referenced document is not valid YAML.
    InvalidDocument,
    /// A mapping key appeared twice under [`crate::DuplicateKeyPolicy::Error`].
    DuplicateKey,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedNodeType => "UNEXPECTED_NODE_TYPE",
            ErrorCode::ValueError => "VALUE_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::FieldNotDeclared => "FIELD_NOT_DECLARED",
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::MultipleMatchingHandlers => "MULTIPLE_MATCHING_HANDLERS",
            ErrorCode::IncludeError => "INCLUDE_ERROR",
            ErrorCode::InvalidDocument => "INVALID_DOCUMENT",
            ErrorCode::DuplicateKey => "DUPLICATE_KEY",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported problem: what went wrong, and where.
///
/// Diagnostics are only created by [`crate::LoadingContext::error`], which captures the
/// position of the active node and the logical location (document) it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    /// Position of the node that was active when the problem was reported.
    pub location: Location,
    /// Logical location (usually a path) of the document owning that node.
    pub document: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.code)?;
        fmt_with_location(f, &self.message, &self.location)?;
        if let Some(document) = &self.document {
            write!(f, " in {document}")?;
        }
        Ok(())
    }
}

/// Error returned by the loading entry points.
#[derive(Debug)]
pub enum Error {
    /// A problem reported through [`crate::LoadingContext::error`] while no error handler
    /// was installed (fail-fast mode).
    Load {
        code: ErrorCode,
        msg: String,
        location: Location,
        document: Option<String>,
    },
    /// Free-form error with optional source location (parser scan errors and the like).
    Message { msg: String, location: Location },
    /// The document holds no node at all.
    Eof { location: Location },
    /// Alias references a non-existent anchor id.
    UnknownAnchor { id: usize, location: Location },
    /// The input holds more than one YAML document.
    MultipleDocuments { location: Location },
    /// Unexpected I/O error while reading the source.
    IOError { cause: std::io::Error },
    /// Wrap an error with a pre-rendered source snippet.
    ///
    /// Only the cropped rendering is kept, not the whole input text.
    WithSnippet { text: String, error: Box<Error> },
}

impl Error {
    /// Construct a `Message` error with no known location.
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn eof() -> Self {
        Error::Eof {
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn unknown_anchor(id: usize) -> Self {
        Error::UnknownAnchor {
            id,
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        Error::Load {
            code: diagnostic.code,
            msg: diagnostic.message,
            location: diagnostic.location,
            document: diagnostic.document,
        }
    }

    pub(crate) fn from_scan_error(err: ScanError) -> Self {
        let mark = err.marker();
        Error::Message {
            msg: err.info().to_owned(),
            location: Location::new(mark.line(), mark.col() + 1),
        }
    }

    /// Attach/override a concrete location to this error and return it.
    pub(crate) fn with_location(mut self, set_location: Location) -> Self {
        match &mut self {
            Error::Load { location, .. }
            | Error::Message { location, .. }
            | Error::Eof { location }
            | Error::UnknownAnchor { location, .. }
            | Error::MultipleDocuments { location } => {
                *location = set_location;
            }
            Error::IOError { .. } => {}
            Error::WithSnippet { error, .. } => {
                let inner = std::mem::replace(error.as_mut(), Error::eof());
                **error = inner.with_location(set_location);
            }
        }
        self
    }

    /// Render a snippet of `text` around this error's location.
    ///
    /// An error that already carries a snippet keeps it: errors raised inside an included
    /// document are rendered against that document before they reach the outer one.
    pub(crate) fn with_snippet(self, text: &str, path: &str, crop_radius: usize) -> Self {
        if matches!(self, Error::WithSnippet { .. }) {
            return self;
        }
        let Some(location) = self.location() else {
            return self;
        };
        let msg = match &self {
            Error::Load { code, msg, .. } => format!("{code}: {msg}"),
            other => other.to_string(),
        };
        match Snippet::new(text, path, crop_radius).render(&msg, &location) {
            Some(text) => Error::WithSnippet {
                text,
                error: Box::new(self),
            },
            None => self,
        }
    }

    /// If the error has a known location, return it.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Load { location, .. }
            | Error::Message { location, .. }
            | Error::Eof { location }
            | Error::UnknownAnchor { location, .. }
            | Error::MultipleDocuments { location } => {
                if location.is_known() {
                    Some(*location)
                } else {
                    None
                }
            }
            Error::IOError { .. } => None,
            Error::WithSnippet { error, .. } => error.location(),
        }
    }

    /// The error code of a load error.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Load { code, .. } => Some(*code),
            Error::WithSnippet { error, .. } => error.code(),
            _ => None,
        }
    }

    /// The logical location (document) a load error was reported in.
    pub fn document(&self) -> Option<&str> {
        match self {
            Error::Load { document, .. } => document.as_deref(),
            Error::WithSnippet { error, .. } => error.document(),
            _ => None,
        }
    }

    /// The error without its snippet wrapper.
    pub fn without_snippet(&self) -> &Error {
        match self {
            Error::WithSnippet { error, .. } => error.without_snippet(),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Load {
                code,
                msg,
                location,
                document,
            } => {
                write!(f, "{code}: ")?;
                fmt_with_location(f, msg, location)?;
                if let Some(document) = document {
                    write!(f, " in {document}")?;
                }
                Ok(())
            }
            Error::Message { msg, location } => fmt_with_location(f, msg, location),
            Error::Eof { location } => fmt_with_location(f, "unexpected end of input", location),
            Error::UnknownAnchor { id, location } => {
                fmt_with_location(f, &format!("alias references unknown anchor {id}"), location)
            }
            Error::MultipleDocuments { location } => fmt_with_location(
                f,
                "multiple YAML documents where a single one was expected",
                location,
            ),
            Error::IOError { cause } => write!(f, "IO error: {cause}"),
            Error::WithSnippet { text, .. } => f.write_str(text.trim_end()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError { cause } => Some(cause),
            Error::WithSnippet { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(cause: std::io::Error) -> Self {
        Error::IOError { cause }
    }
}

/// Print a message optionally suffixed with "at line X, column Y".
fn fmt_with_location(f: &mut fmt::Formatter<'_>, msg: &str, location: &Location) -> fmt::Result {
    if location.is_known() {
        write!(
            f,
            "{msg} at line {}, column {}",
            location.line(),
            location.column()
        )
    } else {
        write!(f, "{msg}")
    }
}
