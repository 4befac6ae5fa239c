use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::handlers::TagHandler;
use crate::resolver::Resolver;
use crate::sink::ErrorHandler;

/// Duplicate key handling policy for mappings.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Report `DUPLICATE_KEY` at the repeated key and skip it.
    #[default]
    Error,
    /// First key wins: later duplicate entries are skipped silently.
    FirstWins,
    /// Last key wins: later duplicate entries are loaded over the earlier ones.
    LastWins,
}

/// Loader configuration.
///
/// Example: collect every problem instead of stopping at the first one.
///
/// ```rust
/// use saphyr_schema::{load, options, Diagnostics, ErrorCode, Loaded};
/// use std::collections::BTreeMap;
///
/// let diagnostics = Diagnostics::new();
/// let options = options! {
///     error_handler: Some(diagnostics.handler()),
/// };
///
/// let loaded = load::<BTreeMap<String, bool>>("a: yes\nb: maybe\nc: off\n", options).unwrap();
/// let Loaded::Success(flags) = loaded else { panic!("dict loads even with a bad entry") };
/// assert_eq!(flags.len(), 2);
/// assert_eq!(diagnostics.codes(), vec![ErrorCode::ValueError]);
/// ```
#[derive(Clone)]
pub struct Options {
    /// Directories searched by `!include` and `!glob`, in order. Each becomes a
    /// [`crate::FileSystemResolver`] placed after [`Options::resolvers`].
    pub resolve_roots: Vec<PathBuf>,
    /// Custom document resolvers, consulted before the resolve roots.
    pub resolvers: Vec<Rc<dyn Resolver>>,
    /// Tag handlers registered in addition to the built-in ones. A handler whose
    /// [`TagHandler::tag_pattern`] equals a built-in one (`^env$`, `^switch$`,
    /// `^(include|import)$`, `^glob$`) replaces it.
    pub tag_handlers: Vec<Rc<dyn TagHandler>>,
    /// Called for every reported problem. When `None`, the first problem aborts the load
    /// and is returned as the `Err`.
    pub error_handler: Option<ErrorHandler>,
    /// Logical location of the root document, usually its path. Set by
    /// [`crate::load_file`].
    pub location: Option<String>,
    /// Policy for duplicate keys in dictionaries and objects.
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Maximum number of nested documents, counting the root when it has a location.
    /// Deeper includes are reported as `INCLUDE_ERROR`, which also stops include cycles.
    pub max_include_depth: usize,
    /// If true (default), errors returned in fail-fast mode carry a rendered snippet of
    /// the document they were found in.
    pub with_snippet: bool,
    /// Horizontal crop radius (in character columns) when rendering snippets.
    ///
    /// If set to `0`, snippet wrapping is disabled.
    pub crop_radius: usize,
}

impl Options {
    /// Registers an error handler. Any closure can be used, including ones that
    /// capture state from the surrounding scope.
    ///
    /// ```rust
    /// use saphyr_schema::{Diagnostic, Node, Options};
    ///
    /// let options = Options::default().with_error_handler(|_node: &Node, diagnostic: &Diagnostic| {
    ///     eprintln!("{diagnostic}");
    /// });
    /// assert!(options.error_handler.is_some());
    /// ```
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&crate::Node, &crate::Diagnostic) + 'static,
    {
        self.error_handler = Some(Rc::new(std::cell::RefCell::new(handler)));
        self
    }

    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolvers.push(Rc::new(resolver));
        self
    }

    pub fn with_tag_handler(mut self, handler: impl TagHandler + 'static) -> Self {
        self.tag_handlers.push(Rc::new(handler));
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            resolve_roots: Vec::new(),
            resolvers: Vec::new(),
            tag_handlers: Vec::new(),
            error_handler: None,
            location: None,
            duplicate_keys: DuplicateKeyPolicy::Error,
            max_include_depth: 32,
            with_snippet: true,
            crop_radius: 64,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("resolve_roots", &self.resolve_roots)
            .field("resolvers", &self.resolvers.len())
            .field("tag_handlers", &self.tag_handlers.len())
            .field("error_handler", &if self.error_handler.is_some() { "set" } else { "none" })
            .field("location", &self.location)
            .field("duplicate_keys", &self.duplicate_keys)
            .field("max_include_depth", &self.max_include_depth)
            .field("with_snippet", &self.with_snippet)
            .field("crop_radius", &self.crop_radius)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::default();
        assert_eq!(options.duplicate_keys, DuplicateKeyPolicy::Error);
        assert_eq!(options.max_include_depth, 32);
        assert!(options.with_snippet);
        assert!(options.error_handler.is_none());
    }

    #[test]
    fn macro_overrides_selected_fields() {
        let options = crate::options! {
            duplicate_keys: DuplicateKeyPolicy::LastWins,
            crop_radius: 0,
        };
        assert_eq!(options.duplicate_keys, DuplicateKeyPolicy::LastWins);
        assert_eq!(options.crop_radius, 0);
        assert_eq!(options.max_include_depth, 32);
    }

    #[test]
    fn policy_serializes_by_name() {
        let json = serde_json::to_string(&DuplicateKeyPolicy::FirstWins).unwrap();
        assert_eq!(json, "\"FirstWins\"");
    }
}
