//! Document resolvers: where `!include` and `!glob` find the documents they name.
//!
//! A [`Resolver`] maps a reference to a location string, expands patterns to
//! locations, and reads the text at a location. [`Documents`] puts a chain of them
//! together for the include handlers.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::compose::{compose, read_to_string};
use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::fields::AnyField;
use crate::loaded::Loaded;
use crate::node::Node;

/// Source of referenced documents.
pub trait Resolver {
    /// Location of the document `reference` names, or `None` if this resolver does not
    /// know it.
    fn resolve(&self, reference: &str) -> Option<String>;

    /// Locations matching `pattern`, sorted.
    fn expand(&self, pattern: &str) -> io::Result<Vec<String>>;

    /// Text of the document at `location`.
    fn read(&self, location: &str) -> io::Result<String>;
}

/// Resolves references as paths relative to a root directory.
#[derive(Clone, Debug)]
pub struct FileSystemResolver {
    root: PathBuf,
}

impl FileSystemResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Resolver for FileSystemResolver {
    fn resolve(&self, reference: &str) -> Option<String> {
        let path = self.root.join(reference);
        path.is_file()
            .then(|| path.to_string_lossy().into_owned())
    }

    fn expand(&self, pattern: &str) -> io::Result<Vec<String>> {
        let pattern = self.root.join(pattern);
        let paths = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let mut locations = Vec::new();
        for path in paths {
            let path = path.map_err(io::Error::from)?;
            if path.is_file() {
                locations.push(path.to_string_lossy().into_owned());
            }
        }
        locations.sort();
        Ok(locations)
    }

    fn read(&self, location: &str) -> io::Result<String> {
        let file = std::fs::File::open(location)?;
        read_to_string(file).map_err(|e| match e {
            Error::IOError { cause } => cause,
            other => io::Error::other(other.to_string()),
        })
    }
}

/// Serves documents from memory, keyed by location.
///
/// ```rust
/// use saphyr_schema::{MemoryResolver, Resolver};
///
/// let resolver = MemoryResolver::new()
///     .with("servers/a.yaml", "name: a")
///     .with("servers/b.yaml", "name: b");
/// assert_eq!(resolver.expand("servers/*.yaml").unwrap(), ["servers/a.yaml", "servers/b.yaml"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryResolver {
    documents: BTreeMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(location, text);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(location.into(), text.into());
    }
}

impl Resolver for MemoryResolver {
    fn resolve(&self, reference: &str) -> Option<String> {
        self.documents
            .contains_key(reference)
            .then(|| reference.to_owned())
    }

    fn expand(&self, pattern: &str) -> io::Result<Vec<String>> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        Ok(self
            .documents
            .keys()
            .filter(|location| pattern.matches(location))
            .cloned()
            .collect())
    }

    fn read(&self, location: &str) -> io::Result<String> {
        self.documents.get(location).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no document at {location}"))
        })
    }
}

/// A referenced document, parsed and ready to load.
pub(crate) struct Document {
    location: String,
    text: String,
    root: Rc<Node>,
}

/// The resolver chain shared by the include and glob handlers.
pub(crate) struct Documents {
    resolvers: Vec<Rc<dyn Resolver>>,
    max_depth: usize,
    /// Crop radius of snippets attached to errors; `None` disables them.
    snippet_radius: Option<usize>,
}

impl Documents {
    pub(crate) fn new(
        resolvers: Vec<Rc<dyn Resolver>>,
        max_depth: usize,
        snippet_radius: Option<usize>,
    ) -> Self {
        Self {
            resolvers,
            max_depth,
            snippet_radius,
        }
    }

    /// The first resolver that knows `reference`, with the location it resolved to.
    ///
    /// Reports `INCLUDE_ERROR` when none does.
    pub(crate) fn resolve(
        &self,
        ctx: &mut LoadingContext<'_>,
        reference: &str,
    ) -> Result<Option<(Rc<dyn Resolver>, String)>, Error> {
        let found = self.resolvers.iter().find_map(|resolver| {
            resolver
                .resolve(reference)
                .map(|location| (Rc::clone(resolver), location))
        });
        if found.is_none() {
            ctx.error(
                ErrorCode::IncludeError,
                format!("cannot resolve `{reference}`"),
            )?;
        }
        Ok(found)
    }

    /// Matches of `pattern` from every resolver, in resolver order.
    pub(crate) fn expand(
        &self,
        ctx: &mut LoadingContext<'_>,
        pattern: &str,
    ) -> Result<Vec<(Rc<dyn Resolver>, String)>, Error> {
        let mut matches = Vec::new();
        for resolver in &self.resolvers {
            match resolver.expand(pattern) {
                Ok(locations) => matches.extend(
                    locations
                        .into_iter()
                        .map(|location| (Rc::clone(resolver), location)),
                ),
                Err(e) => ctx.error(
                    ErrorCode::IncludeError,
                    format!("cannot expand `{pattern}`: {e}"),
                )?,
            }
        }
        crate::trace!(pattern, matches = matches.len(), "expanded glob");
        Ok(matches)
    }

    /// Read and parse the document at `location`.
    pub(crate) fn open(
        &self,
        ctx: &mut LoadingContext<'_>,
        resolver: &dyn Resolver,
        location: &str,
    ) -> Result<Option<Document>, Error> {
        if ctx.location_depth() >= self.max_depth {
            ctx.error(
                ErrorCode::IncludeError,
                format!(
                    "cannot include `{location}`: more than {} nested documents",
                    self.max_depth
                ),
            )?;
            return Ok(None);
        }
        let text = match resolver.read(location) {
            Ok(text) => text,
            Err(e) => {
                ctx.error(
                    ErrorCode::IncludeError,
                    format!("cannot read `{location}`: {e}"),
                )?;
                return Ok(None);
            }
        };
        match compose(&text) {
            Ok(root) => {
                crate::debug!(location, "opened document");
                Ok(Some(Document {
                    location: location.to_owned(),
                    text,
                    root,
                }))
            }
            Err(e) => {
                ctx.error(
                    ErrorCode::InvalidDocument,
                    format!("`{location}` is not a valid document: {e}"),
                )?;
                Ok(None)
            }
        }
    }

    /// Load `document` with `field`, under the document's own location.
    ///
    /// A fail-fast error raised inside the document gets that document's snippet.
    pub(crate) fn load(
        &self,
        ctx: &mut LoadingContext<'_>,
        field: &dyn AnyField,
        document: &Document,
    ) -> Result<Loaded<Box<dyn std::any::Any>>, Error> {
        ctx.load_any(field, &document.root, Some(&document.location))
            .map_err(|e| match self.snippet_radius {
                Some(radius) if e.document() == Some(document.location.as_str()) => {
                    e.with_snippet(&document.text, &document.location, radius)
                }
                _ => e,
            })
    }
}
