use std::path::{Path, PathBuf};

use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::loaded::Loaded;

use super::{Field, FieldOptions, field_builders, scalar_node};

/// Loads a filesystem path.
///
/// A relative path is taken relative to the directory of the document it appears in,
/// when that document has a location; otherwise it is kept as written.
#[derive(Clone, Default)]
pub struct PathField {
    options: FieldOptions<PathBuf>,
    must_exist: bool,
}

impl PathField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`ErrorCode::ValidationError`] when the resolved path does not exist.
    pub fn must_exist(mut self) -> Self {
        self.must_exist = true;
        self
    }

    field_builders!();
}

impl Field for PathField {
    type Output = PathBuf;

    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<PathBuf>, Error> {
        let Some(node) = scalar_node(ctx)? else {
            return Ok(Loaded::Failed);
        };
        let text = node.as_scalar().unwrap_or_default();
        let mut path = PathBuf::from(text);
        if path.is_relative() {
            let parent = ctx
                .current_location()
                .and_then(|location| Path::new(location).parent())
                .filter(|parent| !parent.as_os_str().is_empty());
            if let Some(parent) = parent {
                path = parent.join(path);
            }
        }
        if self.must_exist && !path.exists() {
            ctx.error(
                ErrorCode::ValidationError,
                format!("path {} does not exist", path.display()),
            )?;
            return Ok(Loaded::Failed);
        }
        self.options.finish(ctx, Loaded::Success(path))
    }

    fn required(&self) -> bool {
        self.options.required
    }
}
