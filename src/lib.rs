//! Load YAML into typed values through declared field schemas.
//!
//! A document is composed into a [`Node`] tree and walked by a [`LoadingContext`].
//! Each node is loaded by a [`Field`] unless its `!tag` is claimed by a [`TagHandler`]
//! (`!include`, `!glob`, `!switch`, `!env`, or your own). Problems are reported with
//! their position and document; loading either stops at the first one or, with an
//! error handler installed, reports them all and leaves failed entries out.
//!
//! ```rust
//! use saphyr_schema::{load, BoolField, IntField, Loaded, Options, Schema, SchemaBuilder, StringField};
//!
//! #[derive(Default, Debug)]
//! struct Service {
//!     name: String,
//!     port: u16,
//!     enabled: bool,
//! }
//!
//! impl Schema for Service {
//!     fn declare(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .field("name", StringField::new().required(), |s, v| s.name = v)
//!             .field("port", IntField::new().minimum(1), |s, v| s.port = v)
//!             .field("enabled", BoolField::new(), |s, v| s.enabled = v);
//!     }
//! }
//!
//! let yaml = "name: api\nport: !switch [!env API_PORT_UNSET_FOR_DOCS, 8080]\nenabled: yes\n";
//! let Loaded::Success(service) = load::<Service>(yaml, Options::default()).unwrap() else {
//!     panic!("service should load");
//! };
//! assert_eq!(service.port, 8080);
//! assert!(service.enabled);
//! ```

mod compose;
mod context;
mod error;
pub mod fields;
pub mod handlers;
mod loaded;
mod loader;
mod location;
mod macros;
mod node;
mod options;
mod parse_scalars;
mod resolver;
mod schema;
mod sink;
mod snippet;
mod tracing_macros;

pub use compose::compose;
pub use context::LoadingContext;
pub use error::{Diagnostic, Error, ErrorCode};
pub use fields::{
    AnyField, BoolField, DictField, EnumField, Field, FieldOptions, FloatField, IntField,
    ListField, ObjectField, PathField, StringField, Validator,
};
pub use handlers::{
    EnvHandler, FailHandler, GlobHandler, IncludeHandler, SwitchHandler, TagHandler, TagHandlers,
};
pub use loaded::Loaded;
pub use loader::{Loadable, load, load_file, load_from_reader, load_with_field};
pub use location::{Location, Span};
pub use node::{Node, NodeKind, NodeValue};
pub use options::{DuplicateKeyPolicy, Options};
pub use resolver::{FileSystemResolver, MemoryResolver, Resolver};
pub use schema::{ObjectValidator, Schema, SchemaBuilder, SchemaEntry, schema_of};
pub use sink::{Collect, Diagnostics, ErrorHandler, ErrorSink, FailFast};
