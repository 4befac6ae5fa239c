//! Entry points: compose a document and load it with a root field.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::compose::{compose, read_to_string};
use crate::context::LoadingContext;
use crate::error::{Diagnostic, Error};
use crate::fields::{
    BoolField, DictField, Field, FloatField, IntField, ListField, ObjectField, PathField,
    StringField,
};
use crate::handlers::{
    EnvHandler, GlobHandler, IncludeHandler, SwitchHandler, TagHandler, TagHandlers,
};
use crate::loaded::Loaded;
use crate::node::Node;
use crate::options::Options;
use crate::resolver::{Documents, FileSystemResolver, Resolver};
use crate::schema::Schema;
use crate::sink::{Collect, FailFast};

/// Types with a default root field, so they can be loaded with [`load`].
pub trait Loadable: Sized + 'static {
    type Field: Field<Output = Self>;

    fn root_field() -> Self::Field;
}

impl Loadable for bool {
    type Field = BoolField;

    fn root_field() -> BoolField {
        BoolField::new()
    }
}

macro_rules! loadable_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Loadable for $ty {
                type Field = IntField<$ty>;

                fn root_field() -> IntField<$ty> {
                    IntField::new()
                }
            }
        )*
    };
}

loadable_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Loadable for f32 {
    type Field = FloatField<f32>;

    fn root_field() -> FloatField<f32> {
        FloatField::new()
    }
}

impl Loadable for f64 {
    type Field = FloatField<f64>;

    fn root_field() -> FloatField<f64> {
        FloatField::new()
    }
}

impl Loadable for String {
    type Field = StringField;

    fn root_field() -> StringField {
        StringField::new()
    }
}

impl Loadable for PathBuf {
    type Field = PathField;

    fn root_field() -> PathField {
        PathField::new()
    }
}

impl<T: Loadable> Loadable for Vec<T> {
    type Field = ListField<T::Field>;

    fn root_field() -> Self::Field {
        ListField::new(T::root_field())
    }
}

impl<T: Loadable> Loadable for BTreeMap<String, T> {
    type Field = DictField<T::Field>;

    fn root_field() -> Self::Field {
        DictField::new(T::root_field())
    }
}

impl<T: Schema> Loadable for T {
    type Field = ObjectField<T>;

    fn root_field() -> ObjectField<T> {
        ObjectField::new()
    }
}

/// Load a `T` from YAML text, with the root field inferred from `T`.
///
/// ```rust
/// use saphyr_schema::{load, Loaded, Options};
///
/// let loaded = load::<Vec<u16>>("[80, 443]", Options::default()).unwrap();
/// assert_eq!(loaded, Loaded::Success(vec![80, 443]));
/// ```
///
/// Returns `Err` on a parse error, or on the first reported problem when no
/// [`Options::error_handler`] is set. With a handler, problems are passed to it and a
/// root that could not be loaded is `Ok(Loaded::Failed)`.
pub fn load<T: Loadable>(source: &str, options: Options) -> Result<Loaded<T>, Error> {
    load_with_field(&T::root_field(), source, options)
}

/// Load YAML text with an explicit root field.
pub fn load_with_field<F: Field>(
    field: &F,
    source: &str,
    options: Options,
) -> Result<Loaded<F::Output>, Error> {
    let snippet_radius = (options.with_snippet && options.crop_radius > 0).then_some(options.crop_radius);
    let root_location = options.location.clone();
    let snippet = |err: Error| match snippet_radius {
        Some(radius) => err.with_snippet(
            source,
            root_location.as_deref().unwrap_or("<input>"),
            radius,
        ),
        None => err,
    };

    // Parse errors always belong to the root source.
    let root = compose(source).map_err(snippet)?;
    let handlers = build_handlers(&options, snippet_radius)?;
    crate::debug!(
        location = root_location.as_deref().unwrap_or("<input>"),
        handlers = handlers.len(),
        "loading document"
    );

    let loaded = match options.error_handler {
        Some(handler) => {
            let sink = Collect(move |node: &Node, diagnostic: &Diagnostic| {
                (&mut *handler.borrow_mut())(node, diagnostic)
            });
            let mut ctx = LoadingContext::new(&handlers, sink).with_duplicate_keys(options.duplicate_keys);
            ctx.load(field, &root, root_location.as_deref())
        }
        None => {
            let mut ctx = LoadingContext::new(&handlers, FailFast).with_duplicate_keys(options.duplicate_keys);
            ctx.load(field, &root, root_location.as_deref())
        }
    };
    loaded.map_err(|err| {
        if err.document() == root_location.as_deref() {
            snippet(err)
        } else {
            err
        }
    })
}

/// Load a `T` from a reader, honouring a UTF-8/UTF-16 byte order mark.
pub fn load_from_reader<T: Loadable, R: Read>(reader: R, options: Options) -> Result<Loaded<T>, Error> {
    let text = read_to_string(reader)?;
    load(&text, options)
}

/// Load a `T` from a file. The path becomes the root location, so diagnostics name the
/// file and relative paths in it resolve against its directory.
pub fn load_file<T: Loadable>(path: impl AsRef<Path>, mut options: Options) -> Result<Loaded<T>, Error> {
    let path = path.as_ref();
    let text = read_to_string(std::fs::File::open(path)?)?;
    options.location = Some(path.to_string_lossy().into_owned());
    load(&text, options)
}

/// Built-in handlers, include handlers when any resolver is configured, then the
/// explicitly registered ones.
///
/// A registered handler with the same tag pattern as a built-in one replaces it.
fn build_handlers(options: &Options, snippet_radius: Option<usize>) -> Result<TagHandlers, Error> {
    let replaced = |pattern: &str| {
        options
            .tag_handlers
            .iter()
            .any(|handler| handler.tag_pattern() == pattern)
    };
    let mut builtins: Vec<Rc<dyn TagHandler>> =
        vec![Rc::new(SwitchHandler), Rc::new(EnvHandler::new())];

    let resolvers: Vec<Rc<dyn Resolver>> = options
        .resolvers
        .iter()
        .cloned()
        .chain(
            options
                .resolve_roots
                .iter()
                .map(|root| Rc::new(FileSystemResolver::new(root)) as Rc<dyn Resolver>),
        )
        .collect();
    if !resolvers.is_empty() {
        let documents = Rc::new(Documents::new(
            resolvers,
            options.max_include_depth,
            snippet_radius,
        ));
        builtins.push(Rc::new(IncludeHandler::new(Rc::clone(&documents))));
        builtins.push(Rc::new(GlobHandler::new(documents)));
    }

    let mut handlers = TagHandlers::new();
    for handler in builtins {
        if replaced(handler.tag_pattern()) {
            crate::trace!(pattern = handler.tag_pattern(), "built-in tag handler replaced");
            continue;
        }
        handlers.register(handler)?;
    }
    for handler in &options.tag_handlers {
        handlers.register(Rc::clone(handler))?;
    }
    Ok(handlers)
}
