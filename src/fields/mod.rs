//! Fields: loaders for one kind of value.
//!
//! A field receives the current node from a [`LoadingContext`] and produces a typed
//! value or [`Loaded::Failed`]. Containers load their children through the context,
//! never by calling a child field directly, so tag handlers apply at every level.

use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::loaded::Loaded;
use crate::node::Node;

mod bool_field;
mod dict;
mod enum_field;
mod float;
mod int;
mod list;
mod object;
mod path;
mod string;

pub use bool_field::BoolField;
pub use dict::DictField;
pub use enum_field::EnumField;
pub use float::FloatField;
pub use int::IntField;
pub use list::ListField;
pub use object::ObjectField;
pub use path::PathField;
pub use string::StringField;

/// Loads the current node of a [`LoadingContext`] into a value.
pub trait Field {
    type Output: 'static;

    /// Load [`LoadingContext::current_node`].
    ///
    /// Problems are reported through [`LoadingContext::error`] and propagated with `?`;
    /// a field that gives up without an `Err` returns [`Loaded::Failed`].
    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<Self::Output>, Error>;

    /// Whether an enclosing object must see this field.
    fn required(&self) -> bool {
        false
    }

    /// The per-item field of a list, for handlers that expand into several documents.
    fn item_field(&self) -> Option<&dyn AnyField> {
        None
    }

    /// Assemble values loaded with [`Field::item_field`] into this field's output, running
    /// the validation hook as [`Field::load`] would.
    fn collect_items(
        &self,
        ctx: &mut LoadingContext<'_>,
        items: Vec<Box<dyn Any>>,
    ) -> Result<Loaded<Self::Output>, Error> {
        let _ = (ctx, items);
        Ok(Loaded::Failed)
    }
}

/// Object-safe view of a [`Field`], handed to tag handlers.
///
/// Implemented for every field; the loaded value is boxed as the field's `Output`.
pub trait AnyField {
    fn load_any(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<Box<dyn Any>>, Error>;

    fn sequence_item(&self) -> Option<&dyn AnyField>;

    fn collect_sequence(
        &self,
        ctx: &mut LoadingContext<'_>,
        items: Vec<Box<dyn Any>>,
    ) -> Result<Loaded<Box<dyn Any>>, Error>;
}

impl<F: Field> AnyField for F {
    fn load_any(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<Box<dyn Any>>, Error> {
        Ok(Field::load(self, ctx)?.map(|value| Box::new(value) as Box<dyn Any>))
    }

    fn sequence_item(&self) -> Option<&dyn AnyField> {
        Field::item_field(self)
    }

    fn collect_sequence(
        &self,
        ctx: &mut LoadingContext<'_>,
        items: Vec<Box<dyn Any>>,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        Ok(Field::collect_items(self, ctx, items)?.map(|value| Box::new(value) as Box<dyn Any>))
    }
}

/// Post-load validation hook.
///
/// Returning `Ok(false)` turns the value into [`Loaded::Failed`]; the hook is expected to
/// have reported why through [`LoadingContext::error`].
pub type Validator<T> =
    Arc<dyn Fn(&mut LoadingContext<'_>, &T) -> Result<bool, Error> + Send + Sync>;

/// Settings every field carries.
pub struct FieldOptions<T> {
    pub required: bool,
    pub validate: Option<Validator<T>>,
}

impl<T> Default for FieldOptions<T> {
    fn default() -> Self {
        Self {
            required: false,
            validate: None,
        }
    }
}

impl<T> Clone for FieldOptions<T> {
    fn clone(&self) -> Self {
        Self {
            required: self.required,
            validate: self.validate.clone(),
        }
    }
}

impl<T> FieldOptions<T> {
    /// Run the validation hook over a freshly loaded value.
    pub(crate) fn finish(
        &self,
        ctx: &mut LoadingContext<'_>,
        loaded: Loaded<T>,
    ) -> Result<Loaded<T>, Error> {
        let Loaded::Success(value) = loaded else {
            return Ok(Loaded::Failed);
        };
        if let Some(validate) = &self.validate {
            if !validate(ctx, &value)? {
                return Ok(Loaded::Failed);
            }
        }
        Ok(Loaded::Success(value))
    }
}

/// `required()` and `validate()` builders shared by all field types.
macro_rules! field_builders {
    () => {
        /// Mark the field as required in its enclosing object.
        pub fn required(mut self) -> Self {
            self.options.required = true;
            self
        }

        /// Run `validate` on every successfully loaded value.
        ///
        /// The hook reports its own diagnostics; returning `Ok(false)` makes the value
        /// [`Loaded::Failed`](crate::Loaded::Failed).
        pub fn validate<V>(mut self, validate: V) -> Self
        where
            V: Fn(
                    &mut $crate::LoadingContext<'_>,
                    &<Self as $crate::fields::Field>::Output,
                ) -> Result<bool, $crate::Error>
                + Send
                + Sync
                + 'static,
        {
            self.options.validate = Some(std::sync::Arc::new(validate));
            self
        }
    };
}
pub(crate) use field_builders;

/// Text of the current node, or `None` after reporting that it is not a scalar.
///
/// The node is returned alongside so the text can be borrowed while `ctx` is used.
pub(crate) fn scalar_node(ctx: &mut LoadingContext<'_>) -> Result<Option<Rc<Node>>, Error> {
    if !ctx.expect_scalar()? {
        return Ok(None);
    }
    Ok(Some(Rc::clone(ctx.current_node())))
}

/// Key text of a mapping entry, loaded with the key as the current node.
pub(crate) fn mapping_key(
    ctx: &mut LoadingContext<'_>,
    key: &Rc<Node>,
) -> Result<Option<String>, Error> {
    ctx.with_node(key, None, |ctx| {
        if !ctx.expect_scalar()? {
            return Ok(None);
        }
        Ok(ctx.current_node().as_scalar().map(str::to_owned))
    })
}

/// Report a key that was already seen in the same mapping, honoring the
/// duplicate-key policy. Returns whether the new entry should be loaded.
pub(crate) fn accept_duplicate(
    ctx: &mut LoadingContext<'_>,
    key: &Rc<Node>,
    name: &str,
) -> Result<bool, Error> {
    use crate::error::ErrorCode;
    use crate::options::DuplicateKeyPolicy;

    match ctx.duplicate_keys() {
        DuplicateKeyPolicy::Error => {
            ctx.with_node(key, None, |ctx| {
                ctx.error(ErrorCode::DuplicateKey, format!("duplicate key `{name}`"))
            })?;
            Ok(false)
        }
        DuplicateKeyPolicy::FirstWins => Ok(false),
        DuplicateKeyPolicy::LastWins => Ok(true),
    }
}
