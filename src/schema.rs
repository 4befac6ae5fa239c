//! Declarative object schemas.
//!
//! A type opts in by implementing [`Schema`]: `declare` lists its fields, how each
//! loaded value is stored, and the object-level validators. Declarations are built
//! once per type and cached for the lifetime of the process, so the field table can
//! be inspected ([`schema_of`]) before anything is loaded.
//!
//! ```rust
//! use saphyr_schema::{IntField, Schema, SchemaBuilder, StringField};
//!
//! #[derive(Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Schema for Server {
//!     fn declare(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .field("host", StringField::new().required(), |s, v| s.host = v)
//!             .field("port", IntField::new().minimum(1), |s, v| s.port = v);
//!     }
//! }
//!
//! let entry = saphyr_schema::schema_of::<Server>();
//! assert_eq!(entry.field_names().collect::<Vec<_>>(), ["host", "port"]);
//! assert!(entry.is_required("host"));
//! ```

use std::any::{Any, TypeId};
use std::rc::Rc;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use ahash::AHashMap;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::fields::Field;
use crate::loaded::Loaded;
use crate::node::Node;

/// A type loadable from a mapping through declared fields.
pub trait Schema: Default + Send + Sync + 'static {
    fn declare(schema: &mut SchemaBuilder<Self>);
}

/// Object-level validation hook, run after all fields are loaded.
///
/// Returning `Ok(false)` fails the object; the hook reports its own diagnostics.
pub type ObjectValidator<T> =
    Arc<dyn Fn(&mut LoadingContext<'_>, &T) -> Result<bool, Error> + Send + Sync>;

/// A declared field bound to its storage in `T`.
pub(crate) trait Member<T>: Send + Sync {
    fn required(&self) -> bool;

    /// Load `node` and store the value. A failed value leaves `target` untouched.
    fn load_into(
        &self,
        ctx: &mut LoadingContext<'_>,
        node: &Rc<Node>,
        target: &mut T,
    ) -> Result<(), Error>;
}

struct Binding<T, F: Field> {
    field: F,
    assign: fn(&mut T, F::Output),
}

impl<T, F> Member<T> for Binding<T, F>
where
    F: Field + Send + Sync,
{
    fn required(&self) -> bool {
        self.field.required()
    }

    fn load_into(
        &self,
        ctx: &mut LoadingContext<'_>,
        node: &Rc<Node>,
        target: &mut T,
    ) -> Result<(), Error> {
        if let Loaded::Success(value) = ctx.load(&self.field, node, None)? {
            (self.assign)(target, value);
        }
        Ok(())
    }
}

/// A base type's member, reached through `AsMut`.
struct Inherited<B> {
    member: Arc<dyn Member<B>>,
}

impl<T, B> Member<T> for Inherited<B>
where
    T: AsMut<B>,
    B: 'static,
{
    fn required(&self) -> bool {
        self.member.required()
    }

    fn load_into(
        &self,
        ctx: &mut LoadingContext<'_>,
        node: &Rc<Node>,
        target: &mut T,
    ) -> Result<(), Error> {
        self.member.load_into(ctx, node, target.as_mut())
    }
}

/// Collects the declarations of one schema type.
pub struct SchemaBuilder<T> {
    members: Vec<(String, Arc<dyn Member<T>>)>,
    validators: Vec<ObjectValidator<T>>,
    base_validators: Vec<ObjectValidator<T>>,
    base_members: Vec<(String, Arc<dyn Member<T>>)>,
}

impl<T: Schema> SchemaBuilder<T> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            validators: Vec::new(),
            base_validators: Vec::new(),
            base_members: Vec::new(),
        }
    }

    /// Declare field `name`, storing each successfully loaded value with `assign`.
    ///
    /// Declaring a name a base already declares replaces the base field.
    pub fn field<F>(&mut self, name: &str, field: F, assign: fn(&mut T, F::Output)) -> &mut Self
    where
        F: Field + Send + Sync + 'static,
    {
        let member: Arc<dyn Member<T>> = Arc::new(Binding { field, assign });
        self.members.push((name.to_owned(), member));
        self
    }

    /// Inherit the fields and validators of `B`.
    ///
    /// Base fields come first in declaration order and base validators run before the
    /// ones declared here.
    pub fn extend<B>(&mut self) -> &mut Self
    where
        B: Schema,
        T: AsRef<B> + AsMut<B>,
    {
        let base = schema_of::<B>();
        for (name, member) in &base.members {
            let member: Arc<dyn Member<T>> = Arc::new(Inherited {
                member: Arc::clone(member),
            });
            upsert(&mut self.base_members, name, member);
        }
        for validator in &base.validators {
            let validator = Arc::clone(validator);
            self.base_validators.push(Arc::new(
                move |ctx: &mut LoadingContext<'_>, this: &T| validator(ctx, this.as_ref()),
            ));
        }
        self
    }

    /// Add an object-level validation hook.
    pub fn validate<V>(&mut self, validator: V) -> &mut Self
    where
        V: Fn(&mut LoadingContext<'_>, &T) -> Result<bool, Error> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    fn build(self) -> SchemaEntry<T> {
        let mut members = self.base_members;
        for (name, member) in self.members {
            upsert(&mut members, &name, member);
        }
        let mut validators = self.base_validators;
        validators.extend(self.validators);
        SchemaEntry {
            members,
            validators,
        }
    }
}

fn upsert<T>(members: &mut Vec<(String, Arc<dyn Member<T>>)>, name: &str, member: Arc<dyn Member<T>>) {
    match members.iter_mut().find(|(existing, _)| existing == name) {
        Some(slot) => slot.1 = member,
        None => members.push((name.to_owned(), member)),
    }
}

/// The resolved field table of a schema type, bases included.
pub struct SchemaEntry<T> {
    members: Vec<(String, Arc<dyn Member<T>>)>,
    validators: Vec<ObjectValidator<T>>,
}

impl<T> SchemaEntry<T> {
    /// Declared field names, bases first.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.member(name).is_some_and(|member| member.required())
    }

    pub(crate) fn member(&self, name: &str) -> Option<&Arc<dyn Member<T>>> {
        self.members
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, member)| member)
    }

    pub(crate) fn members(&self) -> impl Iterator<Item = (&str, &Arc<dyn Member<T>>)> {
        self.members.iter().map(|(name, member)| (name.as_str(), member))
    }

    pub(crate) fn validators(&self) -> &[ObjectValidator<T>] {
        &self.validators
    }
}

type Registry = RwLock<AHashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The field table of `T`, declared on first use and cached afterwards.
pub fn schema_of<T: Schema>() -> Arc<SchemaEntry<T>> {
    let registry = REGISTRY.get_or_init(Registry::default);
    let cached = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&TypeId::of::<T>())
        .cloned();
    if let Some(entry) = cached.and_then(|entry| entry.downcast::<SchemaEntry<T>>().ok()) {
        return entry;
    }

    // Declared outside the lock: `extend` looks up the base types recursively.
    let mut builder = SchemaBuilder::new();
    T::declare(&mut builder);
    let built = Arc::new(builder.build());
    crate::trace!(schema = std::any::type_name::<T>(), fields = built.len(), "declared schema");

    let stored = Arc::clone(
        registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::clone(&built) as Arc<dyn Any + Send + Sync>),
    );
    stored.downcast::<SchemaEntry<T>>().unwrap_or(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{IntField, StringField};

    #[derive(Default)]
    struct Base {
        name: String,
        size: i64,
    }

    impl Schema for Base {
        fn declare(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("name", StringField::new().required(), |b, v| b.name = v)
                .field("size", IntField::new(), |b, v| b.size = v);
        }
    }

    #[derive(Default)]
    struct Child {
        base: Base,
        extra: String,
    }

    impl AsRef<Base> for Child {
        fn as_ref(&self) -> &Base {
            &self.base
        }
    }

    impl AsMut<Base> for Child {
        fn as_mut(&mut self) -> &mut Base {
            &mut self.base
        }
    }

    impl Schema for Child {
        fn declare(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("extra", StringField::new(), |c, v| c.extra = v)
                .extend::<Base>()
                .field("size", IntField::<i64>::new().required(), |c, v| c.base.size = v * 2);
        }
    }

    #[test]
    fn inherited_fields_come_first_and_can_be_overridden() {
        let entry = schema_of::<Child>();
        assert_eq!(entry.field_names().collect::<Vec<_>>(), ["name", "size", "extra"]);
        assert!(entry.is_required("name"));
        assert!(entry.is_required("size"));
        assert!(!entry.contains("missing"));
    }

    #[test]
    fn entries_are_cached_per_type() {
        let first = schema_of::<Base>();
        let second = schema_of::<Base>();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
