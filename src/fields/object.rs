use std::marker::PhantomData;
use std::rc::Rc;

use ahash::AHashSet;

use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::loaded::Loaded;
use crate::schema::{Schema, schema_of};

use super::{Field, FieldOptions, accept_duplicate, field_builders, mapping_key};

/// Loads a mapping into a [`Schema`] type.
///
/// Starting from `T::default()`, each mapping entry is loaded with the declared field of
/// the same name. Undeclared keys are reported and skipped, and a field that fails
/// keeps its default. Once all entries are processed, missing required fields are
/// reported and the object validators run; any of these failing fails the object.
pub struct ObjectField<T> {
    options: FieldOptions<T>,
    schema: PhantomData<fn() -> T>,
}

impl<T> Default for ObjectField<T> {
    fn default() -> Self {
        Self {
            options: FieldOptions::default(),
            schema: PhantomData,
        }
    }
}

impl<T> Clone for ObjectField<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            schema: PhantomData,
        }
    }
}

impl<T: Schema> ObjectField<T> {
    pub fn new() -> Self {
        Self::default()
    }

    field_builders!();
}

impl<T: Schema> Field for ObjectField<T> {
    type Output = T;

    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<T>, Error> {
        if !ctx.expect_mapping()? {
            return Ok(Loaded::Failed);
        }
        let schema = schema_of::<T>();
        let node = Rc::clone(ctx.current_node());
        let mut object = T::default();
        let mut seen = AHashSet::new();

        for (key, value) in node.as_mapping().unwrap_or_default() {
            let Some(name) = mapping_key(ctx, key)? else {
                continue;
            };
            let Some(member) = schema.member(&name) else {
                ctx.with_node(key, None, |ctx| {
                    ctx.error(
                        ErrorCode::FieldNotDeclared,
                        format!("field `{name}` is not declared"),
                    )
                })?;
                continue;
            };
            if !seen.insert(name.clone()) && !accept_duplicate(ctx, key, &name)? {
                continue;
            }
            member.load_into(ctx, value, &mut object)?;
        }

        let mut valid = true;
        for (name, member) in schema.members() {
            if member.required() && !seen.contains(name) {
                ctx.error(
                    ErrorCode::MissingRequiredField,
                    format!("missing required field `{name}`"),
                )?;
                valid = false;
            }
        }
        for validator in schema.validators() {
            if !validator(ctx, &object)? {
                valid = false;
            }
        }
        if !valid {
            return Ok(Loaded::Failed);
        }
        self.options.finish(ctx, Loaded::Success(object))
    }

    fn required(&self) -> bool {
        self.options.required
    }
}
