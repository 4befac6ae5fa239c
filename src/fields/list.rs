use std::any::{Any, type_name};
use std::rc::Rc;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::loaded::Loaded;

use super::{AnyField, Field, FieldOptions, field_builders};

/// Loads a sequence, each item through `I`.
///
/// Items that fail are left out; the list itself still loads.
#[derive(Clone)]
pub struct ListField<I: Field> {
    item: I,
    options: FieldOptions<Vec<I::Output>>,
}

impl<I: Field + Default> Default for ListField<I> {
    fn default() -> Self {
        Self::new(I::default())
    }
}

impl<I: Field> ListField<I> {
    pub fn new(item: I) -> Self {
        Self {
            item,
            options: FieldOptions::default(),
        }
    }

    field_builders!();
}

impl<I: Field> Field for ListField<I> {
    type Output = Vec<I::Output>;

    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<Self::Output>, Error> {
        if !ctx.expect_sequence()? {
            return Ok(Loaded::Failed);
        }
        let node = Rc::clone(ctx.current_node());
        let mut values = Vec::new();
        for item in node.as_sequence().unwrap_or_default() {
            if let Loaded::Success(value) = ctx.load(&self.item, item, None)? {
                values.push(value);
            }
        }
        self.options.finish(ctx, Loaded::Success(values))
    }

    fn required(&self) -> bool {
        self.options.required
    }

    fn item_field(&self) -> Option<&dyn AnyField> {
        Some(&self.item)
    }

    fn collect_items(
        &self,
        ctx: &mut LoadingContext<'_>,
        items: Vec<Box<dyn Any>>,
    ) -> Result<Loaded<Self::Output>, Error> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match item.downcast::<I::Output>() {
                Ok(value) => values.push(*value),
                Err(_) => {
                    return Err(Error::msg(format!(
                        "list item is not a {}",
                        type_name::<I::Output>()
                    ))
                    .with_location(ctx.current_node().location()));
                }
            }
        }
        self.options.finish(ctx, Loaded::Success(values))
    }
}
