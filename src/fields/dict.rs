use std::collections::BTreeMap;
use std::rc::Rc;

use ahash::AHashSet;

use crate::context::LoadingContext;
use crate::error::Error;
use crate::loaded::Loaded;

use super::{Field, FieldOptions, accept_duplicate, field_builders, mapping_key};

/// Loads a mapping with scalar keys, each value through `I`.
///
/// Entries are visited in document order, but the output is a `BTreeMap`, so it is
/// sorted by key. Entries whose key is not a scalar or whose value fails are left out.
#[derive(Clone)]
pub struct DictField<I: Field> {
    item: I,
    options: FieldOptions<BTreeMap<String, I::Output>>,
}

impl<I: Field + Default> Default for DictField<I> {
    fn default() -> Self {
        Self::new(I::default())
    }
}

impl<I: Field> DictField<I> {
    pub fn new(item: I) -> Self {
        Self {
            item,
            options: FieldOptions::default(),
        }
    }

    field_builders!();
}

impl<I: Field> Field for DictField<I> {
    type Output = BTreeMap<String, I::Output>;

    fn load(&self, ctx: &mut LoadingContext<'_>) -> Result<Loaded<Self::Output>, Error> {
        if !ctx.expect_mapping()? {
            return Ok(Loaded::Failed);
        }
        let node = Rc::clone(ctx.current_node());
        let mut values = BTreeMap::new();
        let mut seen = AHashSet::new();
        for (key, value) in node.as_mapping().unwrap_or_default() {
            let Some(name) = mapping_key(ctx, key)? else {
                continue;
            };
            if !seen.insert(name.clone()) && !accept_duplicate(ctx, key, &name)? {
                continue;
            }
            if let Loaded::Success(value) = ctx.load(&self.item, value, None)? {
                values.insert(name, value);
            }
        }
        self.options.finish(ctx, Loaded::Success(values))
    }

    fn required(&self) -> bool {
        self.options.required
    }
}
