//! Recursive node resolution.

use std::any::type_name;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::annotation::{FieldAnnotation, RelationKind, RelationMode};
use crate::error::{Result, SideloadError};
use crate::lookup::{as_id, as_object, find, get_list, get_present};
use crate::options::Options;
use crate::schema::{RelationSlot, Sideload};

/// Shared state of one resolution pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a> {
    document: &'a Map<String, Value>,
    options: &'a Options,
    depth: usize,
}

impl<'a> Context<'a> {
    pub(crate) fn root(document: &'a Map<String, Value>, options: &'a Options) -> Self {
        Context {
            document,
            options,
            depth: 0,
        }
    }

    fn descend(self) -> Result<Self> {
        let depth = self.depth + 1;
        if let Some(limit) = self.options.depth_limit() {
            if depth > limit {
                return Err(SideloadError::DepthLimitExceeded { limit });
            }
        }
        Ok(Context { depth, ..self })
    }
}

/// Decode `local` into `target`, then resolve each relation field of `T` in
/// declaration order. The first error stops the loop; fields resolved before
/// it stay applied.
pub(crate) fn resolve_node<T: Sideload>(
    ctx: Context<'_>,
    local: &Value,
    target: &mut T,
) -> Result<()> {
    let object = as_object(local, type_name::<T>())?;
    trace!(node = type_name::<T>(), depth = ctx.depth, "decoding node");
    *target = T::deserialize(local)?;

    for field in T::schema().fields() {
        field.resolve(ctx, object, target)?;
    }
    Ok(())
}

fn resolve_child<N: Sideload>(ctx: Context<'_>, local: &Value) -> Result<N> {
    let ctx = ctx.descend()?;
    let mut node = N::default();
    resolve_node(ctx, local, &mut node)?;
    Ok(node)
}

pub(crate) fn resolve_relation<S: RelationSlot>(
    ctx: Context<'_>,
    name: &str,
    annotation: &FieldAnnotation,
    local: &Map<String, Value>,
    slot: &mut S,
) -> Result<()> {
    let key = annotation.relation_key.as_str();
    match (annotation.kind, annotation.mode()) {
        (RelationKind::Attribute, _) => {}

        (RelationKind::HasOne, RelationMode::Embedded) => {
            let Some(value) = get_present(local, key) else {
                debug!(field = name, key, "embedded relation absent");
                return Ok(());
            };
            as_object(value, name)?;
            let node = resolve_child::<S::Node>(ctx, value)?;
            slot.fill(vec![node]);
        }

        (RelationKind::HasOne, RelationMode::Referenced { id_field }) => {
            let Some(id) = get_present(local, id_field) else {
                debug!(field = name, id_field, "relation id absent");
                return Ok(());
            };
            let id = as_id(id, id_field)?;
            match find(ctx.document, key, id) {
                Some(entity) => {
                    let node = resolve_child::<S::Node>(ctx, entity)?;
                    slot.fill(vec![node]);
                }
                None => debug!(field = name, collection = key, id, "relation id not found"),
            }
        }

        (RelationKind::HasMany, RelationMode::Embedded) => {
            let mut nodes = Vec::new();
            for item in get_list(local, key) {
                as_object(item, name)?;
                nodes.push(resolve_child::<S::Node>(ctx, item)?);
            }
            debug!(field = name, count = nodes.len(), "resolved embedded relations");
            slot.fill(nodes);
        }

        (RelationKind::HasMany, RelationMode::Referenced { id_field }) => {
            let mut nodes = Vec::new();
            for id in get_list(local, id_field) {
                let id = as_id(id, id_field)?;
                match find(ctx.document, key, id) {
                    Some(entity) => nodes.push(resolve_child::<S::Node>(ctx, entity)?),
                    None => debug!(field = name, collection = key, id, "relation id not found"),
                }
            }
            debug!(field = name, count = nodes.len(), "resolved referenced relations");
            slot.fill(nodes);
        }
    }
    Ok(())
}
