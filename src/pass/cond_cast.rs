//! Boolean coercion of condition values.
//!
//! PyTorch comparison ops produce `uint8` tensors, but ONNX `If` and `Loop`
//! only accept `bool` conditions. These helpers splice a `Cast(to=BOOL)`
//! between a condition value and the node that consumes it:
//!
//! ```text
//! before:  %c -> consumer
//! after:   %c -> Cast(to=9) -> consumer
//! ```

use tracing::debug;

use crate::error::{IrError, PassError};
use crate::ir::graph::Graph;
use crate::ir::node::{AttrKey, AttrValue, NodeId, NodeKind};
use crate::ir::types::DType;
use crate::ir::value::ValueId;

/// Returns `true` unless `value` is declared boolean.
///
/// Only the declared type is consulted. Unknown types, non-bool scalars and
/// tensors with a non-bool element type all need a cast.
pub fn needs_bool_cast(graph: &Graph, value: ValueId) -> bool {
    !graph.value_type(value).is_bool()
}

/// Inserts `Cast(to=BOOL)` on `value` immediately before `consumer` and
/// rewires every input of `consumer` that read `value` to the cast output.
///
/// Other consumers of `value` are left alone. Callers check
/// [`needs_bool_cast`] first; this function casts unconditionally.
pub fn insert_bool_cast(
    graph: &mut Graph,
    value: ValueId,
    consumer: NodeId,
) -> Result<NodeId, PassError> {
    if !graph.node(consumer).inputs().contains(&value) {
        return Err(IrError::NotAnInput { node: consumer, value }.into());
    }

    // Placed before it reads `value`, so a failed placement leaves no stray use.
    let cast = graph.create(NodeKind::Cast, &[], 1);
    graph.insert_before(cast, consumer)?;
    graph.add_input(cast, value);
    graph.set_attr(cast, AttrKey::To, AttrValue::Int(DType::Bool.onnx_elem()))?;
    let out = graph.node(cast).outputs()[0];
    let bool_ty = graph.value_type(value).with_dtype(DType::Bool);
    graph.set_type(out, bool_ty);

    graph.replace_input_with(consumer, value, out)?;

    debug!(
        cast = %cast,
        %value,
        %consumer,
        from = %graph.value_type(value),
        "inserted bool cast for condition"
    );
    Ok(cast)
}
