//! Loop signature normalization: outer and inner condition casts, the
//! inserted `cond` body input, counter typing and carried-value typing.

use onnx_cflow::error::PassError;
use onnx_cflow::ir::{BlockId, DType, Graph, IrType, NodeId, NodeKind, Shape, ValueDef, ValueId};
use onnx_cflow::pass::fixup_graph;

fn i8_scalar_tensor() -> IrType {
    IrType::Tensor {
        dtype: DType::I8,
        shape: Shape::scalar(),
    }
}

fn u8_scalar_tensor() -> IrType {
    IrType::Tensor {
        dtype: DType::U8,
        shape: Shape::scalar(),
    }
}

struct LoopGraph {
    graph: Graph,
    initial_cond: ValueId,
    carried_x: ValueId,
    loop_node: NodeId,
    body: BlockId,
    iter_i: ValueId,
    body_x: ValueId,
    less: NodeId,
}

/// ```text
/// graph counter(trip_count: tensor<i64, []>, initial_cond: tensor<i8, []>, carried_x: f32) {
///   out = Loop(trip_count, initial_cond, carried_x) {
///     body(iter_i: ?, body_x: ?) {
///       next: tensor<u8, []> = Less(body_x, body_x)
///       return next, body_x
///     }
///   }
///   return out
/// }
/// ```
fn counter_loop(next_ty: IrType) -> LoopGraph {
    let mut graph = Graph::new("counter");
    let root = graph.root();
    let trip = graph.add_block_input(root, Some("trip_count"), IrType::loop_counter());
    let initial_cond = graph.add_block_input(root, Some("initial_cond"), i8_scalar_tensor());
    let carried_x = graph.add_block_input(root, Some("carried_x"), IrType::Scalar(DType::F32));

    let loop_node = graph
        .add_op(
            root,
            NodeKind::Loop,
            &[trip, initial_cond, carried_x],
            vec![IrType::Scalar(DType::F32)],
        )
        .unwrap();
    let body = graph.add_block(loop_node).unwrap();
    let iter_i = graph.add_block_input(body, Some("iter_i"), IrType::Infer);
    let body_x = graph.add_block_input(body, Some("body_x"), IrType::Infer);
    let less = graph
        .add_op(body, NodeKind::Op("Less".into()), &[body_x, body_x], vec![next_ty])
        .unwrap();
    let next = graph.node(less).outputs()[0];
    graph.register_output(body, next);
    graph.register_output(body, body_x);

    let out = graph.node(loop_node).outputs()[0];
    graph.register_output(root, out);

    LoopGraph {
        graph,
        initial_cond,
        carried_x,
        loop_node,
        body,
        iter_i,
        body_x,
        less,
    }
}

// ---------------------------------------------------------------------------
// Worked example
// ---------------------------------------------------------------------------

#[test]
fn test_counter_loop_outer_cast() {
    let mut g = counter_loop(u8_scalar_tensor());
    fixup_graph(&mut g.graph).unwrap();
    let graph = &g.graph;
    let root = graph.root();

    let nodes = graph.block(root).nodes();
    assert_eq!(nodes.len(), 2, "one cast in front of the loop");
    let cast = nodes[0];
    assert_eq!(nodes[1], g.loop_node);
    assert_eq!(graph.node(cast).cast_target(), Some(DType::Bool));
    assert_eq!(graph.node(cast).inputs(), &[g.initial_cond]);

    let cond = graph.node(g.loop_node).inputs()[1];
    assert_eq!(cond, graph.node(cast).outputs()[0]);
    assert!(graph.value_type(cond).is_bool());
    assert_eq!(graph.node(g.loop_node).inputs()[2], g.carried_x);
}

#[test]
fn test_counter_loop_body_signature() {
    let mut g = counter_loop(u8_scalar_tensor());
    fixup_graph(&mut g.graph).unwrap();
    let graph = &g.graph;

    let inputs = graph.block(g.body).inputs();
    assert_eq!(inputs.len(), 3, "body takes as many inputs as the loop");
    assert_eq!(inputs[0], g.iter_i);
    assert_eq!(inputs[2], g.body_x);

    assert_eq!(graph.value_type(g.iter_i), &IrType::loop_counter());
    assert!(graph.value_type(g.iter_i).is_integer());

    let cond_in = graph.value(inputs[1]);
    assert_eq!(cond_in.name.as_deref(), Some("cond"));
    assert_eq!(cond_in.ty, IrType::Scalar(DType::Bool));
    assert_eq!(cond_in.def(), ValueDef::BlockInput { block: g.body, index: 1 });

    assert_eq!(graph.value_type(g.body_x), &IrType::Scalar(DType::F32));
    assert_eq!(
        graph.value(g.body_x).def(),
        ValueDef::BlockInput { block: g.body, index: 2 }
    );
}

#[test]
fn test_counter_loop_inner_cast_before_return() {
    let mut g = counter_loop(u8_scalar_tensor());
    fixup_graph(&mut g.graph).unwrap();
    let graph = &g.graph;

    let nodes = graph.block(g.body).nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0], g.less);
    let cast = nodes[1];
    assert_eq!(graph.node(cast).kind, NodeKind::Cast);

    let next = graph.node(g.less).outputs()[0];
    assert_eq!(graph.node(cast).inputs(), &[next]);
    let outputs = graph.block_outputs(g.body);
    assert_eq!(outputs[0], graph.node(cast).outputs()[0]);
    assert_eq!(outputs[1], g.body_x, "carried output untouched");
    assert_eq!(
        graph.value_type(outputs[0]),
        &IrType::Tensor {
            dtype: DType::Bool,
            shape: Shape::scalar()
        }
    );
}

#[test]
fn test_counter_loop_stats() {
    let mut g = counter_loop(u8_scalar_tensor());
    let stats = fixup_graph(&mut g.graph).unwrap();
    assert_eq!(stats.loops_fixed, 1);
    assert_eq!(stats.ifs_fixed, 0);
    assert_eq!(stats.casts_inserted, 2);
    assert_eq!(stats.blocks_visited, 2);
    // Root: the loop. Body: `Less` plus the cast placed before its return.
    assert_eq!(stats.nodes_visited, 3);
}

#[test]
fn test_original_conditions_still_exist() {
    let mut g = counter_loop(u8_scalar_tensor());
    fixup_graph(&mut g.graph).unwrap();
    let graph = &g.graph;

    assert_eq!(graph.value_type(g.initial_cond), &i8_scalar_tensor());
    let uses = graph.uses(g.initial_cond);
    assert_eq!(uses.len(), 1);
    assert_eq!(graph.node(uses[0].node).kind, NodeKind::Cast);

    let next = graph.node(g.less).outputs()[0];
    let uses = graph.uses(next);
    assert_eq!(uses.len(), 1);
    assert_eq!(graph.node(uses[0].node).kind, NodeKind::Cast);
}

// ---------------------------------------------------------------------------
// Variations
// ---------------------------------------------------------------------------

#[test]
fn test_bool_recomputed_condition_needs_no_inner_cast() {
    let mut g = counter_loop(IrType::Scalar(DType::Bool));
    let stats = fixup_graph(&mut g.graph).unwrap();
    assert_eq!(stats.casts_inserted, 1, "only the outer condition is cast");
    assert_eq!(g.graph.block(g.body).nodes(), &[g.less]);
    let next = g.graph.node(g.less).outputs()[0];
    assert_eq!(g.graph.block_outputs(g.body)[0], next);
}

#[test]
fn test_bool_initial_condition_needs_no_outer_cast() {
    let mut g = counter_loop(u8_scalar_tensor());
    g.graph.set_type(g.initial_cond, IrType::Scalar(DType::Bool));
    fixup_graph(&mut g.graph).unwrap();
    let root = g.graph.root();
    assert_eq!(g.graph.block(root).nodes(), &[g.loop_node]);
    assert_eq!(g.graph.node(g.loop_node).inputs()[1], g.initial_cond);
}

#[test]
fn test_counter_type_is_overwritten() {
    let mut g = counter_loop(u8_scalar_tensor());
    g.graph.set_type(g.iter_i, IrType::Scalar(DType::F32));
    fixup_graph(&mut g.graph).unwrap();
    assert_eq!(g.graph.value_type(g.iter_i), &IrType::loop_counter());
}

#[test]
fn test_loop_without_carried_values() {
    let mut graph = Graph::new("spin");
    let root = graph.root();
    let trip = graph.add_block_input(root, Some("n"), IrType::loop_counter());
    let cond = graph.add_block_input(root, Some("c"), IrType::Infer);
    let lp = graph.add_op(root, NodeKind::Loop, &[trip, cond], vec![]).unwrap();
    let body = graph.add_block(lp).unwrap();
    let i = graph.add_block_input(body, Some("i"), IrType::Infer);
    graph.register_output(body, cond);

    let stats = fixup_graph(&mut graph).unwrap();

    assert_eq!(stats.casts_inserted, 2);
    assert_eq!(graph.block(body).inputs().len(), 2);
    assert_eq!(graph.block(body).inputs()[0], i);
    assert!(graph.value_type(graph.block(body).inputs()[1]).is_bool());
    assert!(graph.value_type(graph.block_outputs(body)[0]).is_bool());
}

// ---------------------------------------------------------------------------
// Malformed loops
// ---------------------------------------------------------------------------

#[test]
fn test_loop_with_two_bodies_is_fatal() {
    let mut g = counter_loop(u8_scalar_tensor());
    g.graph.add_block(g.loop_node).unwrap();
    let err = fixup_graph(&mut g.graph).unwrap_err();
    assert!(
        matches!(err, PassError::MalformedLoop { node, ref detail } if node == g.loop_node && detail.contains("found 2")),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_loop_without_body_is_fatal() {
    let mut graph = Graph::new("bodiless");
    let root = graph.root();
    let trip = graph.add_block_input(root, None, IrType::loop_counter());
    let cond = graph.add_block_input(root, None, IrType::Scalar(DType::Bool));
    graph.add_op(root, NodeKind::Loop, &[trip, cond], vec![]).unwrap();
    let err = fixup_graph(&mut graph).unwrap_err();
    assert!(matches!(err, PassError::MalformedLoop { .. }));
}

#[test]
fn test_malformed_loop_is_rejected_before_any_rewrite() {
    let mut g = counter_loop(u8_scalar_tensor());
    // Body takes a carried value the loop never passes.
    g.graph.add_block_input(g.body, Some("extra"), IrType::Infer);
    let err = fixup_graph(&mut g.graph).unwrap_err();
    assert!(matches!(err, PassError::MalformedLoop { .. }));

    let root = g.graph.root();
    assert_eq!(g.graph.block(root).nodes(), &[g.loop_node], "no cast inserted");
    assert_eq!(g.graph.block(g.body).inputs().len(), 3);
}

#[test]
fn test_loop_body_without_outputs_is_fatal() {
    let mut graph = Graph::new("silent");
    let root = graph.root();
    let trip = graph.add_block_input(root, None, IrType::loop_counter());
    let cond = graph.add_block_input(root, None, IrType::Scalar(DType::Bool));
    let lp = graph.add_op(root, NodeKind::Loop, &[trip, cond], vec![]).unwrap();
    let body = graph.add_block(lp).unwrap();
    graph.add_block_input(body, Some("i"), IrType::Infer);
    let err = fixup_graph(&mut graph).unwrap_err();
    assert!(err.to_string().contains("continuation condition"), "{}", err);
}
