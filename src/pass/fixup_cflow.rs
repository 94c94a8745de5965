//! Control-flow fixup for ONNX export.
//!
//! ONNX is stricter than the source graph about `If` and `Loop`:
//! conditions must be `bool`, and a loop body must take
//! `(iteration_num: i64, cond: bool, carried...)` with every carried input
//! typed. `fixup_graph` walks every block depth-first and rewrites each
//! control-flow node to meet that contract. Each node is fixed before its
//! own nested blocks are visited.

use tracing::{debug, trace};

use crate::error::PassError;
use crate::ir::block::BlockId;
use crate::ir::graph::Graph;
use crate::ir::node::{NodeId, NodeKind};
use crate::ir::types::{DType, IrType};
use crate::pass::cond_cast::{insert_bool_cast, needs_bool_cast};
use crate::pass::graph_pass::GraphPass;

/// Counters collected during one run of the fixup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixupStats {
    pub blocks_visited: usize,
    pub nodes_visited: usize,
    pub ifs_fixed: usize,
    pub loops_fixed: usize,
    pub casts_inserted: usize,
}

/// Fixes every `If` and `Loop` in the graph, starting at the root block.
pub fn fixup_graph(graph: &mut Graph) -> Result<FixupStats, PassError> {
    let mut stats = FixupStats::default();
    let root = graph.root();
    fixup_block(graph, root, &mut stats)?;
    debug!(graph = %graph.name, ?stats, "control-flow fixup finished");
    Ok(stats)
}

/// Fixes every `If` and `Loop` in `block` and, recursively, in all blocks nested below it.
///
/// The node list is snapshotted on entry: casts inserted in front of the
/// current node are not visited again.
pub fn fixup_block(
    graph: &mut Graph,
    block: BlockId,
    stats: &mut FixupStats,
) -> Result<(), PassError> {
    stats.blocks_visited += 1;
    trace!(%block, nodes = graph.block(block).nodes().len(), "visiting block");

    let nodes = graph.block(block).nodes().to_vec();
    for node in nodes {
        stats.nodes_visited += 1;
        let kind = graph.node(node).kind.clone();
        match kind {
            NodeKind::Loop => fixup_loop(graph, node, stats)?,
            NodeKind::If => fixup_if(graph, node, stats)?,
            _ => {}
        }
        for nested in graph.node(node).blocks().to_vec() {
            fixup_block(graph, nested, stats)?;
        }
    }
    Ok(())
}

fn fixup_if(graph: &mut Graph, if_node: NodeId, stats: &mut FixupStats) -> Result<(), PassError> {
    let cond = *graph
        .node(if_node)
        .inputs()
        .first()
        .ok_or(PassError::MalformedIf { node: if_node })?;
    if needs_bool_cast(graph, cond) {
        insert_bool_cast(graph, cond, if_node)?;
        stats.casts_inserted += 1;
    }
    stats.ifs_fixed += 1;
    Ok(())
}

fn fixup_loop(
    graph: &mut Graph,
    loop_node: NodeId,
    stats: &mut FixupStats,
) -> Result<(), PassError> {
    let body = check_loop_shape(graph, loop_node)?;

    // Initial condition, cast outside the loop.
    let cond = graph.node(loop_node).inputs()[1];
    if needs_bool_cast(graph, cond) {
        insert_bool_cast(graph, cond, loop_node)?;
        stats.casts_inserted += 1;
    }

    // Body signature: (iteration_num, cond, carried...).
    graph.insert_block_input(body, 1, Some("cond"), IrType::Scalar(DType::Bool))?;
    let counter = graph.block(body).inputs()[0];
    graph.set_type(counter, IrType::loop_counter());

    let body_inputs = graph.block(body).inputs().to_vec();
    for (k, &input) in body_inputs.iter().enumerate().skip(2) {
        let outer = graph.node(loop_node).inputs()[k];
        let ty = graph.value_type(outer).clone();
        graph.set_type(input, ty);
    }

    // Recomputed condition, cast inside the body before its return.
    let next_cond = graph.block_outputs(body)[0];
    if needs_bool_cast(graph, next_cond) {
        let ret = graph.block(body).return_node();
        insert_bool_cast(graph, next_cond, ret)?;
        stats.casts_inserted += 1;
    }

    stats.loops_fixed += 1;
    debug!(
        node = %loop_node,
        %body,
        carried = body_inputs.len() - 2,
        "normalized Loop signature"
    );
    Ok(())
}

/// Checks the structural preconditions of a `Loop` before anything is rewritten
/// and returns its body block.
fn check_loop_shape(graph: &Graph, loop_node: NodeId) -> Result<BlockId, PassError> {
    let malformed = |detail: String| PassError::MalformedLoop {
        node: loop_node,
        detail,
    };
    let node = graph.node(loop_node);

    let body = match node.blocks() {
        [body] => *body,
        blocks => {
            return Err(malformed(format!(
                "expected exactly one body block, found {}",
                blocks.len()
            )))
        }
    };
    if node.inputs().len() < 2 {
        return Err(malformed(format!(
            "expected at least (trip_count, cond) inputs, found {}",
            node.inputs().len()
        )));
    }
    let body_inputs = graph.block(body).inputs().len();
    if body_inputs == 0 {
        return Err(malformed("body has no iteration counter input".to_owned()));
    }
    if body_inputs + 1 != node.inputs().len() {
        return Err(malformed(format!(
            "body takes {} inputs but the loop passes {} carried values",
            body_inputs - 1,
            node.inputs().len() - 2
        )));
    }
    if graph.block_outputs(body).is_empty() {
        return Err(malformed("body returns no continuation condition".to_owned()));
    }
    Ok(body)
}

/// Graph pass wrapper around [`fixup_graph`]. Keeps the counters of the last run.
#[derive(Debug, Default)]
pub struct FixupControlFlowPass {
    pub stats: FixupStats,
}

impl GraphPass for FixupControlFlowPass {
    fn name(&self) -> &'static str {
        "fixup-control-flow"
    }

    fn run(&mut self, graph: &mut Graph) -> Result<(), PassError> {
        self.stats = fixup_graph(graph)?;
        Ok(())
    }
}
