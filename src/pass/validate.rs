//! Export-contract validation.
//!
//! Checks that a graph satisfies what ONNX requires of control flow, i.e. the
//! post-conditions of `FixupControlFlowPass`. This pass never rewrites
//! anything; it rejects the first violation it finds.

use crate::error::PassError;
use crate::ir::block::BlockId;
use crate::ir::graph::Graph;
use crate::ir::node::{NodeId, NodeKind};
use crate::pass::graph_pass::GraphPass;

/// Validates, in every block:
/// 1. Every node carries the attributes its kind requires (`Cast.to`).
/// 2. Every `If` condition is declared `bool`.
/// 3. Every `Loop` has one body whose inputs are `(integer, bool, carried...)`
///    with carried input `k` typed like loop input `k`.
/// 4. Every `Loop` condition and every body's first output are declared `bool`.
pub struct ValidateControlFlowPass;

impl GraphPass for ValidateControlFlowPass {
    fn name(&self) -> &'static str {
        "validate-control-flow"
    }

    fn run(&mut self, graph: &mut Graph) -> Result<(), PassError> {
        validate_block(graph, graph.root()).map_err(|detail| PassError::ContractViolation {
            graph: graph.name.clone(),
            detail,
        })
    }
}

fn validate_block(graph: &Graph, block: BlockId) -> Result<(), String> {
    for &node in graph.block(block).nodes() {
        let n = graph.node(node);
        for key in n.kind.required_attrs() {
            if n.attr(*key).is_none() {
                return Err(format!("{} node {} is missing attribute '{}'", n.kind, node, key));
            }
        }
        match n.kind {
            NodeKind::If => validate_if(graph, node)?,
            NodeKind::Loop => validate_loop(graph, node)?,
            _ => {}
        }
        for &nested in n.blocks() {
            validate_block(graph, nested)?;
        }
    }
    Ok(())
}

fn validate_if(graph: &Graph, node: NodeId) -> Result<(), String> {
    let cond = *graph
        .node(node)
        .inputs()
        .first()
        .ok_or_else(|| format!("If node {} has no condition", node))?;
    if !graph.value_type(cond).is_bool() {
        return Err(format!(
            "If node {} condition {} has type {}, expected bool",
            node,
            cond,
            graph.value_type(cond)
        ));
    }
    Ok(())
}

fn validate_loop(graph: &Graph, node: NodeId) -> Result<(), String> {
    let n = graph.node(node);
    let body = match n.blocks() {
        [body] => *body,
        blocks => return Err(format!("Loop node {} has {} bodies", node, blocks.len())),
    };
    let inputs = n.inputs();
    let body_inputs = graph.block(body).inputs();
    if inputs.len() < 2 || body_inputs.len() != inputs.len() {
        return Err(format!(
            "Loop node {} passes {} inputs to a body taking {}",
            node,
            inputs.len(),
            body_inputs.len()
        ));
    }
    if !graph.value_type(inputs[1]).is_bool() {
        return Err(format!(
            "Loop node {} condition has type {}, expected bool",
            node,
            graph.value_type(inputs[1])
        ));
    }
    if !graph.value_type(body_inputs[0]).is_integer() {
        return Err(format!(
            "Loop node {} iteration counter has type {}, expected an integer",
            node,
            graph.value_type(body_inputs[0])
        ));
    }
    if !graph.value_type(body_inputs[1]).is_bool() {
        return Err(format!(
            "Loop node {} body condition input has type {}, expected bool",
            node,
            graph.value_type(body_inputs[1])
        ));
    }
    for k in 2..inputs.len() {
        let outer = graph.value_type(inputs[k]);
        let inner = graph.value_type(body_inputs[k]);
        if outer != inner {
            return Err(format!(
                "Loop node {} carried input {} is {} outside but {} in the body",
                node, k, outer, inner
            ));
        }
    }
    match graph.block_outputs(body).first() {
        Some(&next) if graph.value_type(next).is_bool() => Ok(()),
        Some(&next) => Err(format!(
            "Loop node {} body condition output has type {}, expected bool",
            node,
            graph.value_type(next)
        )),
        None => Err(format!("Loop node {} body returns nothing", node)),
    }
}
