//! Text emission for `Graph`, used for pass dumps and debugging.
//!
//! Output format (deterministic, block order):
//!
//! ```text
//! // graph: counter
//!
//! graph counter(%0: tensor<i64, []>, %1: u8, %2: f32) {
//!   %4: bool = Cast(%1) { to=9 }
//!   %5: f32 = Loop(%0, %4, %2) {
//!     block1(%6: tensor<i64, []>, %10 cond: bool, %7: f32) {
//!       %9: bool = Cast(%8) { to=9 }
//!       return %9, %7
//!     }
//!   }
//!   return %5
//! }
//! ```

use std::fmt::Write;

use crate::error::CodegenError;
use crate::ir::block::BlockId;
use crate::ir::graph::Graph;
use crate::ir::value::ValueId;

pub fn emit_graph_text(graph: &Graph) -> Result<String, CodegenError> {
    let mut out = String::new();

    writeln!(out, "// graph: {}", graph.name)?;
    writeln!(out)?;
    let root = graph.root();
    writeln!(out, "graph {}({}) {{", graph.name, format_params(graph, graph.block(root).inputs()))?;
    emit_block_body(graph, root, 1, &mut out)?;
    writeln!(out, "}}")?;

    Ok(out)
}

fn emit_block_body(
    graph: &Graph,
    block: BlockId,
    depth: usize,
    out: &mut String,
) -> Result<(), CodegenError> {
    let pad = "  ".repeat(depth);
    for &id in graph.block(block).nodes() {
        let node = graph.node(id);
        let results: Vec<String> = node
            .outputs()
            .iter()
            .map(|&v| format!("{}: {}", v, graph.value_type(v)))
            .collect();
        let args: Vec<String> = node.inputs().iter().map(ValueId::to_string).collect();

        write!(out, "{}", pad)?;
        if !results.is_empty() {
            write!(out, "{} = ", results.join(", "))?;
        }
        write!(out, "{}({})", node.kind, args.join(", "))?;

        let attrs: Vec<String> = node.attrs().map(|(k, v)| format!("{}={}", k, v)).collect();
        if !attrs.is_empty() {
            write!(out, " {{ {} }}", attrs.join(", "))?;
        }

        if node.blocks().is_empty() {
            writeln!(out)?;
            continue;
        }
        writeln!(out, " {{")?;
        for &nested in node.blocks() {
            writeln!(
                out,
                "{}  {}({}) {{",
                pad,
                nested,
                format_params(graph, graph.block(nested).inputs())
            )?;
            emit_block_body(graph, nested, depth + 2, out)?;
            writeln!(out, "{}  }}", pad)?;
        }
        writeln!(out, "{}}}", pad)?;
    }

    let outputs: Vec<String> = graph
        .block_outputs(block)
        .iter()
        .map(ValueId::to_string)
        .collect();
    if outputs.is_empty() {
        writeln!(out, "{}return", pad)?;
    } else {
        writeln!(out, "{}return {}", pad, outputs.join(", "))?;
    }
    Ok(())
}

fn format_params(graph: &Graph, params: &[ValueId]) -> String {
    params
        .iter()
        .map(|&v| {
            let value = graph.value(v);
            match &value.name {
                Some(name) => format!("{} {}: {}", v, name, value.ty),
                None => format!("{}: {}", v, value.ty),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
