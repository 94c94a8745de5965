//! Control-flow preparation for ONNX export.
//!
//! ONNX `If` and `Loop` are stricter than the graphs a tracing frontend
//! produces: conditions must be `bool` (comparisons usually yield `uint8`),
//! and loop bodies need a fully typed `(iteration_num, cond, carried...)`
//! signature. This crate rewrites a [`Graph`](ir::Graph) in place to close
//! that gap.
//!
//! Pipeline run by [`prepare_for_export`]:
//!
//! ```text
//! Graph → FixupControlFlowPass → ValidateControlFlowPass → ready for export
//! ```
//!
//! 1. `FixupControlFlowPass`: casts conditions to bool, normalizes loop bodies
//! 2. `ValidateControlFlowPass`: rejects graphs still violating the contract

pub mod codegen;
pub mod error;
pub mod ir;
pub mod pass;

pub use error::Error;

use crate::ir::Graph;
use crate::pass::{FixupControlFlowPass, GraphPassManager, ValidateControlFlowPass};

/// Runs the control-flow fixup followed by export-contract validation.
///
/// The pipeline aborts at the first error; the graph must then be discarded.
pub fn prepare_for_export(graph: &mut Graph) -> Result<(), Error> {
    let mut pm = GraphPassManager::new();
    pm.add_pass(FixupControlFlowPass::default());
    pm.add_pass(ValidateControlFlowPass);
    pm.run(graph).map_err(|(_, e)| Error::Pass(e))
}
