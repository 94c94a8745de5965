//! `GraphPass` trait and `GraphPassManager` for passes that rewrite a `Graph` in place.

use tracing::{debug, warn};

use crate::codegen::graph_printer::emit_graph_text;
use crate::error::PassError;
use crate::ir::graph::Graph;

/// A compiler pass that operates on a `Graph` in place.
///
/// Passes must be deterministic: the same input graph always yields the same
/// rewritten graph.
pub trait GraphPass {
    /// Human-readable name, used in error messages and `dump_after`.
    fn name(&self) -> &'static str;

    /// Run the pass on the graph.
    ///
    /// On error the graph state is unspecified and the pipeline aborts.
    fn run(&mut self, graph: &mut Graph) -> Result<(), PassError>;
}

/// Manages and executes an ordered sequence of graph passes.
pub struct GraphPassManager {
    passes: Vec<Box<dyn GraphPass>>,
    /// If set, dumps the graph text at `debug` level after the pass with this name.
    dump_after: Option<String>,
}

impl GraphPassManager {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            dump_after: None,
        }
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: impl GraphPass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Configures the manager to dump the graph after the named pass completes.
    pub fn set_dump_after(&mut self, pass_name: impl Into<String>) {
        self.dump_after = Some(pass_name.into());
    }

    /// Runs all passes in registration order on `graph`.
    ///
    /// Returns `Err((pass_name, error))` at the first failure.
    pub fn run(&mut self, graph: &mut Graph) -> Result<(), (String, PassError)> {
        for pass in &mut self.passes {
            debug!(pass = pass.name(), graph = %graph.name, "running graph pass");
            pass.run(graph).map_err(|e| (pass.name().to_owned(), e))?;
            if self.dump_after.as_deref() == Some(pass.name()) {
                match emit_graph_text(graph) {
                    Ok(text) => debug!(pass = pass.name(), "graph after pass:\n{}", text),
                    Err(e) => warn!(pass = pass.name(), error = %e, "graph dump failed"),
                }
            }
        }
        Ok(())
    }

    /// Returns the names of all registered passes in pipeline order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for GraphPassManager {
    fn default() -> Self {
        Self::new()
    }
}
