pub mod cond_cast;
pub mod fixup_cflow;
pub mod graph_pass;
pub mod validate;

pub use cond_cast::{insert_bool_cast, needs_bool_cast};
pub use fixup_cflow::{fixup_block, fixup_graph, FixupControlFlowPass, FixupStats};
pub use graph_pass::{GraphPass, GraphPassManager};
pub use validate::ValidateControlFlowPass;
