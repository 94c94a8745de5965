pub mod block;
pub mod graph;
pub mod node;
pub mod types;
pub mod value;

pub use block::{Block, BlockId};
pub use graph::Graph;
pub use node::{AttrKey, AttrValue, Node, NodeId, NodeKind};
pub use types::{DType, Dim, IrType, Shape};
pub use value::{Use, Value, ValueDef, ValueId};
