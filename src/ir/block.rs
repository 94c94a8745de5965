use crate::ir::node::NodeId;
use crate::ir::value::ValueId;

/// An opaque index identifying a block within a `Graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block{}", self.0)
    }
}

/// One control-flow scope: the graph body, or a branch/body of an `If`/`Loop`.
///
/// Invariants:
/// 1. `ret` is a `Return` node owned by this block but not listed in `nodes`;
///    its inputs are the block outputs.
/// 2. `nodes` is in execution order.
/// 3. `owner` is `None` only for the graph's root block.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub(crate) inputs: Vec<ValueId>,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) ret: NodeId,
    pub(crate) owner: Option<NodeId>,
}

impl Block {
    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn return_node(&self) -> NodeId {
        self.ret
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }
}
