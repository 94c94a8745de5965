use crate::ir::block::BlockId;
use crate::ir::node::NodeId;
use crate::ir::types::IrType;

/// An opaque, index-based reference to a value within a `Graph`.
///
/// Invariant: `ValueId(n)` is only valid within the `Graph` that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub u32);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// The definition site of a value. Every value has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    /// Output `index` of `node`.
    NodeOutput { node: NodeId, index: usize },
    /// Input `index` of `block`, defined at block entry.
    BlockInput { block: BlockId, index: usize },
}

/// A consumer edge: `node` reads the value through input slot `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Use {
    pub node: NodeId,
    pub index: usize,
}

/// A typed data-flow edge.
#[derive(Debug, Clone)]
pub struct Value {
    pub id: ValueId,
    pub ty: IrType,
    pub name: Option<String>,
    pub(crate) def: ValueDef,
    pub(crate) uses: Vec<Use>,
}

impl Value {
    pub fn def(&self) -> ValueDef {
        self.def
    }

    pub fn uses(&self) -> &[Use] {
        &self.uses
    }
}
