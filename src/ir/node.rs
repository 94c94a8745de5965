use std::collections::BTreeMap;
use std::fmt;

use crate::ir::block::BlockId;
use crate::ir::types::DType;
use crate::ir::value::ValueId;

/// Opaque node identifier (index into the graph's node arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Operation tag of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// ONNX `Cast`; target element type in the `to` attribute.
    Cast,
    /// ONNX `If`: input 0 is the condition, blocks are the branches.
    If,
    /// ONNX `Loop`: inputs are `[trip_count, cond, carried...]`, one body block.
    Loop,
    /// Block terminator; its inputs are the block outputs.
    Return,
    /// Any other operator, by ONNX `op_type`.
    Op(String),
}

impl NodeKind {
    /// Only control-flow nodes own nested blocks.
    pub fn can_own_blocks(&self) -> bool {
        matches!(self, NodeKind::If | NodeKind::Loop)
    }

    /// Whether `key` is a legal attribute for this kind.
    pub fn accepts_attr(&self, key: AttrKey) -> bool {
        match self {
            NodeKind::Cast => key == AttrKey::To,
            NodeKind::Op(_) => key != AttrKey::To,
            NodeKind::If | NodeKind::Loop | NodeKind::Return => false,
        }
    }

    /// Attributes a node of this kind cannot be exported without.
    pub fn required_attrs(&self) -> &'static [AttrKey] {
        match self {
            NodeKind::Cast => &[AttrKey::To],
            _ => &[],
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Cast => f.write_str("Cast"),
            NodeKind::If => f.write_str("If"),
            NodeKind::Loop => f.write_str("Loop"),
            NodeKind::Return => f.write_str("return"),
            NodeKind::Op(name) => f.write_str(name),
        }
    }
}

/// Attribute keys, a closed set shared by every node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttrKey {
    /// `Cast.to`: ONNX element-type code.
    To,
    Axis,
    Value,
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttrKey::To => "to",
            AttrKey::Axis => "axis",
            AttrKey::Value => "value",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Ints(Vec<i64>),
    Float(f64),
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(n) => write!(f, "{}", n),
            AttrValue::Ints(ns) => write!(f, "{:?}", ns),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// A single operation.
///
/// Invariants:
/// - `owner` is `None` only between `Graph::create` and insertion into a block.
/// - `blocks` is empty unless `kind.can_own_blocks()`.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub(crate) inputs: Vec<ValueId>,
    pub(crate) outputs: Vec<ValueId>,
    pub(crate) blocks: Vec<BlockId>,
    pub(crate) attrs: BTreeMap<AttrKey, AttrValue>,
    pub(crate) owner: Option<BlockId>,
}

impl Node {
    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn attr(&self, key: AttrKey) -> Option<&AttrValue> {
        self.attrs.get(&key)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&AttrKey, &AttrValue)> {
        self.attrs.iter()
    }

    pub fn owner(&self) -> Option<BlockId> {
        self.owner
    }

    /// Decoded `to` attribute of a `Cast` node.
    pub fn cast_target(&self) -> Option<DType> {
        if self.kind != NodeKind::Cast {
            return None;
        }
        match self.attr(AttrKey::To)? {
            AttrValue::Int(code) => DType::from_onnx_elem(*code),
            _ => None,
        }
    }
}
