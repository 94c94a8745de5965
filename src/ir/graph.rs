//! Arena-backed graph IR for ONNX-bound models.
//!
//! `Graph` owns every node, value and block of a compilation unit. Cross
//! references are plain indices (`NodeId`, `ValueId`, `BlockId`), so surgery
//! such as "insert before" is a positional insert into the owning block's
//! node list rather than pointer relinking.

use crate::error::IrError;
use crate::ir::block::{Block, BlockId};
use crate::ir::node::{AttrKey, AttrValue, Node, NodeId, NodeKind};
use crate::ir::types::IrType;
use crate::ir::value::{Use, Value, ValueDef, ValueId};

/// Invariants:
/// - `NodeId(n)` indexes `nodes[n]`, `ValueId(n)` indexes `values[n]`,
///   `BlockId(n)` indexes `blocks[n]`.
/// - Nothing is ever removed from an arena; ids stay valid for the graph's lifetime.
/// - `values[v].uses` lists exactly the `(node, slot)` pairs whose input is `v`.
#[derive(Debug, Clone)]
pub struct Graph {
    pub name: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) values: Vec<Value>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) root: BlockId,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        let mut graph = Self {
            name: name.into(),
            nodes: Vec::new(),
            values: Vec::new(),
            blocks: Vec::new(),
            root: BlockId(0),
        };
        graph.root = graph.new_block(None);
        graph
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0 as usize]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn value_type(&self, id: ValueId) -> &IrType {
        &self.value(id).ty
    }

    pub fn set_type(&mut self, id: ValueId, ty: IrType) {
        self.values[id.0 as usize].ty = ty;
    }

    pub fn uses(&self, id: ValueId) -> &[Use] {
        &self.value(id).uses
    }

    pub fn owning_block(&self, node: NodeId) -> Option<BlockId> {
        self.node(node).owner
    }

    /// The block outputs, i.e. the inputs of the block's `Return` node.
    pub fn block_outputs(&self, block: BlockId) -> &[ValueId] {
        self.node(self.block(block).ret).inputs()
    }

    /// Number of nodes in `block` and all blocks nested below it.
    /// `Return` terminators are not counted.
    pub fn count_nodes(&self, block: BlockId) -> usize {
        self.block(block)
            .nodes
            .iter()
            .map(|&n| {
                1 + self
                    .node(n)
                    .blocks
                    .iter()
                    .map(|&b| self.count_nodes(b))
                    .sum::<usize>()
            })
            .sum()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Creates a detached node with `num_outputs` untyped outputs.
    ///
    /// The node belongs to no block until `append` or `insert_before` places it.
    pub fn create(&mut self, kind: NodeKind, inputs: &[ValueId], num_outputs: usize) -> NodeId {
        let id = self.push_node(kind, None);
        for &input in inputs {
            self.push_input(id, input);
        }
        for index in 0..num_outputs {
            let out = self.push_value(ValueDef::NodeOutput { node: id, index }, IrType::Infer, None);
            self.nodes[id.0 as usize].outputs.push(out);
        }
        id
    }

    /// Creates a node with typed outputs and appends it to the end of `block`.
    pub fn add_op(
        &mut self,
        block: BlockId,
        kind: NodeKind,
        inputs: &[ValueId],
        output_types: Vec<IrType>,
    ) -> Result<NodeId, IrError> {
        let id = self.create(kind, inputs, output_types.len());
        for (out, ty) in self.node(id).outputs.clone().into_iter().zip(output_types) {
            self.set_type(out, ty);
        }
        self.append(block, id)?;
        Ok(id)
    }

    /// Appends a detached node to the end of `block`, before its `Return`.
    pub fn append(&mut self, block: BlockId, node: NodeId) -> Result<(), IrError> {
        self.check_detached(node)?;
        self.nodes[node.0 as usize].owner = Some(block);
        self.blocks[block.0 as usize].nodes.push(node);
        Ok(())
    }

    /// Places a detached `node` immediately before `anchor` in `anchor`'s block.
    ///
    /// Anchoring on a block's `Return` appends at the end of that block.
    pub fn insert_before(&mut self, node: NodeId, anchor: NodeId) -> Result<(), IrError> {
        self.check_detached(node)?;
        let block = self
            .node(anchor)
            .owner
            .ok_or(IrError::DetachedNode { node: anchor })?;
        let position = if self.block(block).ret == anchor {
            self.block(block).nodes.len()
        } else {
            self.block(block)
                .nodes
                .iter()
                .position(|&n| n == anchor)
                .ok_or(IrError::DetachedNode { node: anchor })?
        };
        self.nodes[node.0 as usize].owner = Some(block);
        self.blocks[block.0 as usize].nodes.insert(position, node);
        Ok(())
    }

    /// Appends `value` to the inputs of `node`.
    pub fn add_input(&mut self, node: NodeId, value: ValueId) {
        self.push_input(node, value);
    }

    /// Attaches a new, empty nested block to a control-flow node.
    pub fn add_block(&mut self, node: NodeId) -> Result<BlockId, IrError> {
        let kind = &self.node(node).kind;
        if !kind.can_own_blocks() {
            return Err(IrError::NotABlockOwner { kind: kind.to_string() });
        }
        let block = self.new_block(Some(node));
        self.nodes[node.0 as usize].blocks.push(block);
        Ok(block)
    }

    /// Appends a typed input to `block`.
    pub fn add_block_input(&mut self, block: BlockId, name: Option<&str>, ty: IrType) -> ValueId {
        let index = self.block(block).inputs.len();
        let value = self.push_value(ValueDef::BlockInput { block, index }, ty, name);
        self.blocks[block.0 as usize].inputs.push(value);
        value
    }

    /// Inserts a typed input into `block` at `index`, shifting later inputs right.
    pub fn insert_block_input(
        &mut self,
        block: BlockId,
        index: usize,
        name: Option<&str>,
        ty: IrType,
    ) -> Result<ValueId, IrError> {
        let len = self.block(block).inputs.len();
        if index > len {
            return Err(IrError::IndexOutOfRange {
                what: format!("input of {}", block),
                index,
                len,
            });
        }
        let value = self.push_value(ValueDef::BlockInput { block, index }, ty, name);
        self.blocks[block.0 as usize].inputs.insert(index, value);
        for shifted in self.blocks[block.0 as usize].inputs[index + 1..].to_vec() {
            if let ValueDef::BlockInput { index, .. } = &mut self.values[shifted.0 as usize].def {
                *index += 1;
            }
        }
        Ok(value)
    }

    /// Adds `value` as the next output of `block`. Returns its output position.
    pub fn register_output(&mut self, block: BlockId, value: ValueId) -> usize {
        let ret = self.block(block).ret;
        self.push_input(ret, value);
        self.node(ret).inputs.len() - 1
    }

    /// Sets an attribute, rejecting keys the node's kind does not accept.
    pub fn set_attr(&mut self, node: NodeId, key: AttrKey, value: AttrValue) -> Result<(), IrError> {
        let kind = &self.node(node).kind;
        if !kind.accepts_attr(key) {
            return Err(IrError::InvalidAttr {
                kind: kind.to_string(),
                key: key.to_string(),
            });
        }
        self.nodes[node.0 as usize].attrs.insert(key, value);
        Ok(())
    }

    /// Rewrites every input slot of `node` that reads `from` to read `to`.
    ///
    /// `from` keeps its uses by other nodes. Returns the number of rewritten slots.
    pub fn replace_input_with(
        &mut self,
        node: NodeId,
        from: ValueId,
        to: ValueId,
    ) -> Result<usize, IrError> {
        let slots: Vec<usize> = self
            .node(node)
            .inputs
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == from)
            .map(|(i, _)| i)
            .collect();
        if slots.is_empty() {
            return Err(IrError::NotAnInput { node, value: from });
        }
        for &index in &slots {
            self.nodes[node.0 as usize].inputs[index] = to;
            let used = Use { node, index };
            self.values[from.0 as usize].uses.retain(|u| *u != used);
            self.values[to.0 as usize].uses.push(used);
        }
        Ok(slots.len())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn new_block(&mut self, owner: Option<NodeId>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        let ret = self.push_node(NodeKind::Return, Some(id));
        self.blocks.push(Block {
            id,
            inputs: Vec::new(),
            nodes: Vec::new(),
            ret,
            owner,
        });
        id
    }

    fn push_node(&mut self, kind: NodeKind, owner: Option<BlockId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            blocks: Vec::new(),
            attrs: Default::default(),
            owner,
        });
        id
    }

    fn push_value(&mut self, def: ValueDef, ty: IrType, name: Option<&str>) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value {
            id,
            ty,
            name: name.map(str::to_owned),
            def,
            uses: Vec::new(),
        });
        id
    }

    fn push_input(&mut self, node: NodeId, value: ValueId) {
        let index = self.node(node).inputs.len();
        self.nodes[node.0 as usize].inputs.push(value);
        self.values[value.0 as usize].uses.push(Use { node, index });
    }

    fn check_detached(&self, node: NodeId) -> Result<(), IrError> {
        let n = self.node(node);
        if n.kind == NodeKind::Return || n.owner.is_some() {
            return Err(IrError::AlreadyAttached { node });
        }
        Ok(())
    }
}
