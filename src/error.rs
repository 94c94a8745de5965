use thiserror::Error;

use crate::ir::node::NodeId;
use crate::ir::value::ValueId;

/// Top-level error type for the export-preparation pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("[graph error] {0}")]
    Ir(#[from] IrError),

    #[error("[pass error] {0}")]
    Pass(#[from] PassError),

    #[error("[codegen error] {0}")]
    Codegen(#[from] CodegenError),
}

impl Error {
    /// Returns a stable diagnostic code for this error.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            Error::Ir(e) | Error::Pass(PassError::Ir(e)) => e.diagnostic_code(),
            Error::Pass(PassError::MalformedLoop { .. }) => "E0200",
            Error::Pass(PassError::ContractViolation { .. }) => "E0201",
            Error::Pass(PassError::MalformedIf { .. }) => "E0202",
            Error::Codegen(_) => "E0300",
        }
    }
}

// ---------------------------------------------------------------------------
// Graph construction / surgery errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum IrError {
    #[error("attribute '{key}' is not valid on a {kind} node")]
    InvalidAttr { kind: String, key: String },

    #[error("a {kind} node cannot own nested blocks — only If and Loop can")]
    NotABlockOwner { kind: String },

    #[error("node {node} is not placed in any block")]
    DetachedNode { node: NodeId },

    #[error("node {node} is already placed in a block")]
    AlreadyAttached { node: NodeId },

    #[error("index {index} is out of range for {what} (length {len})")]
    IndexOutOfRange { what: String, index: usize, len: usize },

    #[error("value {value} is not an input of node {node}")]
    NotAnInput { node: NodeId, value: ValueId },
}

impl IrError {
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            IrError::InvalidAttr { .. } => "E0100",
            IrError::NotABlockOwner { .. } => "E0101",
            IrError::DetachedNode { .. } => "E0102",
            IrError::AlreadyAttached { .. } => "E0103",
            IrError::IndexOutOfRange { .. } => "E0104",
            IrError::NotAnInput { .. } => "E0105",
        }
    }
}

// ---------------------------------------------------------------------------
// Pass errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PassError {
    #[error("malformed Loop node {node} — {detail}. This is an internal compiler bug, the graph cannot be exported")]
    MalformedLoop { node: NodeId, detail: String },

    #[error("malformed If node {node} — it has no condition input. This is an internal compiler bug, the graph cannot be exported")]
    MalformedIf { node: NodeId },

    #[error("graph '{graph}' is not ready for ONNX export — {detail}")]
    ContractViolation { graph: String, detail: String },

    #[error(transparent)]
    Ir(#[from] IrError),
}

// ---------------------------------------------------------------------------
// Codegen errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("text emission failed: {0}")]
    Fmt(#[from] std::fmt::Error),
}
