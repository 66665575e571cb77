// fault.rs
//! Faults raised while exploring or evaluating choice trees.

use thiserror::Error;

use crate::arena::NodeId;

/// A fault the generated program itself would raise at runtime.
///
/// These are ignorable: the search swallows them, records them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeFault {
    #[error("arithmetic fault: {0}")]
    Arithmetic(String),

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    /// The program ran more statements in one invocation than allowed.
    #[error("step limit of {limit} exceeded")]
    StepLimit { limit: usize },
}

impl RuntimeFault {
    /// Stable name used when tallying faults.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeFault::Arithmetic(_) => "ArithmeticException",
            RuntimeFault::IndexOutOfBounds { .. } => "ArrayIndexOutOfBoundsException",
            RuntimeFault::StepLimit { .. } => "StepLimitExceeded",
        }
    }
}

/// An invariant violation inside the engine. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalFault {
    #[error("evaluation stack underflow at node {node}")]
    StackUnderflow { node: NodeId },

    #[error("evaluation left {depth} values on the stack")]
    UnbalancedStack { depth: usize },

    #[error("no symbol named '{name}' in the environment")]
    UnknownSymbol { name: String },

    #[error("node {node} is not an assignable location")]
    NotAddressable { node: NodeId },

    #[error("node {node} has no live configuration")]
    Unresolved { node: NodeId },

    #[error("iterator of node {node} advanced past its last value")]
    Exhausted { node: NodeId },

    #[error("ill-typed operation at node {node}: {detail}")]
    TypeMismatch { node: NodeId, detail: String },

    #[error("hole {hole} was evaluated outside a supervised run")]
    Unsupervised { hole: u32 },

    #[error("hole {hole} is not declared by the template")]
    UnknownHole { hole: u32 },
}

/// A node's domain turned out to be empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("no alternative of node {node} has a usable value")]
    NoAlternative { node: NodeId },

    #[error("{kind} node {node} has an empty domain")]
    Empty { node: NodeId, kind: &'static str },
}

/// Any fault surfaced by exploration or evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error(transparent)]
    Runtime(#[from] RuntimeFault),

    #[error(transparent)]
    Internal(#[from] InternalFault),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl Fault {
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Fault::Runtime(_))
    }
}
