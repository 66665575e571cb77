// node.rs
//! Choice node kinds.
//!
//! Terminal nodes own a domain directly. Composite nodes combine the
//! domains of their children: binary operators, assignment and explicit
//! array access form a cartesian product, alternatives form a union, and
//! casts and pre-increments delegate to their single child.

use holesmith_ops::{ArithOp, LogicOp, Operator, PrimitiveType, RelOp, ShiftOp, Value};
use smallvec::{SmallVec, smallvec};

use crate::arena::NodeId;

/// Domain of a literal node.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralDomain {
    /// An explicit finite set, enumerated in the given order.
    Values(Vec<Value>),
    /// The contiguous range `[low, high)`.
    Range { low: i64, high: i64 },
    /// No declared bound. Enumerates the configured candidates for the
    /// type; random stepping draws from the type's full range.
    Free,
}

/// Which names an identifier node may resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameSet {
    /// Exactly these names, in this order.
    Declared(Vec<String>),
    /// Every in-scope symbol of the node's type, sorted by name, minus
    /// `exclude`. Resolved from the environment on first access.
    Inferred { exclude: Vec<String> },
}

/// How an array element node picks its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexChoice {
    Explicit(NodeId),
    /// `[0, len)` of the container's runtime length, or the constant 0 for
    /// an empty container.
    Inferred,
}

/// An operator domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorSet {
    Arith(SmallVec<[ArithOp; 5]>),
    Shift(SmallVec<[ShiftOp; 3]>),
    Rel(SmallVec<[RelOp; 6]>),
    Logic(SmallVec<[LogicOp; 2]>),
}

impl OperatorSet {
    pub fn len(&self) -> usize {
        match self {
            OperatorSet::Arith(ops) => ops.len(),
            OperatorSet::Shift(ops) => ops.len(),
            OperatorSet::Rel(ops) => ops.len(),
            OperatorSet::Logic(ops) => ops.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn symbol(&self, pick: usize) -> Option<&'static str> {
        match self {
            OperatorSet::Arith(ops) => ops.get(pick).map(|op| op.symbol()),
            OperatorSet::Shift(ops) => ops.get(pick).map(|op| op.symbol()),
            OperatorSet::Rel(ops) => ops.get(pick).map(|op| op.symbol()),
            OperatorSet::Logic(ops) => ops.get(pick).map(|op| op.symbol()),
        }
    }
}

/// A point of variability.
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceNode {
    /// A single fixed value.
    Immutable(Value),
    Literal {
        prim: PrimitiveType,
        domain: LiteralDomain,
    },
    Ident {
        names: NameSet,
    },
    Element {
        array: NodeId,
        index: IndexChoice,
    },
    Operator(OperatorSet),
    Binary {
        op: NodeId,
        left: NodeId,
        right: NodeId,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    PreInc {
        target: NodeId,
    },
    Alt {
        options: SmallVec<[NodeId; 4]>,
    },
    Cast {
        to: PrimitiveType,
        operand: NodeId,
    },
}

impl ChoiceNode {
    /// Direct children, in printing order.
    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        match self {
            ChoiceNode::Immutable(_)
            | ChoiceNode::Literal { .. }
            | ChoiceNode::Ident { .. }
            | ChoiceNode::Operator(_) => SmallVec::new(),
            ChoiceNode::Element { array, index } => match index {
                IndexChoice::Explicit(index) => smallvec![*array, *index],
                IndexChoice::Inferred => smallvec![*array],
            },
            ChoiceNode::Binary { op, left, right } => smallvec![*left, *op, *right],
            ChoiceNode::Assign { target, value } => smallvec![*target, *value],
            ChoiceNode::PreInc { target } => smallvec![*target],
            ChoiceNode::Alt { options } => options.clone(),
            ChoiceNode::Cast { operand, .. } => smallvec![*operand],
        }
    }

    /// Short kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ChoiceNode::Immutable(_) => "immutable",
            ChoiceNode::Literal { .. } => "literal",
            ChoiceNode::Ident { .. } => "identifier",
            ChoiceNode::Element { .. } => "array element",
            ChoiceNode::Operator(_) => "operator",
            ChoiceNode::Binary { .. } => "binary",
            ChoiceNode::Assign { .. } => "assignment",
            ChoiceNode::PreInc { .. } => "pre-increment",
            ChoiceNode::Alt { .. } => "alternative",
            ChoiceNode::Cast { .. } => "cast",
        }
    }
}
