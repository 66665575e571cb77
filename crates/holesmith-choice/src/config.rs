// config.rs
//! Live configurations.
//!
//! A [`Configuration`] holds, for every node of an arena, the node's live
//! selection and its iterator cursor. Nodes themselves never change; the
//! value a node currently denotes is a pure function of the node and its
//! slot here.

use holesmith_ops::{LogicOp, PrimitiveType, Value};

use crate::arena::{ChoiceArena, NodeId};
use crate::fault::InternalFault;
use crate::node::{ChoiceNode, LiteralDomain, OperatorSet};

/// The live selection of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Live {
    /// Never stepped.
    #[default]
    Unset,
    /// Position within the node's enumerable domain.
    Pick(usize),
    /// A value drawn directly, outside any enumeration.
    Scalar(Value),
}

/// Domain material resolved on first access.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum Resolved {
    #[default]
    Pending,
    /// Leaf with no resolved material of its own.
    Ready,
    Values(Vec<Value>),
    Names(Vec<String>),
    /// Alternatives left after pruning empty ones.
    Options(Vec<NodeId>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Slot {
    pub(crate) resolved: Resolved,
    pub(crate) live: Live,
    /// Leaf, union or inferred-index position; `None` while virgin.
    pub(crate) pos: Option<usize>,
    /// Whether a product iterator has produced its first tuple.
    pub(crate) started: bool,
    /// Size of an inferred index domain (at least 1).
    pub(crate) index_len: usize,
}

/// Per-node search state for one arena.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    slots: Vec<Slot>,
}

impl Configuration {
    pub fn new(arena: &ChoiceArena) -> Self {
        Self {
            slots: vec![Slot::default(); arena.len()],
        }
    }

    pub(crate) fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.index() as usize]
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.slots[id.index() as usize]
    }

    /// The raw live selection of a node.
    pub fn live(&self, id: NodeId) -> &Live {
        &self.slot(id).live
    }

    /// Whether the node's domain material has been resolved.
    pub fn is_built(&self, id: NodeId) -> bool {
        !matches!(self.slot(id).resolved, Resolved::Pending)
    }

    fn pick(&self, id: NodeId) -> Result<usize, InternalFault> {
        match self.slot(id).live {
            Live::Pick(i) => Ok(i),
            _ => Err(InternalFault::Unresolved { node: id }),
        }
    }

    /// Current value of an immutable or literal node.
    pub fn literal(&self, arena: &ChoiceArena, id: NodeId) -> Result<Value, InternalFault> {
        let slot = self.slot(id);
        if let Live::Scalar(v) = &slot.live {
            return Ok(v.clone());
        }
        let pick = self.pick(id)?;
        let value = match arena.get(id) {
            ChoiceNode::Immutable(v) => Some(v.clone()),
            ChoiceNode::Literal { domain, prim } => match domain {
                LiteralDomain::Values(values) => values.get(pick).cloned(),
                LiteralDomain::Range { low, .. } => range_value(*prim, *low, pick),
                LiteralDomain::Free => match &slot.resolved {
                    Resolved::Values(values) => values.get(pick).cloned(),
                    _ => None,
                },
            },
            _ => None,
        };
        value.ok_or(InternalFault::Unresolved { node: id })
    }

    /// Current name of an identifier node.
    pub fn name(&self, id: NodeId) -> Result<&str, InternalFault> {
        let pick = self.pick(id)?;
        match &self.slot(id).resolved {
            Resolved::Names(names) => names
                .get(pick)
                .map(String::as_str)
                .ok_or(InternalFault::Unresolved { node: id }),
            _ => Err(InternalFault::Unresolved { node: id }),
        }
    }

    /// Current operator position of an operator node.
    pub fn operator(&self, id: NodeId) -> Result<usize, InternalFault> {
        self.pick(id)
    }

    /// Current logical operator of an operator node, if it is one.
    pub fn logic_op(&self, arena: &ChoiceArena, id: NodeId) -> Result<LogicOp, InternalFault> {
        let pick = self.pick(id)?;
        match arena.get(id) {
            ChoiceNode::Operator(OperatorSet::Logic(ops)) => ops
                .get(pick)
                .copied()
                .ok_or(InternalFault::Unresolved { node: id }),
            _ => Err(InternalFault::TypeMismatch {
                node: id,
                detail: "not a logical operator".to_string(),
            }),
        }
    }

    /// Currently selected child of an alternative node.
    pub fn option(&self, id: NodeId) -> Result<NodeId, InternalFault> {
        let pick = self.pick(id)?;
        match &self.slot(id).resolved {
            Resolved::Options(options) => options
                .get(pick)
                .copied()
                .ok_or(InternalFault::Unresolved { node: id }),
            _ => Err(InternalFault::Unresolved { node: id }),
        }
    }

    /// Current inferred index of an array element node.
    pub fn inferred_index(&self, id: NodeId) -> Result<usize, InternalFault> {
        self.pick(id)
    }
}

/// The `pick`-th value of a range starting at `low`.
fn range_value(prim: PrimitiveType, low: i64, pick: usize) -> Option<Value> {
    let v = i128::from(low) + i128::try_from(pick).ok()?;
    Value::from_i64(prim, i64::try_from(v).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChoiceBuilder;

    #[test]
    fn unset_slots_report_unresolved() {
        let mut b = ChoiceBuilder::new();
        let lit = b.int_range(0, 3).unwrap();
        let arena = b.finish();
        let config = Configuration::new(&arena);
        assert_eq!(
            config.literal(&arena, lit),
            Err(InternalFault::Unresolved { node: lit })
        );
        assert!(!config.is_built(lit));
    }

    #[test]
    fn positions_past_i64_max_stay_in_range() {
        assert_eq!(
            range_value(PrimitiveType::Long, i64::MIN, usize::MAX - 1),
            Some(Value::Long(i64::MAX - 1))
        );
        assert_eq!(
            range_value(PrimitiveType::Long, -1, 1 << 63),
            Some(Value::Long(i64::MAX))
        );
        assert_eq!(range_value(PrimitiveType::Long, 0, 1 << 63), None);
    }
}
