// builder.rs
//! Type-checked construction of choice trees.

use holesmith_ops::{ArithOp, LogicOp, PrimitiveType, RelOp, ShiftOp, Type, Value};
use smallvec::SmallVec;
use thiserror::Error;

use crate::arena::{ChoiceArena, NodeId};
use crate::node::{ChoiceNode, IndexChoice, LiteralDomain, NameSet, OperatorSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{what} must have at least one choice")]
    EmptyDomain { what: &'static str },

    #[error("range [{low}, {high}) is empty")]
    EmptyRange { low: i64, high: i64 },

    #[error("range [{low}, {high}) does not fit in {prim}")]
    RangeOutOfType {
        prim: PrimitiveType,
        low: i64,
        high: i64,
    },

    #[error("{context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: &'static str,
        expected: String,
        found: Type,
    },

    #[error("{found} cannot be assigned to {target}")]
    NotAssignable { target: Type, found: Type },

    #[error("node {node} is not an assignable location")]
    NotAddressable { node: NodeId },

    #[error("unknown node {node}")]
    UnknownNode { node: NodeId },
}

/// Builds an arena of choice trees, checking types as it goes.
#[derive(Debug, Default)]
pub struct ChoiceBuilder {
    arena: ChoiceArena,
}

impl ChoiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arena(&self) -> &ChoiceArena {
        &self.arena
    }

    pub fn finish(self) -> ChoiceArena {
        self.arena
    }

    fn ty(&self, id: NodeId) -> Result<Type, BuildError> {
        if self.arena.contains(id) {
            Ok(self.arena.ty(id))
        } else {
            Err(BuildError::UnknownNode { node: id })
        }
    }

    // -----------------------------------------------------------------------
    // Terminals
    // -----------------------------------------------------------------------

    /// A one-element domain.
    pub fn constant(&mut self, value: Value) -> NodeId {
        let ty = value.ty();
        self.arena.push(ChoiceNode::Immutable(value), ty)
    }

    /// A literal choosing among `values`, all of type `prim`.
    pub fn values(&mut self, prim: PrimitiveType, values: Vec<Value>) -> Result<NodeId, BuildError> {
        if values.is_empty() {
            return Err(BuildError::EmptyDomain { what: "literal" });
        }
        if let Some(bad) = values.iter().find(|v| v.ty() != Type::Primitive(prim)) {
            return Err(BuildError::TypeMismatch {
                context: "literal value",
                expected: prim.to_string(),
                found: bad.ty(),
            });
        }
        Ok(self.arena.push(
            ChoiceNode::Literal {
                prim,
                domain: LiteralDomain::Values(values),
            },
            Type::Primitive(prim),
        ))
    }

    /// A numeric literal over `[low, high)`.
    ///
    /// Integral ranges must lie inside the type; floating ranges take any
    /// bounds.
    pub fn range(&mut self, prim: PrimitiveType, low: i64, high: i64) -> Result<NodeId, BuildError> {
        if !prim.is_numeric() {
            return Err(BuildError::TypeMismatch {
                context: "ranged literal",
                expected: "a numeric type".to_string(),
                found: Type::Primitive(prim),
            });
        }
        if low >= high {
            return Err(BuildError::EmptyRange { low, high });
        }
        if let Some((min, end)) = integral_span(prim)
            && (i128::from(low) < min || i128::from(high) > end)
        {
            return Err(BuildError::RangeOutOfType { prim, low, high });
        }
        Ok(self.arena.push(
            ChoiceNode::Literal {
                prim,
                domain: LiteralDomain::Range { low, high },
            },
            Type::Primitive(prim),
        ))
    }

    pub fn int_range(&mut self, low: i32, high: i32) -> Result<NodeId, BuildError> {
        self.range(PrimitiveType::Int, i64::from(low), i64::from(high))
    }

    pub fn ints(&mut self, values: &[i32]) -> Result<NodeId, BuildError> {
        let values = values.iter().map(|v| Value::Int(*v)).collect();
        self.values(PrimitiveType::Int, values)
    }

    pub fn bools(&mut self, values: &[bool]) -> Result<NodeId, BuildError> {
        let values = values.iter().map(|v| Value::Bool(*v)).collect();
        self.values(PrimitiveType::Bool, values)
    }

    /// A literal with no declared bound.
    pub fn free(&mut self, prim: PrimitiveType) -> NodeId {
        self.arena.push(
            ChoiceNode::Literal {
                prim,
                domain: LiteralDomain::Free,
            },
            Type::Primitive(prim),
        )
    }

    /// An identifier choosing among the given names.
    pub fn ident(&mut self, ty: Type, names: &[&str]) -> Result<NodeId, BuildError> {
        if names.is_empty() {
            return Err(BuildError::EmptyDomain { what: "identifier" });
        }
        let names = names.iter().map(|n| n.to_string()).collect();
        Ok(self.arena.push(
            ChoiceNode::Ident {
                names: NameSet::Declared(names),
            },
            ty,
        ))
    }

    /// An identifier inferred from the in-scope symbols of type `ty`,
    /// skipping `exclude`.
    pub fn infer_ident(&mut self, ty: Type, exclude: &[&str]) -> NodeId {
        let exclude = exclude.iter().map(|n| n.to_string()).collect();
        self.arena.push(
            ChoiceNode::Ident {
                names: NameSet::Inferred { exclude },
            },
            ty,
        )
    }

    /// `array[index]`; the index is inferred from the runtime length when
    /// `index` is `None`.
    pub fn element(&mut self, array: NodeId, index: Option<NodeId>) -> Result<NodeId, BuildError> {
        let array_ty = self.ty(array)?;
        let elem = array_ty.element().ok_or(BuildError::TypeMismatch {
            context: "array access",
            expected: "an array".to_string(),
            found: array_ty,
        })?;
        let index = match index {
            Some(index) => {
                let index_ty = self.ty(index)?;
                let is_int_index = index_ty
                    .primitive()
                    .is_some_and(|p| p.is_integral() && p.unary_promote() == PrimitiveType::Int);
                if !is_int_index {
                    return Err(BuildError::TypeMismatch {
                        context: "array index",
                        expected: "int".to_string(),
                        found: index_ty,
                    });
                }
                IndexChoice::Explicit(index)
            }
            None => IndexChoice::Inferred,
        };
        Ok(self
            .arena
            .push(ChoiceNode::Element { array, index }, Type::Primitive(elem)))
    }

    // -----------------------------------------------------------------------
    // Operators
    // -----------------------------------------------------------------------

    fn operator(&mut self, set: OperatorSet) -> Result<NodeId, BuildError> {
        if set.is_empty() {
            return Err(BuildError::EmptyDomain { what: "operator set" });
        }
        // Operator nodes are not values; their type is never consulted.
        Ok(self.arena.push(ChoiceNode::Operator(set), Type::BOOL))
    }

    fn binary(&mut self, set: OperatorSet, left: NodeId, right: NodeId, ty: Type) -> Result<NodeId, BuildError> {
        let op = self.operator(set)?;
        Ok(self.arena.push(ChoiceNode::Binary { op, left, right }, ty))
    }

    pub fn arith(&mut self, left: NodeId, right: NodeId, ops: &[ArithOp]) -> Result<NodeId, BuildError> {
        let (l, r) = (self.ty(left)?, self.ty(right)?);
        let ty = ArithOp::result_type(l, r).ok_or(BuildError::TypeMismatch {
            context: "arithmetic operand",
            expected: "numeric operands".to_string(),
            found: if l.is_numeric() { r } else { l },
        })?;
        self.binary(OperatorSet::Arith(SmallVec::from_slice(ops)), left, right, ty)
    }

    pub fn shift(&mut self, left: NodeId, right: NodeId, ops: &[ShiftOp]) -> Result<NodeId, BuildError> {
        let (l, r) = (self.ty(left)?, self.ty(right)?);
        let ty = ShiftOp::result_type(l, r).ok_or(BuildError::TypeMismatch {
            context: "shift operand",
            expected: "integral operands".to_string(),
            found: if l.is_integral() { r } else { l },
        })?;
        self.binary(OperatorSet::Shift(SmallVec::from_slice(ops)), left, right, ty)
    }

    pub fn rel(&mut self, left: NodeId, right: NodeId, ops: &[RelOp]) -> Result<NodeId, BuildError> {
        let (l, r) = (self.ty(left)?, self.ty(right)?);
        if !RelOp::accepts(ops, l, r) {
            return Err(BuildError::TypeMismatch {
                context: "relational operand",
                expected: "two numeric or two boolean operands".to_string(),
                found: if l.is_numeric() { r } else { l },
            });
        }
        self.binary(OperatorSet::Rel(SmallVec::from_slice(ops)), left, right, Type::BOOL)
    }

    pub fn logic(&mut self, left: NodeId, right: NodeId, ops: &[LogicOp]) -> Result<NodeId, BuildError> {
        for side in [left, right] {
            let ty = self.ty(side)?;
            if !ty.is_bool() {
                return Err(BuildError::TypeMismatch {
                    context: "logical operand",
                    expected: "boolean".to_string(),
                    found: ty,
                });
            }
        }
        self.binary(OperatorSet::Logic(SmallVec::from_slice(ops)), left, right, Type::BOOL)
    }

    // -----------------------------------------------------------------------
    // Side effects, alternatives and casts
    // -----------------------------------------------------------------------

    fn is_addressable(&self, id: NodeId) -> bool {
        match self.arena.get(id) {
            ChoiceNode::Ident { .. } => true,
            ChoiceNode::Element { array, .. } => self.is_addressable(*array),
            ChoiceNode::Alt { options } => options.iter().all(|o| self.is_addressable(*o)),
            _ => false,
        }
    }

    /// `target = value`.
    pub fn assign(&mut self, target: NodeId, value: NodeId) -> Result<NodeId, BuildError> {
        let target_ty = self.ty(target)?;
        let value_ty = self.ty(value)?;
        if !self.is_addressable(target) {
            return Err(BuildError::NotAddressable { node: target });
        }
        if !value_ty.assignable_to(target_ty) {
            return Err(BuildError::NotAssignable {
                target: target_ty,
                found: value_ty,
            });
        }
        Ok(self.arena.push(ChoiceNode::Assign { target, value }, target_ty))
    }

    /// `++target`.
    pub fn pre_inc(&mut self, target: NodeId) -> Result<NodeId, BuildError> {
        let ty = self.ty(target)?;
        if !self.is_addressable(target) {
            return Err(BuildError::NotAddressable { node: target });
        }
        if !ty.is_numeric() {
            return Err(BuildError::TypeMismatch {
                context: "pre-increment",
                expected: "a numeric location".to_string(),
                found: ty,
            });
        }
        Ok(self.arena.push(ChoiceNode::PreInc { target }, ty))
    }

    /// One of `options`, all of the same type.
    pub fn alt(&mut self, options: &[NodeId]) -> Result<NodeId, BuildError> {
        let (first, rest) = options
            .split_first()
            .ok_or(BuildError::EmptyDomain { what: "alternative" })?;
        let ty = self.ty(*first)?;
        for option in rest {
            let found = self.ty(*option)?;
            if found != ty {
                return Err(BuildError::TypeMismatch {
                    context: "alternative",
                    expected: ty.to_string(),
                    found,
                });
            }
        }
        let options = SmallVec::from_slice(options);
        Ok(self.arena.push(ChoiceNode::Alt { options }, ty))
    }

    /// `(to) operand`.
    pub fn cast(&mut self, to: PrimitiveType, operand: NodeId) -> Result<NodeId, BuildError> {
        let from = self.ty(operand)?;
        let ok = from
            .primitive()
            .is_some_and(|p| (p == PrimitiveType::Bool) == (to == PrimitiveType::Bool));
        if !ok {
            return Err(BuildError::TypeMismatch {
                context: "cast operand",
                expected: format!("a value convertible to {to}"),
                found: from,
            });
        }
        Ok(self
            .arena
            .push(ChoiceNode::Cast { to, operand }, Type::Primitive(to)))
    }
}

/// Inclusive minimum and exclusive end of an integral type's values.
fn integral_span(prim: PrimitiveType) -> Option<(i128, i128)> {
    let (min, max) = match prim {
        PrimitiveType::Byte => (i128::from(i8::MIN), i128::from(i8::MAX)),
        PrimitiveType::Short => (i128::from(i16::MIN), i128::from(i16::MAX)),
        PrimitiveType::Char => (i128::from(u16::MIN), i128::from(u16::MAX)),
        PrimitiveType::Int => (i128::from(i32::MIN), i128::from(i32::MAX)),
        PrimitiveType::Long => (i128::from(i64::MIN), i128::from(i64::MAX)),
        PrimitiveType::Bool | PrimitiveType::Float | PrimitiveType::Double => return None,
    };
    Some((min, max + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_result_type_is_promoted() {
        let mut b = ChoiceBuilder::new();
        let x = b.ident(Type::BYTE, &["x"]).unwrap();
        let y = b.free(PrimitiveType::Long);
        let sum = b.arith(x, y, &[ArithOp::Add]).unwrap();
        assert_eq!(b.arena().ty(sum), Type::LONG);
    }

    #[test]
    fn rejects_ill_typed_trees() {
        let mut b = ChoiceBuilder::new();
        let flag = b.bools(&[true]).unwrap();
        let n = b.ints(&[1]).unwrap();
        assert!(b.arith(flag, n, &[ArithOp::Add]).is_err());
        assert!(b.logic(flag, n, &[LogicOp::And]).is_err());
        assert!(b.alt(&[flag, n]).is_err());
        assert!(b.assign(n, flag).is_err());
        assert!(b.pre_inc(n).is_err());
        assert!(b.cast(PrimitiveType::Int, flag).is_err());
        assert_eq!(b.alt(&[]), Err(BuildError::EmptyDomain { what: "alternative" }));
        assert_eq!(b.int_range(3, 3), Err(BuildError::EmptyRange { low: 3, high: 3 }));
    }

    #[test]
    fn integral_ranges_must_fit_their_type() {
        let mut b = ChoiceBuilder::new();
        assert_eq!(
            b.range(PrimitiveType::Byte, 0, 300),
            Err(BuildError::RangeOutOfType {
                prim: PrimitiveType::Byte,
                low: 0,
                high: 300,
            })
        );
        assert!(b.range(PrimitiveType::Byte, -129, 0).is_err());
        assert!(b.range(PrimitiveType::Short, 0, 40_000).is_err());
        assert!(b.range(PrimitiveType::Char, -1, 10).is_err());
        assert!(b.range(PrimitiveType::Int, 0, i64::from(i32::MAX) + 2).is_err());

        assert!(b.range(PrimitiveType::Byte, -128, 128).is_ok());
        assert!(b.range(PrimitiveType::Short, -32_768, 32_768).is_ok());
        assert!(b.range(PrimitiveType::Char, 0, 65_536).is_ok());
        assert!(b.range(PrimitiveType::Int, i64::from(i32::MIN), i64::from(i32::MAX) + 1).is_ok());
        assert!(b.range(PrimitiveType::Long, i64::MIN, i64::MAX).is_ok());
        assert!(b.range(PrimitiveType::Float, -1_000_000, 1_000_000).is_ok());
    }

    #[test]
    fn assignment_allows_widening() {
        let mut b = ChoiceBuilder::new();
        let target = b.ident(Type::LONG, &["l"]).unwrap();
        let value = b.ints(&[1, 2]).unwrap();
        let assign = b.assign(target, value).unwrap();
        assert_eq!(b.arena().ty(assign), Type::LONG);

        let narrow = b.ident(Type::SHORT, &["s"]).unwrap();
        assert!(b.assign(narrow, value).is_err());
    }

    #[test]
    fn element_requires_array_and_int_index() {
        let mut b = ChoiceBuilder::new();
        let arr = b.ident(Type::Array(PrimitiveType::Double), &["d"]).unwrap();
        let long_index = b.free(PrimitiveType::Long);
        assert!(b.element(arr, Some(long_index)).is_err());
        let elem = b.element(arr, None).unwrap();
        assert_eq!(b.arena().ty(elem), Type::DOUBLE);
        let scalar = b.ints(&[0]).unwrap();
        assert!(b.element(scalar, None).is_err());
    }
}
