// operators.rs
//! Operator catalogs.
//!
//! Each catalog is a finite, ordered set of operators. The order of `ALL`
//! is the enumeration order used by systematic exploration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OpError;
use crate::types::{PrimitiveType, Type};
use crate::value::Value;

/// A finite, enumerable operator set with a source-level symbol.
pub trait Operator: Copy + Eq + fmt::Debug + 'static {
    /// Every operator in the catalog, in enumeration order.
    const ALL: &'static [Self];

    fn symbol(self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
}

impl Operator for ArithOp {
    const ALL: &'static [Self] = &[
        ArithOp::Add,
        ArithOp::Sub,
        ArithOp::Mul,
        ArithOp::Div,
        ArithOp::Rem,
    ];

    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }
}

impl ArithOp {
    /// Result type of `left op right`, or `None` if either side is not numeric.
    pub fn result_type(left: Type, right: Type) -> Option<Type> {
        let promoted = left.primitive()?.binary_promote(right.primitive()?)?;
        Some(Type::Primitive(promoted))
    }

    pub fn apply(self, left: &Value, right: &Value) -> Result<Value, OpError> {
        let operands = || OpError::Operands {
            op: self.symbol(),
            left: left.ty(),
            right: right.ty(),
        };
        let promoted = ArithOp::result_type(left.ty(), right.ty())
            .and_then(Type::primitive)
            .ok_or_else(operands)?;
        match promoted {
            PrimitiveType::Int => {
                let (l, r) = int_pair(left, right).ok_or_else(operands)?;
                let (l, r) = (l as i32, r as i32);
                Ok(Value::Int(match self {
                    ArithOp::Add => l.wrapping_add(r),
                    ArithOp::Sub => l.wrapping_sub(r),
                    ArithOp::Mul => l.wrapping_mul(r),
                    ArithOp::Div if r == 0 => return Err(OpError::DivideByZero),
                    ArithOp::Div => l.wrapping_div(r),
                    ArithOp::Rem if r == 0 => return Err(OpError::DivideByZero),
                    ArithOp::Rem => l.wrapping_rem(r),
                }))
            }
            PrimitiveType::Long => {
                let (l, r) = int_pair(left, right).ok_or_else(operands)?;
                Ok(Value::Long(match self {
                    ArithOp::Add => l.wrapping_add(r),
                    ArithOp::Sub => l.wrapping_sub(r),
                    ArithOp::Mul => l.wrapping_mul(r),
                    ArithOp::Div if r == 0 => return Err(OpError::DivideByZero),
                    ArithOp::Div => l.wrapping_div(r),
                    ArithOp::Rem if r == 0 => return Err(OpError::DivideByZero),
                    ArithOp::Rem => l.wrapping_rem(r),
                }))
            }
            PrimitiveType::Float => {
                let l = left.as_f32().ok_or_else(operands)?;
                let r = right.as_f32().ok_or_else(operands)?;
                Ok(Value::Float(match self {
                    ArithOp::Add => l + r,
                    ArithOp::Sub => l - r,
                    ArithOp::Mul => l * r,
                    ArithOp::Div => l / r,
                    ArithOp::Rem => l % r,
                }))
            }
            PrimitiveType::Double => {
                let l = left.as_f64().ok_or_else(operands)?;
                let r = right.as_f64().ok_or_else(operands)?;
                Ok(Value::Double(match self {
                    ArithOp::Add => l + r,
                    ArithOp::Sub => l - r,
                    ArithOp::Mul => l * r,
                    ArithOp::Div => l / r,
                    ArithOp::Rem => l % r,
                }))
            }
            _ => Err(operands()),
        }
    }
}

fn int_pair(left: &Value, right: &Value) -> Option<(i64, i64)> {
    Some((left.as_i64()?, right.as_i64()?))
}

// ---------------------------------------------------------------------------
// Shift
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftOp {
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = ">>>")]
    Ushr,
}

impl Operator for ShiftOp {
    const ALL: &'static [Self] = &[ShiftOp::Shl, ShiftOp::Shr, ShiftOp::Ushr];

    fn symbol(self) -> &'static str {
        match self {
            ShiftOp::Shl => "<<",
            ShiftOp::Shr => ">>",
            ShiftOp::Ushr => ">>>",
        }
    }
}

impl ShiftOp {
    /// Shifts take the unary-promoted type of the left operand.
    pub fn result_type(left: Type, right: Type) -> Option<Type> {
        let l = left.primitive().filter(|p| p.is_integral())?;
        right.primitive().filter(|p| p.is_integral())?;
        Some(Type::Primitive(l.unary_promote()))
    }

    pub fn apply(self, left: &Value, right: &Value) -> Result<Value, OpError> {
        let operands = || OpError::Operands {
            op: self.symbol(),
            left: left.ty(),
            right: right.ty(),
        };
        let promoted = ShiftOp::result_type(left.ty(), right.ty())
            .and_then(Type::primitive)
            .ok_or_else(operands)?;
        let (l, distance) = int_pair(left, right).ok_or_else(operands)?;
        match promoted {
            PrimitiveType::Int => {
                let l = l as i32;
                let d = (distance & 0x1f) as u32;
                Ok(Value::Int(match self {
                    ShiftOp::Shl => l.wrapping_shl(d),
                    ShiftOp::Shr => l.wrapping_shr(d),
                    ShiftOp::Ushr => ((l as u32) >> d) as i32,
                }))
            }
            PrimitiveType::Long => {
                let d = (distance & 0x3f) as u32;
                Ok(Value::Long(match self {
                    ShiftOp::Shl => l.wrapping_shl(d),
                    ShiftOp::Shr => l.wrapping_shr(d),
                    ShiftOp::Ushr => ((l as u64) >> d) as i64,
                }))
            }
            _ => Err(operands()),
        }
    }
}

// ---------------------------------------------------------------------------
// Relational
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Operator for RelOp {
    const ALL: &'static [Self] = &[
        RelOp::Eq,
        RelOp::Ne,
        RelOp::Lt,
        RelOp::Le,
        RelOp::Gt,
        RelOp::Ge,
    ];

    fn symbol(self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

impl RelOp {
    /// Operand types a relational node may compare: two numerics, or two
    /// booleans when every allowed operator is an equality.
    pub fn accepts(ops: &[RelOp], left: Type, right: Type) -> bool {
        if left.is_bool() && right.is_bool() {
            return ops.iter().all(|op| matches!(op, RelOp::Eq | RelOp::Ne));
        }
        left.is_numeric() && right.is_numeric()
    }

    pub fn apply(self, left: &Value, right: &Value) -> Result<Value, OpError> {
        let operands = || OpError::Operands {
            op: self.symbol(),
            left: left.ty(),
            right: right.ty(),
        };
        if let (Value::Bool(l), Value::Bool(r)) = (left, right) {
            return match self {
                RelOp::Eq => Ok(Value::Bool(l == r)),
                RelOp::Ne => Ok(Value::Bool(l != r)),
                _ => Err(operands()),
            };
        }
        let promoted = ArithOp::result_type(left.ty(), right.ty())
            .and_then(Type::primitive)
            .ok_or_else(operands)?;
        let outcome = match promoted {
            PrimitiveType::Int | PrimitiveType::Long => {
                let (l, r) = int_pair(left, right).ok_or_else(operands)?;
                self.compare(l, r)
            }
            PrimitiveType::Float => {
                let l = left.as_f32().ok_or_else(operands)?;
                let r = right.as_f32().ok_or_else(operands)?;
                self.compare(l, r)
            }
            _ => {
                let l = left.as_f64().ok_or_else(operands)?;
                let r = right.as_f64().ok_or_else(operands)?;
                self.compare(l, r)
            }
        };
        Ok(Value::Bool(outcome))
    }

    fn compare<T: PartialOrd>(self, l: T, r: T) -> bool {
        match self {
            RelOp::Eq => l == r,
            RelOp::Ne => l != r,
            RelOp::Lt => l < r,
            RelOp::Le => l <= r,
            RelOp::Gt => l > r,
            RelOp::Ge => l >= r,
        }
    }
}

// ---------------------------------------------------------------------------
// Logical
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl Operator for LogicOp {
    const ALL: &'static [Self] = &[LogicOp::And, LogicOp::Or];

    fn symbol(self) -> &'static str {
        match self {
            LogicOp::And => "&&",
            LogicOp::Or => "||",
        }
    }
}

impl LogicOp {
    /// The outcome decided by the left operand alone, if any.
    pub fn short_circuit(self, left: bool) -> Option<bool> {
        match (self, left) {
            (LogicOp::And, false) => Some(false),
            (LogicOp::Or, true) => Some(true),
            _ => None,
        }
    }

    pub fn apply(self, left: &Value, right: &Value) -> Result<Value, OpError> {
        match (left, right) {
            (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(match self {
                LogicOp::And => *l && *r,
                LogicOp::Or => *l || *r,
            })),
            _ => Err(OpError::Operands {
                op: self.symbol(),
                left: left.ty(),
                right: right.ty(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_wraps() {
        assert_eq!(
            ArithOp::Add.apply(&Value::Int(i32::MAX), &Value::Int(1)),
            Ok(Value::Int(i32::MIN))
        );
        assert_eq!(
            ArithOp::Div.apply(&Value::Int(i32::MIN), &Value::Int(-1)),
            Ok(Value::Int(i32::MIN))
        );
        assert_eq!(
            ArithOp::Mul.apply(&Value::Byte(100), &Value::Byte(3)),
            Ok(Value::Int(300))
        );
    }

    #[test]
    fn integral_division_by_zero_is_arithmetic_fault() {
        let err = ArithOp::Div.apply(&Value::Int(1), &Value::Int(0)).unwrap_err();
        assert!(err.is_arithmetic());
        let err = ArithOp::Rem.apply(&Value::Long(1), &Value::Int(0)).unwrap_err();
        assert!(err.is_arithmetic());
        let ok = ArithOp::Div.apply(&Value::Double(1.0), &Value::Int(0));
        assert_eq!(ok, Ok(Value::Double(f64::INFINITY)));
    }

    #[test]
    fn mixed_operands_promote() {
        assert_eq!(
            ArithOp::Add.apply(&Value::Int(1), &Value::Long(2)),
            Ok(Value::Long(3))
        );
        assert_eq!(
            ArithOp::Sub.apply(&Value::Char(98), &Value::Char(97)),
            Ok(Value::Int(1))
        );
        assert!(ArithOp::Add.apply(&Value::Bool(true), &Value::Int(1)).is_err());
    }

    #[test]
    fn shifts_mask_distance() {
        assert_eq!(
            ShiftOp::Shl.apply(&Value::Int(1), &Value::Int(33)),
            Ok(Value::Int(2))
        );
        assert_eq!(
            ShiftOp::Shr.apply(&Value::Int(-8), &Value::Int(1)),
            Ok(Value::Int(-4))
        );
        assert_eq!(
            ShiftOp::Ushr.apply(&Value::Int(-1), &Value::Int(28)),
            Ok(Value::Int(15))
        );
        assert_eq!(
            ShiftOp::Shl.apply(&Value::Long(1), &Value::Int(63)),
            Ok(Value::Long(i64::MIN))
        );
        assert_eq!(
            ShiftOp::Shl.apply(&Value::Byte(1), &Value::Long(4)),
            Ok(Value::Int(16))
        );
    }

    #[test]
    fn relational_compares_after_promotion() {
        assert_eq!(
            RelOp::Lt.apply(&Value::Int(-1), &Value::Long(0)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            RelOp::Eq.apply(&Value::Double(f64::NAN), &Value::Double(f64::NAN)),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            RelOp::Ne.apply(&Value::Bool(true), &Value::Bool(false)),
            Ok(Value::Bool(true))
        );
        assert!(RelOp::Lt.apply(&Value::Bool(true), &Value::Bool(false)).is_err());
    }

    #[test]
    fn logic_short_circuit_table() {
        assert_eq!(LogicOp::And.short_circuit(false), Some(false));
        assert_eq!(LogicOp::And.short_circuit(true), None);
        assert_eq!(LogicOp::Or.short_circuit(true), Some(true));
        assert_eq!(LogicOp::Or.short_circuit(false), None);
    }

    #[test]
    fn catalogs_have_distinct_symbols() {
        fn distinct<O: Operator>() -> bool {
            let mut symbols: Vec<_> = O::ALL.iter().map(|op| op.symbol()).collect();
            symbols.sort_unstable();
            symbols.dedup();
            symbols.len() == O::ALL.len()
        }
        assert!(distinct::<ArithOp>());
        assert!(distinct::<ShiftOp>());
        assert!(distinct::<RelOp>());
        assert!(distinct::<LogicOp>());
    }
}
