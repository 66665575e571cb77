// value.rs
//
// Runtime values with target-language (Java) conversion semantics.

use std::hash::{Hash, Hasher};

use crate::error::OpError;
use crate::types::{PrimitiveType, Type};

/// A concrete runtime value.
///
/// `Char` holds a UTF-16 code unit, matching the target's 16-bit `char`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(u16),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Array(PrimitiveType, Vec<Value>),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Bool(_) => Type::BOOL,
            Value::Char(_) => Type::CHAR,
            Value::Byte(_) => Type::BYTE,
            Value::Short(_) => Type::SHORT,
            Value::Int(_) => Type::INT,
            Value::Long(_) => Type::LONG,
            Value::Float(_) => Type::FLOAT,
            Value::Double(_) => Type::DOUBLE,
            Value::Array(elem, _) => Type::Array(*elem),
        }
    }

    /// The default value of a primitive type.
    pub fn zero(prim: PrimitiveType) -> Value {
        match prim {
            PrimitiveType::Bool => Value::Bool(false),
            PrimitiveType::Char => Value::Char(0),
            PrimitiveType::Byte => Value::Byte(0),
            PrimitiveType::Short => Value::Short(0),
            PrimitiveType::Int => Value::Int(0),
            PrimitiveType::Long => Value::Long(0),
            PrimitiveType::Float => Value::Float(0.0),
            PrimitiveType::Double => Value::Double(0.0),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral payload widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Char(c) => Some(i64::from(*c)),
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload converted to `f32` in one rounding step.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Double(v) => Some(*v as f32),
            other => other.as_i64().map(|v| v as f32),
        }
    }

    /// Numeric payload converted to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Length of an array value.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(_, items) => Some(items.len()),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::Array(_, items) => Some(items),
            _ => None,
        }
    }

    pub fn elements_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(_, items) => Some(items),
            _ => None,
        }
    }

    /// Narrow an `i64` into `prim`, wrapping like a target-language cast.
    ///
    /// Returns `None` for `boolean`.
    pub fn from_i64(prim: PrimitiveType, v: i64) -> Option<Value> {
        Some(match prim {
            PrimitiveType::Bool => return None,
            PrimitiveType::Char => Value::Char(v as u16),
            PrimitiveType::Byte => Value::Byte(v as i8),
            PrimitiveType::Short => Value::Short(v as i16),
            PrimitiveType::Int => Value::Int(v as i32),
            PrimitiveType::Long => Value::Long(v),
            PrimitiveType::Float => Value::Float(v as f32),
            PrimitiveType::Double => Value::Double(v as f64),
        })
    }

    /// Convert an `f64` into `prim`. Floating-to-integral conversion
    /// saturates at the bounds of `int`/`long` and maps NaN to zero,
    /// then narrows sub-int types from `int`.
    pub fn from_f64(prim: PrimitiveType, v: f64) -> Option<Value> {
        Some(match prim {
            PrimitiveType::Bool => return None,
            PrimitiveType::Char => Value::Char((v as i32) as u16),
            PrimitiveType::Byte => Value::Byte((v as i32) as i8),
            PrimitiveType::Short => Value::Short((v as i32) as i16),
            PrimitiveType::Int => Value::Int(v as i32),
            PrimitiveType::Long => Value::Long(v as i64),
            PrimitiveType::Float => Value::Float(v as f32),
            PrimitiveType::Double => Value::Double(v),
        })
    }

    /// Primitive cast. `boolean` only casts to itself; arrays never cast.
    pub fn cast(&self, to: PrimitiveType) -> Result<Value, OpError> {
        let mismatch = || OpError::Cast {
            from: self.ty(),
            to: Type::Primitive(to),
        };
        match self {
            Value::Bool(_) if to == PrimitiveType::Bool => Ok(self.clone()),
            Value::Bool(_) | Value::Array(..) => Err(mismatch()),
            _ if to == PrimitiveType::Bool => Err(mismatch()),
            Value::Float(v) if to == PrimitiveType::Float => Ok(Value::Float(*v)),
            Value::Float(v) => Value::from_f64(to, f64::from(*v)).ok_or_else(mismatch),
            Value::Double(v) => Value::from_f64(to, *v).ok_or_else(mismatch),
            other => {
                let v = other.as_i64().ok_or_else(mismatch)?;
                Value::from_i64(to, v).ok_or_else(mismatch)
            }
        }
    }

    /// The value plus one, in the value's own type.
    pub fn increment(&self) -> Result<Value, OpError> {
        Ok(match self {
            Value::Char(v) => Value::Char(v.wrapping_add(1)),
            Value::Byte(v) => Value::Byte(v.wrapping_add(1)),
            Value::Short(v) => Value::Short(v.wrapping_add(1)),
            Value::Int(v) => Value::Int(v.wrapping_add(1)),
            Value::Long(v) => Value::Long(v.wrapping_add(1)),
            Value::Float(v) => Value::Float(v + 1.0),
            Value::Double(v) => Value::Double(v + 1.0),
            Value::Bool(_) | Value::Array(..) => {
                return Err(OpError::Increment { ty: self.ty() });
            }
        })
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Bool(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::Short(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Array(elem, items) => {
                elem.hash(state);
                items.hash(state);
            }
        }
    }
}
