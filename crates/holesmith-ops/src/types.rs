// types.rs
//
// Static types of template values.

use std::fmt;
use std::str::FromStr;

/// Primitive types of the target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: &'static [PrimitiveType] = &[
        PrimitiveType::Bool,
        PrimitiveType::Char,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    /// Get the source keyword for this primitive type.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "boolean",
            PrimitiveType::Char => "char",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveType::Bool)
    }

    /// Integral types, including `char`.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveType::Char
                | PrimitiveType::Byte
                | PrimitiveType::Short
                | PrimitiveType::Int
                | PrimitiveType::Long
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveType::Float | PrimitiveType::Double)
    }

    /// Unary numeric promotion: sub-int integral types widen to `int`.
    pub fn unary_promote(self) -> PrimitiveType {
        match self {
            PrimitiveType::Char | PrimitiveType::Byte | PrimitiveType::Short => PrimitiveType::Int,
            other => other,
        }
    }

    /// Identity or widening primitive conversion from `self` to `to`.
    pub fn widens_to(self, to: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == to {
            return true;
        }
        match self {
            Byte => matches!(to, Short | Int | Long | Float | Double),
            Short | Char => matches!(to, Int | Long | Float | Double),
            Int => matches!(to, Long | Float | Double),
            Long => matches!(to, Float | Double),
            Float => to == Double,
            Bool | Double => false,
        }
    }

    /// Binary numeric promotion of two numeric operand types.
    ///
    /// Returns `None` if either side is not numeric.
    pub fn binary_promote(self, other: PrimitiveType) -> Option<PrimitiveType> {
        if !self.is_numeric() || !other.is_numeric() {
            return None;
        }
        let widest = |t: PrimitiveType| match t {
            PrimitiveType::Double => 3,
            PrimitiveType::Float => 2,
            PrimitiveType::Long => 1,
            _ => 0,
        };
        Some(match widest(self).max(widest(other)) {
            3 => PrimitiveType::Double,
            2 => PrimitiveType::Float,
            1 => PrimitiveType::Long,
            _ => PrimitiveType::Int,
        })
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A static type: a primitive or a one-dimensional array of primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Primitive(PrimitiveType),
    Array(PrimitiveType),
}

impl Type {
    pub const BOOL: Type = Type::Primitive(PrimitiveType::Bool);
    pub const CHAR: Type = Type::Primitive(PrimitiveType::Char);
    pub const BYTE: Type = Type::Primitive(PrimitiveType::Byte);
    pub const SHORT: Type = Type::Primitive(PrimitiveType::Short);
    pub const INT: Type = Type::Primitive(PrimitiveType::Int);
    pub const LONG: Type = Type::Primitive(PrimitiveType::Long);
    pub const FLOAT: Type = Type::Primitive(PrimitiveType::Float);
    pub const DOUBLE: Type = Type::Primitive(PrimitiveType::Double);

    pub fn primitive(self) -> Option<PrimitiveType> {
        match self {
            Type::Primitive(p) => Some(p),
            Type::Array(_) => None,
        }
    }

    /// Element type of an array type.
    pub fn element(self) -> Option<PrimitiveType> {
        match self {
            Type::Array(p) => Some(p),
            Type::Primitive(_) => None,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_bool(self) -> bool {
        self == Type::BOOL
    }

    pub fn is_numeric(self) -> bool {
        self.primitive().is_some_and(PrimitiveType::is_numeric)
    }

    pub fn is_integral(self) -> bool {
        self.primitive().is_some_and(PrimitiveType::is_integral)
    }

    /// Whether a value of type `self` may be stored into a slot of type `to`.
    pub fn assignable_to(self, to: Type) -> bool {
        match (self, to) {
            (Type::Primitive(from), Type::Primitive(to)) => from.widens_to(to),
            (from, to) => from == to,
        }
    }

    /// Floating-point scalars and arrays of them.
    pub fn is_floating(self) -> bool {
        match self {
            Type::Primitive(p) | Type::Array(p) => p.is_floating(),
        }
    }
}

impl From<PrimitiveType> for Type {
    fn from(p: PrimitiveType) -> Self {
        Type::Primitive(p)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.as_str()),
            Type::Array(p) => write!(f, "{}[]", p.as_str()),
        }
    }
}

/// Error returned when a type name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type '{0}'")]
pub struct UnknownTypeError(pub String);

impl FromStr for Type {
    type Err = UnknownTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (base, array) = match trimmed.strip_suffix("[]") {
            Some(base) => (base.trim_end(), true),
            None => (trimmed, false),
        };
        let prim = PrimitiveType::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == base)
            .ok_or_else(|| UnknownTypeError(s.to_string()))?;
        Ok(if array {
            Type::Array(prim)
        } else {
            Type::Primitive(prim)
        })
    }
}

impl TryFrom<String> for Type {
    type Error = UnknownTypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for p in PrimitiveType::ALL {
            let scalar = Type::Primitive(*p);
            let array = Type::Array(*p);
            assert_eq!(scalar.to_string().parse::<Type>(), Ok(scalar));
            assert_eq!(array.to_string().parse::<Type>(), Ok(array));
        }
        assert!("string".parse::<Type>().is_err());
        assert!("int[][]".parse::<Type>().is_err());
    }

    #[test]
    fn binary_promotion_follows_widest_operand() {
        use PrimitiveType::*;
        assert_eq!(Byte.binary_promote(Short), Some(Int));
        assert_eq!(Char.binary_promote(Int), Some(Int));
        assert_eq!(Int.binary_promote(Long), Some(Long));
        assert_eq!(Long.binary_promote(Float), Some(Float));
        assert_eq!(Float.binary_promote(Double), Some(Double));
        assert_eq!(Bool.binary_promote(Int), None);
    }

    #[test]
    fn widening_is_one_directional() {
        use PrimitiveType::*;
        assert!(Byte.widens_to(Int));
        assert!(Char.widens_to(Long));
        assert!(!Char.widens_to(Short));
        assert!(!Int.widens_to(Short));
        assert!(!Bool.widens_to(Int));
        assert!(Type::INT.assignable_to(Type::DOUBLE));
        assert!(!Type::Array(Int).assignable_to(Type::Array(Long)));
    }
}
