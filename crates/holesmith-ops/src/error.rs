// error.rs

use thiserror::Error;

use crate::types::Type;

/// Failure while applying an operator or conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    /// Integral division or remainder by zero.
    #[error("/ by zero")]
    DivideByZero,

    #[error("operator '{op}' cannot be applied to {left} and {right}")]
    Operands {
        op: &'static str,
        left: Type,
        right: Type,
    },

    #[error("cannot cast {from} to {to}")]
    Cast { from: Type, to: Type },

    #[error("cannot increment a value of type {ty}")]
    Increment { ty: Type },
}

impl OpError {
    /// True for faults the target program itself would raise at runtime.
    /// All other variants indicate an ill-typed tree.
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, OpError::DivideByZero)
    }
}
