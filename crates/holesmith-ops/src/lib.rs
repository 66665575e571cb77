// lib.rs
//! Values, types and operator catalogs shared by the holesmith crates.
//!
//! Arithmetic follows the target language: integral operations wrap,
//! integral division by zero is a runtime fault, shift distances are masked
//! and mixed operands undergo binary numeric promotion.

pub mod domains;
pub mod error;
pub mod literal;
pub mod operators;
pub mod random;
pub mod types;
pub mod value;

pub use domains::CandidateDomains;
pub use error::OpError;
pub use operators::{ArithOp, LogicOp, Operator, RelOp, ShiftOp};
pub use types::{PrimitiveType, Type, UnknownTypeError};
pub use value::Value;
