// domains.rs
//! Per-type candidate domains for free literals.
//!
//! A free literal has no declared values. Systematic and hybrid exploration
//! enumerate the candidate list for its type; random exploration draws from
//! the type's full range instead.

use serde::{Deserialize, Serialize};

use crate::types::PrimitiveType;
use crate::value::Value;

/// Candidate values, one list per primitive type.
///
/// Fields omitted from a TOML table keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateDomains {
    pub booleans: Vec<bool>,
    /// UTF-16 code units.
    pub chars: Vec<u16>,
    pub bytes: Vec<i8>,
    pub shorts: Vec<i16>,
    pub ints: Vec<i32>,
    pub longs: Vec<i64>,
    pub floats: Vec<f32>,
    pub doubles: Vec<f64>,
}

impl Default for CandidateDomains {
    fn default() -> Self {
        Self {
            booleans: vec![false, true],
            chars: vec![u16::from(b'a'), u16::MAX, u16::MIN],
            bytes: vec![0, 1, -1, i8::MAX, i8::MIN],
            shorts: vec![0, 1, -1, i16::MAX, i16::MIN],
            ints: vec![0, 1, -1, i32::MAX, i32::MIN],
            longs: vec![0, 1, -1, i64::MAX, i64::MIN],
            // The last entry is the smallest positive subnormal.
            floats: vec![0.0, 1.0, -1.0, f32::MAX, f32::from_bits(1)],
            doubles: vec![0.0, 1.0, -1.0, f64::MAX, f64::from_bits(1)],
        }
    }
}

impl CandidateDomains {
    /// The candidate values for `prim`, in enumeration order.
    pub fn candidates(&self, prim: PrimitiveType) -> Vec<Value> {
        match prim {
            PrimitiveType::Bool => self.booleans.iter().map(|v| Value::Bool(*v)).collect(),
            PrimitiveType::Char => self.chars.iter().map(|v| Value::Char(*v)).collect(),
            PrimitiveType::Byte => self.bytes.iter().map(|v| Value::Byte(*v)).collect(),
            PrimitiveType::Short => self.shorts.iter().map(|v| Value::Short(*v)).collect(),
            PrimitiveType::Int => self.ints.iter().map(|v| Value::Int(*v)).collect(),
            PrimitiveType::Long => self.longs.iter().map(|v| Value::Long(*v)).collect(),
            PrimitiveType::Float => self.floats.iter().map(|v| Value::Float(*v)).collect(),
            PrimitiveType::Double => self.doubles.iter().map(|v| Value::Double(*v)).collect(),
        }
    }

    /// Number of candidates for `prim`.
    pub fn len_of(&self, prim: PrimitiveType) -> usize {
        match prim {
            PrimitiveType::Bool => self.booleans.len(),
            PrimitiveType::Char => self.chars.len(),
            PrimitiveType::Byte => self.bytes.len(),
            PrimitiveType::Short => self.shorts.len(),
            PrimitiveType::Int => self.ints.len(),
            PrimitiveType::Long => self.longs.len(),
            PrimitiveType::Float => self.floats.len(),
            PrimitiveType::Double => self.doubles.len(),
        }
    }

    /// The first primitive type whose candidate list is empty, if any.
    pub fn first_empty(&self) -> Option<PrimitiveType> {
        PrimitiveType::ALL
            .iter()
            .copied()
            .find(|p| self.len_of(*p) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_type() {
        let domains = CandidateDomains::default();
        assert_eq!(domains.first_empty(), None);
        assert_eq!(domains.candidates(PrimitiveType::Int).len(), 5);
        assert_eq!(
            domains.candidates(PrimitiveType::Bool),
            vec![Value::Bool(false), Value::Bool(true)]
        );
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let domains: CandidateDomains = toml::from_str("ints = [3, 4]").unwrap();
        assert_eq!(domains.ints, vec![3, 4]);
        assert_eq!(domains.longs, CandidateDomains::default().longs);
    }
}
