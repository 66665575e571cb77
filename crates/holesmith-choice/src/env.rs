// env.rs
//! Symbol environment.
//!
//! The environment maps names to typed runtime values. Whoever runs the
//! target program populates it before a hole is evaluated and flushes it
//! back afterwards; the evaluator reads identifiers from it and applies
//! writebacks to it.

use std::collections::BTreeMap;
use std::fmt;

use holesmith_ops::{Type, Value};

use crate::fault::{InternalFault, RuntimeFault};

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub ty: Type,
    pub value: Value,
}

/// A writable location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Place {
    Var(String),
    Element { base: Box<Place>, index: usize },
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Var(name) => f.write_str(name),
            Place::Element { base, index } => write!(f, "{base}[{index}]"),
        }
    }
}

/// Name-to-value bindings, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    symbols: BTreeMap<String, Symbol>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous binding.
    pub fn declare(&mut self, name: impl Into<String>, ty: Type, value: Value) {
        self.symbols.insert(name.into(), Symbol { ty, value });
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn read(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name).map(|s| &s.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Names bound to symbols of exactly type `ty`, sorted.
    pub fn names_of_type(&self, ty: Type) -> Vec<String> {
        self.symbols
            .iter()
            .filter(|(_, s)| s.ty == ty)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Read the value stored at `place`.
    pub fn load(&self, place: &Place) -> Result<&Value, crate::Fault> {
        match place {
            Place::Var(name) => self
                .read(name)
                .ok_or_else(|| InternalFault::UnknownSymbol { name: name.clone() }.into()),
            Place::Element { base, index } => {
                let container = self.load(base)?;
                element(container, *index).map_err(Into::into)
            }
        }
    }

    /// Store `value` at `place`.
    pub fn store(&mut self, place: &Place, value: Value) -> Result<(), crate::Fault> {
        let slot = self.slot_mut(place)?;
        *slot = value;
        Ok(())
    }

    fn slot_mut(&mut self, place: &Place) -> Result<&mut Value, crate::Fault> {
        match place {
            Place::Var(name) => self
                .symbols
                .get_mut(name)
                .map(|s| &mut s.value)
                .ok_or_else(|| InternalFault::UnknownSymbol { name: name.clone() }.into()),
            Place::Element { base, index } => {
                let container = self.slot_mut(base)?;
                let len = container.len().unwrap_or(0);
                container
                    .elements_mut()
                    .and_then(|items| items.get_mut(*index))
                    .ok_or_else(|| {
                        RuntimeFault::IndexOutOfBounds {
                            index: *index as i64,
                            len,
                        }
                        .into()
                    })
            }
        }
    }
}

fn element(container: &Value, index: usize) -> Result<&Value, RuntimeFault> {
    let len = container.len().unwrap_or(0);
    container
        .elements()
        .and_then(|items| items.get(index))
        .ok_or(RuntimeFault::IndexOutOfBounds {
            index: index as i64,
            len,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use holesmith_ops::PrimitiveType;

    fn sample() -> Environment {
        let mut env = Environment::new();
        env.declare("x", Type::INT, Value::Int(1));
        env.declare("b", Type::BOOL, Value::Bool(false));
        env.declare("a", Type::INT, Value::Int(2));
        env.declare(
            "arr",
            Type::Array(PrimitiveType::Int),
            Value::Array(PrimitiveType::Int, vec![Value::Int(5), Value::Int(6)]),
        );
        env
    }

    #[test]
    fn names_of_type_are_sorted() {
        let env = sample();
        assert_eq!(env.names_of_type(Type::INT), vec!["a", "x"]);
        assert_eq!(env.names_of_type(Type::LONG), Vec::<String>::new());
    }

    #[test]
    fn store_into_element() {
        let mut env = sample();
        let place = Place::Element {
            base: Box::new(Place::Var("arr".into())),
            index: 1,
        };
        env.store(&place, Value::Int(9)).unwrap();
        assert_eq!(env.load(&place).unwrap(), &Value::Int(9));
        assert_eq!(place.to_string(), "arr[1]");
    }

    #[test]
    fn out_of_range_element_is_runtime_fault() {
        let mut env = sample();
        let place = Place::Element {
            base: Box::new(Place::Var("arr".into())),
            index: 2,
        };
        let err = env.store(&place, Value::Int(0)).unwrap_err();
        assert!(err.is_ignorable());
        let err = env.load(&Place::Var("nope".into())).unwrap_err();
        assert!(!err.is_ignorable());
    }
}
