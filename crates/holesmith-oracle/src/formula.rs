// formula.rs
//! Solver formulas and their SMT-LIB2 rendering.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Sort of a solver term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    Bool,
    Int,
}

impl Sort {
    fn as_str(self) -> &'static str {
        match self {
            Sort::Bool => "Bool",
            Sort::Int => "Int",
        }
    }
}

/// Bit width used when a term round-trips through bit-vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    W32,
    W64,
}

impl Width {
    pub fn bits(self) -> u32 {
        match self {
            Width::W32 => 32,
            Width::W64 => 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Bool(bool),
    Int(i64),
    /// A declared constant, quoted on output.
    Const(String),
    /// Function application, e.g. `(+ a b)`.
    App(&'static str, Vec<Term>),
    /// A bit-vector shift `op` of `value` by `distance`, both reinterpreted
    /// at `width` bits. The distance is masked to the low bits, and the
    /// result is converted back to a signed integer.
    Shift {
        op: &'static str,
        width: Width,
        value: Box<Term>,
        distance: Box<Term>,
    },
}

impl Term {
    pub fn app(op: &'static str, args: impl IntoIterator<Item = Term>) -> Term {
        Term::App(op, args.into_iter().collect())
    }

    pub fn not(self) -> Term {
        Term::App("not", vec![self])
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Bool(b) => write!(f, "{b}"),
            Term::Int(v) if *v < 0 => write!(f, "(- {})", v.unsigned_abs()),
            Term::Int(v) => write!(f, "{v}"),
            Term::Const(name) => write!(f, "|{name}|"),
            Term::App(op, args) => {
                write!(f, "({op}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Term::Shift {
                op,
                width,
                value,
                distance,
            } => {
                let bits = width.bits();
                let mask = bits - 1;
                let shifted = format!(
                    "({op} ((_ int2bv {bits}) {value}) (bvand ((_ int2bv {bits}) {distance}) (_ bv{mask} {bits})))"
                );
                write!(
                    f,
                    "(ite (bvslt {shifted} (_ bv0 {bits})) (- (bv2int {shifted}) {modulus}) (bv2int {shifted}))",
                    modulus = 1u128 << bits
                )
            }
        }
    }
}

/// A closed boolean query: a formula plus the constants it mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub constants: BTreeMap<String, Sort>,
    pub formula: Term,
}

impl Query {
    /// Script asking for satisfiability of the formula and then of its
    /// negation. The solver prints one answer per `check-sat`.
    pub fn to_smtlib(&self) -> String {
        let mut out = String::from("(set-option :print-success false)\n(set-logic ALL)\n");
        for (name, sort) in &self.constants {
            let _ = writeln!(out, "(declare-const |{name}| {})", sort.as_str());
        }
        let _ = writeln!(out, "(push 1)\n(assert {})\n(check-sat)\n(pop 1)", self.formula);
        let _ = writeln!(out, "(push 1)\n(assert (not {}))\n(check-sat)\n(pop 1)", self.formula);
        out.push_str("(exit)\n");
        out
    }
}
