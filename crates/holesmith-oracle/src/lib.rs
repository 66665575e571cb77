// lib.rs
//! Decision oracles for condition pruning.
//!
//! A configured boolean tree is translated into a [`Query`]; an [`Oracle`]
//! classifies it as always true, always false, contingent or unknown. Trees
//! with nodes outside the solver theory are reported as unbuildable and
//! never reach an oracle.

pub mod formula;
pub mod solver;
pub mod translate;
pub mod verdict;

pub use formula::{Query, Sort, Term, Width};
pub use solver::{DEFAULT_SOLVER, NoOracle, Oracle, OracleFault, SolverOracle};
pub use translate::{Blocker, Translation, Translator, translate};
pub use verdict::{SatAnswer, Verdict};
