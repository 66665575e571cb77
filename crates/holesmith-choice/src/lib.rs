// lib.rs
//! Choice trees for holesmith.
//!
//! A choice tree describes every expression a hole may become. Nodes live in
//! a [`ChoiceArena`] and never change once built; the search state of a tree
//! lives in a [`Configuration`]. An [`Explorer`] advances a configuration,
//! either systematically (each node acts as an iterator over its domain) or
//! by random stepping. An [`Evaluator`] computes the configured expression
//! against an [`Environment`], and a [`Printer`] renders it as source text.

pub mod arena;
pub mod builder;
pub mod config;
pub mod env;
pub mod eval;
pub mod explore;
pub mod fault;
pub mod node;
pub mod print;

pub use arena::{ChoiceArena, NodeId};
pub use builder::{BuildError, ChoiceBuilder};
pub use config::{Configuration, Live};
pub use env::{Environment, Place, Symbol};
pub use eval::{Evaluation, Evaluator, Writeback, evaluate_condition};
pub use explore::Explorer;
pub use fault::{DomainError, Fault, InternalFault, RuntimeFault};
pub use node::{ChoiceNode, IndexChoice, LiteralDomain, NameSet, OperatorSet};
pub use print::Printer;
