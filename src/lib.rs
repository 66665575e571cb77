// src/lib.rs
//! holesmith: synthesize program variants from templates with holes.
//!
//! A [`template::Template`] is a program skeleton whose holes each own a
//! choice tree. A [`search::Campaign`] runs the template through a
//! [`target::Target`], filling every hole it reaches, and emits one variant
//! per distinct filling.

pub mod cli;
pub mod commands;
pub mod compile;
pub mod config;
pub mod errors;
pub mod output;
pub mod search;
pub mod target;
pub mod template;
