// src/template/mod.rs
//! Templates: a fixed program skeleton with holes.
//!
//! A template declares static fields, an entry-point body and a set of
//! holes. Each hole owns a choice tree in the template's arena. Code
//! outside holes is fixed: its trees have exactly one configuration, which
//! is settled when the template is loaded.

mod lower;
mod render;
mod schema;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use holesmith_choice::{ChoiceArena, Configuration, Environment, NodeId};
use holesmith_ops::{Type, Value};

use crate::errors::TemplateError;

pub use render::{Rendering, render_unit};

/// Identifier of a hole, unique within its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HoleId(pub u32);

impl fmt::Display for HoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Holes that become unreachable once a branch condition is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard {
    /// Holes in the then-branch or loop body.
    pub then: Vec<HoleId>,
    /// Holes in the else-branch. Always empty for loops.
    pub otherwise: Vec<HoleId>,
}

impl Guard {
    /// Holes that can no longer run when the condition is always `value`.
    pub fn unreachable_when(&self, value: bool) -> &[HoleId] {
        if value { &self.otherwise } else { &self.then }
    }
}

#[derive(Debug, Clone)]
pub struct Hole {
    pub id: HoleId,
    pub root: NodeId,
    /// Set when the hole is the condition of an `if` or `while`.
    pub guard: Option<Guard>,
}

impl Hole {
    pub fn is_condition(&self) -> bool {
        self.guard.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expr {
    Hole(HoleId),
    Fixed(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Eval(Expr),
    Assign {
        target: String,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    /// Runs the body, swallowing arithmetic and bounds faults.
    Try(Vec<Stmt>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDecl {
    pub name: String,
    pub ty: Type,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    arena: ChoiceArena,
    symbols: Vec<SymbolDecl>,
    body: Vec<Stmt>,
    holes: BTreeMap<HoleId, Hole>,
    fixed: Configuration,
}

impl Template {
    /// Parse and validate a template from TOML text. `origin` names the
    /// source in diagnostics.
    pub fn from_toml(origin: &str, source: &str) -> Result<Template, TemplateError> {
        let spec: schema::TemplateSpec = toml::from_str(source)
            .map_err(|e| TemplateError::parse(origin, source.to_string(), e))?;
        lower::lower(spec)
    }

    /// Load an embedded demo by name, or a template file by path.
    ///
    /// Anything containing `/` or ending in `.toml` is treated as a path.
    pub fn load(name_or_path: &str) -> Result<Template, TemplateError> {
        if name_or_path.contains('/') || name_or_path.ends_with(".toml") {
            let source =
                std::fs::read_to_string(name_or_path).map_err(|source| TemplateError::Io {
                    path: name_or_path.to_string(),
                    source,
                })?;
            return Template::from_toml(name_or_path, &source);
        }
        let (name, source) = DEMOS
            .iter()
            .find(|(name, _)| *name == name_or_path)
            .ok_or_else(|| TemplateError::UnknownTemplate {
                name: name_or_path.to_string(),
                available: available_templates().join(", "),
            })?;
        Template::from_toml(name, source)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arena(&self) -> &ChoiceArena {
        &self.arena
    }

    pub fn symbols(&self) -> &[SymbolDecl] {
        &self.symbols
    }

    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    pub fn hole(&self, id: HoleId) -> Option<&Hole> {
        self.holes.get(&id)
    }

    /// Holes in id order.
    pub fn holes(&self) -> impl Iterator<Item = &Hole> {
        self.holes.values()
    }

    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    /// The settled configuration of every fixed tree.
    pub fn fixed_config(&self) -> &Configuration {
        &self.fixed
    }

    /// A fresh environment holding every symbol at its initial value.
    pub fn environment(&self) -> Environment {
        let mut env = Environment::new();
        for symbol in &self.symbols {
            env.declare(symbol.name.clone(), symbol.ty, symbol.value.clone());
        }
        env
    }
}

// ---------------------------------------------------------------------------
// Embedded demos
// ---------------------------------------------------------------------------

static DEMOS: &[(&str, &str)] = &[
    ("scenario-a", include_str!("../../templates/scenario-a.toml")),
    ("scenario-b", include_str!("../../templates/scenario-b.toml")),
    ("arrays", include_str!("../../templates/arrays.toml")),
];

/// Names of the templates compiled into the binary.
pub fn available_templates() -> Vec<&'static str> {
    DEMOS.iter().map(|(name, _)| *name).collect()
}
