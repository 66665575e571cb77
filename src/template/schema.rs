// src/template/schema.rs
//! Serde model of the template TOML format.

use holesmith_ops::{ArithOp, LogicOp, RelOp, ShiftOp, Type};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct TemplateSpec {
    pub name: String,
    #[serde(default)]
    pub symbols: Vec<SymbolSpec>,
    #[serde(default)]
    pub body: Vec<StmtSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct SymbolSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// Omitted values start at zero, or as an empty array.
    #[serde(default)]
    pub value: Option<toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum StmtSpec {
    Eval(ExprSpec),
    Assign {
        target: String,
        value: ExprSpec,
    },
    If {
        cond: ExprSpec,
        #[serde(default)]
        then: Vec<StmtSpec>,
        #[serde(default, rename = "else")]
        otherwise: Vec<StmtSpec>,
    },
    While {
        cond: ExprSpec,
        #[serde(default)]
        body: Vec<StmtSpec>,
    },
    Try {
        #[serde(default)]
        body: Vec<StmtSpec>,
    },
    Block(Vec<StmtSpec>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ExprSpec {
    Hole { hole: u32, node: NodeSpec },
    Fixed(NodeSpec),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(super) enum NodeSpec {
    Const {
        #[serde(rename = "type")]
        ty: Type,
        value: toml::Value,
    },
    Literal {
        #[serde(rename = "type")]
        ty: Type,
        #[serde(default)]
        values: Option<Vec<toml::Value>>,
        #[serde(default)]
        low: Option<i64>,
        #[serde(default)]
        high: Option<i64>,
    },
    Ident {
        #[serde(rename = "type")]
        ty: Type,
        /// Empty means: every in-scope symbol of the type.
        #[serde(default)]
        names: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
    Element {
        array: Box<NodeSpec>,
        #[serde(default)]
        index: Option<Box<NodeSpec>>,
    },
    Arith {
        left: Box<NodeSpec>,
        right: Box<NodeSpec>,
        ops: Vec<ArithOp>,
    },
    Shift {
        left: Box<NodeSpec>,
        right: Box<NodeSpec>,
        ops: Vec<ShiftOp>,
    },
    Rel {
        left: Box<NodeSpec>,
        right: Box<NodeSpec>,
        ops: Vec<RelOp>,
    },
    Logic {
        left: Box<NodeSpec>,
        right: Box<NodeSpec>,
        ops: Vec<LogicOp>,
    },
    Assign {
        target: Box<NodeSpec>,
        value: Box<NodeSpec>,
    },
    PreInc {
        target: Box<NodeSpec>,
    },
    Alt {
        options: Vec<NodeSpec>,
    },
    Cast {
        #[serde(rename = "type")]
        to: Type,
        operand: Box<NodeSpec>,
    },
}
