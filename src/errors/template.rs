// src/errors/template.rs
//! Template loading errors (H1xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use holesmith_choice::BuildError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum TemplateError {
    #[error("malformed template: {message}")]
    #[diagnostic(code(H1001))]
    Parse {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("hole {id} is declared more than once")]
    #[diagnostic(code(H1002), help("every hole needs its own positive id"))]
    DuplicateHole { id: u32 },

    #[error("hole ids must be positive")]
    #[diagnostic(code(H1003))]
    InvalidHoleId,

    #[error("ill-formed expression in {context}: {source}")]
    #[diagnostic(code(H1004))]
    Build {
        context: String,
        #[source]
        source: BuildError,
    },

    #[error("unknown symbol '{name}'")]
    #[diagnostic(code(H1005), help("declare it under [[symbols]]"))]
    UnknownSymbol { name: String },

    #[error("symbol '{name}' is declared more than once")]
    #[diagnostic(code(H1006))]
    DuplicateSymbol { name: String },

    #[error("invalid value for '{name}': {detail}")]
    #[diagnostic(code(H1007))]
    InvalidValue { name: String, detail: String },

    #[error("{context} must be a boolean expression, found {found}")]
    #[diagnostic(code(H1008))]
    NonBooleanCondition { context: &'static str, found: String },

    #[error("{context} is not a statement")]
    #[diagnostic(
        code(H1009),
        help("expression statements must be assignments or pre-increments")
    )]
    NotAStatement { context: String },

    #[error("fixed code in {context} must have exactly one configuration")]
    #[diagnostic(
        code(H1010),
        help("wrap the expression in a hole, or give every choice a single value and every array access an explicit index")
    )]
    AmbiguousFixedCode { context: String },

    #[error("unknown template '{name}'")]
    #[diagnostic(code(H1011), help("available templates: {available}"))]
    UnknownTemplate { name: String, available: String },

    #[error("failed to read template '{path}': {source}")]
    #[diagnostic(code(H1012))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TemplateError {
    pub fn parse(name: &str, source: String, err: toml::de::Error) -> Self {
        let span = err.span().map(SourceSpan::from);
        TemplateError::Parse {
            message: err.message().to_string(),
            src: NamedSource::new(name, source),
            span,
        }
    }

    pub fn build(context: impl Into<String>, source: BuildError) -> Self {
        TemplateError::Build {
            context: context.into(),
            source,
        }
    }
}
