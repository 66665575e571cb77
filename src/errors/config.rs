// src/errors/config.rs
//! Configuration errors (H2xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("unknown profile '{name}'")]
    #[diagnostic(code(H2001), help("available profiles: {available}"))]
    UnknownProfile { name: String, available: String },

    #[error("malformed profile: {message}")]
    #[diagnostic(code(H2002))]
    Parse {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("failed to read profile '{path}': {source}")]
    #[diagnostic(code(H2003))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output budget is zero")]
    #[diagnostic(code(H2004), help("set outputs > 0 or enable exhaustive search"))]
    ZeroOutputs,

    #[error("invocation budget is zero")]
    #[diagnostic(code(H2005))]
    ZeroInvocations,

    #[error("candidate domain for {ty} is empty")]
    #[diagnostic(code(H2006), help("free {ty} literals need at least one candidate"))]
    EmptyDomain { ty: String },
}

impl ConfigError {
    pub fn parse(name: &str, source: String, err: toml::de::Error) -> Self {
        let span = err.span().map(SourceSpan::from);
        ConfigError::Parse {
            message: err.message().to_string(),
            src: NamedSource::new(name, source),
            span,
        }
    }
}
