// src/errors/campaign.rs
//! Campaign aborts (H3xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use holesmith_choice::{DomainError, InternalFault};
use miette::Diagnostic;
use thiserror::Error;

use crate::template::HoleId;

#[derive(Error, Debug, Diagnostic)]
pub enum CampaignError {
    #[error("hole {hole} has an empty domain: {source}")]
    #[diagnostic(code(H3001), help("every alternative of the hole was pruned away"))]
    Domain {
        hole: HoleId,
        #[source]
        source: DomainError,
    },

    #[error("internal fault: {source}")]
    #[diagnostic(code(H3002))]
    Internal {
        #[source]
        source: InternalFault,
    },

    #[error("failed to write '{path}': {source}")]
    #[diagnostic(code(H3003))]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<InternalFault> for CampaignError {
    fn from(source: InternalFault) -> Self {
        CampaignError::Internal { source }
    }
}
