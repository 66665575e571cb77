// src/output/mod.rs
//! Emitted variants and where they go.

mod artifacts;
mod report;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::CampaignError;
use crate::template::HoleId;

pub use artifacts::{Artifacts, FaultTally, TraceSummary};
pub use report::{CampaignReport, Coverage, Outcome, Stats};

/// One accepted program variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// 1-based output index; 0 for the unmodified template.
    pub index: usize,
    pub class_name: String,
    pub source: String,
    /// Text of every hole filled in the run.
    pub filling: BTreeMap<HoleId, String>,
    /// Observed outcomes of each condition hole, in execution order.
    pub traces: BTreeMap<HoleId, Vec<bool>>,
    /// State checksum at the end of the run, in mimic mode.
    pub checksum: Option<u64>,
}

/// Receives variants as a campaign accepts them.
pub trait VariantSink {
    fn accept(&mut self, variant: &Variant) -> Result<(), CampaignError>;

    /// Called once when the campaign ends.
    fn finish(&mut self, _artifacts: &Artifacts) -> Result<(), CampaignError> {
        Ok(())
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub variants: Vec<Variant>,
    pub artifacts: Option<Artifacts>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariantSink for MemorySink {
    fn accept(&mut self, variant: &Variant) -> Result<(), CampaignError> {
        self.variants.push(variant.clone());
        Ok(())
    }

    fn finish(&mut self, artifacts: &Artifacts) -> Result<(), CampaignError> {
        self.artifacts = Some(artifacts.clone());
        Ok(())
    }
}

/// Writes `<class>.java` per variant and the side artifacts into a
/// directory, creating it on first use.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every file written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write(&mut self, name: &str, contents: &str) -> Result<(), CampaignError> {
        let path = self.dir.join(name);
        let io_error = |source| CampaignError::Output {
            path: path.display().to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_error)?;
        std::fs::write(&path, contents).map_err(io_error)?;
        tracing::trace!(path = %path.display(), "wrote");
        self.written.push(path);
        Ok(())
    }
}

impl VariantSink for DirectorySink {
    fn accept(&mut self, variant: &Variant) -> Result<(), CampaignError> {
        self.write(&format!("{}.java", variant.class_name), &variant.source)?;
        if let Some(checksum) = variant.checksum {
            self.write(
                &format!("{}_output.txt", variant.class_name),
                &format!("{checksum:016x}\n"),
            )?;
        }
        Ok(())
    }

    fn finish(&mut self, artifacts: &Artifacts) -> Result<(), CampaignError> {
        self.write("output.txt", &artifacts.output_txt())?;
        self.write("coverage.txt", &artifacts.coverage_txt())?;
        self.write("traces.csv", &artifacts.traces_csv())?;
        self.write("faults.txt", &artifacts.faults_txt())?;
        Ok(())
    }
}
