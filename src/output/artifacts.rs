// src/output/artifacts.rs
//! Side artifacts collected over a campaign.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use holesmith_choice::RuntimeFault;

use super::Variant;
use crate::template::HoleId;

/// Ignorable faults seen while running the target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultTally {
    pub by_kind: BTreeMap<&'static str, u64>,
    /// Out-of-bounds accesses, by offending index.
    pub invalid_indices: BTreeMap<i64, u64>,
}

impl FaultTally {
    pub fn record(&mut self, fault: &RuntimeFault) {
        *self.by_kind.entry(fault.kind()).or_default() += 1;
        if let RuntimeFault::IndexOutOfBounds { index, .. } = fault {
            *self.invalid_indices.entry(*index).or_default() += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.by_kind.values().sum()
    }
}

/// How a condition behaved over one variant's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceSummary {
    AlwaysTrue,
    AlwaysFalse,
    Varied,
}

impl TraceSummary {
    pub fn of(trace: &[bool]) -> Option<TraceSummary> {
        let first = *trace.first()?;
        Some(if trace.iter().all(|v| *v == first) {
            if first {
                TraceSummary::AlwaysTrue
            } else {
                TraceSummary::AlwaysFalse
            }
        } else {
            TraceSummary::Varied
        })
    }

    pub fn as_char(self) -> char {
        match self {
            TraceSummary::AlwaysTrue => 'T',
            TraceSummary::AlwaysFalse => 'F',
            TraceSummary::Varied => 'V',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TraceRow {
    class_name: String,
    hole: HoleId,
    trace: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub outputs: usize,
    pub total_holes: usize,
    /// Holes filled in at least one run.
    pub reached: BTreeSet<HoleId>,
    pub faults: FaultTally,
    traces: Vec<TraceRow>,
}

impl Artifacts {
    pub fn new(total_holes: usize) -> Self {
        Self {
            outputs: 0,
            total_holes,
            reached: BTreeSet::new(),
            faults: FaultTally::default(),
            traces: Vec::new(),
        }
    }

    pub fn record_variant(&mut self, variant: &Variant) {
        for (hole, trace) in &variant.traces {
            self.traces.push(TraceRow {
                class_name: variant.class_name.clone(),
                hole: *hole,
                trace: trace.clone(),
            });
        }
    }

    pub fn output_txt(&self) -> String {
        format!("{}\n", self.outputs)
    }

    pub fn coverage_txt(&self) -> String {
        let mut out = format!("{}/{}\n", self.reached.len(), self.total_holes);
        let reached: Vec<String> = self.reached.iter().map(HoleId::to_string).collect();
        let _ = writeln!(out, "reached: {}", reached.join(" "));
        out
    }

    /// One row per emitted variant and condition hole.
    pub fn traces_csv(&self) -> String {
        let mut out = String::from("class,hole,trace,summary\n");
        for row in &self.traces {
            let trace: String = row.trace.iter().map(|v| if *v { 'T' } else { 'F' }).collect();
            let summary = TraceSummary::of(&row.trace).map_or('-', TraceSummary::as_char);
            let _ = writeln!(out, "{},{},{},{}", row.class_name, row.hole, trace, summary);
        }
        out
    }

    pub fn faults_txt(&self) -> String {
        let mut out = String::new();
        for (kind, count) in &self.faults.by_kind {
            let _ = writeln!(out, "{kind}: {count}");
        }
        for (index, count) in &self.faults.invalid_indices {
            let _ = writeln!(out, "invalid index {index}: {count}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_summaries() {
        assert_eq!(TraceSummary::of(&[]), None);
        assert_eq!(TraceSummary::of(&[true, true]), Some(TraceSummary::AlwaysTrue));
        assert_eq!(TraceSummary::of(&[false]), Some(TraceSummary::AlwaysFalse));
        assert_eq!(TraceSummary::of(&[true, false, true]), Some(TraceSummary::Varied));
    }

    #[test]
    fn fault_tally_counts_kinds_and_indices() {
        let mut tally = FaultTally::default();
        tally.record(&RuntimeFault::IndexOutOfBounds { index: 3, len: 3 });
        tally.record(&RuntimeFault::IndexOutOfBounds { index: 3, len: 3 });
        tally.record(&RuntimeFault::IndexOutOfBounds { index: -1, len: 3 });
        tally.record(&RuntimeFault::Arithmetic("/ by zero".to_string()));
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.invalid_indices.get(&3), Some(&2));

        let mut artifacts = Artifacts::new(1);
        artifacts.faults = tally;
        assert_eq!(
            artifacts.faults_txt(),
            "ArithmeticException: 1\nArrayIndexOutOfBoundsException: 3\ninvalid index -1: 1\ninvalid index 3: 2\n"
        );
    }

    #[test]
    fn renders_traces_and_coverage() {
        let mut artifacts = Artifacts::new(3);
        artifacts.reached.extend([HoleId(1), HoleId(3)]);
        let variant = Variant {
            index: 1,
            class_name: "TGen1".to_string(),
            source: String::new(),
            filling: BTreeMap::new(),
            traces: BTreeMap::from([(HoleId(1), vec![true, true, false]), (HoleId(3), vec![false])]),
            checksum: None,
        };
        artifacts.record_variant(&variant);
        assert_eq!(
            artifacts.traces_csv(),
            "class,hole,trace,summary\nTGen1,1,TTF,V\nTGen1,3,F,F\n"
        );
        assert_eq!(artifacts.coverage_txt(), "2/3\nreached: 1 3\n");
    }
}
