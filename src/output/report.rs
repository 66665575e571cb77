// src/output/report.rs
//! Campaign statistics and the final report.

use std::fmt;
use std::fmt::Write;

/// Why a campaign stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The systematic enumeration ran out of configurations.
    Exhausted,
    OutputBudget,
    /// Too many consecutive runs were discarded.
    RepeatedTrials,
    /// Every hole walked its whole domain (hybrid).
    AllHolesExhausted,
    /// No run reached any hole; the template was emitted as is.
    NoHoleReached,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Exhausted => "search space exhausted",
            Outcome::OutputBudget => "output budget reached",
            Outcome::RepeatedTrials => "too many consecutive wasted trials",
            Outcome::AllHolesExhausted => "every hole exhausted its domain",
            Outcome::NoHoleReached => "no hole reached",
        })
    }
}

/// Counters collected while searching.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub runs: usize,
    /// Entry-point invocations across all runs.
    pub invocations: usize,
    /// Holes given a fresh configuration.
    pub holes_resolved: usize,
    /// Queries sent to the oracle.
    pub oracle_queries: usize,
    /// Conditions the oracle could not be asked about.
    pub unbuildable: usize,
    /// Conditions fixed to a constant.
    pub pruned_conditions: usize,
    pub hot_fills: usize,
    pub runtime_faults: usize,
    pub duplicates: usize,
    pub compile_failures: usize,
    pub hot_fill_failures: usize,
}

impl Stats {
    /// Runs discarded without producing a variant.
    pub fn wasted_trials(&self) -> usize {
        self.duplicates + self.compile_failures + self.hot_fill_failures
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub reached: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignReport {
    pub outcome: Outcome,
    pub outputs: usize,
    pub coverage: Coverage,
    pub stats: Stats,
}

impl CampaignReport {
    /// Format the summary printed at the end of `generate`.
    pub fn format_summary(&self) -> String {
        let s = &self.stats;
        let mut out = String::new();
        out.push_str("--- Search Summary ---\n\n");
        let _ = writeln!(out, "  Outcome:             {}", self.outcome);
        let _ = writeln!(out, "  Variants:            {}", self.outputs);
        let _ = writeln!(
            out,
            "  Hole coverage:       {}/{}",
            self.coverage.reached, self.coverage.total
        );
        let _ = writeln!(out, "  Runs:                {}", s.runs);
        let _ = writeln!(out, "  Invocations:         {}", s.invocations);
        let _ = writeln!(out, "  Holes resolved:      {}", s.holes_resolved);
        let _ = writeln!(
            out,
            "  Oracle queries:      {} ({} pruned, {} unbuildable)",
            s.oracle_queries, s.pruned_conditions, s.unbuildable
        );
        if s.hot_fills > 0 {
            let _ = writeln!(out, "  Hot fills:           {}", s.hot_fills);
        }
        let _ = writeln!(
            out,
            "  Wasted trials:       {} ({} duplicate, {} not compiling)",
            s.wasted_trials(),
            s.duplicates,
            s.compile_failures + s.hot_fill_failures
        );
        if s.runtime_faults > 0 {
            let _ = writeln!(out, "  Runtime faults:      {}", s.runtime_faults);
        }
        out
    }

    pub fn print_summary(&self) {
        println!("{}", self.format_summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_counters() {
        let report = CampaignReport {
            outcome: Outcome::Exhausted,
            outputs: 3,
            coverage: Coverage {
                reached: 1,
                total: 1,
            },
            stats: Stats {
                runs: 3,
                invocations: 3,
                duplicates: 1,
                compile_failures: 2,
                ..Stats::default()
            },
        };
        let text = report.format_summary();
        assert!(text.starts_with("--- Search Summary ---"));
        assert!(text.contains("  Outcome:             search space exhausted\n"));
        assert!(text.contains("  Wasted trials:       3 (1 duplicate, 2 not compiling)\n"));
        assert!(!text.contains("Hot fills"));
        assert!(!text.contains("Runtime faults"));
    }
}
