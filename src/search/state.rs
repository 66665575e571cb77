// src/search/state.rs
//! Search state: what survives across runs and what lives for one run.

use std::collections::{BTreeMap, BTreeSet};

use holesmith_choice::Configuration;
use holesmith_oracle::Verdict;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::template::{HoleId, Template};

/// Where the campaign is in its run cycle. Holes may only resolve while
/// executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Setup,
    Execute,
    Teardown,
}

/// Which reached holes the next systematic run advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystematicCursor {
    /// Nothing has run yet; every hole steps.
    Fresh,
    /// Holes reached at this position or later step; earlier ones keep
    /// their configuration.
    From(usize),
    Exhausted,
}

impl SystematicCursor {
    pub fn steps(self, index: usize) -> bool {
        match self {
            SystematicCursor::Fresh => true,
            SystematicCursor::From(first) => index >= first,
            SystematicCursor::Exhausted => false,
        }
    }
}

/// Cross-run state.
#[derive(Debug)]
pub struct SearchState {
    pub phase: Phase,
    /// Configuration of every hole tree.
    pub choices: Configuration,
    /// Serialized fillings already emitted or rejected.
    pub memo: FxHashSet<String>,
    /// Oracle verdicts by condition hole and rendered text.
    pub verdicts: FxHashMap<(HoleId, String), Verdict>,
    pub cursor: SystematicCursor,
    /// Holes stepped at least once (systematic).
    pub stepped: BTreeSet<HoleId>,
    /// Holes whose domain ran out at least once (hybrid).
    pub exhausted: BTreeSet<HoleId>,
    /// Holes filled in any run.
    pub reached_ever: BTreeSet<HoleId>,
    /// Variants emitted so far.
    pub outputs: usize,
    /// Consecutive runs discarded without output.
    pub repeated: usize,
    pub rng: StdRng,
    /// Consecutive oracle faults.
    pub oracle_faults: usize,
    pub oracle_disabled: bool,
}

impl SearchState {
    pub fn new(template: &Template, seed: u64) -> Self {
        Self {
            phase: Phase::Idle,
            choices: Configuration::new(template.arena()),
            memo: FxHashSet::default(),
            verdicts: FxHashMap::default(),
            cursor: SystematicCursor::Fresh,
            stepped: BTreeSet::new(),
            exhausted: BTreeSet::new(),
            reached_ever: BTreeSet::new(),
            outputs: 0,
            repeated: 0,
            rng: StdRng::seed_from_u64(seed),
            oracle_faults: 0,
            oracle_disabled: false,
        }
    }
}

/// Per-run state, discarded at teardown.
#[derive(Debug, Default, Clone)]
pub struct RunState {
    /// Holes in the order they were first reached.
    pub reached: Vec<HoleId>,
    /// Rendered text of each filled hole.
    pub fills: BTreeMap<HoleId, String>,
    /// Conditions the oracle fixed to a constant.
    pub conditions: BTreeMap<HoleId, bool>,
    /// Holes ruled out by a fixed condition.
    pub never_reachable: BTreeSet<HoleId>,
    /// Outcomes of each condition hole, in evaluation order.
    pub traces: BTreeMap<HoleId, Vec<bool>>,
    pub hot_fill_failed: bool,
    pub checksum: Option<u64>,
}

impl RunState {
    /// Whether every hole that can still run has been filled.
    pub fn all_reachable_filled(&self, total: usize) -> bool {
        let covered = self
            .fills
            .keys()
            .chain(self.never_reachable.iter())
            .collect::<BTreeSet<_>>()
            .len();
        covered == total
    }

    /// Canonical form of the filling, used for duplicate detection.
    pub fn serialized(&self) -> String {
        let mut out = String::new();
        for (hole, text) in &self.fills {
            out.push_str(&hole.to_string());
            out.push('\t');
            out.push_str(text);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_steps() {
        assert!(SystematicCursor::Fresh.steps(0));
        assert!(!SystematicCursor::From(2).steps(1));
        assert!(SystematicCursor::From(2).steps(2));
        assert!(!SystematicCursor::Exhausted.steps(5));
    }

    #[test]
    fn reachable_fill_counts_pruned_holes_once() {
        let mut run = RunState::default();
        run.fills.insert(HoleId(1), "true".to_string());
        run.fills.insert(HoleId(3), "x".to_string());
        assert!(!run.all_reachable_filled(3));
        run.never_reachable.insert(HoleId(3));
        assert!(!run.all_reachable_filled(3));
        run.never_reachable.insert(HoleId(2));
        assert!(run.all_reachable_filled(3));
    }

    #[test]
    fn serialization_is_order_independent() {
        let mut a = RunState::default();
        a.fills.insert(HoleId(2), "y".to_string());
        a.fills.insert(HoleId(1), "x = 1".to_string());
        let mut b = RunState::default();
        b.fills.insert(HoleId(1), "x = 1".to_string());
        b.fills.insert(HoleId(2), "y".to_string());
        assert_eq!(a.serialized(), b.serialized());
        assert_eq!(a.serialized(), "1\tx = 1\n2\ty\n");
    }
}
