// src/search/site.rs
//! The hole site driven by a campaign during execution.

use holesmith_choice::{Environment, Evaluator, Explorer, Fault, InternalFault, Printer};
use holesmith_oracle::{Oracle, Translation, Verdict};
use holesmith_ops::Value;

use super::state::{Phase, RunState, SearchState};
use crate::config::{SearchConfig, Strategy};
use crate::output::Stats;
use crate::target::HoleSite;
use crate::template::{Hole, HoleId, Template};

/// Consecutive oracle faults tolerated before pruning is switched off.
pub const MAX_ORACLE_FAULTS: usize = 3;

/// Resolves holes for one run.
pub struct RunSite<'a> {
    pub template: &'a Template,
    pub config: &'a SearchConfig,
    pub state: &'a mut SearchState,
    pub run: &'a mut RunState,
    pub oracle: &'a mut dyn Oracle,
    pub stats: &'a mut Stats,
}

impl RunSite<'_> {
    /// Give a hole reached for the first time this run its next configuration.
    fn fill(&mut self, hole: &Hole, env: &Environment) -> Result<(), Fault> {
        let index = self.run.reached.len();
        self.run.reached.push(hole.id);
        self.state.reached_ever.insert(hole.id);

        let state = &mut *self.state;
        let mut explorer = Explorer::new(
            self.template.arena(),
            &mut state.choices,
            &self.config.domains,
            env,
        );
        match self.config.strategy {
            Strategy::Random => explorer.step_random(hole.root, &mut state.rng)?,
            Strategy::Systematic => {
                let fresh = state.stepped.insert(hole.id);
                if fresh || state.cursor.steps(index) {
                    explorer.step_systematic(hole.root)?;
                }
            }
            Strategy::Hybrid => {
                if explorer.step_systematic(hole.root)? {
                    state.exhausted.insert(hole.id);
                }
            }
        }

        let text = Printer::new(self.template.arena(), &self.state.choices).render_bare(hole.root)?;
        tracing::trace!(hole = %hole.id, %text, "filled");
        self.stats.holes_resolved += 1;
        if self.config.oracle_pruning && !self.state.oracle_disabled && hole.is_condition() {
            self.consult(hole, &text)?;
        }
        self.run.fills.insert(hole.id, text);
        Ok(())
    }

    /// Ask the oracle whether a freshly filled condition is constant.
    fn consult(&mut self, hole: &Hole, text: &str) -> Result<(), Fault> {
        let key = (hole.id, text.to_string());
        let verdict = match self.state.verdicts.get(&key) {
            Some(verdict) => *verdict,
            None => {
                let verdict = self.decide(hole)?;
                self.state.verdicts.insert(key, verdict);
                verdict
            }
        };
        if let Some(value) = verdict.fixed_value() {
            tracing::debug!(hole = %hole.id, %verdict, "condition fixed");
            self.stats.pruned_conditions += 1;
            self.run.conditions.insert(hole.id, value);
            if let Some(guard) = &hole.guard {
                self.run
                    .never_reachable
                    .extend(guard.unreachable_when(value).iter().copied());
            }
        }
        Ok(())
    }

    fn decide(&mut self, hole: &Hole) -> Result<Verdict, Fault> {
        let query = match holesmith_oracle::translate(
            self.template.arena(),
            &self.state.choices,
            hole.root,
        )? {
            Translation::Buildable(query) => query,
            Translation::Unbuildable(blocker) => {
                tracing::trace!(hole = %hole.id, blocker = blocker.as_str(), "not translatable");
                self.stats.unbuildable += 1;
                return Ok(Verdict::Unknown);
            }
        };
        self.stats.oracle_queries += 1;
        match self.oracle.check(&query) {
            Ok(verdict) => {
                self.state.oracle_faults = 0;
                Ok(verdict)
            }
            Err(fault) => {
                tracing::warn!(hole = %hole.id, %fault, "oracle failed");
                self.state.oracle_faults += 1;
                if self.state.oracle_faults >= MAX_ORACLE_FAULTS {
                    tracing::warn!(
                        faults = self.state.oracle_faults,
                        "disabling condition pruning"
                    );
                    self.state.oracle_disabled = true;
                }
                Ok(Verdict::Unknown)
            }
        }
    }

    fn record(&mut self, hole: &Hole, value: &Value) {
        if hole.is_condition()
            && let Some(outcome) = value.as_bool()
        {
            self.run.traces.entry(hole.id).or_default().push(outcome);
        }
    }
}

impl HoleSite for RunSite<'_> {
    fn resolve(&mut self, id: HoleId, env: &mut Environment) -> Result<Value, Fault> {
        if self.state.phase != Phase::Execute {
            return Err(InternalFault::Unsupervised { hole: id.0 }.into());
        }
        let template = self.template;
        let hole = template
            .hole(id)
            .ok_or(InternalFault::UnknownHole { hole: id.0 })?;
        if !self.run.fills.contains_key(&id) {
            self.fill(hole, env)?;
        }
        let value = Evaluator::new(template.arena(), &self.state.choices)
            .evaluate(hole.root, env)?
            .value;
        self.record(hole, &value);
        Ok(value)
    }

    fn observe(&mut self, id: HoleId, value: &Value) {
        if let Some(hole) = self.template.hole(id) {
            self.record(hole, value);
        }
    }
}
