// src/search/mod.rs
//! The search driver.
//!
//! A [`Campaign`] repeatedly runs a [`Target`], resolving every reached
//! hole to a fresh configuration, and turns each run's filling into a
//! program variant. Each run goes through three phases:
//!
//! - setup: restore the target to its initial state
//! - execute: invoke the entry point until every reachable hole is filled
//!   (or the invocation budget runs out), hot-filling between invocations
//! - teardown: render the filling, reject duplicates and units that do not
//!   compile, and hand the rest to a [`VariantSink`]
//!
//! The strategy decides how holes move between runs: random stepping,
//! a systematic enumeration over the reached holes, or a hybrid where each
//! hole cycles through its own domain independently.

mod site;
mod state;


use std::rc::Rc;

use holesmith_choice::{Environment, Explorer, Fault, InternalFault};
use holesmith_oracle::{NoOracle, Oracle};
use rustc_hash::FxHashSet;

pub use site::{MAX_ORACLE_FAULTS, RunSite};
pub use state::{Phase, RunState, SearchState, SystematicCursor};

use crate::compile::{Compiler, SourceCheck, Unit};
use crate::config::{SearchConfig, Strategy};
use crate::errors::CampaignError;
use crate::output::{Artifacts, CampaignReport, Coverage, Outcome, Stats, Variant, VariantSink};
use crate::target::{Specialization, Target};
use crate::template::{HoleId, Rendering, Template, render_unit};

pub struct Campaign {
    config: SearchConfig,
    template: Rc<Template>,
    target: Box<dyn Target>,
    compiler: Box<dyn Compiler>,
    oracle: Box<dyn Oracle>,
    state: SearchState,
    stats: Stats,
    artifacts: Artifacts,
}

impl Campaign {
    pub fn new(config: SearchConfig, target: Box<dyn Target>) -> Self {
        let template = target.template();
        let state = SearchState::new(&template, config.seed);
        let artifacts = Artifacts::new(template.hole_count());
        Self {
            config,
            template,
            target,
            compiler: Box::new(SourceCheck),
            oracle: Box::new(NoOracle),
            state,
            stats: Stats::default(),
            artifacts,
        }
    }

    pub fn with_compiler(mut self, compiler: Box<dyn Compiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_oracle(mut self, oracle: Box<dyn Oracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Run the campaign to completion, streaming variants into `sink`.
    pub fn run(&mut self, sink: &mut dyn VariantSink) -> Result<CampaignReport, CampaignError> {
        let span = tracing::info_span!(
            "campaign",
            template = self.template.name(),
            strategy = self.config.strategy.as_str()
        );
        let _enter = span.enter();
        tracing::info!(
            holes = self.template.hole_count(),
            outputs = self.config.outputs,
            exhaustive = self.config.exhaustive,
            "starting"
        );

        let outcome = loop {
            self.setup();
            let run = self.execute()?;
            if let Some(outcome) = self.teardown(run, sink)? {
                break outcome;
            }
            if let Some(outcome) = self.done() {
                break outcome;
            }
        };
        self.state.phase = Phase::Idle;

        self.artifacts.outputs = self.state.outputs;
        self.artifacts.reached = self.state.reached_ever.clone();
        sink.finish(&self.artifacts)?;

        let report = CampaignReport {
            outcome,
            outputs: self.state.outputs,
            coverage: Coverage {
                reached: self.state.reached_ever.len(),
                total: self.template.hole_count(),
            },
            stats: self.stats.clone(),
        };
        tracing::info!(
            %outcome,
            outputs = report.outputs,
            runs = self.stats.runs,
            wasted = self.stats.wasted_trials(),
            "finished"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    fn setup(&mut self) {
        self.state.phase = Phase::Setup;
        self.target.restore();
    }

    fn execute(&mut self) -> Result<RunState, CampaignError> {
        self.state.phase = Phase::Execute;
        self.stats.runs += 1;
        let total = self.template.hole_count();
        let mut run = RunState::default();
        let mut seen = FxHashSet::default();
        seen.insert(self.target.fingerprint());

        for _ in 0..self.config.max_invocations {
            let filled_before = run.fills.len();
            let mut site = RunSite {
                template: &self.template,
                config: &self.config,
                state: &mut self.state,
                run: &mut run,
                oracle: self.oracle.as_mut(),
                stats: &mut self.stats,
            };
            let result = self.target.invoke(&mut site);
            self.stats.invocations += 1;
            match result {
                Ok(()) => {}
                Err(Fault::Runtime(fault)) => {
                    tracing::trace!(kind = fault.kind(), "runtime fault");
                    self.stats.runtime_faults += 1;
                    self.artifacts.faults.record(&fault);
                }
                Err(Fault::Internal(source)) => return Err(CampaignError::Internal { source }),
                Err(Fault::Domain(source)) => {
                    let hole = run.reached.last().copied().unwrap_or(HoleId(0));
                    return Err(CampaignError::Domain { hole, source });
                }
            }

            if !self.config.mimic_execution {
                if run.all_reachable_filled(total) {
                    break;
                }
                if self.config.stop_early && !seen.insert(self.target.fingerprint()) {
                    break;
                }
            }
            if (self.config.hot_fill || self.config.oracle_pruning)
                && run.fills.len() > filled_before
                && !self.hot_fill(&run)?
            {
                run.hot_fill_failed = true;
                break;
            }
        }

        if self.config.mimic_execution {
            run.checksum = Some(self.target.fingerprint());
        }
        tracing::debug!(
            run = self.stats.runs,
            filled = run.fills.len(),
            reached = ?run.reached,
            "run executed"
        );
        Ok(run)
    }

    /// Compile the holes filled so far into the target. Returns `false`
    /// when the partial unit does not compile.
    fn hot_fill(&mut self, run: &RunState) -> Result<bool, CampaignError> {
        let name = self.class_name(self.state.outputs + 1);
        let source = render_unit(
            &self.template,
            &Rendering {
                class_name: &name,
                fills: &run.fills,
                conditions: &run.conditions,
                invocations: self.config.max_invocations,
            },
        )?;
        let unit = Unit {
            name,
            source,
            partial: true,
        };
        if let Err(fault) = self.compiler.compile(&unit) {
            tracing::warn!(%fault, "hot fill does not compile");
            self.stats.hot_fill_failures += 1;
            return Ok(false);
        }
        self.target.relink(Specialization {
            config: self.state.choices.clone(),
            frozen: run.fills.keys().copied().collect(),
            conditions: run.conditions.clone(),
        });
        self.stats.hot_fills += 1;
        tracing::debug!(filled = run.fills.len(), "hot filled");
        Ok(true)
    }

    /// Turn a finished run into a variant. Returns an outcome when the
    /// campaign cannot continue.
    fn teardown(
        &mut self,
        run: RunState,
        sink: &mut dyn VariantSink,
    ) -> Result<Option<Outcome>, CampaignError> {
        self.state.phase = Phase::Teardown;

        if run.fills.is_empty() {
            let class_name = self.class_name(0);
            tracing::info!(class = %class_name, "no hole reached; emitting the template as is");
            let source = self.render(&class_name, &run)?;
            self.emit(
                Variant {
                    index: 0,
                    class_name,
                    source,
                    filling: run.fills,
                    traces: run.traces,
                    checksum: run.checksum,
                },
                sink,
            )?;
            return Ok(Some(Outcome::NoHoleReached));
        }

        let fresh = self.state.memo.insert(run.serialized());
        if self.config.strategy == Strategy::Systematic {
            self.state.cursor = self.advance_cursor(&run)?;
        }
        if !fresh {
            tracing::debug!("duplicate filling");
            self.stats.duplicates += 1;
            self.state.repeated += 1;
            return Ok(None);
        }
        if run.hot_fill_failed {
            self.state.repeated += 1;
            return Ok(None);
        }

        let index = self.state.outputs + 1;
        let class_name = self.class_name(index);
        let source = self.render(&class_name, &run)?;
        if !self.config.allow_non_compiling {
            let unit = Unit {
                name: class_name.clone(),
                source: source.clone(),
                partial: false,
            };
            if let Err(fault) = self.compiler.compile(&unit) {
                tracing::warn!(class = %class_name, %fault, "variant does not compile");
                self.stats.compile_failures += 1;
                self.state.repeated += 1;
                return Ok(None);
            }
        }

        self.emit(
            Variant {
                index,
                class_name,
                source,
                filling: run.fills,
                traces: run.traces,
                checksum: run.checksum,
            },
            sink,
        )?;
        self.state.outputs = index;
        self.state.repeated = 0;
        Ok(None)
    }

    fn emit(&mut self, variant: Variant, sink: &mut dyn VariantSink) -> Result<(), CampaignError> {
        tracing::info!(
            index = variant.index,
            class = %variant.class_name,
            holes = variant.filling.len(),
            "variant"
        );
        self.artifacts.record_variant(&variant);
        sink.accept(&variant)
    }

    fn done(&self) -> Option<Outcome> {
        let outputs_reached = self.config.bounded() && self.state.outputs >= self.config.outputs;
        let exhausted = match self.config.strategy {
            Strategy::Systematic => {
                (self.state.cursor == SystematicCursor::Exhausted).then_some(Outcome::Exhausted)
            }
            Strategy::Hybrid => (self.state.exhausted.len() == self.template.hole_count())
                .then_some(Outcome::AllHolesExhausted),
            Strategy::Random => None,
        };
        // Systematic runs end only on the cursor or the output budget.
        let repeated = self.config.strategy != Strategy::Systematic
            && self.state.repeated >= self.config.max_repeated_trials;
        exhausted
            .or(outputs_reached.then_some(Outcome::OutputBudget))
            .or(repeated.then_some(Outcome::RepeatedTrials))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Find the last reached hole that can still advance.
    fn advance_cursor(&mut self, run: &RunState) -> Result<SystematicCursor, CampaignError> {
        // Every reached tree is already built, so no symbols are needed.
        let env = Environment::new();
        let mut explorer = Explorer::new(
            self.template.arena(),
            &mut self.state.choices,
            &self.config.domains,
            &env,
        );
        for (index, hole) in run.reached.iter().enumerate().rev() {
            let root = self
                .template
                .hole(*hole)
                .ok_or(InternalFault::UnknownHole { hole: hole.0 })?
                .root;
            let more = explorer.has_next(root).map_err(|fault| match fault {
                Fault::Domain(source) => CampaignError::Domain {
                    hole: *hole,
                    source,
                },
                Fault::Internal(source) => CampaignError::Internal { source },
                Fault::Runtime(fault) => CampaignError::Internal {
                    source: InternalFault::TypeMismatch {
                        node: root,
                        detail: fault.to_string(),
                    },
                },
            })?;
            if more {
                return Ok(SystematicCursor::From(index));
            }
        }
        Ok(SystematicCursor::Exhausted)
    }

    fn render(&self, class_name: &str, run: &RunState) -> Result<String, CampaignError> {
        Ok(render_unit(
            &self.template,
            &Rendering {
                class_name,
                fills: &run.fills,
                conditions: &run.conditions,
                invocations: self.config.max_invocations,
            },
        )?)
    }

    fn class_name(&self, index: usize) -> String {
        format!(
            "{}{}{}",
            self.template.name(),
            self.config.class_postfix,
            index
        )
    }
}
