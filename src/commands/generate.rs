// src/commands/generate.rs
//! The `generate` command: profile, overrides, campaign, summary.

#![allow(unused_assignments)] // False positives from thiserror derive

use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use holesmith_oracle::{NoOracle, Oracle, SolverOracle};
use miette::Diagnostic;
use thiserror::Error;

use crate::cli::{ColorMode, GenerateArgs};
use crate::compile::{CommandCompiler, Compiler, SourceCheck};
use crate::config::{SearchConfig, get_profile};
use crate::errors::{CampaignError, ConfigError, TemplateError, print_diagnostic};
use crate::output::{CampaignReport, DirectorySink, MemorySink};
use crate::search::Campaign;
use crate::target::ScriptTarget;
use crate::template::Template;

#[derive(Error, Debug, Diagnostic)]
pub enum GenerateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Campaign(#[from] CampaignError),
}

pub fn generate(args: &GenerateArgs, color: ColorMode) -> ExitCode {
    match run_generate(args) {
        Ok(report) => {
            report.print_summary();
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_diagnostic(&err, color.styled());
            ExitCode::FAILURE
        }
    }
}

pub fn run_generate(args: &GenerateArgs) -> Result<CampaignReport, GenerateError> {
    let config = resolve_config(args)?;
    let template = Rc::new(Template::load(&args.template)?);
    tracing::debug!(template = template.name(), ?config, "resolved");

    let target = ScriptTarget::new(Rc::clone(&template)).with_max_steps(config.max_steps);
    let compiler = compiler_for(&config);
    let oracle = oracle_for(&config);
    let output_dir = config.output_dir.clone();
    let mut campaign = Campaign::new(config, Box::new(target))
        .with_compiler(compiler)
        .with_oracle(oracle);

    if args.dry_run {
        let mut sink = MemorySink::new();
        let report = campaign.run(&mut sink)?;
        for variant in &sink.variants {
            println!("{}", variant.class_name);
        }
        return Ok(report);
    }
    let mut sink = DirectorySink::new(output_dir);
    let report = campaign.run(&mut sink)?;
    println!(
        "wrote {} files to {}",
        sink.written().len(),
        sink.dir().display()
    );
    Ok(report)
}

/// Load the profile and apply command-line overrides.
pub fn resolve_config(args: &GenerateArgs) -> Result<SearchConfig, ConfigError> {
    let mut config = get_profile(&args.profile)?;
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(outputs) = args.outputs {
        config.outputs = outputs;
    }
    if let Some(invocations) = args.invocations {
        config.max_invocations = invocations;
    }
    config.exhaustive |= args.exhaustive;
    config.hot_fill &= !args.no_hot_fill;
    config.oracle_pruning &= !args.no_oracle;
    config.stop_early &= !args.no_stop_early;
    config.mimic_execution |= args.mimic;
    config.allow_non_compiling |= args.allow_non_compiling;
    if let Some(solver) = &args.solver {
        config.solver = Some(solver.clone());
    }
    if let Some(compiler) = &args.compiler {
        config.compiler = Some(compiler.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn compiler_for(config: &SearchConfig) -> Box<dyn Compiler> {
    match &config.compiler {
        Some(command) => Box::new(
            CommandCompiler::new(command.clone())
                .with_timeout(Duration::from_millis(config.compile_timeout_ms)),
        ),
        None => Box::new(SourceCheck),
    }
}

fn oracle_for(config: &SearchConfig) -> Box<dyn Oracle> {
    match &config.solver {
        Some(command) if config.oracle_pruning => Box::new(
            SolverOracle::new(command.clone())
                .with_timeout(Duration::from_millis(config.solver_timeout_ms)),
        ),
        _ => Box::new(NoOracle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;

    fn args(template: &str) -> GenerateArgs {
        GenerateArgs {
            template: template.to_string(),
            profile: "default".to_string(),
            ..GenerateArgs::default()
        }
    }

    #[test]
    fn flags_override_the_profile() {
        let mut args = args("scenario-a");
        args.profile = "quick".to_string();
        args.strategy = Some(Strategy::Hybrid);
        args.seed = Some(9);
        args.no_oracle = true;
        args.mimic = true;
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.strategy, Strategy::Hybrid);
        assert_eq!(config.seed, 9);
        assert_eq!(config.outputs, 10);
        assert!(!config.oracle_pruning);
        assert!(config.hot_fill);
        assert!(config.mimic_execution);
    }

    #[test]
    fn zero_outputs_rejected() {
        let mut args = args("scenario-a");
        args.outputs = Some(0);
        assert!(matches!(resolve_config(&args), Err(ConfigError::ZeroOutputs)));
    }

    #[test]
    fn writes_variants_to_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut args = args("scenario-a");
        args.profile = "systematic".to_string();
        args.output_dir = Some(tmp.path().to_path_buf());
        let report = run_generate(&args).unwrap();
        assert_eq!(report.outputs, 3);
        for index in 1..=3 {
            assert!(tmp.path().join(format!("ScenarioAGen{index}.java")).exists());
        }
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("output.txt")).unwrap(),
            "3\n"
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let mut args = args("scenario-b");
        args.profile = "systematic".to_string();
        args.output_dir = Some(out.clone());
        args.dry_run = true;
        assert_eq!(run_generate(&args).unwrap().outputs, 4);
        assert!(!out.exists());
    }

    #[test]
    fn unknown_template_is_a_template_error() {
        assert!(matches!(
            run_generate(&args("nope")),
            Err(GenerateError::Template(TemplateError::UnknownTemplate { .. }))
        ));
    }
}
