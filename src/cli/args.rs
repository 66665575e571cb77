// src/cli/args.rs

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands::version::version_string;
use crate::config::Strategy;

/// Color output mode
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect based on terminal
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorMode {
    /// Whether diagnostics on stderr should be styled.
    pub fn styled(self) -> bool {
        use std::io::IsTerminal;
        match self {
            ColorMode::Auto => std::io::stderr().is_terminal(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Synthesize program variants from templates with holes
#[derive(Parser)]
#[command(name = "holesmith")]
#[command(version = version_string())]
#[command(about = "Synthesize program variants from templates with holes", long_about = None)]
pub struct Cli {
    /// Color output: auto, always, never
    #[arg(long, global = true, hide = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search a template and write the variants it yields
    #[command(visible_alias = "g")]
    Generate(GenerateArgs),
    /// List the embedded demo templates
    Templates,
    /// Show version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Embedded demo name or path to a template .toml file
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Profile name (default, quick, systematic, hybrid, boundary) or path
    #[arg(short, long, default_value = "default")]
    pub profile: String,

    /// Override the profile's search strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Seed for random stepping
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of variants to produce
    #[arg(short = 'n', long)]
    pub outputs: Option<usize>,

    /// Enumerate until the space is exhausted (systematic and hybrid)
    #[arg(long)]
    pub exhaustive: bool,

    /// Entry-point invocations per run
    #[arg(long, value_name = "N")]
    pub invocations: Option<usize>,

    /// Do not compile filled holes into the target between invocations
    #[arg(long)]
    pub no_hot_fill: bool,

    /// Do not consult the oracle about conditions
    #[arg(long)]
    pub no_oracle: bool,

    /// Keep invoking when the program state repeats
    #[arg(long)]
    pub no_stop_early: bool,

    /// Run every invocation and record a state checksum per variant
    #[arg(long)]
    pub mimic: bool,

    /// Emit variants without compiling them
    #[arg(long)]
    pub allow_non_compiling: bool,

    /// SMT solver command, e.g. "z3 -in -smt2"
    #[arg(long, value_name = "CMD")]
    pub solver: Option<String>,

    /// Compiler command; `{file}` is replaced by the source path
    #[arg(long, value_name = "CMD")]
    pub compiler: Option<String>,

    /// Directory the variants are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Search without writing any files
    #[arg(long)]
    pub dry_run: bool,
}
