// src/bin/holesmith.rs

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{CommandFactory, FromArgMatches};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::FormatTime;

use holesmith::cli::{Cli, Commands};
use holesmith::commands::generate::generate;
use holesmith::commands::templates::list_templates;
use holesmith::commands::version::print_version;

/// A timer that outputs nothing but still enables span timing calculation
struct NoTimestamp;

impl FormatTime for NoTimestamp {
    fn format_time(
        &self,
        _w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> std::fmt::Result {
        Ok(())
    }
}

fn init_tracing() {
    // HOLESMITH_LOG_STYLE: "compact" (default) or "full" (with timestamps)
    let Ok(filter) = EnvFilter::try_from_env("HOLESMITH_LOG") else {
        return;
    };
    let style = std::env::var("HOLESMITH_LOG_STYLE").unwrap_or_default();
    if style == "full" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_timer(NoTimestamp)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    }
    tracing::debug!("tracing initialized");
}

fn main() -> ExitCode {
    init_tracing();

    let styles = Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default());

    let cli = match Cli::from_arg_matches(&Cli::command().styles(styles).get_matches()) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    match cli.command {
        Commands::Generate(args) => generate(&args, cli.color),
        Commands::Templates => list_templates(cli.color),
        Commands::Version => print_version(),
    }
}
