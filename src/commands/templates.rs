// src/commands/templates.rs
use std::process::ExitCode;

use crate::cli::ColorMode;
use crate::errors::print_diagnostic;
use crate::template::{Template, available_templates};

/// List the embedded demos with their hole counts.
pub fn list_templates(color: ColorMode) -> ExitCode {
    let mut failed = false;
    for name in available_templates() {
        match Template::load(name) {
            Ok(template) => println!(
                "{name:<14} {:<12} {} holes",
                template.name(),
                template.hole_count()
            ),
            Err(err) => {
                print_diagnostic(&err, color.styled());
                failed = true;
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
