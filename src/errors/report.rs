// src/errors/report.rs
//! Drawing diagnostics for the terminal.

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, ThemeCharacters, ThemeStyles};

/// How a diagnostic is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Unicode box drawing with ANSI colors.
    Fancy,
    /// ASCII only, no escape codes.
    Plain,
}

impl Style {
    pub fn new(styled: bool) -> Self {
        if styled { Style::Fancy } else { Style::Plain }
    }

    fn handler(self) -> GraphicalReportHandler {
        let (characters, styles) = match self {
            Style::Fancy => (ThemeCharacters::unicode(), ThemeStyles::ansi()),
            Style::Plain => (ThemeCharacters::ascii(), ThemeStyles::none()),
        };
        GraphicalReportHandler::new_themed(GraphicalTheme { characters, styles })
    }

    /// Render `report`, falling back to its one-line message if the
    /// graphical handler fails.
    pub fn render(self, report: &dyn Diagnostic) -> String {
        let mut output = String::new();
        match self.handler().render_report(&mut output, report) {
            Ok(()) => output,
            Err(_) => format!("error: {report}\n"),
        }
    }
}

/// Print `report` to stderr and note its code in the log.
pub fn print_diagnostic(report: &dyn Diagnostic, styled: bool) {
    let code = report.code().map(|c| c.to_string()).unwrap_or_default();
    tracing::debug!(%code, "reporting diagnostic");
    eprint!("{}", Style::new(styled).render(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ConfigError, TemplateError};

    fn unknown_profile() -> ConfigError {
        ConfigError::UnknownProfile {
            name: "turbo".to_string(),
            available: "default, quick".to_string(),
        }
    }

    #[test]
    fn plain_output_has_code_and_help() {
        let output = Style::Plain.render(&unknown_profile());
        assert!(output.contains("H2001"), "missing code: {output}");
        assert!(output.contains("turbo"));
        assert!(output.contains("default, quick"), "missing help: {output}");
        assert!(!output.contains('\u{1b}'), "plain output is uncolored");
        assert!(output.is_ascii());
    }

    #[test]
    fn fancy_output_uses_unicode_frames() {
        let output = Style::new(true).render(&unknown_profile());
        assert!(output.contains("H2001"));
        assert!(!output.is_ascii());
    }

    #[test]
    fn parse_errors_name_their_source() {
        let err = TemplateError::parse("broken.toml", "name = \n".to_string(), {
            toml::from_str::<toml::Table>("name = \n").unwrap_err()
        });
        let output = Style::Plain.render(&err);
        assert!(output.contains("H1001"));
        assert!(output.contains("broken.toml"), "should name the source: {output}");
    }
}
