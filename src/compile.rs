// src/compile.rs
//! The compiler seam.
//!
//! Every emitted variant, and every hot-fill specialization, is handed to a
//! [`Compiler`] first. A rejected variant is discarded as a wasted trial.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::sync::mpsc;
use std::os::unix::process::CommandExt;
use std::time::{Duration, Instant};

use regex::Regex;
use thiserror::Error;

/// A compilation unit: one top-level class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
    pub source: String,
    /// Set for hot-fill specializations that still contain unresolved holes.
    pub partial: bool,
}

#[derive(Debug, Error)]
pub enum CompileFault {
    #[error("unexpected '{found}' at line {line}")]
    Unbalanced { line: usize, found: char },

    #[error("'{open}' opened at line {line} is never closed")]
    Unclosed { line: usize, open: char },

    #[error("no declaration of public class {name}")]
    MissingClass { name: String },

    #[error("hole {hole} is unfilled and the unit declares no hole helper")]
    MissingHoleHelper { hole: u32 },

    #[error("invalid built-in pattern: {0}")]
    Pattern(regex::Error),

    #[error("failed to spawn compiler `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compiler i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("compiler timed out after {0:.2?}")]
    TimedOut(Duration),

    #[error("compiler exited with {status}: {stderr}")]
    Rejected { status: String, stderr: String },
}

pub trait Compiler {
    fn compile(&mut self, unit: &Unit) -> Result<(), CompileFault>;
}

// ---------------------------------------------------------------------------
// SourceCheck
// ---------------------------------------------------------------------------

struct Patterns {
    class: Regex,
    hole_call: Regex,
    helper: Regex,
}

static PATTERNS: LazyLock<Result<Patterns, regex::Error>> = LazyLock::new(|| {
    Ok(Patterns {
        class: Regex::new(r"(?m)^\s*public\s+class\s+([A-Za-z_$][\w$]*)\s*\{")?,
        hole_call: Regex::new(r"\bhole\((\d+)\)")?,
        helper: Regex::new(r"static\s+<T>\s+T\s+hole\(int\s+\w+\)")?,
    })
});

/// The built-in compiler: structural checks on the rendered text.
///
/// Checks that delimiters balance outside literals and comments, that the
/// unit declares its class, and that residual hole calls have the helper
/// they need.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceCheck;

impl Compiler for SourceCheck {
    fn compile(&mut self, unit: &Unit) -> Result<(), CompileFault> {
        let patterns = PATTERNS.as_ref().map_err(|e| CompileFault::Pattern(e.clone()))?;
        check_balance(&unit.source)?;

        let declares = patterns
            .class
            .captures_iter(&unit.source)
            .any(|c| &c[1] == unit.name);
        if !declares {
            return Err(CompileFault::MissingClass {
                name: unit.name.clone(),
            });
        }

        if let Some(call) = patterns.hole_call.captures(&unit.source)
            && !patterns.helper.is_match(&unit.source)
        {
            return Err(CompileFault::MissingHoleHelper {
                hole: call[1].parse().unwrap_or(0),
            });
        }
        Ok(())
    }
}

fn check_balance(source: &str) -> Result<(), CompileFault> {
    let mut open: Vec<(char, usize)> = Vec::new();
    let mut line = 1;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            '"' | '\'' => {
                // Skip the literal, honoring escapes.
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => {
                            chars.next();
                        }
                        '\n' => line += 1,
                        _ if inner == c => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '(' | '[' | '{' => open.push((c, line)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match open.pop() {
                    Some((opener, _)) if opener == expected => {}
                    _ => return Err(CompileFault::Unbalanced { line, found: c }),
                }
            }
            _ => {}
        }
    }
    match open.pop() {
        Some((open, line)) => Err(CompileFault::Unclosed { line, open }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// CommandCompiler
// ---------------------------------------------------------------------------

/// Runs an external compiler on each complete unit.
///
/// The unit is written to `<dir>/<name>.java` in a fresh temporary
/// directory. `{file}` and `{dir}` in the command are replaced by those
/// paths; a command without `{file}` gets the file appended.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    command: String,
    timeout: Option<Duration>,
}

impl CommandCompiler {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Compiler for CommandCompiler {
    fn compile(&mut self, unit: &Unit) -> Result<(), CompileFault> {
        if unit.partial {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let file = dir.path().join(format!("{}.java", unit.name));
        std::fs::write(&file, &unit.source)?;

        let command = expand_placeholders(
            &self.command,
            &file.to_string_lossy(),
            &dir.path().to_string_lossy(),
        );
        let start = Instant::now();
        let result = run_command(&command, dir.path(), self.timeout);
        tracing::trace!(unit = %unit.name, elapsed = ?start.elapsed(), "compiler finished");
        result
    }
}

fn expand_placeholders(template: &str, file: &str, dir: &str) -> String {
    let mut command = template.replace("{file}", file).replace("{dir}", dir);
    if !template.contains("{file}") {
        command.push(' ');
        command.push_str(file);
    }
    command
}

/// Spawn a shell command in its own process group and wait for it, killing
/// the whole group if the deadline passes.
fn run_command(command: &str, working_dir: &Path, deadline: Option<Duration>) -> Result<(), CompileFault> {
    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .spawn()
        .map_err(|source| CompileFault::Spawn {
            command: command.to_string(),
            source,
        })?;

    let child_pid = child.id();
    let (output, timed_out) = match deadline {
        Some(timeout) => {
            let (tx, rx) = mpsc::channel::<()>();
            let watcher = std::thread::spawn(move || {
                if rx.recv_timeout(timeout).is_err() {
                    kill_process_group(child_pid);
                    true
                } else {
                    false
                }
            });
            let output = child.wait_with_output();
            let _ = tx.send(());
            (output, watcher.join().unwrap_or(false))
        }
        None => (child.wait_with_output(), false),
    };

    if timed_out {
        return Err(CompileFault::TimedOut(deadline.unwrap_or_default()));
    }
    let output = output?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(CompileFault::Rejected {
        status: output.status.to_string(),
        stderr: stderr.lines().take(5).collect::<Vec<_>>().join("\n"),
    })
}

/// Send SIGKILL to an entire process group.
fn kill_process_group(pid: u32) {
    // SAFETY: killpg only sends a signal. The child was spawned with
    // process_group(0), so its pid is its pgid.
    unsafe {
        libc::killpg(pid as libc::pid_t, libc::SIGKILL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, source: &str) -> Unit {
        Unit {
            name: name.to_string(),
            source: source.to_string(),
            partial: false,
        }
    }

    const GOOD: &str = "public class A {\n    static void entry() {\n        x = a[0];\n    }\n}\n";

    #[test]
    fn accepts_well_formed_unit() {
        SourceCheck.compile(&unit("A", GOOD)).unwrap();
    }

    #[test]
    fn rejects_unbalanced_delimiters() {
        let err = SourceCheck
            .compile(&unit("A", "public class A {\n    x = (1];\n}\n"))
            .unwrap_err();
        assert!(matches!(err, CompileFault::Unbalanced { line: 2, found: ']' }));

        let err = SourceCheck
            .compile(&unit("A", "public class A {\n"))
            .unwrap_err();
        assert!(matches!(err, CompileFault::Unclosed { line: 1, open: '{' }));
    }

    #[test]
    fn literals_and_comments_do_not_count() {
        let source = "public class A {\n    // ) stray\n    s = \"}\" + '{' + \"\\\"(\";\n}\n";
        SourceCheck.compile(&unit("A", source)).unwrap();
    }

    #[test]
    fn class_name_must_match() {
        let err = SourceCheck.compile(&unit("B", GOOD)).unwrap_err();
        assert!(matches!(err, CompileFault::MissingClass { name } if name == "B"));
    }

    #[test]
    fn hole_calls_need_the_helper() {
        let bare = "public class A {\n    static void entry() {\n        x = hole(3);\n    }\n}\n";
        let err = SourceCheck.compile(&unit("A", bare)).unwrap_err();
        assert!(matches!(err, CompileFault::MissingHoleHelper { hole: 3 }));

        let helped = "public class A {\n    static void entry() {\n        x = hole(3);\n    }\n\n    private static <T> T hole(int id) {\n        throw new IllegalStateException(\"hole \" + id);\n    }\n}\n";
        SourceCheck.compile(&unit("A", helped)).unwrap();
    }

    #[test]
    fn placeholders() {
        assert_eq!(
            expand_placeholders("javac -d {dir} {file}", "/t/A.java", "/t"),
            "javac -d /t /t/A.java"
        );
        assert_eq!(expand_placeholders("javac", "/t/A.java", "/t"), "javac /t/A.java");
    }

    #[test]
    fn command_compiler_runs_on_the_written_file() {
        let mut ok = CommandCompiler::new("grep -q 'class A' {file}").with_timeout(Duration::from_secs(10));
        ok.compile(&unit("A", GOOD)).unwrap();

        let mut rejecting = CommandCompiler::new("grep -q 'class Z' {file}");
        assert!(matches!(
            rejecting.compile(&unit("A", GOOD)),
            Err(CompileFault::Rejected { .. })
        ));
    }

    #[test]
    fn command_compiler_skips_partial_units() {
        let mut compiler = CommandCompiler::new("false");
        let mut partial = unit("A", GOOD);
        partial.partial = true;
        compiler.compile(&partial).unwrap();
    }

    #[test]
    fn slow_compiler_times_out() {
        let mut compiler =
            CommandCompiler::new("sleep 5 # {file}").with_timeout(Duration::from_millis(100));
        let start = Instant::now();
        assert!(matches!(
            compiler.compile(&unit("A", GOOD)),
            Err(CompileFault::TimedOut(_))
        ));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
