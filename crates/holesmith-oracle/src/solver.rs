// solver.rs
//! Oracles backed by an external SMT solver process.
//!
//! The solver command runs through `sh -c` in its own process group, reads
//! the query script on stdin and prints one `check-sat` answer per line.

use std::io::Write;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::formula::Query;
use crate::verdict::{SatAnswer, Verdict};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A failed oracle call. The search treats every fault as [`Verdict::Unknown`].
#[derive(Debug, Error)]
pub enum OracleFault {
    #[error("failed to spawn solver `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("solver i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("solver timed out after {0:.2?}")]
    TimedOut(Duration),

    #[error("solver exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("unexpected solver output: {0:?}")]
    Unparseable(String),
}

/// A decision oracle for boolean queries.
pub trait Oracle {
    fn check(&mut self, query: &Query) -> Result<Verdict, OracleFault>;
}

/// An oracle that knows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOracle;

impl Oracle for NoOracle {
    fn check(&mut self, _query: &Query) -> Result<Verdict, OracleFault> {
        Ok(Verdict::Unknown)
    }
}

pub const DEFAULT_SOLVER: &str = "z3 -in -smt2";

/// Runs an external solver once per query.
#[derive(Debug, Clone)]
pub struct SolverOracle {
    command: String,
    timeout: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl SolverOracle {
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

impl Default for SolverOracle {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER).with_timeout(Duration::from_secs(10))
    }
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

impl Oracle for SolverOracle {
    fn check(&mut self, query: &Query) -> Result<Verdict, OracleFault> {
        let start = Instant::now();
        let stdout = self.run(&query.to_smtlib())?;
        let verdict = parse_answers(&stdout)?;
        tracing::trace!(%verdict, elapsed = ?start.elapsed(), "solver answered");
        Ok(verdict)
    }
}

impl SolverOracle {
    fn run(&self, script: &str) -> Result<String, OracleFault> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(|source| OracleFault::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A solver that exits early closes the pipe; its exit status
            // tells the real story.
            let _ = stdin.write_all(script.as_bytes());
        }

        let child_pid = child.id();
        let (output, timed_out) = match self.timeout {
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
            return Err(OracleFault::TimedOut(self.timeout.unwrap_or_default()));
        }
        let output = output?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() && parse_answers(&stdout).is_err() {
            return Err(OracleFault::Failed {
                status: output.status.to_string(),
                stderr: first_line(&String::from_utf8_lossy(&output.stderr)),
            });
        }
        Ok(stdout)
    }
}

/// Send SIGKILL to an entire process group.
fn kill_process_group(pid: u32) {
    // SAFETY: killpg only sends a signal. The child was spawned with
    // process_group(0), so its pid is its pgid.
    unsafe {
        libc::killpg(pid as libc::pid_t, libc::SIGKILL);
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_answers(stdout: &str) -> Result<Verdict, OracleFault> {
    let mut answers = stdout.lines().filter(|l| !l.trim().is_empty());
    let mut next = || {
        answers
            .next()
            .and_then(SatAnswer::parse)
            .ok_or_else(|| OracleFault::Unparseable(first_line(stdout)))
    };
    let formula = next()?;
    if formula == SatAnswer::Unsat {
        return Ok(Verdict::Unsatisfiable);
    }
    let negation = next()?;
    Ok(Verdict::classify(formula, negation))
}

fn first_line(text: &str) -> String {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .chars()
        .take(200)
        .collect()
}
