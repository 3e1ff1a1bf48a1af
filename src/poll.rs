//! Polling loop shared by the blocking and async clients.
//!
//! The loop body exists twice, once per color, but both take the status
//! check, the result fetch, and the wait primitive as injected operations,
//! so the clients only decide *how* to perform each step.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::models::{FileStatus, JobState};
use crate::table::DataTable;

/// Controls how a validation job is polled and what the outcome looks like.
///
/// Defaults match the hosted API guidance: check every 5 seconds, give up
/// after 60 checks, keep the results in memory, and parse them into a
/// [`DataTable`].
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub(crate) interval_secs: u64,
    pub(crate) max_attempts: u32,
    pub(crate) output_path: Option<PathBuf>,
    pub(crate) return_table: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 60,
            output_path: None,
            return_table: true,
        }
    }
}

impl PollOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds to wait between status checks.
    ///
    /// Zero is accepted and busy-polls the API; prefer at least one second.
    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    /// Upper bound on status checks; must be at least 1. Together with the
    /// interval this caps the total time spent polling at
    /// `interval * max_attempts` seconds.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Write the finished results to this path instead of keeping them only
    /// in memory.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Whether to parse the finished results into a [`DataTable`] (the
    /// default) or hand back the raw download.
    pub fn with_return_table(mut self, return_table: bool) -> Self {
        self.return_table = return_table;
        self
    }

    pub(crate) fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub(crate) fn budget_secs(&self) -> u64 {
        self.interval_secs * u64::from(self.max_attempts)
    }
}

/// Terminal result of polling a validation job.
///
/// Which variant comes back is decided by the [`PollOptions`]: a table when
/// `return_table` is set, otherwise the saved path or the raw bytes.
#[derive(Debug)]
pub enum PollOutcome {
    /// Results parsed into rows and columns.
    Table(DataTable),
    /// Results saved to disk at this path.
    Saved(PathBuf),
    /// Raw downloaded bytes.
    Content(Vec<u8>),
}

impl PollOutcome {
    pub fn into_table(self) -> Option<DataTable> {
        match self {
            PollOutcome::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            PollOutcome::Saved(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            PollOutcome::Content(bytes) => Some(bytes),
            _ => None,
        }
    }
}

enum Step {
    Finish,
    Fail(Error),
    Wait,
}

fn next_step(status: &FileStatus) -> Step {
    match status.status {
        JobState::Completed => Step::Finish,
        JobState::Failed => {
            let message = status
                .error_message
                .clone()
                .unwrap_or_else(|| "File processing failed".to_string());
            Step::Fail(Error::api(message))
        }
        _ => Step::Wait,
    }
}

/// Blocking poll loop: check, act on terminal states, otherwise wait.
///
/// Performs at most `options.max_attempts` checks; a completed job resolves
/// through `finish`, a failed job stops at its attempt, and exhausting the
/// budget yields the poll-timeout error.
pub(crate) fn run_blocking<C, F, W>(
    options: &PollOptions,
    mut check: C,
    finish: F,
    mut wait: W,
) -> crate::Result<PollOutcome>
where
    C: FnMut() -> crate::Result<FileStatus>,
    F: FnOnce() -> crate::Result<PollOutcome>,
    W: FnMut(Duration),
{
    let mut last_state: Option<JobState> = None;
    for _ in 0..options.max_attempts {
        let status = check()?;
        if last_state != Some(status.status) {
            last_state = Some(status.status);
            eprintln!("File status: {}", status.status);
        }

        match next_step(&status) {
            Step::Finish => return finish(),
            Step::Fail(err) => return Err(err),
            Step::Wait => wait(options.interval()),
        }
    }

    Err(Error::poll_timeout(options.budget_secs()))
}

/// Async poll loop with the same semantics as [`run_blocking`]; the wait
/// future is a suspension point, so dropping the returned future cancels the
/// poll immediately, mid-wait included.
pub(crate) async fn run_async<C, CF, F, FF, W, WF>(
    options: &PollOptions,
    mut check: C,
    finish: F,
    mut wait: W,
) -> crate::Result<PollOutcome>
where
    C: FnMut() -> CF,
    CF: Future<Output = crate::Result<FileStatus>>,
    F: FnOnce() -> FF,
    FF: Future<Output = crate::Result<PollOutcome>>,
    W: FnMut(Duration) -> WF,
    WF: Future<Output = ()>,
{
    let mut last_state: Option<JobState> = None;
    for _ in 0..options.max_attempts {
        let status = check().await?;
        if last_state != Some(status.status) {
            last_state = Some(status.status);
            eprintln!("File status: {}", status.status);
        }

        match next_step(&status) {
            Step::Finish => return finish().await,
            Step::Fail(err) => return Err(err),
            Step::Wait => wait(options.interval()).await,
        }
    }

    Err(Error::poll_timeout(options.budget_secs()))
}
