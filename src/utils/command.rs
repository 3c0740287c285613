use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::models::VentiSettings;
use crate::utils::{AppError, AppResult};

/// How a command reached its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Clean exit with something on stdout.
    Success(String),
    /// Launch error, non-zero exit, or anything written to stderr.
    Failure(String),
    /// Deadline hit and the caller asked for that to be an error.
    TimedOut,
    /// Clean exit with neither stdout nor stderr output.
    Empty,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success(_))
    }

    /// Convert into a result for call sites that act on the output.
    /// `Empty` counts as a success with no output.
    pub fn into_result(self, command: &str) -> AppResult<String> {
        match self {
            ExecutionOutcome::Success(out) => Ok(out),
            ExecutionOutcome::Empty => Ok(String::new()),
            ExecutionOutcome::Failure(err) => Err(AppError::CommandFailed(err)),
            ExecutionOutcome::TimedOut => Err(AppError::Timeout(command.to_string())),
        }
    }
}

/// Coerce a probe result to a boolean. An absent (timed out, ignored) result
/// and an `Empty` one both mean "not yet true".
pub fn probe_passed(outcome: &Option<ExecutionOutcome>) -> bool {
    outcome.as_ref().map_or(false, ExecutionOutcome::is_success)
}

/// What the Timeout Racer does when the deadline wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Settle with `ExecutionOutcome::TimedOut`.
    Fail,
    /// Settle with no result at all.
    Ignore,
}

/// Shell and environment used for every subprocess. Built once from settings
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOptions {
    pub shell: PathBuf,
    pub env: HashMap<String, String>,
}

impl ShellOptions {
    pub fn from_settings(settings: &VentiSettings) -> Self {
        let current = std::env::var("PATH").unwrap_or_default();
        Self::with_path(settings, &current)
    }

    pub fn with_path(settings: &VentiSettings, current_path: &str) -> Self {
        let mut env = HashMap::new();
        env.insert("PATH".to_string(), widen_path(current_path, &settings.extra_path));
        Self {
            shell: PathBuf::from(&settings.shell),
            env,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.env.get("PATH").map(String::as_str)
    }
}

/// Append `extra` entries to a PATH value, skipping ones already present.
pub fn widen_path(current: &str, extra: &[String]) -> String {
    let mut entries: Vec<&str> = current.split(':').filter(|p| !p.is_empty()).collect();
    for dir in extra {
        if !entries.contains(&dir.as_str()) {
            entries.push(dir);
        }
    }
    entries.join(":")
}

/// One subprocess invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec<'a> {
    pub command: &'a str,
    pub options: &'a ShellOptions,
    /// Value masked in logs and failure messages.
    pub secret: Option<&'a str>,
}

impl<'a> CommandSpec<'a> {
    pub fn new(command: &'a str, options: &'a ShellOptions) -> Self {
        Self {
            command,
            options,
            secret: None,
        }
    }

    pub fn redacting(mut self, secret: &'a str) -> Self {
        self.secret = Some(secret).filter(|s| !s.is_empty());
        self
    }

    fn redact(&self, text: &str) -> String {
        match self.secret {
            Some(secret) => text.replace(secret, "********"),
            None => text.to_string(),
        }
    }
}

/// Launch `spec.command` under the configured shell and classify the result.
///
/// Priority: launch error or non-zero exit, then any stderr output, then
/// non-empty stdout. A clean exit that printed nothing is `Empty`.
pub async fn run_command(spec: CommandSpec<'_>) -> ExecutionOutcome {
    let shown = spec.redact(spec.command);
    log::info!("Executing {}", shown);

    // The child is not killed if this future is dropped by a timeout; tokio
    // reaps it in the background once it exits.
    let output = Command::new(&spec.options.shell)
        .arg("-c")
        .arg(spec.command)
        .envs(&spec.options.env)
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(o) => o,
        Err(e) => return ExecutionOutcome::Failure(format!("{}: {}", shown, e)),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return ExecutionOutcome::Failure(spec.redact(&format!(
            "Command failed: {} ({})\n{}",
            spec.command, output.status, stderr
        )));
    }
    if !stderr.is_empty() {
        return ExecutionOutcome::Failure(spec.redact(&stderr));
    }
    if !stdout.is_empty() {
        return ExecutionOutcome::Success(stdout);
    }
    ExecutionOutcome::Empty
}

/// Seam between orchestration logic and real subprocesses.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> ExecutionOutcome;

    /// Like `run`, but `secret` is masked in logs and failure messages.
    async fn run_redacted(&self, command: &str, secret: &str) -> ExecutionOutcome {
        let _ = secret;
        self.run(command).await
    }
}

/// Runs commands through the configured shell.
pub struct ShellRunner {
    options: ShellOptions,
}

impl ShellRunner {
    pub fn new(options: ShellOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> ExecutionOutcome {
        run_command(CommandSpec::new(command, &self.options)).await
    }

    async fn run_redacted(&self, command: &str, secret: &str) -> ExecutionOutcome {
        run_command(CommandSpec::new(command, &self.options).redacting(secret)).await
    }
}

/// Race `fut` against a timer. `None` means the timer fired first; the loser
/// is dropped, which does not terminate any subprocess it started.
pub async fn race_deadline<F, T>(fut: F, timeout: Duration) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        value = fut => Some(value),
        _ = tokio::time::sleep(timeout) => None,
    }
}

/// Run a command with a deadline.
///
/// With `TimeoutPolicy::Ignore` a command that outlives `timeout` settles to
/// `None`, which callers read as "not yet true". With `TimeoutPolicy::Fail`
/// it settles to `Some(ExecutionOutcome::TimedOut)`.
pub async fn run_with_timeout(
    runner: &dyn CommandRunner,
    command: &str,
    timeout: Duration,
    policy: TimeoutPolicy,
) -> Option<ExecutionOutcome> {
    match race_deadline(runner.run(command), timeout).await {
        Some(outcome) => Some(outcome),
        None => {
            log::warn!("{} timed out after {}ms", command, timeout.as_millis());
            match policy {
                TimeoutPolicy::Fail => Some(ExecutionOutcome::TimedOut),
                TimeoutPolicy::Ignore => None,
            }
        }
    }
}
