pub mod app_lifecycle;
pub mod applescript;
pub mod command;
pub mod config;
pub mod error;
pub mod http_client;
pub mod privileged;
pub mod venti;

pub use error::{AppError, AppResult};

use std::time::Duration;

use command::{run_with_timeout, CommandRunner, ExecutionOutcome, TimeoutPolicy};

/// Probe for a tool on PATH with `which`. A slow answer counts as absent.
pub async fn which_probe(runner: &dyn CommandRunner, tool: &str, timeout: Duration) -> bool {
    let command = format!("which {}", applescript::shell_escape(tool));
    let outcome = run_with_timeout(runner, &command, timeout, TimeoutPolicy::Ignore).await;
    matches!(outcome, Some(ExecutionOutcome::Success(out)) if venti::which_found(&out))
}

/// Xcode Command Line Tools presence, using `git` as the signal.
pub async fn is_toolchain_installed(runner: &dyn CommandRunner, timeout: Duration) -> bool {
    which_probe(runner, "git", timeout).await
}

/// The login name passed to the install script. Falls back to the name of
/// the home directory when the environment carries no user.
pub fn current_user() -> Option<String> {
    ["USER", "LOGNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|u| !u.trim().is_empty())
        .or_else(|| {
            dirs::home_dir()
                .and_then(|h| h.file_name().map(|n| n.to_string_lossy().to_string()))
        })
}
