use async_trait::async_trait;
use thiserror::Error;

use crate::utils::applescript::{self, escape_string, shell_escape};
use crate::utils::command::{ExecutionOutcome, ShellOptions};
use crate::utils::AppError;

/// Error type for elevated command execution.
#[derive(Debug, Error)]
pub enum ElevatedError {
    #[error("User cancelled the password dialog")]
    UserCancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ElevatedError> for AppError {
    fn from(e: ElevatedError) -> Self {
        match e {
            ElevatedError::UserCancelled => AppError::UserCancelled,
            ElevatedError::Io(e) => AppError::Io(e),
        }
    }
}

/// Runs a single shell command with administrator rights.
///
/// `Ok` means the command ran (successfully or not). `Err` means it never
/// ran, either because the user refused the prompt or the prompt could not
/// be shown.
#[async_trait]
pub trait PrivilegeEscalator: Send + Sync {
    async fn run_privileged(&self, command: &str) -> Result<ExecutionOutcome, ElevatedError>;
}

/// Elevation through `osascript ... with administrator privileges`, which
/// shows the native macOS password prompt scoped to one command.
pub struct OsascriptEscalator {
    options: ShellOptions,
    app_name: String,
}

impl OsascriptEscalator {
    pub fn new(options: ShellOptions, app_name: impl Into<String>) -> Self {
        Self {
            options,
            app_name: app_name.into(),
        }
    }
}

/// Build the AppleScript that runs `command` as root.
///
/// `do shell script` starts from a minimal environment, so the widened PATH
/// is exported in front of the command.
pub fn build_elevated_script(command: &str, options: &ShellOptions, app_name: &str) -> String {
    let shell_cmd = match options.path() {
        Some(path) => format!("export PATH={}; {}", shell_escape(path), command),
        None => command.to_string(),
    };
    let prompt = format!("{} wants to install its background components.", app_name);
    format!(
        "do shell script \"{}\" with prompt \"{}\" with administrator privileges",
        escape_string(&shell_cmd),
        escape_string(&prompt)
    )
}

#[async_trait]
impl PrivilegeEscalator for OsascriptEscalator {
    async fn run_privileged(&self, command: &str) -> Result<ExecutionOutcome, ElevatedError> {
        log::info!("Sudo executing command: {}", command);
        let script = build_elevated_script(command, &self.options, &self.app_name);
        let output = applescript::osascript(&script).await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            if applescript::is_user_cancelled(&stderr) {
                log::info!("Administrator prompt dismissed by user");
                return Err(ElevatedError::UserCancelled);
            }
            return Ok(ExecutionOutcome::Failure(stderr));
        }

        if stdout.is_empty() {
            Ok(ExecutionOutcome::Empty)
        } else {
            Ok(ExecutionOutcome::Success(stdout))
        }
    }
}
