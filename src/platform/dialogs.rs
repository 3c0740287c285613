use async_trait::async_trait;

use crate::utils::applescript::{self, quoted};
use crate::utils::{AppError, AppResult};

pub const SUBMIT_BUTTON: &str = "Submit";
pub const EXIT_BUTTON: &str = "Exit";

/// Blocking, user-facing modals. The UI layer may supply its own.
#[async_trait]
pub trait Dialogs: Send + Sync {
    /// Show a message with a single OK button and wait for acknowledgment.
    async fn alert(&self, message: &str);

    /// Ask for a sensitive value. `Ok(None)` means the user chose Exit or
    /// dismissed the dialog.
    async fn prompt_secret(&self, label: &str, placeholder: &str) -> AppResult<Option<String>>;
}

/// Native dialogs through `osascript display dialog`.
pub struct AppleScriptDialogs {
    app_name: String,
}

impl AppleScriptDialogs {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

pub fn alert_script(app_name: &str, message: &str) -> String {
    format!(
        "display dialog {} with title {} buttons {{\"OK\"}} default button \"OK\"",
        quoted(message),
        quoted(app_name)
    )
}

pub fn secret_prompt_script(app_name: &str, label: &str, placeholder: &str) -> String {
    format!(
        "display dialog {} default answer {} with title {} \
         buttons {{\"{exit}\", \"{submit}\"}} default button \"{submit}\" \
         cancel button \"{exit}\" with hidden answer",
        quoted(label),
        quoted(placeholder),
        quoted(app_name),
        exit = EXIT_BUTTON,
        submit = SUBMIT_BUTTON,
    )
}

/// Parsed `display dialog` result record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogReply {
    pub button: String,
    pub text: Option<String>,
}

/// Parse `button returned:Submit, text returned:...`. The text field comes
/// last and may itself contain commas.
pub fn parse_dialog_reply(stdout: &str) -> Option<DialogReply> {
    const BUTTON: &str = "button returned:";
    const TEXT: &str = ", text returned:";

    let line = stdout.trim_end_matches(['\n', '\r']);
    let rest = line.strip_prefix(BUTTON)?;
    match rest.find(TEXT) {
        Some(idx) => Some(DialogReply {
            button: rest[..idx].to_string(),
            text: Some(rest[idx + TEXT.len()..].to_string()),
        }),
        None => Some(DialogReply {
            button: rest.to_string(),
            text: None,
        }),
    }
}

#[async_trait]
impl Dialogs for AppleScriptDialogs {
    async fn alert(&self, message: &str) {
        log::info!("Alert: {}", message);
        match applescript::osascript(&alert_script(&self.app_name, message)).await {
            Ok(o) if !o.status.success() => {
                log::warn!("alert dialog failed: {}", String::from_utf8_lossy(&o.stderr));
            }
            Ok(_) => {}
            Err(e) => log::warn!("alert dialog failed: {}", e),
        }
    }

    async fn prompt_secret(&self, label: &str, placeholder: &str) -> AppResult<Option<String>> {
        let script = secret_prompt_script(&self.app_name, label, placeholder);
        let output = applescript::osascript(&script).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            if applescript::is_user_cancelled(&stderr) {
                return Ok(None);
            }
            return Err(AppError::CommandFailed(format!("secret dialog: {}", stderr.trim())));
        }

        let reply = parse_dialog_reply(&stdout).ok_or_else(|| {
            AppError::MalformedResponse(format!("unexpected dialog reply: {}", stdout.trim()))
        })?;
        if reply.button != SUBMIT_BUTTON {
            return Ok(None);
        }
        Ok(Some(reply.text.unwrap_or_default()))
    }
}
