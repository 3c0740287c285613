use crate::commands::AppContext;
use crate::utils::command::{race_deadline, ExecutionOutcome};
use crate::utils::{AppError, AppResult};

/// Ask the user for an API key and store it with `venti set-api-key`.
///
/// `Ok(None)` means the user chose Exit; the caller decides what that ends.
pub async fn prompt_for_secret(ctx: &AppContext, label: &str) -> AppResult<Option<String>> {
    let placeholder = &ctx.settings.secret_placeholder;
    let Some(raw) = ctx.dialogs.prompt_secret(label, placeholder).await? else {
        log::info!("Secret prompt dismissed");
        return Ok(None);
    };

    let key = raw.trim();
    if key.is_empty() || key == placeholder.trim() {
        return Err(AppError::Custom("No API key was entered".to_string()));
    }

    let command = ctx.venti.set_api_key(key);
    let outcome = race_deadline(
        ctx.runner.run_redacted(&command, key),
        ctx.settings.probe_timeout(),
    )
    .await
    .unwrap_or(ExecutionOutcome::TimedOut);
    outcome.into_result("venti set-api-key")?;

    log::info!("API key stored");
    Ok(Some(key.to_string()))
}
