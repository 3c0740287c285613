use crate::commands::status::fetch_status;
use crate::commands::AppContext;
use crate::utils::command::{run_with_timeout, TimeoutPolicy};
use crate::utils::AppResult;

/// Send one maintain directive. `venti maintain` may keep running in the
/// foreground, so a slow answer is not an error.
async fn send_directive(ctx: &AppContext, command: &str) -> AppResult<()> {
    let outcome = run_with_timeout(
        ctx.runner.as_ref(),
        command,
        ctx.settings.probe_timeout(),
        TimeoutPolicy::Ignore,
    )
    .await;
    if let Some(outcome) = outcome {
        outcome.into_result(command)?;
    }
    Ok(())
}

async fn enable_inner(ctx: &AppContext) -> AppResult<u8> {
    let default = ctx.settings.default_maintain_percentage;
    let target = match fetch_status(ctx).await {
        Ok(status) => status.maintain_target_or(default),
        Err(e) => {
            ctx.report("Venti error", &e).await;
            log::warn!("Could not read maintain target, using {}%", default);
            default
        }
    };
    send_directive(ctx, &ctx.venti.maintain(target)).await?;
    Ok(target)
}

/// Start maintaining the battery at its configured target. Returns the
/// target on success; failures are alerted.
pub async fn enable_limiter(ctx: &AppContext) -> Option<u8> {
    let _guard = ctx.maintain_lock.lock().await;
    match enable_inner(ctx).await {
        Ok(target) => {
            log::info!("enable_battery_limiter exec complete ({}%)", target);
            Some(target)
        }
        Err(e) => {
            ctx.report("Error enabling Venti", &e).await;
            None
        }
    }
}

/// Stop the active maintain directive. Failures are alerted.
pub async fn disable_limiter(ctx: &AppContext) -> bool {
    let _guard = ctx.maintain_lock.lock().await;
    match send_directive(ctx, &ctx.venti.maintain_stop()).await {
        Ok(()) => {
            log::info!("disable_battery_limiter exec complete");
            true
        }
        Err(e) => {
            ctx.report("Error disabling Venti", &e).await;
            false
        }
    }
}
