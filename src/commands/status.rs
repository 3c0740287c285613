use crate::commands::AppContext;
use crate::models::{parse_status_csv, BatteryStatusSnapshot};
use crate::utils::command::{run_with_timeout, ExecutionOutcome, TimeoutPolicy};
use crate::utils::venti::status_indicates_limiter;
use crate::utils::AppResult;

/// Query `venti status_csv` and parse the record. Never cached.
pub async fn fetch_status(ctx: &AppContext) -> AppResult<BatteryStatusSnapshot> {
    let command = ctx.venti.status_csv();
    let outcome = run_with_timeout(
        ctx.runner.as_ref(),
        &command,
        ctx.settings.probe_timeout(),
        TimeoutPolicy::Fail,
    )
    .await
    .unwrap_or(ExecutionOutcome::TimedOut);
    let raw = outcome.into_result(&command)?;
    parse_status_csv(&raw)
}

/// Query free-text `venti status` and look for the maintain marker.
pub async fn fetch_limiter_enabled(ctx: &AppContext) -> AppResult<bool> {
    let command = ctx.venti.status();
    let outcome = run_with_timeout(
        ctx.runner.as_ref(),
        &command,
        ctx.settings.probe_timeout(),
        TimeoutPolicy::Fail,
    )
    .await
    .unwrap_or(ExecutionOutcome::TimedOut);
    let message = outcome.into_result(&command)?;
    log::info!("Limiter status message: {}", message.trim());
    Ok(status_indicates_limiter(&message))
}

/// UI entry point: the current battery snapshot, or `None` after alerting.
pub async fn get_battery_status(ctx: &AppContext) -> Option<BatteryStatusSnapshot> {
    match fetch_status(ctx).await {
        Ok(status) => Some(status),
        Err(e) => {
            ctx.report("Venti error", &e).await;
            None
        }
    }
}

/// UI entry point: whether a maintain directive is active, or `None` after
/// alerting.
pub async fn is_limiter_enabled(ctx: &AppContext) -> Option<bool> {
    match fetch_limiter_enabled(ctx).await {
        Ok(enabled) => Some(enabled),
        Err(e) => {
            ctx.report("Venti error", &e).await;
            None
        }
    }
}
