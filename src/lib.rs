pub mod commands;
pub mod models;
pub mod platform;
pub mod utils;

#[cfg(test)]
mod test_support;

use commands::{limiter, setup, status, AppContext};
use utils::config;

/// What the host binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    /// Detect → install/update → configure.
    Reconcile,
    Enable,
    Disable,
    IsEnabled,
    Status { json: bool },
}

/// Run one action on a single-threaded runtime and return the process exit
/// code.
pub fn run(action: HostAction) -> i32 {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = config::load_settings();
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            return 1;
        }
    };
    let ctx = match AppContext::system(settings) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("Failed to initialize: {}", e);
            return 1;
        }
    };

    runtime.block_on(dispatch(&ctx, action))
}

async fn dispatch(ctx: &AppContext, action: HostAction) -> i32 {
    match action {
        HostAction::Reconcile => {
            let outcome = setup::update_or_install(ctx).await;
            if outcome.is_terminal_for_process() {
                log::info!("Handing over to the relaunched instance");
            }
            match outcome {
                models::ReconcileOutcome::Failed(_) => 1,
                _ => 0,
            }
        }
        HostAction::Enable => match limiter::enable_limiter(ctx).await {
            Some(target) => {
                println!("maintaining battery at {}%", target);
                0
            }
            None => 1,
        },
        HostAction::Disable => {
            if limiter::disable_limiter(ctx).await {
                0
            } else {
                1
            }
        }
        HostAction::IsEnabled => match status::is_limiter_enabled(ctx).await {
            Some(enabled) => {
                println!("{}", enabled);
                0
            }
            None => 1,
        },
        HostAction::Status { json } => match status::get_battery_status(ctx).await {
            Some(snapshot) if json => match serde_json::to_string_pretty(&snapshot) {
                Ok(body) => {
                    println!("{}", body);
                    0
                }
                Err(e) => {
                    log::error!("Failed to encode status: {}", e);
                    1
                }
            },
            Some(snapshot) => {
                println!("{}", snapshot.summary(ctx.settings.default_maintain_percentage));
                0
            }
            None => 1,
        },
    }
}
