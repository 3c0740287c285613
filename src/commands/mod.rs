pub mod limiter;
pub mod secret;
pub mod setup;
pub mod status;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::VentiSettings;
use crate::platform::{AppleScriptDialogs, Dialogs, Reachability};
use crate::utils::app_lifecycle::{AppLifecycle, SystemLifecycle};
use crate::utils::command::{CommandRunner, ShellOptions, ShellRunner};
use crate::utils::http_client;
use crate::utils::privileged::{OsascriptEscalator, PrivilegeEscalator};
use crate::utils::venti::VentiCli;
use crate::utils::{AppError, AppResult};

/// Everything the entry points need, wired once at startup and shared with
/// the UI layer.
pub struct AppContext {
    pub settings: VentiSettings,
    pub venti: VentiCli,
    pub runner: Arc<dyn CommandRunner>,
    pub escalator: Arc<dyn PrivilegeEscalator>,
    pub dialogs: Arc<dyn Dialogs>,
    pub reachability: Reachability,
    pub lifecycle: Arc<dyn AppLifecycle>,
    /// Held while a maintain directive is being sent so enable and disable
    /// never interleave.
    maintain_lock: Mutex<()>,
}

impl AppContext {
    pub fn new(
        settings: VentiSettings,
        runner: Arc<dyn CommandRunner>,
        escalator: Arc<dyn PrivilegeEscalator>,
        dialogs: Arc<dyn Dialogs>,
        reachability: Reachability,
        lifecycle: Arc<dyn AppLifecycle>,
    ) -> Self {
        Self {
            venti: VentiCli::new(settings.venti_binary.clone()),
            settings,
            runner,
            escalator,
            dialogs,
            reachability,
            lifecycle,
            maintain_lock: Mutex::new(()),
        }
    }

    /// Wire the real shell, osascript prompts, HTTP probes and process
    /// lifecycle.
    pub fn system(settings: VentiSettings) -> AppResult<Self> {
        let options = ShellOptions::from_settings(&settings);
        let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner::new(options.clone()));
        let escalator = Arc::new(OsascriptEscalator::new(options, settings.app_name.clone()));
        let dialogs = Arc::new(AppleScriptDialogs::new(settings.app_name.clone()));
        let client = http_client::create_http_client()?;
        let reachability = Reachability::from_settings(&settings, client, runner.clone());

        Ok(Self::new(
            settings,
            runner,
            escalator,
            dialogs,
            reachability,
            Arc::new(SystemLifecycle),
        ))
    }

    /// Log an error and show it to the user. Cancellations are only logged.
    pub(crate) async fn report(&self, prefix: &str, err: &AppError) {
        if err.is_cancellation() {
            log::info!("{}: cancelled by user", prefix);
            return;
        }
        log::error!("{}: {}", prefix, err);
        self.dialogs.alert(&format!("{}: {}", prefix, err)).await;
    }
}
