use crate::commands::secret::prompt_for_secret;
use crate::commands::AppContext;
use crate::models::{InstallationState, ReconcileOutcome, ReconcileState};
use crate::utils::applescript::shell_escape;
use crate::utils::command::{probe_passed, run_with_timeout, ExecutionOutcome, TimeoutPolicy};
use crate::utils::{current_user, is_toolchain_installed, which_probe, AppError, AppResult};

const MSG_NEEDS_XCODE: &str =
    "Venti needs Xcode to be installed, please accept the terms and conditions for installation";
const MSG_RESTART_AFTER_XCODE: &str = "Please restart Venti after Xcode finished installing";
const MSG_NEEDS_INTERNET: &str = "Venti needs an internet connection to download the latest \
    version, please connect to the internet and open the app again.";
const MSG_WELCOME: &str = "Welcome to Venti. The app needs to install/update some components, \
    so it will ask for your password. This should only be needed once.";
const MSG_INSTALLED: &str = "Venti background components installed successfully. You can find \
    the Venti icon in the top right of your menu bar.";
const MSG_NEEDS_KEY: &str = "Venti needs an Electricity Maps API key to follow the carbon \
    intensity of your grid. You will be asked for it next.";
const MSG_KEY_SAVED: &str = "Your API key was saved. Venti will now restart.";

/// Printed by the install command only when fetch and script both succeeded.
const INSTALL_DONE: &str = "venti-install-complete";

/// Privileged install command. `pipefail` and `curl -f` keep a failed
/// download from looking like a script that ran and printed nothing.
fn install_command(url: &str, user: &str) -> String {
    format!(
        "set -o pipefail; curl -fsSL {} | bash -s -- {} && echo {}",
        shell_escape(url),
        shell_escape(user),
        INSTALL_DONE
    )
}

/// Everything step 1 of a pass learns, gathered concurrently.
#[derive(Debug, Clone, Copy)]
struct Probes {
    online: bool,
    toolchain: bool,
    installation: InstallationState,
}

/// One detect → remediate pass over the venti installation.
pub struct Reconciler<'a> {
    ctx: &'a AppContext,
    state: ReconcileState,
    terminated: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self {
            ctx,
            state: ReconcileState::Unknown,
            terminated: false,
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    fn transition(&mut self, next: ReconcileState) {
        log::debug!("reconcile: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    async fn probe(&self, command: &str) -> bool {
        let outcome = run_with_timeout(
            self.ctx.runner.as_ref(),
            command,
            self.ctx.settings.probe_timeout(),
            TimeoutPolicy::Ignore,
        )
        .await;
        probe_passed(&outcome)
    }

    async fn gather(&self) -> Probes {
        let settings = &self.ctx.settings;
        let runner = self.ctx.runner.as_ref();
        let timeout = settings.probe_timeout();
        let smc = shell_escape(&settings.smc_binary);
        let charge = format!("sudo -n {} -k CH0C -r", smc);
        let discharge = format!("sudo -n {} -k CH0I -r", smc);

        let (online, toolchain, venti, smc_present, charge_ok, discharge_ok, credential) = tokio::join!(
            self.ctx.reachability.is_online(),
            is_toolchain_installed(runner, timeout),
            which_probe(runner, &settings.venti_binary, timeout),
            which_probe(runner, &settings.smc_binary, timeout),
            self.probe(&charge),
            self.probe(&discharge),
            self.probe(&settings.credential_probe),
        );

        Probes {
            online,
            toolchain,
            installation: InstallationState {
                venti_present: venti,
                smc_helper_present: smc_present,
                charge_permission_granted: charge_ok,
                discharge_permission_granted: discharge_ok,
                credential_configured: credential,
            },
        }
    }

    /// Stop any maintain directive and kill stray venti processes so an old
    /// binary never races a new one. Every failure here is tolerated.
    async fn clean_slate(&self) {
        let runner = self.ctx.runner.as_ref();
        let timeout = self.ctx.settings.probe_timeout();
        let venti = &self.ctx.venti;

        if let Some(ExecutionOutcome::Success(count)) =
            run_with_timeout(runner, &venti.count_processes(), timeout, TimeoutPolicy::Ignore).await
        {
            log::info!("Found {} venti related processes to kill", count.trim());
        }

        match run_with_timeout(runner, &venti.maintain_stop(), timeout, TimeoutPolicy::Ignore).await {
            Some(ExecutionOutcome::Failure(e)) => log::warn!("maintain stop failed: {}", e.trim()),
            _ => log::debug!("maintain stop issued"),
        }

        if let Some(ExecutionOutcome::Failure(_)) =
            run_with_timeout(runner, &venti.kill_processes(), timeout, TimeoutPolicy::Ignore).await
        {
            log::info!("Error killing existing venti processes, usually means no running processes");
        }
    }

    /// Start a fresh instance and end this one. Happens at most once.
    fn relaunch_and_exit(&mut self) -> AppResult<()> {
        if self.terminated {
            return Ok(());
        }
        self.ctx.lifecycle.relaunch()?;
        self.terminated = true;
        self.ctx.lifecycle.exit();
        Ok(())
    }

    fn exit(&mut self) {
        if !self.terminated {
            self.terminated = true;
            self.ctx.lifecycle.exit();
        }
    }

    async fn run_install_script(&mut self) -> AppResult<()> {
        let user = current_user()
            .ok_or_else(|| AppError::Custom("Could not determine the current user".to_string()))?;
        log::info!("Installing venti for {}...", user);

        let command = install_command(&self.ctx.settings.install_script_url, &user);
        match self.ctx.escalator.run_privileged(&command).await? {
            ExecutionOutcome::Failure(e) => Err(AppError::CommandFailed(e)),
            ExecutionOutcome::TimedOut => Err(AppError::Timeout(command)),
            ExecutionOutcome::Success(out) if out.contains(INSTALL_DONE) => {
                log::info!("Install result: {}", out.trim());
                Ok(())
            }
            ExecutionOutcome::Success(out) => Err(AppError::CommandFailed(format!(
                "install script did not complete: {}",
                out.trim()
            ))),
            ExecutionOutcome::Empty => Err(AppError::CommandFailed(
                "install script did not complete".to_string(),
            )),
        }
    }

    async fn update(&self, online: bool) -> AppResult<ReconcileOutcome> {
        if !online {
            log::info!("Skipping venti update because we are offline");
            return Ok(ReconcileOutcome::UpdateDeferred);
        }
        log::info!("Updating venti...");
        let command = self.ctx.venti.update_silent();
        let outcome = run_with_timeout(
            self.ctx.runner.as_ref(),
            &command,
            self.ctx.settings.update_timeout(),
            TimeoutPolicy::Ignore,
        )
        .await;
        match outcome {
            Some(outcome) => {
                let result = outcome.into_result(&command)?;
                log::info!("Update result: {}", result.trim());
            }
            None => log::info!("Update still running in the background"),
        }
        Ok(ReconcileOutcome::Updated)
    }

    /// Run the pass. Errors are returned to `update_or_install`, which
    /// reports them.
    pub async fn run(&mut self) -> AppResult<ReconcileOutcome> {
        let dialogs = self.ctx.dialogs.clone();

        self.transition(ReconcileState::Probing);
        let probes = self.gather().await;
        log::info!("Internet online: {}", probes.online);
        log::info!("Installation state: {:?}", probes.installation);

        if !probes.toolchain {
            dialogs.alert(MSG_NEEDS_XCODE).await;
            let outcome = run_with_timeout(
                self.ctx.runner.as_ref(),
                "xcode-select --install",
                self.ctx.settings.probe_timeout(),
                TimeoutPolicy::Ignore,
            )
            .await;
            if let Some(ExecutionOutcome::Failure(e)) = outcome {
                log::warn!("Could not launch the Xcode installer: {}", e);
            }
            dialogs.alert(MSG_RESTART_AFTER_XCODE).await;
            self.exit();
            return Ok(ReconcileOutcome::ToolchainMissing);
        }

        self.clean_slate().await;

        let state = probes.installation.classify();
        self.transition(state);

        if state.needs_install_script() {
            if !probes.online {
                dialogs.alert(MSG_NEEDS_INTERNET).await;
                return Ok(ReconcileOutcome::Offline);
            }
            dialogs.alert(MSG_WELCOME).await;
            self.run_install_script().await?;
            dialogs.alert(MSG_INSTALLED).await;
            self.relaunch_and_exit()?;
            return Ok(ReconcileOutcome::Installed);
        }

        let updated = self.update(probes.online).await?;

        if state == ReconcileState::NeedsCredential {
            dialogs.alert(MSG_NEEDS_KEY).await;
            let label = self.ctx.settings.secret_label.clone();
            if prompt_for_secret(self.ctx, &label).await?.is_none() {
                log::info!("Onboarding aborted at API key prompt");
                self.exit();
                return Ok(ReconcileOutcome::Cancelled);
            }
            dialogs.alert(MSG_KEY_SAVED).await;
            self.relaunch_and_exit()?;
            return Ok(ReconcileOutcome::CredentialConfigured);
        }

        Ok(updated)
    }
}

/// Entry point at app start: bring venti to a fully configured state.
/// Never fails; errors become a single alert.
pub async fn update_or_install(ctx: &AppContext) -> ReconcileOutcome {
    let mut reconciler = Reconciler::new(ctx);
    match reconciler.run().await {
        Ok(outcome) => {
            log::info!("Reconcile finished: {:?}", outcome);
            outcome
        }
        Err(e) if e.is_cancellation() => {
            log::info!("Reconcile stopped: user cancelled");
            ReconcileOutcome::Cancelled
        }
        Err(e) => {
            log::error!("Update/install error: {}", e);
            ctx.dialogs.alert(&format!("Error installing Venti: {}", e)).await;
            ReconcileOutcome::Failed(e.to_string())
        }
    }
}
