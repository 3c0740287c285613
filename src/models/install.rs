use serde::Serialize;

/// Snapshot of the probes taken at the start of a reconciliation pass.
/// Never persisted and never reused across passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationState {
    pub venti_present: bool,
    pub smc_helper_present: bool,
    pub charge_permission_granted: bool,
    pub discharge_permission_granted: bool,
    pub credential_configured: bool,
}

impl InstallationState {
    pub fn binaries_installed(&self) -> bool {
        self.venti_present && self.smc_helper_present
    }

    /// Passwordless sudo entries for both smc keys are in place.
    pub fn permissions_granted(&self) -> bool {
        self.charge_permission_granted && self.discharge_permission_granted
    }

    pub fn classify(&self) -> ReconcileState {
        if !self.binaries_installed() {
            ReconcileState::NeedsInstall
        } else if !self.permissions_granted() {
            ReconcileState::NeedsPrereqs
        } else if !self.credential_configured {
            ReconcileState::NeedsCredential
        } else {
            ReconcileState::UpToDate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileState {
    Unknown,
    Probing,
    /// Binaries present, sudo permissions for smc missing.
    NeedsPrereqs,
    /// venti or smc missing.
    NeedsInstall,
    NeedsCredential,
    UpToDate,
}

impl ReconcileState {
    /// Whether the remediation for this state is the privileged install script.
    pub fn needs_install_script(&self) -> bool {
        matches!(self, ReconcileState::NeedsInstall | ReconcileState::NeedsPrereqs)
    }
}

/// How a reconciliation pass ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum ReconcileOutcome {
    /// Installed and configured; a silent update was issued.
    Updated,
    /// Installed and configured but offline; the update was skipped.
    UpdateDeferred,
    /// Developer toolchain missing; the installer was triggered and the app exited.
    ToolchainMissing,
    /// Install needed but offline; the user was told to reconnect.
    Offline,
    /// The install script ran; the app relaunched.
    Installed,
    /// An API key was stored; the app relaunched.
    CredentialConfigured,
    /// The user dismissed a prompt.
    Cancelled,
    /// Something failed; the message was shown to the user.
    Failed(String),
}

impl ReconcileOutcome {
    /// Outcomes after which this process has relaunched or exited.
    pub fn is_terminal_for_process(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::ToolchainMissing
                | ReconcileOutcome::Installed
                | ReconcileOutcome::CredentialConfigured
        )
    }
}
