use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::{AppError, AppResult};

pub const DEFAULT_INSTALL_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/adamlechowicz/venti/main/setup.sh";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VentiSettings {
    pub app_name: String,
    pub shell: String,
    pub extra_path: Vec<String>,
    pub venti_binary: String,
    pub smc_binary: String,
    pub probe_timeout_ms: u64,
    pub update_timeout_ms: u64,
    pub install_script_url: String,
    pub reachability_urls: Vec<String>,
    pub reachability_backend: ProbeBackend,
    pub credential_probe: String,
    pub default_maintain_percentage: u8,
    pub secret_label: String,
    pub secret_placeholder: String,
}

/// How reachability probes reach the network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProbeBackend {
    /// HEAD requests with the shared HTTP client.
    Http,
    /// `curl` through the shell.
    Command,
}

impl Default for VentiSettings {
    fn default() -> Self {
        Self {
            app_name: "Venti".into(),
            shell: "/bin/bash".into(),
            extra_path: vec![
                "/bin".into(),
                "/usr/bin".into(),
                "/usr/local/bin".into(),
                "/usr/sbin".into(),
                "/opt/homebrew/bin".into(),
            ],
            venti_binary: "/usr/local/bin/venti".into(),
            smc_binary: "/usr/local/bin/smc".into(),
            probe_timeout_ms: 2000,
            update_timeout_ms: 120_000,
            install_script_url: DEFAULT_INSTALL_SCRIPT_URL.into(),
            reachability_urls: vec![
                "https://icanhazip.com".into(),
                "https://github.com".into(),
            ],
            reachability_backend: ProbeBackend::Http,
            credential_probe: r#"test -s "$HOME/.venti/api_key" && echo configured"#.into(),
            default_maintain_percentage: 80,
            secret_label: "Venti uses the Electricity Maps API to follow the carbon intensity \
                           of your grid. Please enter your API key:"
                .into(),
            secret_placeholder: "Paste your API key here".into(),
        }
    }
}

impl VentiSettings {
    pub fn validate(&self) -> AppResult<()> {
        let script = Url::parse(&self.install_script_url)
            .map_err(|e| AppError::Config(format!("installScriptUrl: {}", e)))?;
        if script.scheme() != "https" {
            return Err(AppError::Config(
                "installScriptUrl must use https".to_string(),
            ));
        }

        if self.reachability_urls.len() != 2 {
            return Err(AppError::Config(format!(
                "reachabilityUrls needs exactly two entries, got {}",
                self.reachability_urls.len()
            )));
        }
        for raw in &self.reachability_urls {
            Url::parse(raw).map_err(|e| AppError::Config(format!("{}: {}", raw, e)))?;
        }

        if !(1..=100).contains(&self.default_maintain_percentage) {
            return Err(AppError::Config(format!(
                "defaultMaintainPercentage out of range: {}",
                self.default_maintain_percentage
            )));
        }

        if self.shell.trim().is_empty() || self.venti_binary.trim().is_empty() {
            return Err(AppError::Config("shell and ventiBinary must be set".to_string()));
        }

        Ok(())
    }

    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn update_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.update_timeout_ms)
    }
}
