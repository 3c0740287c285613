use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future;

use crate::models::{ProbeBackend, VentiSettings};
use crate::utils::applescript::shell_escape;
use crate::utils::command::{race_deadline, run_with_timeout, CommandRunner, ExecutionOutcome, TimeoutPolicy};

/// One outbound connectivity check.
#[async_trait]
pub trait Probe: Send + Sync {
    fn target(&self) -> &str;
    async fn check(&self) -> bool;
}

/// HEAD request through the shared HTTP client. Any response counts.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn target(&self) -> &str {
        &self.url
    }

    async fn check(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                log::debug!("probe {} failed: {}", self.url, e);
                false
            }
        }
    }
}

/// `curl` through the Process Runner.
pub struct CommandProbe {
    runner: Arc<dyn CommandRunner>,
    url: String,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            url: url.into(),
            timeout,
        }
    }

    pub fn command(&self) -> String {
        format!("curl -sS -o /dev/null -w '%{{http_code}}' {}", shell_escape(&self.url))
    }
}

#[async_trait]
impl Probe for CommandProbe {
    fn target(&self) -> &str {
        &self.url
    }

    async fn check(&self) -> bool {
        let outcome = run_with_timeout(
            self.runner.as_ref(),
            &self.command(),
            self.timeout,
            TimeoutPolicy::Ignore,
        )
        .await;
        matches!(outcome, Some(ExecutionOutcome::Success(_)))
    }
}

/// Races two independent probes against one shared deadline.
pub struct Reachability {
    probes: [Arc<dyn Probe>; 2],
    timeout: Duration,
}

impl Reachability {
    pub fn new(first: Arc<dyn Probe>, second: Arc<dyn Probe>, timeout: Duration) -> Self {
        Self {
            probes: [first, second],
            timeout,
        }
    }

    /// Build the two probes named in settings with the configured backend.
    pub fn from_settings(
        settings: &VentiSettings,
        client: reqwest::Client,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let timeout = settings.probe_timeout();
        let mut probes = settings.reachability_urls.iter().map(|url| -> Arc<dyn Probe> {
            match settings.reachability_backend {
                ProbeBackend::Http => Arc::new(HttpProbe::new(client.clone(), url.clone())),
                ProbeBackend::Command => {
                    Arc::new(CommandProbe::new(runner.clone(), url.clone(), timeout))
                }
            }
        });
        // Settings validation guarantees exactly two URLs.
        let fallback = |url: &str| -> Arc<dyn Probe> { Arc::new(HttpProbe::new(client.clone(), url)) };
        let first = probes.next().unwrap_or_else(|| fallback("https://icanhazip.com"));
        let second = probes.next().unwrap_or_else(|| fallback("https://github.com"));
        Self::new(first, second, timeout)
    }

    /// True as soon as either probe succeeds; false once both have failed or
    /// the deadline passed.
    pub async fn is_online(&self) -> bool {
        let checks = self
            .probes
            .iter()
            .map(|probe| Box::pin(check_before_deadline(probe.as_ref(), self.timeout)));

        match future::select_ok(checks).await {
            Ok((target, _)) => {
                log::info!("Internet online: true (via {})", target);
                true
            }
            Err(()) => {
                log::info!("Internet online: false");
                false
            }
        }
    }
}

async fn check_before_deadline(probe: &dyn Probe, timeout: Duration) -> Result<&str, ()> {
    match race_deadline(probe.check(), timeout).await {
        Some(true) => Ok(probe.target()),
        _ => Err(()),
    }
}
