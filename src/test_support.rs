//! Stub collaborators for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::commands::AppContext;
use crate::models::VentiSettings;
use crate::platform::{Dialogs, Probe, Reachability};
use crate::utils::app_lifecycle::AppLifecycle;
use crate::utils::command::{CommandRunner, ExecutionOutcome};
use crate::utils::privileged::{ElevatedError, PrivilegeEscalator};
use crate::utils::AppResult;

/// Ordered record of everything the stubs saw, across all of them.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Clone)]
enum Reply {
    Now(ExecutionOutcome),
    After(Duration, ExecutionOutcome),
    Never,
}

/// Answers commands by substring match; earlier rules win.
#[derive(Default)]
pub struct StubRunner {
    rules: Vec<(String, Reply)>,
    calls: Mutex<Vec<String>>,
    journal: Journal,
}

impl StubRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, pattern: &str, outcome: ExecutionOutcome) -> Self {
        self.rules.push((pattern.to_string(), Reply::Now(outcome)));
        self
    }

    pub fn on_first(mut self, pattern: &str, outcome: ExecutionOutcome) -> Self {
        self.rules.insert(0, (pattern.to_string(), Reply::Now(outcome)));
        self
    }

    pub fn delay(mut self, pattern: &str, delay: Duration) -> Self {
        let reply = Reply::After(delay, ExecutionOutcome::Success("done".into()));
        self.rules.push((pattern.to_string(), reply));
        self
    }

    pub fn hang(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_string(), Reply::Never));
        self
    }

    pub fn hang_first(mut self, pattern: &str) -> Self {
        self.rules.insert(0, (pattern.to_string(), Reply::Never));
        self
    }

    fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run(&self, command: &str) -> ExecutionOutcome {
        self.calls.lock().unwrap().push(command.to_string());
        self.journal.push(format!("run:{}", command));

        let reply = self
            .rules
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Now(outcome)) => outcome,
            Some(Reply::After(delay, outcome)) => {
                tokio::time::sleep(delay).await;
                outcome
            }
            Some(Reply::Never) => std::future::pending().await,
            None => ExecutionOutcome::Failure(format!("unexpected command: {}", command)),
        }
    }
}

pub struct StubEscalator {
    reply: Result<ExecutionOutcome, String>,
    calls: Mutex<Vec<String>>,
    journal: Journal,
}

impl StubEscalator {
    fn with(reply: Result<ExecutionOutcome, String>) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
            journal: Journal::default(),
        }
    }

    pub fn succeeding() -> Self {
        Self::with(Ok(ExecutionOutcome::Success(
            "Venti installed\nventi-install-complete\n".into(),
        )))
    }

    pub fn replying(outcome: ExecutionOutcome) -> Self {
        Self::with(Ok(outcome))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(Ok(ExecutionOutcome::Failure(message.to_string())))
    }

    /// The user dismisses the administrator prompt.
    pub fn cancelling() -> Self {
        Self::with(Err("cancelled".into()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrivilegeEscalator for StubEscalator {
    async fn run_privileged(&self, command: &str) -> Result<ExecutionOutcome, ElevatedError> {
        self.calls.lock().unwrap().push(command.to_string());
        self.journal.push("escalate");
        self.reply.clone().map_err(|_| ElevatedError::UserCancelled)
    }
}

pub struct StubDialogs {
    secret: Option<String>,
    alerts: Mutex<Vec<String>>,
    prompts: Mutex<usize>,
    journal: Journal,
}

impl StubDialogs {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> usize {
        *self.prompts.lock().unwrap()
    }
}

#[async_trait]
impl Dialogs for StubDialogs {
    async fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
        self.journal.push(format!("alert:{}", message));
    }

    async fn prompt_secret(&self, _label: &str, _placeholder: &str) -> AppResult<Option<String>> {
        *self.prompts.lock().unwrap() += 1;
        self.journal.push("prompt");
        Ok(self.secret.clone())
    }
}

pub struct StubProbe {
    result: Option<bool>,
    delay: Duration,
}

impl StubProbe {
    pub fn up() -> Self {
        Self { result: Some(true), delay: Duration::ZERO }
    }

    pub fn down() -> Self {
        Self { result: Some(false), delay: Duration::ZERO }
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self { result: None, delay: Duration::ZERO }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Probe for StubProbe {
    fn target(&self) -> &str {
        "stub"
    }

    async fn check(&self) -> bool {
        tokio::time::sleep(self.delay).await;
        match self.result {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

#[derive(Default)]
pub struct StubLifecycle {
    relaunches: Mutex<usize>,
    exits: Mutex<usize>,
    journal: Journal,
}

impl StubLifecycle {
    pub fn relaunches(&self) -> usize {
        *self.relaunches.lock().unwrap()
    }

    pub fn exits(&self) -> usize {
        *self.exits.lock().unwrap()
    }
}

impl AppLifecycle for StubLifecycle {
    fn relaunch(&self) -> AppResult<()> {
        *self.relaunches.lock().unwrap() += 1;
        self.journal.push("relaunch");
        Ok(())
    }

    fn exit(&self) {
        *self.exits.lock().unwrap() += 1;
        self.journal.push("exit");
    }
}

/// An `AppContext` wired to stubs, with handles to inspect them.
pub struct Harness {
    pub ctx: AppContext,
    pub runner: Arc<StubRunner>,
    pub escalator: Arc<StubEscalator>,
    pub dialogs: Arc<StubDialogs>,
    pub lifecycle: Arc<StubLifecycle>,
    pub journal: Journal,
}

pub struct HarnessBuilder {
    runner: StubRunner,
    escalator: StubEscalator,
    secret: Option<String>,
    online: bool,
}

impl HarnessBuilder {
    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    pub fn escalator(mut self, escalator: StubEscalator) -> Self {
        self.escalator = escalator;
        self
    }

    pub fn secret(mut self, secret: Option<&str>) -> Self {
        self.secret = secret.map(str::to_string);
        self
    }

    pub fn build(self) -> Harness {
        let journal = Journal::default();
        let runner = Arc::new(self.runner.with_journal(journal.clone()));
        let mut escalator = self.escalator;
        escalator.journal = journal.clone();
        let escalator = Arc::new(escalator);
        let dialogs = Arc::new(StubDialogs {
            secret: self.secret,
            alerts: Mutex::new(Vec::new()),
            prompts: Mutex::new(0),
            journal: journal.clone(),
        });
        let lifecycle = Arc::new(StubLifecycle {
            journal: journal.clone(),
            ..Default::default()
        });

        let probe = |online: bool| -> Arc<dyn Probe> {
            Arc::new(if online { StubProbe::up() } else { StubProbe::down() })
        };
        let settings = VentiSettings::default();
        let reachability =
            Reachability::new(probe(self.online), probe(self.online), settings.probe_timeout());

        let ctx = AppContext::new(
            settings,
            runner.clone(),
            escalator.clone(),
            dialogs.clone(),
            reachability,
            lifecycle.clone(),
        );

        Harness {
            ctx,
            runner,
            escalator,
            dialogs,
            lifecycle,
            journal,
        }
    }
}

impl Harness {
    pub fn builder(runner: StubRunner) -> HarnessBuilder {
        HarnessBuilder {
            runner,
            escalator: StubEscalator::succeeding(),
            secret: Some("test-api-key".into()),
            online: true,
        }
    }

    pub fn new(runner: StubRunner) -> Self {
        Self::builder(runner).build()
    }
}
