//! Chat control surface: `stats`/`list` and `run <selector>` commands.

use probe_core::state::TestResult;
use probe_core::types::{ChannelId, Message, SessionEvent};
use probe_session::Session;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::orchestrator::{BatchReport, Orchestrator, OrchestratorError, RunSelector};
use crate::registry::TestRegistry;
use crate::reporter::render_stats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats,
    Run(Option<RunSelector>),
    Unknown(String),
}

impl Command {
    /// Parse `content` as a command when it starts with `prefix`.
    pub fn parse(prefix: &str, content: &str) -> Option<Self> {
        let rest = content.strip_prefix(prefix)?;
        let mut words = rest.split_whitespace();
        let command = match words.next()? {
            "stats" | "list" => Command::Stats,
            "run" => Command::Run(words.next().map(RunSelector::parse)),
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Stats,
    Usage,
    UnknownCommand(String),
    UnknownTest(String),
    Batch(BatchReport),
    Single { name: String, result: TestResult },
}

pub struct CommandDispatcher {
    orchestrator: Orchestrator,
    registry: TestRegistry,
    prefix: String,
}

impl CommandDispatcher {
    pub fn new(orchestrator: Orchestrator, registry: TestRegistry, prefix: impl Into<String>) -> Self {
        Self {
            orchestrator,
            registry,
            prefix: prefix.into(),
        }
    }

    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    fn session(&self) -> Arc<dyn Session> {
        Arc::clone(self.orchestrator.session())
    }

    fn usage(&self) -> String {
        format!("Usage: `{}run <all|unrun|failed|name>`", self.prefix)
    }

    /// Handle one chat message. Returns `None` when it is not a command
    /// for this harness.
    pub async fn handle(
        &mut self,
        message: &Message,
    ) -> Result<Option<CommandOutcome>, OrchestratorError> {
        if &message.author_id == self.session().self_id() {
            return Ok(None);
        }
        let Some(command) = Command::parse(&self.prefix, &message.content) else {
            return Ok(None);
        };
        info!(command = ?command, channel = %message.channel_id, "received command");
        self.execute(command, &message.channel_id).await.map(Some)
    }

    pub async fn execute(
        &mut self,
        command: Command,
        channel: &ChannelId,
    ) -> Result<CommandOutcome, OrchestratorError> {
        let session = self.session();
        match command {
            Command::Stats => {
                session
                    .send_message(channel, &render_stats(&self.registry))
                    .await?;
                Ok(CommandOutcome::Stats)
            }
            Command::Run(None) => {
                session.send_message(channel, &self.usage()).await?;
                Ok(CommandOutcome::Usage)
            }
            Command::Run(Some(RunSelector::Named(name))) => {
                let Some(test) = self.registry.find_by_name_mut(&name) else {
                    session
                        .send_message(channel, &format!(":x: There is no test called `{name}`"))
                        .await?;
                    return Ok(CommandOutcome::UnknownTest(name));
                };
                session
                    .send_message(channel, &format!("Running test `{name}`"))
                    .await?;
                let result = self.orchestrator.run_test(test, channel, false).await?;
                session
                    .send_message(channel, &render_stats(&self.registry))
                    .await?;
                Ok(CommandOutcome::Single { name, result })
            }
            Command::Run(Some(selector)) => {
                let report = self
                    .orchestrator
                    .run_selected(&mut self.registry, channel, &selector)
                    .await?;
                Ok(CommandOutcome::Batch(report))
            }
            Command::Unknown(name) => {
                debug!(command = %name, "ignoring unknown command");
                Ok(CommandOutcome::UnknownCommand(name))
            }
        }
    }

    /// Serve commands from the session stream until it closes.
    pub async fn serve(&mut self) -> Result<(), OrchestratorError> {
        let events = self.session().subscribe();
        self.serve_events(events).await
    }

    /// Serve commands from an already opened subscription.
    ///
    /// Setup faults inside a run are reported back to the channel and
    /// serving continues; transport faults end the loop.
    pub async fn serve_events(
        &mut self,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> Result<(), OrchestratorError> {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "command stream lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("session stream closed; stopping command loop");
                    return Ok(());
                }
            };
            let Some(message) = event.created_message().cloned() else {
                continue;
            };

            match self.handle(&message).await {
                Ok(_) => {}
                Err(err @ (OrchestratorError::Resolve(_) | OrchestratorError::Aborted { .. })) => {
                    warn!(error = %err, "command failed");
                    self.session()
                        .send_message(&message.channel_id, &format!(":warning: {err}"))
                        .await?;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
