//! Built-in suite and a scripted in-process target for `probe demo`.

use probe_core::config::ProbeConfig;
use probe_core::types::{ChannelId, GuildId, Member, Message, UserId};
use probe_session::{LocalSession, Session, SessionError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::commands::{CommandDispatcher, CommandOutcome};
use crate::expect_calls::CallCountMismatch;
use crate::orchestrator::{BatchReport, Orchestrator, OrchestratorError};
use crate::registry::{test_logic, RegistryError, TestDefinition, TestRegistry};
use crate::reporter::render_stats;

pub const BUILTIN_SUITE_SIZE: usize = 6;

pub const THUMBS_UP: &str = "\u{1F44D}";

#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Registration(#[from] CallCountMismatch),
}

/// Register the demo suite and verify every definition landed.
pub fn register_builtin_suite(registry: &mut TestRegistry) -> Result<(), SuiteError> {
    let mut add = registry.collector(BUILTIN_SUITE_SIZE);

    add.call(TestDefinition::new(
        "ping",
        test_logic(|interface| async move {
            interface.assert_reply_equals("ping?", "pong!").await?;
            Ok(())
        }),
    ))?;
    add.call(TestDefinition::new(
        "echo",
        test_logic(|interface| async move {
            interface
                .assert_reply_contains("echo hello there", "hello there")
                .await?;
            Ok(())
        }),
    ))?;
    add.call(TestDefinition::new(
        "greeting",
        test_logic(|interface| async move {
            interface.assert_reply_matches("hi", r"Hello, \w+!").await?;
            interface.assert_reply_not_errored("hi").await?;
            Ok(())
        }),
    ))?;
    add.call(TestDefinition::new(
        "react",
        test_logic(|interface| async move {
            interface
                .assert_reaction_equals("react to this", THUMBS_UP)
                .await?;
            Ok(())
        }),
    ))?;
    add.call(TestDefinition::new(
        "quiet",
        test_logic(|interface| async move {
            interface.send_message("shh").await?;
            interface.ensure_silence().await
        }),
    ))?;
    add.call(TestDefinition::new(
        "edit",
        test_logic(|interface| async move {
            let draft = interface.send_message("draft").await?;
            interface.edit_message(&draft, "final draft").await?;
            interface.ensure_silence().await
        }),
    ))?;

    add.verify()?;
    Ok(())
}

fn scripted_reply(content: &str) -> Option<String> {
    if content == "ping?" {
        return Some("pong!".to_string());
    }
    if let Some(rest) = content.strip_prefix("echo ") {
        return Some(format!("you said: {rest}"));
    }
    if content == "hi" {
        return Some("Hello, Probe!".to_string());
    }
    None
}

/// Spawn a target that answers messages from `harness` on `target`.
///
/// Replies to `ping?`, `echo ...` and `hi`, reacts to `react ...`, and
/// ignores edits and everything else.
pub fn spawn_ping_target(target: LocalSession, harness: UserId) -> JoinHandle<()> {
    let mut events = target.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let Some(message) = event.created_message() else {
                continue;
            };
            if message.author_id != harness {
                continue;
            }
            let outcome = if message.content.starts_with("react") {
                target.add_reaction(message, THUMBS_UP).await.map(|_| ())
            } else if let Some(reply) = scripted_reply(&message.content) {
                target
                    .send_message(&message.channel_id, &reply)
                    .await
                    .map(|_| ())
            } else {
                Ok(())
            };
            if let Err(err) = outcome {
                debug!(error = %err, "scripted target could not answer");
            }
        }
    })
}

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Suite(#[from] SuiteError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

#[derive(Debug)]
pub struct DemoOutcome {
    pub report: BatchReport,
    pub stats: String,
    pub transcript: Vec<Message>,
}

/// Run the built-in suite end to end against the scripted target.
///
/// An operator posts `run all` and `stats` through the control surface,
/// exactly as a person would in a shared channel.
pub async fn run_demo(config: &ProbeConfig) -> Result<DemoOutcome, DemoError> {
    let harness = LocalSession::new(UserId::new("probe"));
    let guild = GuildId::new("demo");
    harness
        .add_guild(
            guild.clone(),
            vec![
                Member::new("probe", "Probe"),
                Member::new("pingbot", "PingBot"),
                Member::new("operator", "Operator"),
            ],
        )
        .await;
    let channel = ChannelId::new("probe-tests");
    harness.add_channel(channel.clone(), guild).await?;

    let target = harness.as_user(UserId::new("pingbot"));
    let operator = harness.as_user(UserId::new("operator"));
    let target_task = spawn_ping_target(target, harness.self_id().clone());

    let mut registry = TestRegistry::new();
    register_builtin_suite(&mut registry)?;
    info!(tests = ?registry.names(), "registered built-in suite");

    let session: Arc<dyn Session> = Arc::new(harness.clone());
    let orchestrator = Orchestrator::with_member_resolver(session, config);
    let mut dispatcher = CommandDispatcher::new(orchestrator, registry, config.commands.prefix.clone());

    let prefix = &config.commands.prefix;
    let run_all = operator
        .send_message(&channel, &format!("{prefix}run all"))
        .await?;
    let report = match dispatcher.handle(&run_all).await? {
        Some(CommandOutcome::Batch(report)) => report,
        _ => BatchReport::default(),
    };
    let stats_request = operator
        .send_message(&channel, &format!("{prefix}stats"))
        .await?;
    dispatcher.handle(&stats_request).await?;

    target_task.abort();
    Ok(DemoOutcome {
        report,
        stats: render_stats(dispatcher.registry()),
        transcript: harness.channel_history(&channel).await,
    })
}
