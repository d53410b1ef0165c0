//! Shared fixture: a local world with the harness, a scripted target and a
//! human operator in one guild.

use probe_core::types::{ChannelId, GuildId, Member, SessionEvent, UserId};
use probe_session::{LocalSession, Session};
use std::sync::Arc;

use crate::interface::NEGATIVE_EMOJI;

pub struct Fixture {
    pub harness: LocalSession,
    pub target: LocalSession,
    pub human: LocalSession,
    pub channel: ChannelId,
    pub other_channel: ChannelId,
}

pub async fn fixture() -> Fixture {
    let harness = LocalSession::new(UserId::new("probe"));
    let guild = GuildId::new("lab");
    harness
        .add_guild(
            guild.clone(),
            vec![
                Member::new("probe", "Probe"),
                Member::new("pingbot", "PingBot"),
                Member::new("alice", "Alice"),
            ],
        )
        .await;
    let channel = ChannelId::new("tests");
    let other_channel = ChannelId::new("offtopic");
    harness
        .add_channel(channel.clone(), guild.clone())
        .await
        .expect("tests channel");
    harness
        .add_channel(other_channel.clone(), guild)
        .await
        .expect("offtopic channel");

    Fixture {
        target: harness.as_user(UserId::new("pingbot")),
        human: harness.as_user(UserId::new("alice")),
        harness,
        channel,
        other_channel,
    }
}

impl Fixture {
    pub fn harness_session(&self) -> Arc<dyn Session> {
        Arc::new(self.harness.clone())
    }

    pub fn target_id(&self) -> UserId {
        self.target.self_id().clone()
    }

    /// Target answers each harness message with `reply(content)`, if any.
    pub fn reply_with<F>(&self, reply: F)
    where
        F: Fn(&str) -> Option<String> + Send + 'static,
    {
        let mut rx = self.target.subscribe();
        let target = self.target.clone();
        let harness_id = self.harness.self_id().clone();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                let Some(message) = event.created_message() else {
                    continue;
                };
                if message.author_id != harness_id {
                    continue;
                }
                if let Some(text) = reply(&message.content) {
                    let _ = target.send_message(&message.channel_id, &text).await;
                }
            }
        });
    }

    /// Target reacts to each harness message with `react(content)`, if any.
    pub fn react_with<F>(&self, react: F)
    where
        F: Fn(&str) -> Option<String> + Send + 'static,
    {
        let mut rx = self.target.subscribe();
        let target = self.target.clone();
        let harness_id = self.harness.self_id().clone();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                let Some(message) = event.created_message() else {
                    continue;
                };
                if message.author_id != harness_id {
                    continue;
                }
                if let Some(emoji) = react(&message.content) {
                    let _ = target.add_reaction(message, &emoji).await;
                }
            }
        });
    }

    /// The human answers the next question the harness puts up for a vote.
    pub fn human_answers(&self, emoji: &'static str) {
        let mut rx = self.human.subscribe();
        let human = self.human.clone();
        let harness_id = self.harness.self_id().clone();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                let SessionEvent::ReactionAdded(reaction) = event else {
                    continue;
                };
                // The negative choice is offered last; once it is up, vote.
                if reaction.user_id != harness_id || reaction.emoji != NEGATIVE_EMOJI {
                    continue;
                }
                if let Some(question) = human.message(&reaction.message_id).await {
                    let _ = human.add_reaction(&question, emoji).await;
                }
                break;
            }
        });
    }
}
