//! In-process session used by the demo and by tests.
//!
//! Every handle created with [`LocalSession::as_user`] shares one message
//! store and one event stream, so a scripted target and the harness see
//! each other's traffic the way two bots on the same server would.

use async_trait::async_trait;
use chrono::Utc;
use probe_core::types::{
    ChannelId, GuildId, Member, Message, MessageId, Reaction, SessionEvent, UserId,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::error::SessionError;
use crate::session::Session;

const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct LocalSessionInner {
    guilds: BTreeMap<GuildId, Vec<Member>>,
    channels: BTreeMap<ChannelId, GuildId>,
    messages: BTreeMap<MessageId, Message>,
}

#[derive(Debug, Clone)]
pub struct LocalSession {
    self_id: UserId,
    inner: Arc<RwLock<LocalSessionInner>>,
    events_tx: broadcast::Sender<SessionEvent>,
    message_counter: Arc<AtomicU64>,
}

impl LocalSession {
    pub fn new(self_id: UserId) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            self_id,
            inner: Arc::new(RwLock::new(LocalSessionInner::default())),
            events_tx,
            message_counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Another handle onto the same world, acting as `user_id`.
    pub fn as_user(&self, user_id: UserId) -> Self {
        Self {
            self_id: user_id,
            inner: Arc::clone(&self.inner),
            events_tx: self.events_tx.clone(),
            message_counter: Arc::clone(&self.message_counter),
        }
    }

    pub async fn add_guild(&self, guild: GuildId, members: Vec<Member>) {
        let mut guard = self.inner.write().await;
        guard.guilds.insert(guild, members);
    }

    pub async fn add_member(&self, guild: &GuildId, member: Member) -> Result<(), SessionError> {
        let mut guard = self.inner.write().await;
        let members = guard
            .guilds
            .get_mut(guild)
            .ok_or_else(|| SessionError::UnknownGuild {
                guild: guild.clone(),
            })?;
        members.push(member);
        Ok(())
    }

    pub async fn add_channel(&self, channel: ChannelId, guild: GuildId) -> Result<(), SessionError> {
        let mut guard = self.inner.write().await;
        if !guard.guilds.contains_key(&guild) {
            return Err(SessionError::UnknownGuild { guild });
        }
        guard.channels.insert(channel, guild);
        Ok(())
    }

    pub async fn message(&self, id: &MessageId) -> Option<Message> {
        let guard = self.inner.read().await;
        guard.messages.get(id).cloned()
    }

    /// All messages posted to `channel`, oldest first.
    pub async fn channel_history(&self, channel: &ChannelId) -> Vec<Message> {
        let guard = self.inner.read().await;
        let mut history = guard
            .messages
            .values()
            .filter(|message| &message.channel_id == channel)
            .cloned()
            .collect::<Vec<_>>();
        history.sort_by_key(message_seq);
        history
    }

    fn next_message_id(&self) -> MessageId {
        let id = self.message_counter.fetch_add(1, Ordering::Relaxed);
        MessageId(format!("M-{id}"))
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}

fn message_seq(message: &Message) -> u64 {
    message
        .id
        .0
        .strip_prefix("M-")
        .and_then(|seq| seq.parse().ok())
        .unwrap_or(u64::MAX)
}

#[async_trait]
impl Session for LocalSession {
    fn self_id(&self) -> &UserId {
        &self.self_id
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    async fn send_message(
        &self,
        channel: &ChannelId,
        content: &str,
    ) -> Result<Message, SessionError> {
        let mut guard = self.inner.write().await;
        if !guard.channels.contains_key(channel) {
            return Err(SessionError::UnknownChannel {
                channel: channel.clone(),
            });
        }
        let message = Message {
            id: self.next_message_id(),
            channel_id: channel.clone(),
            author_id: self.self_id.clone(),
            content: content.to_string(),
            sent_at: Utc::now(),
        };
        guard.messages.insert(message.id.clone(), message.clone());
        drop(guard);
        self.emit(SessionEvent::MessageCreated(message.clone()));
        Ok(message)
    }

    async fn edit_message(
        &self,
        message: &Message,
        content: &str,
    ) -> Result<Message, SessionError> {
        let mut guard = self.inner.write().await;
        let stored = guard
            .messages
            .get_mut(&message.id)
            .ok_or_else(|| SessionError::UnknownMessage {
                message: message.id.clone(),
            })?;
        if stored.author_id != self.self_id {
            return Err(SessionError::NotAuthor {
                message: message.id.clone(),
            });
        }
        stored.content = content.to_string();
        let snapshot = stored.clone();
        drop(guard);
        self.emit(SessionEvent::MessageEdited(snapshot.clone()));
        Ok(snapshot)
    }

    async fn add_reaction(
        &self,
        message: &Message,
        emoji: &str,
    ) -> Result<Reaction, SessionError> {
        let guard = self.inner.read().await;
        let stored = guard
            .messages
            .get(&message.id)
            .ok_or_else(|| SessionError::UnknownMessage {
                message: message.id.clone(),
            })?;
        let reaction = Reaction {
            message_id: stored.id.clone(),
            channel_id: stored.channel_id.clone(),
            user_id: self.self_id.clone(),
            emoji: emoji.to_string(),
        };
        drop(guard);
        self.emit(SessionEvent::ReactionAdded(reaction.clone()));
        Ok(reaction)
    }

    async fn channel_guild(&self, channel: &ChannelId) -> Result<GuildId, SessionError> {
        let guard = self.inner.read().await;
        guard
            .channels
            .get(channel)
            .cloned()
            .ok_or_else(|| SessionError::UnknownChannel {
                channel: channel.clone(),
            })
    }

    async fn guild_members(&self, guild: &GuildId) -> Result<Vec<Member>, SessionError> {
        let guard = self.inner.read().await;
        guard
            .guilds
            .get(guild)
            .cloned()
            .ok_or_else(|| SessionError::UnknownGuild {
                guild: guild.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn world() -> (LocalSession, ChannelId) {
        let session = LocalSession::new(UserId::new("tester"));
        let guild = GuildId::new("g1");
        session
            .add_guild(
                guild.clone(),
                vec![Member::new("tester", "Probe"), Member::new("bot", "PingBot")],
            )
            .await;
        let channel = ChannelId::new("c1");
        session
            .add_channel(channel.clone(), guild)
            .await
            .expect("add channel");
        (session, channel)
    }

    #[tokio::test]
    async fn send_message_emits_created_event() {
        let (session, channel) = world().await;
        let mut rx = session.subscribe();

        let sent = session
            .send_message(&channel, "ping?")
            .await
            .expect("send");

        assert_eq!(sent.author_id, UserId::new("tester"));
        let event = rx.recv().await.expect("event");
        assert_eq!(event, SessionEvent::MessageCreated(sent.clone()));
        assert_eq!(session.message(&sent.id).await, Some(sent));
    }

    #[tokio::test]
    async fn send_to_unknown_channel_fails() {
        let (session, _) = world().await;
        let err = session
            .send_message(&ChannelId::new("nope"), "hi")
            .await
            .expect_err("unknown channel");
        assert!(matches!(err, SessionError::UnknownChannel { .. }));
    }

    #[tokio::test]
    async fn handles_share_history_and_events() {
        let (session, channel) = world().await;
        let bot = session.as_user(UserId::new("bot"));
        let mut rx = session.subscribe();

        session.send_message(&channel, "ping?").await.expect("send");
        let reply = bot.send_message(&channel, "pong!").await.expect("reply");

        let _ = rx.recv().await.expect("own message");
        let event = rx.recv().await.expect("bot message");
        assert_eq!(event.created_message().map(|m| &m.author_id), Some(&UserId::new("bot")));

        let history = session.channel_history(&channel).await;
        assert_eq!(
            history.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["ping?", "pong!"]
        );
        assert_eq!(history[1], reply);
    }

    #[tokio::test]
    async fn only_author_can_edit() {
        let (session, channel) = world().await;
        let bot = session.as_user(UserId::new("bot"));
        let sent = session.send_message(&channel, "draft").await.expect("send");

        let err = bot.edit_message(&sent, "hijack").await.expect_err("not author");
        assert!(matches!(err, SessionError::NotAuthor { .. }));

        let edited = session.edit_message(&sent, "final").await.expect("edit");
        assert_eq!(edited.content, "final");
        assert_eq!(session.message(&sent.id).await.map(|m| m.content), Some("final".to_string()));
    }

    #[tokio::test]
    async fn reaction_carries_reacting_user() {
        let (session, channel) = world().await;
        let bot = session.as_user(UserId::new("bot"));
        let sent = session.send_message(&channel, "react pls").await.expect("send");
        let mut rx = session.subscribe();

        let reaction = bot.add_reaction(&sent, "👍").await.expect("react");

        assert_eq!(reaction.user_id, UserId::new("bot"));
        assert_eq!(reaction.message_id, sent.id);
        let event = rx.recv().await.expect("reaction event");
        assert_eq!(event.reaction(), Some(&reaction));
    }

    #[tokio::test]
    async fn membership_lookup_follows_channel_guild() {
        let (session, channel) = world().await;
        let guild = session.channel_guild(&channel).await.expect("guild");
        session
            .add_member(&guild, Member::new("human", "Alice"))
            .await
            .expect("add member");

        let names = session
            .guild_members(&guild)
            .await
            .expect("members")
            .into_iter()
            .map(|member| member.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Probe", "PingBot", "Alice"]);
    }
}
