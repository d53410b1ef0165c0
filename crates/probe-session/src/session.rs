//! Boundary to the live chat connection.
//!
//! The transport that keeps a real platform connection alive implements
//! [`Session`]; the harness only ever talks to this trait.

use async_trait::async_trait;
use probe_core::types::{ChannelId, GuildId, Member, Message, Reaction, SessionEvent, UserId};
use tokio::sync::broadcast;

use crate::error::SessionError;

#[async_trait]
pub trait Session: Send + Sync {
    /// Identity the session posts and reacts as.
    fn self_id(&self) -> &UserId;

    /// Start observing events. Only events published after this call are seen.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    async fn send_message(&self, channel: &ChannelId, content: &str)
        -> Result<Message, SessionError>;

    async fn edit_message(&self, message: &Message, content: &str)
        -> Result<Message, SessionError>;

    async fn add_reaction(&self, message: &Message, emoji: &str)
        -> Result<Reaction, SessionError>;

    async fn channel_guild(&self, channel: &ChannelId) -> Result<GuildId, SessionError>;

    /// Membership of a guild, in the platform's listing order.
    async fn guild_members(&self, guild: &GuildId) -> Result<Vec<Member>, SessionError>;
}
