//! Resolving the agent under test from a human-friendly name fragment.

use async_trait::async_trait;
use probe_core::types::{ChannelId, GuildId, Member, UserId};
use std::sync::Arc;

use crate::error::SessionError;
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no member of guild {guild} matches target name '{fragment}'")]
    TargetNotFound { fragment: String, guild: GuildId },
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve(&self, fragment: &str, channel: &ChannelId) -> Result<UserId, ResolveError>;
}

/// Case-insensitive substring match over the channel's guild membership.
pub struct MemberNameResolver {
    session: Arc<dyn Session>,
}

impl MemberNameResolver {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl TargetResolver for MemberNameResolver {
    async fn resolve(&self, fragment: &str, channel: &ChannelId) -> Result<UserId, ResolveError> {
        let guild = self.session.channel_guild(channel).await?;
        let members = self.session.guild_members(&guild).await?;
        find_member(&members, fragment)
            .map(|member| member.user_id.clone())
            .ok_or_else(|| ResolveError::TargetNotFound {
                fragment: fragment.to_string(),
                guild,
            })
    }
}

/// First member, in listing order, whose name contains `fragment`.
pub fn find_member<'a>(members: &'a [Member], fragment: &str) -> Option<&'a Member> {
    let needle = fragment.to_lowercase();
    members
        .iter()
        .find(|member| member.name.to_lowercase().contains(&needle))
}
