use probe_core::types::{ChannelId, GuildId, MessageId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session event stream closed")]
    Closed,
    #[error("unknown channel: {channel}")]
    UnknownChannel { channel: ChannelId },
    #[error("unknown guild: {guild}")]
    UnknownGuild { guild: GuildId },
    #[error("unknown message: {message}")]
    UnknownMessage { message: MessageId },
    #[error("cannot edit message {message}: not authored by this session")]
    NotAuthor { message: MessageId },
}
