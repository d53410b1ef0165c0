//! Chat model shared by the session boundary and the harness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(UserId);
string_id!(ChannelId);
string_id!(GuildId);
string_id!(MessageId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub emoji: String,
}

/// A user visible in a guild's membership list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub name: String,
}

impl Member {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    MessageCreated,
    MessageEdited,
    ReactionAdded,
}

/// Raw events delivered by a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    MessageCreated(Message),
    MessageEdited(Message),
    ReactionAdded(Reaction),
}

impl SessionEvent {
    pub fn kind(&self) -> SessionEventKind {
        match self {
            SessionEvent::MessageCreated(_) => SessionEventKind::MessageCreated,
            SessionEvent::MessageEdited(_) => SessionEventKind::MessageEdited,
            SessionEvent::ReactionAdded(_) => SessionEventKind::ReactionAdded,
        }
    }

    pub fn channel_id(&self) -> &ChannelId {
        match self {
            SessionEvent::MessageCreated(message) | SessionEvent::MessageEdited(message) => {
                &message.channel_id
            }
            SessionEvent::ReactionAdded(reaction) => &reaction.channel_id,
        }
    }

    /// The new message carried by a `MessageCreated` event.
    pub fn created_message(&self) -> Option<&Message> {
        match self {
            SessionEvent::MessageCreated(message) => Some(message),
            _ => None,
        }
    }

    pub fn reaction(&self) -> Option<&Reaction> {
        match self {
            SessionEvent::ReactionAdded(reaction) => Some(reaction),
            _ => None,
        }
    }
}
