//! Assertion interface handed to test logic.
//!
//! Every wait primitive subscribes to the session stream, suspends until the
//! first event that satisfies its predicate or until the shared response
//! timeout, and resolves exactly once. Each primitive returns its matched
//! value or exactly one [`RequirementFailure`].
//!
//! Composed primitives open their subscription *before* sending the
//! stimulus, so a target that answers faster than the harness starts
//! waiting is still observed. A bare [`Interface::wait_for_message`] only
//! sees events published after the call; nothing is buffered between calls.

use probe_core::config::ProbeConfig;
use probe_core::failure::RequirementFailure;
use probe_core::types::{ChannelId, Message, Reaction, SessionEvent, UserId};
use probe_session::{EventWatch, Session, SessionError};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const AFFIRMATIVE_EMOJI: &str = "\u{2714}";
pub const NEGATIVE_EMOJI: &str = "\u{274C}";

#[derive(Debug, thiserror::Error)]
pub enum InterfaceError {
    #[error(transparent)]
    Requirement(#[from] RequirementFailure),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid response pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl InterfaceError {
    pub fn requirement(&self) -> Option<RequirementFailure> {
        match self {
            InterfaceError::Requirement(failure) => Some(*failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSettings {
    pub response_timeout: Duration,
    pub error_markers: Vec<String>,
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self::from(&ProbeConfig::for_target(""))
    }
}

impl From<&ProbeConfig> for InterfaceSettings {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            response_timeout: config.timeouts.response_timeout(),
            error_markers: config
                .assertions
                .error_markers
                .iter()
                .map(|marker| marker.to_lowercase())
                .collect(),
        }
    }
}

enum ContentCheck<'a> {
    Equals(&'a str),
    Contains(&'a str),
    Matches(Regex),
}

impl ContentCheck<'_> {
    fn pattern(pattern: &str) -> Result<ContentCheck<'static>, InterfaceError> {
        Regex::new(pattern)
            .map(ContentCheck::Matches)
            .map_err(|source| InterfaceError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    fn holds(&self, content: &str) -> bool {
        match self {
            ContentCheck::Equals(expected) => content == *expected,
            ContentCheck::Contains(substring) => content.contains(substring),
            // Anchored at the start of the content, like a prefix match.
            ContentCheck::Matches(regex) => regex
                .find(content)
                .map(|found| found.start() == 0)
                .unwrap_or(false),
        }
    }

    fn enforce(&self, message: Message) -> Result<Message, InterfaceError> {
        if self.holds(&message.content) {
            Ok(message)
        } else {
            debug!(content = %message.content, "response did not match");
            Err(RequirementFailure::ResponseDidNotMatch.into())
        }
    }
}

/// Per-run handle bound to one session, one channel and one target.
#[derive(Clone)]
pub struct Interface {
    session: Arc<dyn Session>,
    channel: ChannelId,
    target: UserId,
    self_id: UserId,
    settings: Arc<InterfaceSettings>,
}

impl std::fmt::Debug for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interface")
            .field("channel", &self.channel)
            .field("target", &self.target)
            .field("self_id", &self.self_id)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Interface {
    pub fn new(
        session: Arc<dyn Session>,
        channel: ChannelId,
        target: UserId,
        settings: Arc<InterfaceSettings>,
    ) -> Self {
        let self_id = session.self_id().clone();
        Self {
            session,
            channel,
            target,
            self_id,
            settings,
        }
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn target(&self) -> &UserId {
        &self.target
    }

    /// Identity the harness posts as.
    pub fn self_id(&self) -> &UserId {
        &self.self_id
    }

    pub fn timeout(&self) -> Duration {
        self.settings.response_timeout
    }

    pub async fn send_message(&self, content: &str) -> Result<Message, InterfaceError> {
        Ok(self.session.send_message(&self.channel, content).await?)
    }

    pub async fn edit_message(
        &self,
        message: &Message,
        new_content: &str,
    ) -> Result<Message, InterfaceError> {
        Ok(self.session.edit_message(message, new_content).await?)
    }

    /// Next message the target posts in this channel.
    pub async fn wait_for_message(&self) -> Result<Message, InterfaceError> {
        let mut watch = self.watch();
        self.next_target_message(&mut watch).await
    }

    /// Next reaction the target adds to `message`.
    pub async fn wait_for_reaction(&self, message: &Message) -> Result<Reaction, InterfaceError> {
        let mut watch = self.watch();
        self.next_target_reaction(&mut watch, message).await
    }

    pub async fn wait_for_reply(&self, content: &str) -> Result<Message, InterfaceError> {
        let mut watch = self.watch();
        self.send_message(content).await?;
        self.next_target_message(&mut watch).await
    }

    pub async fn assert_message_equals(&self, expected: &str) -> Result<Message, InterfaceError> {
        ContentCheck::Equals(expected).enforce(self.wait_for_message().await?)
    }

    pub async fn assert_message_contains(
        &self,
        substring: &str,
    ) -> Result<Message, InterfaceError> {
        ContentCheck::Contains(substring).enforce(self.wait_for_message().await?)
    }

    pub async fn assert_message_matches(&self, pattern: &str) -> Result<Message, InterfaceError> {
        let check = ContentCheck::pattern(pattern)?;
        check.enforce(self.wait_for_message().await?)
    }

    pub async fn assert_reply_equals(
        &self,
        stimulus: &str,
        expected: &str,
    ) -> Result<Message, InterfaceError> {
        ContentCheck::Equals(expected).enforce(self.wait_for_reply(stimulus).await?)
    }

    pub async fn assert_reply_contains(
        &self,
        stimulus: &str,
        substring: &str,
    ) -> Result<Message, InterfaceError> {
        ContentCheck::Contains(substring).enforce(self.wait_for_reply(stimulus).await?)
    }

    pub async fn assert_reply_matches(
        &self,
        stimulus: &str,
        pattern: &str,
    ) -> Result<Message, InterfaceError> {
        let check = ContentCheck::pattern(pattern)?;
        check.enforce(self.wait_for_reply(stimulus).await?)
    }

    pub async fn assert_reaction_equals(
        &self,
        stimulus: &str,
        expected_emoji: &str,
    ) -> Result<Reaction, InterfaceError> {
        let mut watch = self.watch();
        let sent = self.send_message(stimulus).await?;
        let reaction = self.next_target_reaction(&mut watch, &sent).await?;
        if reaction.emoji != expected_emoji {
            debug!(emoji = %reaction.emoji, expected = expected_emoji, "reaction did not match");
            return Err(RequirementFailure::ReactionDidNotMatch.into());
        }
        Ok(reaction)
    }

    /// Reply must not carry any configured error marker.
    pub async fn assert_reply_not_errored(&self, stimulus: &str) -> Result<Message, InterfaceError> {
        let reply = self.wait_for_reply(stimulus).await?;
        if self.reports_error(&reply) {
            return Err(RequirementFailure::ErroredResponse.into());
        }
        Ok(reply)
    }

    /// Reply must carry at least one configured error marker.
    pub async fn assert_reply_errored(&self, stimulus: &str) -> Result<Message, InterfaceError> {
        let reply = self.wait_for_reply(stimulus).await?;
        if !self.reports_error(&reply) {
            return Err(RequirementFailure::UnexpectedSuccess.into());
        }
        Ok(reply)
    }

    /// Succeeds only if the target stays quiet for the whole window.
    pub async fn ensure_silence(&self) -> Result<(), InterfaceError> {
        let mut watch = self.watch();
        let event = watch
            .next_matching(|event| self.is_target_message(event), self.timeout())
            .await?;
        match event {
            Some(_) => Err(RequirementFailure::UnexpectedResponse.into()),
            None => Ok(()),
        }
    }

    /// Ask whoever is watching the channel for a yes/no verdict.
    ///
    /// The first reaction on the question from anyone but the harness is
    /// the answer. Only the negative choice rejects; any other symbol
    /// approves.
    pub async fn ask_human(&self, query: &str) -> Result<(), InterfaceError> {
        let mut watch = self.watch();
        let question = self.send_message(query).await?;
        self.session
            .add_reaction(&question, AFFIRMATIVE_EMOJI)
            .await?;
        self.session.add_reaction(&question, NEGATIVE_EMOJI).await?;
        info!(message = %question.id, "waiting for a human verdict");

        let event = watch
            .next_matching(
                |event| {
                    event.reaction().is_some_and(|reaction| {
                        reaction.message_id == question.id && reaction.user_id != self.self_id
                    })
                },
                self.timeout(),
            )
            .await?;

        match event {
            Some(SessionEvent::ReactionAdded(reaction)) if reaction.emoji == NEGATIVE_EMOJI => {
                Err(RequirementFailure::HumanResponseFailure.into())
            }
            Some(_) => Ok(()),
            None => Err(RequirementFailure::HumanResponseTimeout.into()),
        }
    }

    fn watch(&self) -> EventWatch {
        EventWatch::open(self.session.as_ref())
    }

    fn is_target_message(&self, event: &SessionEvent) -> bool {
        event.created_message().is_some_and(|message| {
            message.author_id == self.target && message.channel_id == self.channel
        })
    }

    async fn next_target_message(&self, watch: &mut EventWatch) -> Result<Message, InterfaceError> {
        let event = watch
            .next_matching(|event| self.is_target_message(event), self.timeout())
            .await?;
        match event {
            Some(SessionEvent::MessageCreated(message)) => Ok(message),
            _ => Err(RequirementFailure::NoResponse.into()),
        }
    }

    async fn next_target_reaction(
        &self,
        watch: &mut EventWatch,
        message: &Message,
    ) -> Result<Reaction, InterfaceError> {
        let event = watch
            .next_matching(
                |event| {
                    event.reaction().is_some_and(|reaction| {
                        reaction.message_id == message.id
                            && reaction.user_id == self.target
                            && reaction.channel_id == self.channel
                    })
                },
                self.timeout(),
            )
            .await?;
        match event {
            Some(SessionEvent::ReactionAdded(reaction)) => Ok(reaction),
            _ => Err(RequirementFailure::NoReaction.into()),
        }
    }

    fn reports_error(&self, message: &Message) -> bool {
        let content = message.content.to_lowercase();
        self.settings
            .error_markers
            .iter()
            .any(|marker| content.contains(marker.as_str()))
    }
}
