//! Predicate-based event correlation with a deadline.

use probe_core::types::SessionEvent;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::Session;

/// Wait for the first event on `rx` that satisfies `predicate`.
///
/// Returns `Ok(None)` when `timeout` elapses first. A timeout too large to
/// express as an instant never elapses. Events that do not match are
/// discarded, not held for a later wait.
pub async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<SessionEvent>,
    mut predicate: F,
    timeout: Duration,
) -> Result<Option<SessionEvent>, SessionError>
where
    F: FnMut(&SessionEvent) -> bool,
{
    let deadline = Instant::now().checked_add(timeout);
    loop {
        let received = match deadline {
            Some(deadline) => match timeout_at(deadline, rx.recv()).await {
                Ok(received) => received,
                Err(_) => return Ok(None),
            },
            None => rx.recv().await,
        };
        match received {
            Ok(event) => {
                if predicate(&event) {
                    return Ok(Some(event));
                }
                debug!(kind = ?event.kind(), "ignoring non-matching event");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event watcher lagged behind the session stream");
            }
            Err(RecvError::Closed) => return Err(SessionError::Closed),
        }
    }
}

/// A subscription opened at a known instant.
///
/// Opening the watch before sending a stimulus guarantees the reply to that
/// stimulus cannot slip past unobserved.
pub struct EventWatch {
    rx: broadcast::Receiver<SessionEvent>,
}

impl EventWatch {
    pub fn open(session: &dyn Session) -> Self {
        Self {
            rx: session.subscribe(),
        }
    }

    pub async fn next_matching<F>(
        &mut self,
        predicate: F,
        timeout: Duration,
    ) -> Result<Option<SessionEvent>, SessionError>
    where
        F: FnMut(&SessionEvent) -> bool,
    {
        wait_for_event(&mut self.rx, predicate, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalSession;
    use probe_core::types::{ChannelId, GuildId, Member, UserId};

    async fn world() -> (LocalSession, LocalSession, ChannelId) {
        let session = LocalSession::new(UserId::new("tester"));
        let guild = GuildId::new("g1");
        session
            .add_guild(guild.clone(), vec![Member::new("bot", "PingBot")])
            .await;
        let channel = ChannelId::new("c1");
        session
            .add_channel(channel.clone(), guild)
            .await
            .expect("add channel");
        let bot = session.as_user(UserId::new("bot"));
        (session, bot, channel)
    }

    fn from_bot(event: &SessionEvent) -> bool {
        event
            .created_message()
            .map(|message| message.author_id == UserId::new("bot"))
            .unwrap_or(false)
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_without_matching_event() {
        let (session, _, channel) = world().await;
        let mut watch = EventWatch::open(&session);
        session.send_message(&channel, "hello").await.expect("send");

        let started = Instant::now();
        let event = watch
            .next_matching(from_bot, Duration::from_secs(20))
            .await
            .expect("wait");

        assert!(event.is_none());
        assert!(started.elapsed() >= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_matching_event_only() {
        let (session, bot, channel) = world().await;
        let mut watch = EventWatch::open(&session);

        session.send_message(&channel, "noise").await.expect("send");
        bot.send_message(&channel, "first").await.expect("first");
        bot.send_message(&channel, "second").await.expect("second");

        let event = watch
            .next_matching(from_bot, Duration::from_secs(20))
            .await
            .expect("wait")
            .expect("matched");
        assert_eq!(event.created_message().map(|m| m.content.as_str()), Some("first"));
    }

    #[tokio::test(start_paused = true)]
    async fn events_before_subscription_are_not_seen() {
        let (session, bot, channel) = world().await;
        bot.send_message(&channel, "too early").await.expect("early");

        let mut rx = session.subscribe();
        let event = wait_for_event(&mut rx, from_bot, Duration::from_secs(1))
            .await
            .expect("wait");
        assert!(event.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn event_arriving_mid_wait_resolves_it() {
        let (session, bot, channel) = world().await;
        let mut watch = EventWatch::open(&session);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            let _ = bot.send_message(&channel, "late but in time").await;
        });

        let started = Instant::now();
        let event = watch
            .next_matching(from_bot, Duration::from_secs(20))
            .await
            .expect("wait");
        assert!(event.is_some());
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_timeout_waits_without_deadline() {
        let (session, bot, channel) = world().await;
        let mut rx = session.subscribe();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let _ = bot.send_message(&channel, "eventually").await;
        });

        let event = wait_for_event(&mut rx, from_bot, Duration::from_secs(u64::MAX))
            .await
            .expect("wait")
            .expect("matched");
        assert_eq!(
            event.created_message().map(|m| m.content.as_str()),
            Some("eventually")
        );
    }
}
