// Notification dispatch: one photo message per record, error notices to a side channel
use crate::config::AppConfig;
use crate::model::{Candidate, Channel, NotifyError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Where notifications end up. Telegram in production, a recorder in tests.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Sends a captioned photo message for `candidate` to `chat_id`.
    async fn send_candidate(&self, chat_id: &str, candidate: &Candidate) -> Result<(), NotifyError>;

    /// Sends plain text to the error channel.
    async fn send_error(&self, text: &str) -> Result<(), NotifyError>;
}

/// Attempts per error notice and the pause after each attempt
/// (the bot API allows ~20 messages per minute to one group).
#[derive(Debug, Clone, Copy)]
pub struct ErrorPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

#[cfg(test)]
impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_secs(3),
        }
    }
}

impl From<&AppConfig> for ErrorPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_retries: config.error_max_retries,
            delay: config.error_delay(),
        }
    }
}

/// Best-effort error notice. Returns whether any attempt got through.
pub async fn report_error<S>(sink: &S, text: &str, policy: ErrorPolicy) -> bool
where
    S: NotificationSink + ?Sized,
{
    let attempts = policy.max_retries.max(1);

    for attempt in 1..=attempts {
        let result = sink.send_error(text).await;
        if !policy.delay.is_zero() {
            sleep(policy.delay).await;
        }

        match result {
            Ok(()) => return true,
            Err(e) => {
                error!("Error notice failed: {}", e);
                if attempt < attempts {
                    info!("Retrying...({}/{})", attempt, attempts);
                }
            }
        }
    }

    error!("Failed to send message. Maximum retry count reached.");
    false
}

/// Sends every eligible record to `channel` and returns the batch with the
/// channel's flag set.
///
/// A record counts as notified once it has been attempted, even when the send
/// failed; the failure is forwarded to the error channel instead.
pub async fn notify_candidates<S>(
    sink: &S,
    mut records: Vec<Candidate>,
    channel: &Channel,
    policy: ErrorPolicy,
) -> Vec<Candidate>
where
    S: NotificationSink + ?Sized,
{
    for candidate in records.iter_mut() {
        if !channel.accepts(candidate) {
            warn!(
                "Candidate no. {} ({}) is not for the {:?} channel, skipped",
                candidate.id, candidate.species, channel.kind
            );
            continue;
        }
        if channel.is_notified(candidate) {
            continue;
        }

        match sink.send_candidate(&channel.chat_id, candidate).await {
            Ok(()) => info!("Candidate no. {} is sent.", candidate.id),
            Err(e) => {
                error!("Cannot send candidate no. {}: {}", candidate.id, e);
                let notice = format!("Cannot send Candidate no. {} to the bot API.", candidate.id);
                report_error(sink, &notice, policy).await;
            }
        }

        channel.mark_notified(candidate);
    }

    records
}

#[cfg(test)]
pub(crate) mod fake {
    use super::NotificationSink;
    use crate::model::{Candidate, NotifyError};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records everything it is asked to send; fails for configured ids.
    #[derive(Default)]
    pub(crate) struct FakeSink {
        pub(crate) failing_ids: HashSet<String>,
        pub(crate) error_channel_down: bool,
        pub(crate) sent: Mutex<Vec<(String, String)>>,
        pub(crate) errors: Mutex<Vec<String>>,
    }

    impl FakeSink {
        pub(crate) fn failing_on(ids: &[&str]) -> Self {
            Self {
                failing_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        pub(crate) fn sent_ids(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, id)| id.clone()).collect()
        }

        pub(crate) fn error_count(&self) -> usize {
            self.errors.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl NotificationSink for FakeSink {
        async fn send_candidate(&self, chat_id: &str, candidate: &Candidate) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), candidate.id.clone()));
            if self.failing_ids.contains(&candidate.id) {
                return Err(NotifyError::Status(400, "wrong file identifier".into()));
            }
            Ok(())
        }

        async fn send_error(&self, text: &str) -> Result<(), NotifyError> {
            self.errors.lock().unwrap().push(text.to_string());
            if self.error_channel_down {
                return Err(NotifyError::Unreachable);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeSink;
    use super::*;
    use crate::model::tests::sample;
    use crate::model::{ChannelKind, Species};

    const NO_DELAY: ErrorPolicy = ErrorPolicy {
        max_retries: 1,
        delay: Duration::ZERO,
    };

    fn record(id: &str, species: Species) -> Candidate {
        Candidate {
            id: id.to_string(),
            url: format!("https://s/a/{}", id),
            ..sample(species)
        }
    }

    #[tokio::test]
    async fn marks_every_record_even_when_sending_fails() {
        let sink = FakeSink::failing_on(&["2"]);
        let channel = Channel::new(ChannelKind::All, "-100");
        let records = vec![
            record("1", Species::Cat),
            record("2", Species::Dog),
            record("3", Species::Cat),
        ];

        let out = notify_candidates(&sink, records, &channel, NO_DELAY).await;

        assert!(out.iter().all(|c| c.is_notified_all));
        assert!(out.iter().all(|c| !c.is_notified_cat));
        assert_eq!(sink.sent_ids(), vec!["1", "2", "3"]);
        assert!(sink.sent.lock().unwrap().iter().all(|(chat, _)| chat == "-100"));
    }

    #[tokio::test]
    async fn one_failure_sends_exactly_one_error_notice() {
        let sink = FakeSink::failing_on(&["2"]);
        let channel = Channel::new(ChannelKind::All, "-100");

        notify_candidates(&sink, vec![record("1", Species::Cat), record("2", Species::Cat)], &channel, NO_DELAY)
            .await;

        let errors = sink.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Candidate no. 2"));
    }

    #[tokio::test]
    async fn error_notice_retries_up_to_the_limit() {
        let sink = FakeSink {
            error_channel_down: true,
            ..FakeSink::default()
        };
        let policy = ErrorPolicy {
            max_retries: 3,
            delay: Duration::ZERO,
        };

        assert!(!report_error(&sink, "boom", policy).await);
        assert_eq!(sink.error_count(), 3);
    }

    #[tokio::test]
    async fn error_notice_stops_after_success() {
        let sink = FakeSink::default();
        let policy = ErrorPolicy {
            max_retries: 3,
            delay: Duration::ZERO,
        };

        assert!(report_error(&sink, "boom", policy).await);
        assert_eq!(sink.error_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_after_each_error_notice() {
        let sink = FakeSink::default();
        let started = tokio::time::Instant::now();

        report_error(&sink, "boom", ErrorPolicy::default()).await;

        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn cat_channel_skips_dogs() {
        let sink = FakeSink::default();
        let channel = Channel::new(ChannelKind::Cat, "-200");

        let out = notify_candidates(&sink, vec![record("1", Species::Cat), record("2", Species::Dog)], &channel, NO_DELAY)
            .await;

        assert_eq!(sink.sent_ids(), vec!["1"]);
        assert!(out[0].is_notified_cat);
        assert!(!out[1].is_notified_cat);
    }

    #[tokio::test]
    async fn already_notified_records_are_not_resent() {
        let sink = FakeSink::default();
        let channel = Channel::new(ChannelKind::All, "-100");
        let mut done = record("1", Species::Cat);
        done.is_notified_all = true;

        notify_candidates(&sink, vec![done, record("2", Species::Cat)], &channel, NO_DELAY).await;

        assert_eq!(sink.sent_ids(), vec!["2"]);
    }
}
