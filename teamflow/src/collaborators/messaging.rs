//! Outbound messaging.

use crate::errors::CollaboratorError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Sends messages to leads.
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Sends one message.
    ///
    /// Fails with `CollaboratorError::Delivery` on transport failure and may
    /// fail with `CollaboratorError::RateLimited` when a send quota is spent.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), CollaboratorError>;
}

/// A message handed to a messaging service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

/// A messaging service that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct MockMessagingService {
    sent: Mutex<Vec<OutboundMessage>>,
    failure: Option<String>,
}

impl MockMessagingService {
    /// Creates a recording messaging service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service whose every send fails with a delivery error.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    /// Returns all messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    /// Returns the number of messages sent.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl MessagingService for MockMessagingService {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        if let Some(reason) = &self.failure {
            return Err(CollaboratorError::delivery(to, reason));
        }
        tracing::debug!(to = %to, subject = %subject, "recorded outbound message");
        self.sent.lock().push(OutboundMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct OutboxLine<'a> {
    sent_at: DateTime<Utc>,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Appends every message as a JSON line to an outbox file.
///
/// A downstream mailer drains the outbox; write failures surface as
/// delivery errors.
#[derive(Debug)]
pub struct OutboxMessagingService {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl OutboxMessagingService {
    /// Creates an outbox writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the outbox path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MessagingService for OutboxMessagingService {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        let line = OutboxLine {
            sent_at: Utc::now(),
            to,
            subject,
            body,
        };
        let mut json = serde_json::to_string(&line)
            .map_err(|e| CollaboratorError::delivery(to, e.to_string()))?;
        json.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| CollaboratorError::delivery(to, format!("outbox unavailable: {e}")))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| CollaboratorError::delivery(to, format!("outbox write failed: {e}")))?;
        file.flush()
            .await
            .map_err(|e| CollaboratorError::delivery(to, format!("outbox write failed: {e}")))?;

        tracing::info!(to = %to, outbox = %self.path.display(), "queued outbound message");
        Ok(())
    }
}

#[derive(Debug)]
struct DailyCount {
    day: NaiveDate,
    sent: u32,
}

/// Enforces a daily send quota in front of another messaging service.
///
/// A slot is reserved before delegating and released again if the inner
/// send fails, so only delivered messages count against the quota.
pub struct DailyLimitedMessaging {
    inner: Arc<dyn MessagingService>,
    limit: u32,
    count: Mutex<DailyCount>,
    today: Box<dyn Fn() -> NaiveDate + Send + Sync>,
}

impl std::fmt::Debug for DailyLimitedMessaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyLimitedMessaging")
            .field("limit", &self.limit)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl DailyLimitedMessaging {
    /// Wraps `inner` with a quota of `limit` messages per UTC day.
    #[must_use]
    pub fn new(inner: Arc<dyn MessagingService>, limit: u32) -> Self {
        Self::with_clock(inner, limit, || Utc::now().date_naive())
    }

    /// Wraps `inner` using a custom clock to decide the current day.
    #[must_use]
    pub fn with_clock(
        inner: Arc<dyn MessagingService>,
        limit: u32,
        today: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> Self {
        let day = today();
        Self {
            inner,
            limit,
            count: Mutex::new(DailyCount { day, sent: 0 }),
            today: Box::new(today),
        }
    }

    /// Returns the configured daily limit.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of messages counted against today's quota.
    #[must_use]
    pub fn sent_today(&self) -> u32 {
        let today = (self.today)();
        let count = self.count.lock();
        if count.day == today {
            count.sent
        } else {
            0
        }
    }

    fn reserve(&self) -> Result<NaiveDate, CollaboratorError> {
        let today = (self.today)();
        let mut count = self.count.lock();
        if count.day != today {
            count.day = today;
            count.sent = 0;
        }
        if count.sent >= self.limit {
            return Err(CollaboratorError::rate_limited(self.limit));
        }
        count.sent += 1;
        Ok(today)
    }

    fn release(&self, day: NaiveDate) {
        let mut count = self.count.lock();
        if count.day == day {
            count.sent = count.sent.saturating_sub(1);
        }
    }
}

#[async_trait]
impl MessagingService for DailyLimitedMessaging {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        let day = match self.reserve() {
            Ok(day) => day,
            Err(e) => {
                tracing::warn!(to = %to, limit = self.limit, "daily send limit reached");
                return Err(e);
            }
        };

        match self.inner.send(to, subject, body).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.release(day);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[tokio::test]
    async fn test_mock_records_messages() {
        let service = MockMessagingService::new();
        service.send("a@example.com", "Hi", "Body").await.unwrap();

        assert_eq!(
            service.sent(),
            vec![OutboundMessage {
                to: "a@example.com".into(),
                subject: "Hi".into(),
                body: "Body".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let service = MockMessagingService::failing("smtp down");
        let err = service.send("a@example.com", "Hi", "Body").await.unwrap_err();

        assert_eq!(err.kind(), "DeliveryError");
        assert_eq!(service.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_daily_limit_enforced() {
        let inner = Arc::new(MockMessagingService::new());
        let limited = DailyLimitedMessaging::new(inner.clone(), 2);

        limited.send("a@x.example", "s", "b").await.unwrap();
        limited.send("b@x.example", "s", "b").await.unwrap();
        let err = limited.send("c@x.example", "s", "b").await.unwrap_err();

        assert_eq!(err, CollaboratorError::rate_limited(2));
        assert_eq!(inner.sent_count(), 2);
        assert_eq!(limited.sent_today(), 2);
    }

    #[tokio::test]
    async fn test_failed_send_does_not_consume_quota() {
        let limited = DailyLimitedMessaging::new(Arc::new(MockMessagingService::failing("down")), 1);

        assert!(limited.send("a@x.example", "s", "b").await.is_err());
        assert_eq!(limited.sent_today(), 0);
    }

    #[tokio::test]
    async fn test_quota_resets_on_new_day() {
        let offset = Arc::new(AtomicI64::new(0));
        let clock = offset.clone();
        let base = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let limited = DailyLimitedMessaging::with_clock(
            Arc::new(MockMessagingService::new()),
            1,
            move || base + chrono::Days::new(clock.load(Ordering::SeqCst).unsigned_abs()),
        );

        limited.send("a@x.example", "s", "b").await.unwrap();
        assert!(limited.send("a@x.example", "s", "b").await.is_err());

        offset.store(1, Ordering::SeqCst);
        assert_eq!(limited.sent_today(), 0);
        limited.send("a@x.example", "s", "b").await.unwrap();
    }

    #[tokio::test]
    async fn test_outbox_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outbox.jsonl");
        let outbox = OutboxMessagingService::new(&path);

        outbox.send("a@x.example", "Hello", "First").await.unwrap();
        outbox.send("b@x.example", "Hello", "Second").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["to"], "a@x.example");
        assert_eq!(lines[1]["body"], "Second");
        assert!(lines[0]["sent_at"].is_string());
    }

    #[tokio::test]
    async fn test_outbox_unwritable_is_delivery_error() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = OutboxMessagingService::new(dir.path().join("missing").join("outbox.jsonl"));

        let err = outbox.send("a@x.example", "Hello", "Body").await.unwrap_err();
        assert_eq!(err.kind(), "DeliveryError");
    }
}
