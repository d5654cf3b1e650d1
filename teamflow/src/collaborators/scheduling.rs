//! Meeting scheduling.

use crate::errors::CollaboratorError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Default meeting length in minutes.
pub const DEFAULT_MEETING_MINUTES: u32 = 30;

/// Books meetings with leads.
#[async_trait]
pub trait SchedulingService: Send + Sync {
    /// Schedules a meeting and returns a meeting reference (link or id).
    ///
    /// `duration_minutes` must be positive; callers without a preference
    /// pass [`DEFAULT_MEETING_MINUTES`].
    async fn schedule_meeting(
        &self,
        invitee: &str,
        time: &str,
        duration_minutes: u32,
    ) -> Result<String, CollaboratorError>;
}

/// A booking accepted by [`MockSchedulingService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Invitee address.
    pub invitee: String,
    /// Requested meeting time.
    pub time: String,
    /// Meeting length.
    pub duration_minutes: u32,
    /// Returned meeting reference.
    pub reference: String,
}

/// A scheduling service that hands out deterministic mock links.
#[derive(Debug, Default)]
pub struct MockSchedulingService {
    bookings: Mutex<Vec<Booking>>,
}

impl MockSchedulingService {
    /// Creates a new mock scheduling service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all bookings made so far.
    #[must_use]
    pub fn bookings(&self) -> Vec<Booking> {
        self.bookings.lock().clone()
    }

    /// Builds the mock link for an invitee and time.
    ///
    /// `@` becomes `_at_` and `.` becomes `_` in the address; spaces become
    /// `_` and `:` becomes `-` in the time.
    #[must_use]
    pub fn meeting_link(invitee: &str, time: &str) -> String {
        let invitee = invitee.replace('@', "_at_").replace('.', "_");
        let time = time.replace(' ', "_").replace(':', "-");
        format!("https://cal.mock/{invitee}/{time}")
    }
}

#[async_trait]
impl SchedulingService for MockSchedulingService {
    async fn schedule_meeting(
        &self,
        invitee: &str,
        time: &str,
        duration_minutes: u32,
    ) -> Result<String, CollaboratorError> {
        if duration_minutes == 0 {
            return Err(CollaboratorError::scheduling(
                invitee,
                "meeting duration must be positive",
            ));
        }

        let reference = Self::meeting_link(invitee, time);
        self.bookings.lock().push(Booking {
            invitee: invitee.to_string(),
            time: time.to_string(),
            duration_minutes,
            reference: reference.clone(),
        });
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_mock_link_is_sanitized() {
        let service = MockSchedulingService::new();
        let link = service
            .schedule_meeting("client@example.com", "2026-01-01 10:00", DEFAULT_MEETING_MINUTES)
            .await
            .unwrap();

        assert_eq!(link, "https://cal.mock/client_at_example_com/2026-01-01_10-00");
        assert_eq!(service.bookings().len(), 1);
        assert_eq!(service.bookings()[0].duration_minutes, 30);
    }

    #[tokio::test]
    async fn test_zero_duration_rejected() {
        let service = MockSchedulingService::new();
        let err = service
            .schedule_meeting("client@example.com", "2026-01-01 10:00", 0)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "SchedulingError");
        assert!(service.bookings().is_empty());
    }
}
