//! Collaborators - injected capabilities for stages.
//!
//! Each collaborator is a single-operation trait. Stages receive the
//! collaborators they need at construction time and never look them up
//! globally, so any implementation (mock, file-backed, networked) can be
//! swapped in without touching stage logic.

mod lead_source;
mod messaging;
mod records;
mod scheduling;

pub use lead_source::{CsvLeadSource, Lead, LeadSource, MockLeadSource};
pub use messaging::{
    DailyLimitedMessaging, MessagingService, MockMessagingService, OutboundMessage,
    OutboxMessagingService,
};
pub use records::{
    ContactRecord, JsonFileRecordService, MockRelationshipRecordService,
    RelationshipRecordService,
};
pub use scheduling::{Booking, MockSchedulingService, SchedulingService, DEFAULT_MEETING_MINUTES};

use std::sync::Arc;

/// The full set of collaborators a team factory hands to its stages.
#[derive(Clone)]
pub struct Collaborators {
    /// Lead source used by the prospector.
    pub leads: Arc<dyn LeadSource>,
    /// Messaging service used for outreach.
    pub messaging: Arc<dyn MessagingService>,
    /// Scheduling service used by the appointment setter.
    pub scheduling: Arc<dyn SchedulingService>,
    /// Relationship records updated while prospecting.
    pub records: Arc<dyn RelationshipRecordService>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Creates a collaborator set.
    #[must_use]
    pub fn new(
        leads: Arc<dyn LeadSource>,
        messaging: Arc<dyn MessagingService>,
        scheduling: Arc<dyn SchedulingService>,
        records: Arc<dyn RelationshipRecordService>,
    ) -> Self {
        Self {
            leads,
            messaging,
            scheduling,
            records,
        }
    }

    /// Creates a set of recording mocks.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(
            Arc::new(MockLeadSource::new()),
            Arc::new(MockMessagingService::new()),
            Arc::new(MockSchedulingService::new()),
            Arc::new(MockRelationshipRecordService::new()),
        )
    }

    /// Replaces the lead source.
    #[must_use]
    pub fn with_leads(mut self, leads: Arc<dyn LeadSource>) -> Self {
        self.leads = leads;
        self
    }

    /// Replaces the messaging service.
    #[must_use]
    pub fn with_messaging(mut self, messaging: Arc<dyn MessagingService>) -> Self {
        self.messaging = messaging;
        self
    }

    /// Replaces the scheduling service.
    #[must_use]
    pub fn with_scheduling(mut self, scheduling: Arc<dyn SchedulingService>) -> Self {
        self.scheduling = scheduling;
        self
    }

    /// Replaces the record service.
    #[must_use]
    pub fn with_records(mut self, records: Arc<dyn RelationshipRecordService>) -> Self {
        self.records = records;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_swapping_collaborators() {
        let messaging = Arc::new(MockMessagingService::new());
        let collaborators = Collaborators::mock().with_messaging(messaging.clone());

        collaborators
            .messaging
            .send("a@x.example", "s", "b")
            .await
            .unwrap();

        assert_eq!(messaging.sent_count(), 1);
    }
}
