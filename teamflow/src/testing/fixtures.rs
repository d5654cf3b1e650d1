//! Test fixtures wiring recording collaborators into a factory.

use std::sync::Arc;

use crate::collaborators::{
    Collaborators, MockLeadSource, MockMessagingService, MockRelationshipRecordService,
    MockSchedulingService,
};
use crate::config::AgencyConfig;
use crate::errors::PipelineError;
use crate::events::CollectingEventSink;
use crate::factory::TeamFactory;

/// Recording collaborators plus a collecting event sink.
///
/// Keep the fixture around after building a factory to inspect what the
/// teams sent, booked and recorded.
#[derive(Debug)]
pub struct TestFixture {
    /// Configuration handed to the factory.
    pub config: AgencyConfig,
    /// Lead source.
    pub leads: Arc<MockLeadSource>,
    /// Messaging service (behind the factory's rate limiter).
    pub messaging: Arc<MockMessagingService>,
    /// Scheduling service.
    pub scheduling: Arc<MockSchedulingService>,
    /// Relationship records.
    pub records: Arc<MockRelationshipRecordService>,
    /// Event sink.
    pub events: Arc<CollectingEventSink>,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Creates a fixture with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AgencyConfig::default())
    }

    /// Creates a fixture with a custom configuration.
    #[must_use]
    pub fn with_config(config: AgencyConfig) -> Self {
        Self {
            config,
            leads: Arc::new(MockLeadSource::new()),
            messaging: Arc::new(MockMessagingService::new()),
            scheduling: Arc::new(MockSchedulingService::new()),
            records: Arc::new(MockRelationshipRecordService::new()),
            events: Arc::new(CollectingEventSink::new()),
        }
    }

    /// Replaces the messaging service, e.g. with a failing one.
    #[must_use]
    pub fn with_messaging(mut self, messaging: MockMessagingService) -> Self {
        self.messaging = Arc::new(messaging);
        self
    }

    /// Returns the collaborators as trait objects.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.leads.clone(),
            self.messaging.clone(),
            self.scheduling.clone(),
            self.records.clone(),
        )
    }

    /// Builds a factory over the fixture's collaborators and event sink.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid.
    pub fn factory(&self) -> Result<TeamFactory, PipelineError> {
        Ok(TeamFactory::new(self.config.clone(), self.collaborators())?
            .with_event_sink(self.events.clone()))
    }
}
