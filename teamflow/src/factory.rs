//! Team factory: the one-call entry point for building and running teams.

use crate::collaborators::{
    Collaborators, CsvLeadSource, DailyLimitedMessaging, LeadSource, MockLeadSource,
};
use crate::config::AgencyConfig;
use crate::context::Context;
use crate::errors::PipelineError;
use crate::events::{EventSink, NoOpEventSink};
use crate::team::{BaseTeam, ClientTeam};
use std::sync::Arc;
use tracing::info;

/// Builds base and client teams from one configuration and one set of
/// collaborators.
///
/// The messaging collaborator is wrapped in a [`DailyLimitedMessaging`]
/// guard shared by every team this factory creates, so the daily limit holds
/// across runs.
pub struct TeamFactory {
    config: Arc<AgencyConfig>,
    collaborators: Collaborators,
    limiter: Arc<DailyLimitedMessaging>,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for TeamFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamFactory")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl TeamFactory {
    /// Creates a factory.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid.
    pub fn new(config: AgencyConfig, collaborators: Collaborators) -> Result<Self, PipelineError> {
        config.validate()?;

        let limiter = Arc::new(DailyLimitedMessaging::new(
            Arc::clone(&collaborators.messaging),
            config.outreach.daily_limit,
        ));
        let collaborators = collaborators.with_messaging(limiter.clone());

        Ok(Self {
            config: Arc::new(config),
            collaborators,
            limiter,
            event_sink: Arc::new(NoOpEventSink),
        })
    }

    /// Creates a factory with mock collaborators. Leads come from
    /// `leads.csv_path` when it is configured.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid.
    pub fn with_mocks(config: AgencyConfig) -> Result<Self, PipelineError> {
        let leads: Arc<dyn LeadSource> = match &config.leads.csv_path {
            Some(path) => {
                info!(path = %path.display(), "reading leads from CSV");
                Arc::new(CsvLeadSource::new(path.clone()))
            }
            None => Arc::new(MockLeadSource::new()),
        };
        Self::new(config, Collaborators::mock().with_leads(leads))
    }

    /// Sets the event sink handed to every team.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AgencyConfig {
        &self.config
    }

    /// Returns the collaborators handed to stages; messaging is the
    /// rate-limited wrapper.
    #[must_use]
    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Returns the number of messages sent today through this factory's teams.
    #[must_use]
    pub fn messages_sent_today(&self) -> u32 {
        self.limiter.sent_today()
    }

    /// Creates a fresh base team.
    #[must_use]
    pub fn create_base_team(&self) -> BaseTeam {
        BaseTeam::new(&self.config, &self.collaborators, Arc::clone(&self.event_sink))
    }

    /// Creates a fresh team for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidClient` if `client_id` is empty or blank.
    pub fn create_client_team(&self, client_id: &str) -> Result<ClientTeam, PipelineError> {
        let team = ClientTeam::new(client_id, &self.config, Arc::clone(&self.event_sink))?;
        info!(client = %team.client_id(), "client team created");
        Ok(team)
    }

    /// Creates a base team and runs it.
    ///
    /// # Errors
    ///
    /// Propagates the first stage error unchanged.
    pub async fn run_base_pipeline(
        &self,
        initial: Option<Context>,
    ) -> Result<Context, PipelineError> {
        self.create_base_team().run(initial).await
    }

    /// Creates a client team and runs it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` for a blank id, otherwise propagates the first
    /// stage error unchanged.
    pub async fn run_client_pipeline(
        &self,
        client_id: &str,
        initial: Option<Context>,
    ) -> Result<Context, PipelineError> {
        self.create_client_team(client_id)?.run(initial).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockMessagingService;
    use crate::stages::keys;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invalid_config_rejected() {
        let err = TeamFactory::with_mocks(AgencyConfig::new().with_daily_limit(0)).unwrap_err();
        assert_eq!(err.kind(), "Config");
    }

    #[test]
    fn test_fresh_base_team_per_call() {
        let factory = TeamFactory::with_mocks(AgencyConfig::new()).unwrap();
        let a = factory.create_base_team();
        let b = factory.create_base_team();

        assert!(!std::ptr::eq(a.team(), b.team()));
        assert_eq!(a.team().roles(), b.team().roles());
        assert_eq!(a.team().output_keys(), keys::BASE_TEAM_KEYS.to_vec());
    }

    #[test]
    fn test_builtin_teams_are_valid() {
        let factory = TeamFactory::with_mocks(AgencyConfig::new()).unwrap();
        factory.create_base_team().team().validate().unwrap();
        let client = factory.create_client_team("Acme Clinic").unwrap();
        client.team().validate().unwrap();
        assert_eq!(client.team().output_keys(), keys::CLIENT_TEAM_KEYS.to_vec());
    }

    #[test]
    fn test_blank_client_rejected() {
        let factory = TeamFactory::with_mocks(AgencyConfig::new()).unwrap();
        for id in ["", "   ", "\n\t"] {
            let err = factory.create_client_team(id).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidClient { .. }));
        }
    }

    #[tokio::test]
    async fn test_messaging_is_rate_limited_across_runs() {
        let messaging = Arc::new(MockMessagingService::new());
        let factory = TeamFactory::new(
            AgencyConfig::new().with_daily_limit(15).with_batch_size(10),
            Collaborators::mock().with_messaging(messaging.clone()),
        )
        .unwrap();

        factory.run_base_pipeline(None).await.unwrap();
        assert_eq!(factory.messages_sent_today(), 10);

        let err = factory.run_base_pipeline(None).await.unwrap_err();
        assert_eq!(err.kind(), "RateLimited");
        assert_eq!(messaging.sent_count(), 15);
    }

    #[tokio::test]
    async fn test_csv_leads_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(&path, "clinic_name,email\nAcme,acme@x.example\n").unwrap();

        let factory = TeamFactory::with_mocks(AgencyConfig::new().with_leads_csv(&path)).unwrap();
        let ctx = factory.run_base_pipeline(None).await.unwrap();

        assert_eq!(
            ctx.require_list("test", keys::PROSPECTS).unwrap(),
            &["Acme <acme@x.example>".to_string()]
        );
    }
}
