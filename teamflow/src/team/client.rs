//! Per-client asset production team.

use super::{RunReport, Team};
use crate::config::AgencyConfig;
use crate::context::Context;
use crate::errors::PipelineError;
use crate::events::EventSink;
use crate::stages::{
    AccountManager, AdsComplianceChecker, ClientIdentity, CreativeDirector, FunnelArchitect,
    GrowthStrategist, MediaBuyer, Stage,
};
use std::sync::Arc;

/// One client's team. Each instance builds its own stages, so two client
/// teams never share stage state.
#[derive(Debug)]
pub struct ClientTeam {
    client: Arc<ClientIdentity>,
    team: Team,
}

impl ClientTeam {
    /// Builds a team for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidClient` if `client_id` is empty or blank.
    pub fn new(
        client_id: &str,
        config: &AgencyConfig,
        event_sink: Arc<dyn EventSink>,
    ) -> Result<Self, PipelineError> {
        let client = Arc::new(ClientIdentity::new(client_id)?);

        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(AccountManager::new(
                Arc::clone(&client),
                config.brand_kit.clone(),
            )),
            Box::new(GrowthStrategist::new(Arc::clone(&client))),
            Box::new(FunnelArchitect::new(Arc::clone(&client))),
            Box::new(CreativeDirector::new(Arc::clone(&client))),
            Box::new(MediaBuyer),
            Box::new(AdsComplianceChecker::new(config.allowed_region.clone())),
        ];

        let team = Team::assemble(format!("client:{}", client.slug()), stages, event_sink);
        Ok(Self { client, team })
    }

    /// The client identifier, trimmed.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client.id()
    }

    /// Returns the underlying team.
    #[must_use]
    pub fn team(&self) -> &Team {
        &self.team
    }

    /// Runs the pipeline; see [`Team::run`].
    ///
    /// # Errors
    ///
    /// Returns the first stage error unchanged.
    pub async fn run(&self, initial: Option<Context>) -> Result<Context, PipelineError> {
        self.team.run(initial).await
    }

    /// Runs the pipeline against a caller-owned context; see [`Team::execute`].
    ///
    /// # Errors
    ///
    /// Returns the first stage error unchanged.
    pub async fn execute(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        self.team.execute(ctx).await
    }

    /// Runs the pipeline with a report; see [`Team::run_with_report`].
    pub async fn run_with_report(&self, initial: Option<Context>) -> RunReport {
        self.team.run_with_report(initial).await
    }
}
