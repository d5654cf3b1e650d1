//! The permanent prospecting and sales team.

use super::{RunReport, Team};
use crate::collaborators::Collaborators;
use crate::config::AgencyConfig;
use crate::context::Context;
use crate::errors::PipelineError;
use crate::events::EventSink;
use crate::stages::{
    AppointmentSetter, ComplianceChecker, OutreachSpecialist, ProposalBuilder, Prospector,
    SalesManager, Stage,
};
use std::sync::Arc;

/// Team name used in logs and events.
pub const BASE_TEAM_NAME: &str = "base";

/// Sales manager, prospector, outreach, appointments, proposal and the
/// compliance gate, in that order.
#[derive(Debug)]
pub struct BaseTeam {
    team: Team,
}

impl BaseTeam {
    /// Builds the base team from configuration and collaborators.
    #[must_use]
    pub fn new(
        config: &AgencyConfig,
        collaborators: &Collaborators,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(SalesManager),
            Box::new(Prospector::new(
                Arc::clone(&collaborators.leads),
                Arc::clone(&collaborators.records),
                config.outreach.batch_size,
            )),
            Box::new(OutreachSpecialist::new(
                Arc::clone(&collaborators.messaging),
                config.outreach.subject.clone(),
            )),
            Box::new(AppointmentSetter::new(
                Arc::clone(&collaborators.scheduling),
                config.scheduling.clone(),
            )),
            Box::new(ProposalBuilder),
            Box::new(ComplianceChecker::new(
                config.outreach.daily_limit,
                config.allowed_region.clone(),
            )),
        ];

        Self {
            team: Team::assemble(BASE_TEAM_NAME, stages, event_sink),
        }
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
