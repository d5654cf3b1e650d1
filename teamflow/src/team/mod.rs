//! Teams: fixed, ordered stage sequences run as one pipeline.
//!
//! A team folds a single [`Context`] through its stages strictly left to
//! right. The first error aborts the run; the context keeps whatever the
//! completed stages wrote.

mod base;
mod client;
mod report;

pub use base::{BaseTeam, BASE_TEAM_NAME};
pub use client::ClientTeam;
pub use report::{RunReport, StageOutcome, StageRecord};

use crate::context::Context;
use crate::errors::PipelineError;
use crate::events::{EventSink, NoOpEventSink, TeamEvent, TeamEventKind};
use crate::stages::Stage;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// An ordered sequence of stages.
pub struct Team {
    name: String,
    stages: Vec<Box<dyn Stage>>,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Team")
            .field("name", &self.name)
            .field("stages", &self.roles())
            .finish_non_exhaustive()
    }
}

impl Team {
    /// Assembles a team without validating it. Only for fixed stage lists
    /// whose validity is covered by tests.
    pub(crate) fn assemble(
        name: impl Into<String>,
        stages: Vec<Box<dyn Stage>>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            name: name.into(),
            stages,
            event_sink,
        }
    }

    /// Returns the team name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the stage roles in execution order.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.role()).collect()
    }

    /// Returns every key the team's stages own, in execution order.
    #[must_use]
    pub fn output_keys(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .flat_map(|s| s.output_keys().iter().copied())
            .collect()
    }

    /// Checks the team's structure.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Validation` if the team has no stages, a stage
    /// has a blank role or owns no keys, two stages share a role, or two
    /// stages own the same key.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::Validation(format!(
                "team '{}' has no stages",
                self.name
            )));
        }

        let mut roles = HashSet::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();

        for stage in &self.stages {
            let role = stage.role();
            if role.trim().is_empty() {
                return Err(PipelineError::Validation(format!(
                    "team '{}' has a stage with a blank role",
                    self.name
                )));
            }
            if !roles.insert(role) {
                return Err(PipelineError::Validation(format!(
                    "team '{}' has two stages with role '{}'",
                    self.name, role
                )));
            }
            if stage.output_keys().is_empty() {
                return Err(PipelineError::Validation(format!(
                    "stage '{role}' owns no context keys"
                )));
            }
            for &key in stage.output_keys() {
                if let Some(previous) = owners.insert(key, role) {
                    return Err(PipelineError::Validation(format!(
                        "stages '{previous}' and '{role}' both write '{key}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Runs the team and returns the final context.
    ///
    /// Starts from an empty context when `initial` is `None`. On error the
    /// partial context is dropped; use [`Team::execute`] or
    /// [`Team::run_with_report`] to keep it.
    ///
    /// # Errors
    ///
    /// Returns the first stage error unchanged.
    pub async fn run(&self, initial: Option<Context>) -> Result<Context, PipelineError> {
        let mut ctx = initial.unwrap_or_default();
        self.execute(&mut ctx).await?;
        Ok(ctx)
    }

    /// Runs the team against a caller-owned context.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; `ctx` then holds the keys written by
    /// the stages that completed.
    pub async fn execute(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let mut records = Vec::new();
        self.drive(Uuid::new_v4(), ctx, &mut records).await
    }

    /// Runs the team and reports per-stage timings and the outcome.
    ///
    /// Never fails: a stage error is recorded in the report alongside the
    /// partial context.
    pub async fn run_with_report(&self, initial: Option<Context>) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut ctx = initial.unwrap_or_default();
        let mut records = Vec::with_capacity(self.stages.len());

        let result = self.drive(run_id, &mut ctx, &mut records).await;

        RunReport {
            run_id,
            team: self.name.clone(),
            started_at,
            finished_at: Utc::now(),
            stages: records,
            context: ctx,
            error: result.err(),
        }
    }

    fn emit(&self, event: TeamEvent) {
        self.event_sink.try_emit(&event);
    }

    async fn drive(
        &self,
        run_id: Uuid,
        ctx: &mut Context,
        records: &mut Vec<StageRecord>,
    ) -> Result<(), PipelineError> {
        let start = Instant::now();
        info!(team = %self.name, run_id = %run_id, stages = self.stages.len(), "team run started");
        self.emit(TeamEvent::new(TeamEventKind::TeamStarted, &self.name, run_id));

        for stage in &self.stages {
            if let Err(err) = self.run_stage(run_id, stage.as_ref(), ctx, records).await {
                let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
                error!(
                    team = %self.name,
                    run_id = %run_id,
                    stage = stage.role(),
                    kind = err.kind(),
                    duration_ms,
                    "team run failed: {}",
                    err
                );
                self.emit(
                    TeamEvent::new(TeamEventKind::TeamFailed, &self.name, run_id)
                        .with_stage(stage.role())
                        .with_duration_ms(duration_ms)
                        .with_error(serde_json::json!(err.to_dict())),
                );
                return Err(err);
            }
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(team = %self.name, run_id = %run_id, duration_ms, "team run completed");
        self.emit(
            TeamEvent::new(TeamEventKind::TeamCompleted, &self.name, run_id)
                .with_duration_ms(duration_ms),
        );
        Ok(())
    }

    async fn run_stage(
        &self,
        run_id: Uuid,
        stage: &dyn Stage,
        ctx: &mut Context,
        records: &mut Vec<StageRecord>,
    ) -> Result<(), PipelineError> {
        let role = stage.role();
        self.emit(TeamEvent::new(TeamEventKind::StageStarted, &self.name, run_id).with_stage(role));

        let started_at = Utc::now();
        let stage_start = Instant::now();
        let span = info_span!("stage", team = %self.name, stage = role, run_id = %run_id);
        let result = stage
            .run(ctx)
            .instrument(span)
            .await
            .and_then(|()| check_outputs(stage, &*ctx));
        let duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(()) => {
                debug!(team = %self.name, stage = role, duration_ms, "stage completed");
                self.emit(
                    TeamEvent::new(TeamEventKind::StageCompleted, &self.name, run_id)
                        .with_stage(role)
                        .with_duration_ms(duration_ms),
                );
            }
            Err(err) => {
                self.emit(
                    TeamEvent::new(TeamEventKind::StageFailed, &self.name, run_id)
                        .with_stage(role)
                        .with_duration_ms(duration_ms)
                        .with_error(serde_json::json!(err.to_dict())),
                );
            }
        }

        records.push(StageRecord {
            role: role.to_string(),
            started_at,
            finished_at: Utc::now(),
            outcome: match &result {
                Ok(()) => StageOutcome::Completed,
                Err(err) => StageOutcome::Failed {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                },
            },
        });

        result
    }
}

fn check_outputs(stage: &dyn Stage, ctx: &Context) -> Result<(), PipelineError> {
    match stage.output_keys().iter().find(|key| !ctx.contains_key(key)) {
        Some(key) => Err(PipelineError::StageContract {
            stage: stage.role().to_string(),
            key: (*key).to_string(),
        }),
        None => Ok(()),
    }
}

/// Builder for validated teams.
pub struct TeamBuilder {
    name: String,
    stages: Vec<Box<dyn Stage>>,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for TeamBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamBuilder")
            .field("name", &self.name)
            .field("stages", &self.stages.len())
            .finish_non_exhaustive()
    }
}

impl TeamBuilder {
    /// Creates a builder for a team called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Appends a stage; stages run in the order they are added.
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Appends an already boxed stage.
    #[must_use]
    pub fn boxed_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Builds and validates the team.
    ///
    /// # Errors
    ///
    /// See [`Team::validate`].
    pub fn build(self) -> Result<Team, PipelineError> {
        let team = Team::assemble(self.name, self.stages, self.event_sink);
        team.validate()?;
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::stages::FnStage;
    use crate::testing::SlowStage;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn writer(role: &'static str, key: &'static str) -> FnStage<impl Fn(&mut Context) -> Result<(), PipelineError> + Send + Sync> {
        FnStage::new(role, &[key], move |ctx: &mut Context| {
            ctx.set(key, role);
            Ok(())
        })
    }

    #[test]
    fn test_empty_team_rejected() {
        let err = TeamBuilder::new("empty").build().unwrap_err();
        assert_eq!(err.kind(), "Validation");
        assert!(err.to_string().contains("no stages"));
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let err = TeamBuilder::new("dup")
            .stage(writer("a", "x"))
            .stage(writer("a", "y"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("two stages with role 'a'"));
    }

    #[test]
    fn test_overlapping_keys_rejected() {
        let err = TeamBuilder::new("overlap")
            .stage(writer("a", "x"))
            .stage(writer("b", "x"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("both write 'x'"));
    }

    #[test]
    fn test_stage_without_keys_rejected() {
        let err = TeamBuilder::new("silent")
            .stage(FnStage::new("quiet", &[], |_ctx: &mut Context| Ok(())))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("owns no context keys"));
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let team = TeamBuilder::new("ordered")
            .stage(writer("first", "a"))
            .stage(FnStage::new("second", &["b"], |ctx: &mut Context| {
                let first = ctx.require_text("second", "a")?.to_string();
                ctx.set("b", format!("after {first}"));
                Ok(())
            }))
            .build()
            .unwrap();

        assert_eq!(team.roles(), vec!["first", "second"]);
        assert_eq!(team.output_keys(), vec!["a", "b"]);

        let ctx = team.run(None).await.unwrap();
        assert_eq!(ctx.get("b").and_then(|v| v.as_text()), Some("after first"));
    }

    #[tokio::test]
    async fn test_initial_context_is_kept() {
        let team = TeamBuilder::new("t").stage(writer("w", "out")).build().unwrap();
        let ctx = team
            .run(Some(Context::new().with("seed", "value")))
            .await
            .unwrap();

        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["out", "seed"]);
    }

    #[tokio::test]
    async fn test_missing_output_is_contract_violation() {
        let team = TeamBuilder::new("liar")
            .stage(FnStage::new("liar", &["promised"], |_ctx: &mut Context| Ok(())))
            .build()
            .unwrap();

        let err = team.run(None).await.unwrap_err();
        assert_eq!(err.kind(), "StageContract");
    }

    #[tokio::test]
    async fn test_failure_stops_run_and_keeps_partial_context() {
        let team = TeamBuilder::new("failing")
            .stage(writer("first", "a"))
            .stage(FnStage::new("broken", &["b"], |_ctx: &mut Context| {
                Err(PipelineError::Validation("boom".to_string()))
            }))
            .stage(writer("third", "c"))
            .build()
            .unwrap();

        let mut ctx = Context::new();
        let err = team.execute(&mut ctx).await.unwrap_err();

        assert_eq!(err.to_string(), "Team validation error: boom");
        assert!(ctx.contains_key("a"));
        assert!(!ctx.contains_key("b"));
        assert!(!ctx.contains_key("c"));
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let sink = Arc::new(CollectingEventSink::new());
        let team = TeamBuilder::new("observed")
            .stage(writer("only", "a"))
            .with_event_sink(sink.clone())
            .build()
            .unwrap();

        team.run(None).await.unwrap();

        assert_eq!(
            sink.event_types(),
            vec!["team.started", "stage.started", "stage.completed", "team.completed"]
        );
    }

    #[tokio::test]
    async fn test_event_durations_cover_stage_time() {
        let sink = Arc::new(CollectingEventSink::new());
        let team = TeamBuilder::new("timed")
            .stage(SlowStage::new("slow", "a", Duration::from_millis(20)))
            .with_event_sink(sink.clone())
            .build()
            .unwrap();

        team.run(None).await.unwrap();

        let stage_ms = sink.events_of_type("stage.completed")[0].duration_ms.unwrap();
        let team_ms = sink.events_of_type("team.completed")[0].duration_ms.unwrap();
        assert!(stage_ms >= 20.0, "stage took {stage_ms}ms");
        assert!(team_ms >= stage_ms);
    }

    #[tokio::test]
    async fn test_report_records_failure() {
        let team = TeamBuilder::new("reported")
            .stage(writer("first", "a"))
            .stage(FnStage::new("second", &["b"], |ctx: &mut Context| {
                ctx.require_text("second", "missing")?;
                Ok(())
            }))
            .build()
            .unwrap();

        let report = team.run_with_report(None).await;

        assert!(!report.is_success());
        assert_eq!(report.stages.len(), 2);
        assert_eq!(report.stages[0].outcome, StageOutcome::Completed);
        assert!(matches!(
            &report.stages[1].outcome,
            StageOutcome::Failed { kind, .. } if kind == "MissingDependency"
        ));
        assert!(report.context.contains_key("a"));
        assert!(report.stages[0].started_at <= report.stages[0].finished_at);
    }
}
