//! Run reports.

use crate::context::Context;
use crate::errors::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a single stage ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage finished and wrote its keys.
    Completed,
    /// The stage failed and aborted the run.
    Failed {
        /// Error kind, as returned by [`PipelineError::kind`].
        kind: String,
        /// Error message.
        message: String,
    },
}

/// Timing and outcome of one stage in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage role.
    pub role: String,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage finished.
    pub finished_at: DateTime<Utc>,
    /// How it ended.
    pub outcome: StageOutcome,
}

impl StageRecord {
    /// Wall-clock duration of the stage in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Everything known about one team run.
///
/// Stages that never started have no record.
#[derive(Debug)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Team name.
    pub team: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Per-stage records in execution order.
    pub stages: Vec<StageRecord>,
    /// The final context, partial when the run failed.
    pub context: Context,
    /// The error that aborted the run, if any.
    pub error: Option<PipelineError>,
}

impl RunReport {
    /// Returns true if every stage completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Converts the report into the plain run result.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the run.
    pub fn into_result(self) -> Result<Context, PipelineError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.context),
        }
    }

    /// Renders the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "run_id": self.run_id.to_string(),
            "team": self.team,
            "started_at": self.started_at.to_rfc3339(),
            "finished_at": self.finished_at.to_rfc3339(),
            "stages": self.stages,
            "context": self.context.to_json(),
            "error": self.error.as_ref().map(PipelineError::to_dict),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(outcome: StageOutcome) -> StageRecord {
        let now = Utc::now();
        StageRecord {
            role: "prospector".to_string(),
            started_at: now,
            finished_at: now + chrono::Duration::milliseconds(12),
            outcome,
        }
    }

    #[test]
    fn test_stage_record_duration() {
        assert_eq!(record(StageOutcome::Completed).duration_ms(), 12);
    }

    #[test]
    fn test_failed_report_json() {
        let report = RunReport {
            run_id: Uuid::new_v4(),
            team: "base".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            stages: vec![record(StageOutcome::Failed {
                kind: "DeliveryError".to_string(),
                message: "down".to_string(),
            })],
            context: Context::new().with("supervisor", "reviewed"),
            error: Some(PipelineError::Validation("down".to_string())),
        };

        assert!(!report.is_success());
        let json = report.to_json();
        assert_eq!(json["stages"][0]["outcome"]["status"], "failed");
        assert_eq!(json["context"]["supervisor"], "reviewed");
        assert_eq!(json["error"]["type"], "Validation");
        assert!(report.into_result().is_err());
    }
}
