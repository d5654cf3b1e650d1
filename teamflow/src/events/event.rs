//! Team lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamEventKind {
    /// A run began.
    #[serde(rename = "team.started")]
    TeamStarted,
    /// A stage began.
    #[serde(rename = "stage.started")]
    StageStarted,
    /// A stage finished and wrote its keys.
    #[serde(rename = "stage.completed")]
    StageCompleted,
    /// A stage failed.
    #[serde(rename = "stage.failed")]
    StageFailed,
    /// Every stage completed.
    #[serde(rename = "team.completed")]
    TeamCompleted,
    /// The run was aborted by a stage failure.
    #[serde(rename = "team.failed")]
    TeamFailed,
}

impl TeamEventKind {
    /// Dotted event name, e.g. `stage.completed`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TeamStarted => "team.started",
            Self::StageStarted => "stage.started",
            Self::StageCompleted => "stage.completed",
            Self::StageFailed => "stage.failed",
            Self::TeamCompleted => "team.completed",
            Self::TeamFailed => "team.failed",
        }
    }

    /// True for the two failure kinds.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::StageFailed | Self::TeamFailed)
    }
}

impl std::fmt::Display for TeamEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle event of a team run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEvent {
    /// Event kind.
    pub kind: TeamEventKind,
    /// Team name.
    pub team: String,
    /// Run the event belongs to.
    pub run_id: Uuid,
    /// Stage role, for stage events and `team.failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Elapsed time, for completion and failure events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Error rendering, for failure events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
    /// When the event was created.
    pub at: DateTime<Utc>,
}

impl TeamEvent {
    /// Creates an event with no stage, duration or error.
    #[must_use]
    pub fn new(kind: TeamEventKind, team: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            kind,
            team: team.into(),
            run_id,
            stage: None,
            duration_ms: None,
            error: None,
            at: Utc::now(),
        }
    }

    /// Sets the stage role.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Sets the elapsed time.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error rendering.
    #[must_use]
    pub fn with_error(mut self, error: serde_json::Value) -> Self {
        self.error = Some(error);
        self
    }
}
