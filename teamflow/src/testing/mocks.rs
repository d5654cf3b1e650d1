//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::context::{Context, ContextValue};
use crate::errors::{CollaboratorError, PipelineError};
use crate::stages::Stage;

/// A stage that writes a fixed value and records the keys it saw on entry.
#[derive(Debug)]
pub struct RecordingStage {
    role: String,
    keys: [&'static str; 1],
    value: ContextValue,
    seen: Mutex<Vec<Vec<String>>>,
}

impl RecordingStage {
    /// Creates a stage writing `value` under `key`.
    #[must_use]
    pub fn new(role: impl Into<String>, key: &'static str, value: impl Into<ContextValue>) -> Self {
        Self {
            role: role.into(),
            keys: [key],
            value: value.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of times the stage ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Returns the context keys present at the start of each run.
    #[must_use]
    pub fn seen_keys(&self) -> Vec<Vec<String>> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn role(&self) -> &str {
        &self.role
    }

    fn output_keys(&self) -> &[&'static str] {
        &self.keys
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        self.seen
            .lock()
            .push(ctx.keys().map(str::to_string).collect());
        ctx.set(self.keys[0], self.value.clone());
        Ok(())
    }
}

/// A stage that always fails.
#[derive(Debug)]
pub struct FailingStage {
    role: String,
    keys: [&'static str; 1],
    failure: Failure,
}

#[derive(Debug, Clone)]
enum Failure {
    Collaborator(CollaboratorError),
    MissingDependency(String),
}

impl FailingStage {
    /// Creates a stage that fails with a collaborator error.
    #[must_use]
    pub fn collaborator(role: impl Into<String>, key: &'static str, error: CollaboratorError) -> Self {
        Self {
            role: role.into(),
            keys: [key],
            failure: Failure::Collaborator(error),
        }
    }

    /// Creates a stage that fails as if `dependency` were missing.
    #[must_use]
    pub fn missing_dependency(
        role: impl Into<String>,
        key: &'static str,
        dependency: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            keys: [key],
            failure: Failure::MissingDependency(dependency.into()),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn role(&self) -> &str {
        &self.role
    }

    fn output_keys(&self) -> &[&'static str] {
        &self.keys
    }

    async fn run(&self, _ctx: &mut Context) -> Result<(), PipelineError> {
        Err(match &self.failure {
            Failure::Collaborator(err) => err.clone().into(),
            Failure::MissingDependency(key) => PipelineError::missing_dependency(&self.role, key),
        })
    }
}

/// A stage that sleeps before writing its key.
#[derive(Debug)]
pub struct SlowStage {
    role: String,
    keys: [&'static str; 1],
    delay: Duration,
}

impl SlowStage {
    /// Creates a stage that waits `delay` and then writes `"done"` to `key`.
    #[must_use]
    pub fn new(role: impl Into<String>, key: &'static str, delay: Duration) -> Self {
        Self {
            role: role.into(),
            keys: [key],
            delay,
        }
    }
}

#[async_trait]
impl Stage for SlowStage {
    fn role(&self) -> &str {
        &self.role
    }

    fn output_keys(&self) -> &[&'static str] {
        &self.keys
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        tokio::time::sleep(self.delay).await;
        ctx.set(self.keys[0], "done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_stage() {
        let stage = RecordingStage::new("rec", "out", true);
        let mut ctx = Context::new().with("in", "x");

        stage.run(&mut ctx).await.unwrap();
        stage.run(&mut ctx).await.unwrap();

        assert_eq!(stage.call_count(), 2);
        assert_eq!(stage.seen_keys()[0], vec!["in"]);
        assert_eq!(stage.seen_keys()[1], vec!["in", "out"]);
    }

    #[tokio::test]
    async fn test_failing_stage() {
        let stage = FailingStage::collaborator("f", "out", CollaboratorError::rate_limited(5));
        let err = stage.run(&mut Context::new()).await.unwrap_err();
        assert_eq!(err.kind(), "RateLimited");

        let stage = FailingStage::missing_dependency("f", "out", "prospects");
        let err = stage.run(&mut Context::new()).await.unwrap_err();
        assert_eq!(err.kind(), "MissingDependency");
    }
}
