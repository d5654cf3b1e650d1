//! Event sinks.

use super::{TeamEvent, TeamEventKind};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{info, warn};

/// Receives lifecycle events from team runs.
///
/// Teams get their sink from the factory; there is no process-wide sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers an event, possibly waiting on I/O.
    async fn emit(&self, event: TeamEvent);

    /// Delivers an event without waiting. Must never fail or block for long.
    fn try_emit(&self, event: &TeamEvent);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: TeamEvent) {}

    fn try_emit(&self, _event: &TeamEvent) {}
}

/// Writes events to `tracing`: failures at WARN, everything else at INFO.
///
/// With `verbose` off, only team-level events and failures are logged.
#[derive(Debug, Clone, Copy)]
pub struct LoggingEventSink {
    verbose: bool,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { verbose: true }
    }
}

impl LoggingEventSink {
    /// Logs every event.
    #[must_use]
    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    /// Logs team-level events and failures only.
    #[must_use]
    pub fn quiet() -> Self {
        Self { verbose: false }
    }

    fn log(&self, event: &TeamEvent) {
        let stage = event.stage.as_deref().unwrap_or("-");
        if event.kind.is_failure() {
            warn!(
                event = %event.kind,
                team = %event.team,
                run_id = %event.run_id,
                stage,
                error = ?event.error,
                "team event"
            );
            return;
        }

        let stage_event = matches!(
            event.kind,
            TeamEventKind::StageStarted | TeamEventKind::StageCompleted
        );
        if stage_event && !self.verbose {
            return;
        }
        info!(
            event = %event.kind,
            team = %event.team,
            run_id = %event.run_id,
            stage,
            duration_ms = ?event.duration_ms,
            "team event"
        );
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: TeamEvent) {
        self.log(&event);
    }

    fn try_emit(&self, event: &TeamEvent) {
        self.log(event);
    }
}

/// Keeps every event in memory, for tests and run inspection.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<TeamEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events so far.
    #[must_use]
    pub fn events(&self) -> Vec<TeamEvent> {
        self.events.read().clone()
    }

    /// Dotted names of all events, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .map(|e| e.kind.as_str().to_string())
            .collect()
    }

    /// Events whose dotted name starts with `prefix` (`"stage."`, `"team.failed"`).
    #[must_use]
    pub fn events_of_type(&self, prefix: &str) -> Vec<TeamEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind.as_str().starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Drops all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: TeamEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: &TeamEvent) {
        self.events.write().push(event.clone());
    }
}
