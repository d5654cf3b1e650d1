//! Team lifecycle events and the sinks that receive them.
//!
//! Every run reports `team.started`, then `stage.started` and
//! `stage.completed` / `stage.failed` per stage, and finally
//! `team.completed` or `team.failed`.

mod event;
mod sink;

pub use event::{TeamEvent, TeamEventKind};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
