//! # Teamflow
//!
//! A two-tier team pipeline orchestrator for an automated service agency.
//!
//! Teamflow runs two kinds of team:
//!
//! - **Base team**: the permanent prospecting and sales function. Sales
//!   manager, prospector, outreach, appointments, proposal and a compliance
//!   gate.
//! - **Client team**: one per onboarded client, producing the client's
//!   strategy, funnel, creatives and a simulated media plan, closed by an
//!   ads compliance gate.
//!
//! A team folds one [`Context`](context::Context) through its stages in a
//! fixed order. Side effects (lead sourcing, messaging, scheduling and
//! relationship records) go through injected collaborator traits, so mocks
//! and real implementations are interchangeable.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use teamflow::prelude::*;
//!
//! let factory = TeamFactory::with_mocks(AgencyConfig::default())?;
//!
//! let base = factory.run_base_pipeline(None).await?;
//! assert_eq!(base.get("compliance").and_then(ContextValue::as_flag), Some(true));
//!
//! let client = factory.run_client_pipeline("Acme Clinic", None).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod boundary;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod factory;
pub mod observability;
pub mod stages;
pub mod team;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::boundary::{run_base, run_client, BoundaryResponse, ClientRequest};
    pub use crate::collaborators::{
        Collaborators, Lead, LeadSource, MessagingService, RelationshipRecordService,
        SchedulingService,
    };
    pub use crate::config::{AgencyConfig, BrandKit};
    pub use crate::context::{Context, ContextValue};
    pub use crate::errors::{CollaboratorError, PipelineError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::factory::TeamFactory;
    pub use crate::stages::Stage;
    pub use crate::team::{BaseTeam, ClientTeam, RunReport, Team, TeamBuilder};
}
