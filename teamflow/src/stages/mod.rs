//! Stage trait and the built-in agency roles.
//!
//! A stage is one unit of team work. It receives the run's [`Context`] by
//! mutable reference, so it can add or overwrite keys but can never hand back
//! a different context. Each stage declares the keys it owns; the team checks
//! them after the stage returns.

mod base;
mod client;
mod compliance;
pub mod keys;

pub use base::{AppointmentSetter, OutreachSpecialist, ProposalBuilder, Prospector, SalesManager};
pub use client::{
    AccountManager, ClientIdentity, CreativeDirector, FunnelArchitect, GrowthStrategist, MediaBuyer,
};
pub use compliance::{AdsComplianceChecker, ComplianceChecker};

use crate::context::Context;
use crate::errors::PipelineError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for team stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the stage's role name, used in logs and diagnostics.
    fn role(&self) -> &str;

    /// Returns the context keys this stage writes on success.
    fn output_keys(&self) -> &[&'static str];

    /// Runs the stage against the shared context.
    ///
    /// # Errors
    ///
    /// Any error aborts the rest of the team run.
    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(&mut Context) -> Result<(), PipelineError> + Send + Sync,
{
    role: String,
    keys: Vec<&'static str>,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&mut Context) -> Result<(), PipelineError> + Send + Sync,
{
    /// Creates a new function-based stage owning `keys`.
    pub fn new(role: impl Into<String>, keys: &[&'static str], func: F) -> Self {
        Self {
            role: role.into(),
            keys: keys.to_vec(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&mut Context) -> Result<(), PipelineError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("role", &self.role)
            .field("keys", &self.keys)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&mut Context) -> Result<(), PipelineError> + Send + Sync,
{
    fn role(&self) -> &str {
        &self.role
    }

    fn output_keys(&self) -> &[&'static str] {
        &self.keys
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        (self.func)(ctx)
    }
}
