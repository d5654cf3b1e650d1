//! Terminal compliance gates.
//!
//! A gate never fails the run for a compliance problem. It records `false`
//! under its key and logs the reasons; callers inspect the flag.

use super::keys::{ADS_COMPLIANCE, COMPLIANCE, CREATIVES, MEDIA_PLAN, OUTREACH, PROPOSAL, REGION};
use super::Stage;
use crate::context::Context;
use crate::errors::PipelineError;
use async_trait::async_trait;
use tracing::{info, warn};

/// Checks the caller-supplied `region` against the allowed region.
///
/// An absent region is allowed.
fn region_violation(
    stage: &str,
    ctx: &Context,
    allowed_region: &str,
) -> Result<Option<String>, PipelineError> {
    let Some(value) = ctx.get(REGION) else {
        return Ok(None);
    };
    let region = value
        .as_text()
        .ok_or_else(|| PipelineError::unexpected_type(stage, REGION, "a string", value.kind_name()))?;

    if region.trim().eq_ignore_ascii_case(allowed_region.trim()) {
        Ok(None)
    } else {
        Ok(Some(format!(
            "region '{region}' is outside the allowed region '{allowed_region}'"
        )))
    }
}

fn record_verdict(ctx: &mut Context, stage: &str, key: &str, problems: &[String]) {
    let passed = problems.is_empty();
    if passed {
        info!(stage, "compliance passed");
    } else {
        warn!(stage, problems = ?problems, "compliance failed");
    }
    ctx.set(key, passed);
}

/// Compliance gate for the base team's outreach.
#[derive(Debug, Clone)]
pub struct ComplianceChecker {
    daily_limit: u32,
    allowed_region: String,
}

impl ComplianceChecker {
    /// Role name.
    pub const ROLE: &'static str = "qa_compliance";

    /// Creates a gate enforcing the given send limit and operating region.
    #[must_use]
    pub fn new(daily_limit: u32, allowed_region: impl Into<String>) -> Self {
        Self {
            daily_limit,
            allowed_region: allowed_region.into(),
        }
    }
}

#[async_trait]
impl Stage for ComplianceChecker {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[COMPLIANCE]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let outreach = ctx.require_map(Self::ROLE, OUTREACH)?;
        let sent = outreach
            .get("recipients")
            .and_then(|v| v.as_list())
            .map_or(0, <[String]>::len);
        ctx.require(Self::ROLE, PROPOSAL)?;

        let mut problems = Vec::new();
        if sent > self.daily_limit as usize {
            problems.push(format!(
                "{sent} messages sent, above the daily limit of {}",
                self.daily_limit
            ));
        }
        if let Some(problem) = region_violation(Self::ROLE, ctx, &self.allowed_region)? {
            problems.push(problem);
        }

        record_verdict(ctx, Self::ROLE, COMPLIANCE, &problems);
        Ok(())
    }
}

/// Compliance gate for a client's advertising assets.
#[derive(Debug, Clone)]
pub struct AdsComplianceChecker {
    allowed_region: String,
}

impl AdsComplianceChecker {
    /// Role name.
    pub const ROLE: &'static str = "qa_compliance_ads";

    /// Creates a gate for the given operating region.
    #[must_use]
    pub fn new(allowed_region: impl Into<String>) -> Self {
        Self {
            allowed_region: allowed_region.into(),
        }
    }
}

#[async_trait]
impl Stage for AdsComplianceChecker {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[ADS_COMPLIANCE]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let plan = ctx.require_map(Self::ROLE, MEDIA_PLAN)?;
        let mode = plan.get("mode").and_then(|v| v.as_text()).unwrap_or_default();
        let executed = plan.get("executed").and_then(|v| v.as_flag()).unwrap_or(true);
        let creatives = ctx.require_list(Self::ROLE, CREATIVES)?.len();

        let mut problems = Vec::new();
        if mode != "simulated" {
            problems.push(format!("media plan mode is '{mode}', expected 'simulated'"));
        }
        if executed {
            problems.push("media plan reports executed spend".to_string());
        }
        if creatives == 0 {
            problems.push("no creatives to review".to_string());
        }
        if let Some(problem) = region_violation(Self::ROLE, ctx, &self.allowed_region)? {
            problems.push(problem);
        }

        record_verdict(ctx, Self::ROLE, ADS_COMPLIANCE, &problems);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextValue;

    fn base_ctx(recipients: usize) -> Context {
        let list: Vec<String> = (0..recipients).map(|i| format!("L{i} <l{i}@x.example>")).collect();
        Context::new()
            .with(
                OUTREACH,
                ContextValue::map([
                    ("status", ContextValue::from("sent")),
                    ("recipients", ContextValue::List(list)),
                ]),
            )
            .with(PROPOSAL, ContextValue::map([("status", "prepared")]))
    }

    fn ads_ctx(mode: &str, executed: bool) -> Context {
        Context::new()
            .with(CREATIVES, ContextValue::list(["a.png"]))
            .with(
                MEDIA_PLAN,
                ContextValue::map([
                    ("mode", ContextValue::from(mode)),
                    ("executed", ContextValue::from(executed)),
                ]),
            )
    }

    #[tokio::test]
    async fn test_base_gate_passes() {
        let mut ctx = base_ctx(3);
        ComplianceChecker::new(50, "United States").run(&mut ctx).await.unwrap();
        assert_eq!(ctx.get(COMPLIANCE).and_then(ContextValue::as_flag), Some(true));
    }

    #[tokio::test]
    async fn test_base_gate_flags_send_volume() {
        let mut ctx = base_ctx(3);
        ComplianceChecker::new(2, "United States").run(&mut ctx).await.unwrap();
        assert_eq!(ctx.get(COMPLIANCE).and_then(ContextValue::as_flag), Some(false));
    }

    #[tokio::test]
    async fn test_region_mismatch_is_false_not_error() {
        let mut ctx = base_ctx(1).with(REGION, "Canada");
        ComplianceChecker::new(50, "United States").run(&mut ctx).await.unwrap();
        assert_eq!(ctx.get(COMPLIANCE).and_then(ContextValue::as_flag), Some(false));

        let mut ctx = base_ctx(1).with(REGION, "united states ");
        ComplianceChecker::new(50, "United States").run(&mut ctx).await.unwrap();
        assert_eq!(ctx.get(COMPLIANCE).and_then(ContextValue::as_flag), Some(true));
    }

    #[tokio::test]
    async fn test_base_gate_requires_proposal() {
        let mut ctx = Context::new().with(OUTREACH, ContextValue::map([("status", "sent")]));
        let err = ComplianceChecker::new(50, "United States")
            .run(&mut ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "MissingDependency");
    }

    #[tokio::test]
    async fn test_ads_gate() {
        let gate = AdsComplianceChecker::new("United States");

        let mut ok = ads_ctx("simulated", false);
        gate.run(&mut ok).await.unwrap();
        assert_eq!(ok.get(ADS_COMPLIANCE).and_then(ContextValue::as_flag), Some(true));

        let mut live = ads_ctx("live", true);
        gate.run(&mut live).await.unwrap();
        assert_eq!(live.get(ADS_COMPLIANCE).and_then(ContextValue::as_flag), Some(false));
    }
}
