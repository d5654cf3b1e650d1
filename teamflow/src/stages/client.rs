//! Stages of a per-client asset production team.
//!
//! Every stage here is pure: it derives artifact references from the client
//! identity and earlier keys, and none of them holds a collaborator.

use super::keys::{ACCOUNT_MANAGER, BRAND_KIT, CREATIVES, FUNNEL, GROWTH_STRATEGY, MEDIA_PLAN};
use super::Stage;
use crate::config::BrandKit;
use crate::context::{Context, ContextValue};
use crate::errors::PipelineError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// A validated client identifier and its workspace slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    id: String,
    slug: String,
}

impl ClientIdentity {
    /// Validates a client identifier.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidClient` if `id` is empty or blank.
    pub fn new(id: &str) -> Result<Self, PipelineError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(PipelineError::invalid_client(id));
        }
        Ok(Self {
            id: id.to_string(),
            slug: workspace_slug(id),
        })
    }

    /// The client identifier, trimmed.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Workspace name used in artifact paths: the readable slug of the id
    /// plus a short digest of the id itself, so ids that slugify alike
    /// ("Acme Clinic", "acme-clinic") never share a workspace.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    fn artifact(&self, path: &str) -> String {
        format!("clients/{}/{}", self.slug, path)
    }
}

fn workspace_slug(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    format!("{}-{}", slugify(id), hex::encode(&digest[..4]))
}

fn slugify(id: &str) -> String {
    let mut slug = String::with_capacity(id.len());
    for c in id.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "client".to_string()
    } else {
        slug.to_string()
    }
}

/// Onboards the client and records the brand kit in use.
#[derive(Debug, Clone)]
pub struct AccountManager {
    client: Arc<ClientIdentity>,
    default_brand_kit: BrandKit,
}

impl AccountManager {
    /// Role name.
    pub const ROLE: &'static str = "account_manager";

    /// Creates an account manager. A `brand_kit` mapping in the initial
    /// context is laid over `default_brand_kit` field by field.
    #[must_use]
    pub fn new(client: Arc<ClientIdentity>, default_brand_kit: BrandKit) -> Self {
        Self {
            client,
            default_brand_kit,
        }
    }
}

#[async_trait]
impl Stage for AccountManager {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[ACCOUNT_MANAGER]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let brand_kit = match ctx.get(BRAND_KIT) {
            None => self.default_brand_kit.to_context_value(),
            Some(ContextValue::Map(overrides)) => {
                let mut merged = match self.default_brand_kit.to_context_value() {
                    ContextValue::Map(defaults) => defaults,
                    _ => BTreeMap::new(),
                };
                merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
                ContextValue::Map(merged)
            }
            Some(other) => {
                return Err(PipelineError::unexpected_type(
                    Self::ROLE,
                    BRAND_KIT,
                    "a mapping",
                    other.kind_name(),
                ))
            }
        };

        info!(client = %self.client.id(), "client onboarded");
        ctx.set(
            ACCOUNT_MANAGER,
            ContextValue::map([
                ("client", ContextValue::from(self.client.id())),
                ("status", ContextValue::from("onboarded")),
                (
                    "message",
                    ContextValue::from(format!("{} onboarded", self.client.id())),
                ),
                ("workspace", ContextValue::from(format!("clients/{}", self.client.slug()))),
                ("brand_kit", brand_kit),
            ]),
        );
        Ok(())
    }
}

/// Drafts the growth strategy document.
#[derive(Debug, Clone)]
pub struct GrowthStrategist {
    client: Arc<ClientIdentity>,
}

impl GrowthStrategist {
    /// Role name.
    pub const ROLE: &'static str = "growth_strategist";

    /// Creates a growth strategist for `client`.
    #[must_use]
    pub fn new(client: Arc<ClientIdentity>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for GrowthStrategist {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[GROWTH_STRATEGY]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        ctx.require_map(Self::ROLE, ACCOUNT_MANAGER)?;
        ctx.set(GROWTH_STRATEGY, self.client.artifact("strategy/growth-plan.md"));
        Ok(())
    }
}

/// Designs the lead-capture funnel.
#[derive(Debug, Clone)]
pub struct FunnelArchitect {
    client: Arc<ClientIdentity>,
}

impl FunnelArchitect {
    /// Role name.
    pub const ROLE: &'static str = "funnel_architect";

    /// Creates a funnel architect for `client`.
    #[must_use]
    pub fn new(client: Arc<ClientIdentity>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for FunnelArchitect {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[FUNNEL]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        ctx.require_text(Self::ROLE, GROWTH_STRATEGY)?;
        ctx.set(FUNNEL, self.client.artifact("funnels/lead-capture.json"));
        Ok(())
    }
}

/// Produces the image creatives for the campaign.
#[derive(Debug, Clone)]
pub struct CreativeDirector {
    client: Arc<ClientIdentity>,
}

impl CreativeDirector {
    /// Role name.
    pub const ROLE: &'static str = "creative_director";

    /// Creates a creative director for `client`.
    #[must_use]
    pub fn new(client: Arc<ClientIdentity>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for CreativeDirector {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[CREATIVES]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        ctx.require_text(Self::ROLE, FUNNEL)?;
        ctx.set(
            CREATIVES,
            ContextValue::list([
                self.client.artifact("creatives/image1.png"),
                self.client.artifact("creatives/image2.png"),
            ]),
        );
        Ok(())
    }
}

/// Proposes a media plan. The plan is always simulated; this stage has no
/// way to spend money.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaBuyer;

impl MediaBuyer {
    /// Role name.
    pub const ROLE: &'static str = "media_buyer";

    /// Channels every simulated plan targets.
    pub const CHANNELS: [&'static str; 2] = ["meta", "google"];
}

#[async_trait]
impl Stage for MediaBuyer {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[MEDIA_PLAN]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let creatives = ctx.require_list(Self::ROLE, CREATIVES)?.to_vec();

        ctx.set(
            MEDIA_PLAN,
            ContextValue::map([
                ("mode", ContextValue::from("simulated")),
                ("executed", ContextValue::from(false)),
                ("channels", ContextValue::list(Self::CHANNELS)),
                ("creatives", ContextValue::List(creatives)),
            ]),
        );
        Ok(())
    }
}
