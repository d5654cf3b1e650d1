//! Agency configuration.
//!
//! Configuration is read once at startup (usually from `teamflow.toml`) and
//! passed explicitly into the [`TeamFactory`](crate::factory::TeamFactory).
//! Nothing in the pipeline reads configuration from global state.

use crate::context::ContextValue;
use crate::errors::PipelineError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Format of meeting slot timestamps (`2026-02-10 09:00`).
pub const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "teamflow.toml";

// ---------------------------------------------------------------------------
// Config structs (matching teamflow.toml schema)
// ---------------------------------------------------------------------------

/// Top-level agency configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyConfig {
    /// Region the agency is allowed to operate in.
    #[serde(default = "default_allowed_region")]
    pub allowed_region: String,

    /// Outbound messaging settings.
    #[serde(default)]
    pub outreach: OutreachConfig,

    /// Meeting scheduling settings.
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Brand kit applied to newly onboarded clients.
    #[serde(default)]
    pub brand_kit: BrandKit,

    /// Lead sourcing settings.
    #[serde(default)]
    pub leads: LeadsConfig,
}

fn default_allowed_region() -> String {
    "United States".to_string()
}

impl Default for AgencyConfig {
    fn default() -> Self {
        Self {
            allowed_region: default_allowed_region(),
            outreach: OutreachConfig::default(),
            scheduling: SchedulingConfig::default(),
            brand_kit: BrandKit::default(),
            leads: LeadsConfig::default(),
        }
    }
}

/// `[outreach]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachConfig {
    /// Maximum number of outbound messages per day.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Number of leads the prospector requests per run.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Subject line of outreach messages.
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_daily_limit() -> u32 {
    50
}

fn default_batch_size() -> usize {
    10
}

fn default_subject() -> String {
    "Growing your practice".to_string()
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            batch_size: default_batch_size(),
            subject: default_subject(),
        }
    }
}

/// `[scheduling]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// First bookable meeting slot, formatted as [`SLOT_FORMAT`].
    #[serde(default = "default_first_slot")]
    pub first_slot: String,

    /// Meeting length; consecutive meetings are booked back to back.
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
}

fn default_first_slot() -> String {
    "2026-02-10 09:00".to_string()
}

fn default_duration_minutes() -> u32 {
    30
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            first_slot: default_first_slot(),
            duration_minutes: default_duration_minutes(),
        }
    }
}

impl SchedulingConfig {
    /// Parses the first meeting slot.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the slot is not in [`SLOT_FORMAT`].
    pub fn first_slot_time(&self) -> Result<NaiveDateTime, PipelineError> {
        NaiveDateTime::parse_from_str(&self.first_slot, SLOT_FORMAT).map_err(|e| {
            PipelineError::Config(format!(
                "scheduling.first_slot '{}' is not '{}': {}",
                self.first_slot, SLOT_FORMAT, e
            ))
        })
    }
}

/// `[brand_kit]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandKit {
    /// Path to the logo asset.
    #[serde(default = "default_logo_path")]
    pub logo_path: String,

    /// Primary brand color.
    #[serde(default = "default_primary_color")]
    pub primary_color: String,

    /// Secondary brand color.
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
}

fn default_logo_path() -> String {
    "assets/default_logo.png".to_string()
}

fn default_primary_color() -> String {
    "#0066CC".to_string()
}

fn default_secondary_color() -> String {
    "#CCCCCC".to_string()
}

impl Default for BrandKit {
    fn default() -> Self {
        Self {
            logo_path: default_logo_path(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
        }
    }
}

impl BrandKit {
    /// Renders the brand kit as a context mapping.
    #[must_use]
    pub fn to_context_value(&self) -> ContextValue {
        ContextValue::map([
            ("logo_path", self.logo_path.as_str()),
            ("primary_color", self.primary_color.as_str()),
            ("secondary_color", self.secondary_color.as_str()),
        ])
    }
}

/// `[leads]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadsConfig {
    /// CSV file to read leads from; mock leads are used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Builders, validation and loading
// ---------------------------------------------------------------------------

impl AgencyConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the daily message limit.
    #[must_use]
    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.outreach.daily_limit = limit;
        self
    }

    /// Sets the prospecting batch size.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.outreach.batch_size = size;
        self
    }

    /// Sets the allowed region.
    #[must_use]
    pub fn with_allowed_region(mut self, region: impl Into<String>) -> Self {
        self.allowed_region = region.into();
        self
    }

    /// Sets the default brand kit.
    #[must_use]
    pub fn with_brand_kit(mut self, brand_kit: BrandKit) -> Self {
        self.brand_kit = brand_kit;
        self
    }

    /// Sets the CSV lead file.
    #[must_use]
    pub fn with_leads_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.leads.csv_path = Some(path.into());
        self
    }

    /// Checks that all settings are usable.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` describing the first invalid setting.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.allowed_region.trim().is_empty() {
            return Err(PipelineError::Config("allowed_region cannot be blank".into()));
        }
        if self.outreach.daily_limit == 0 {
            return Err(PipelineError::Config("outreach.daily_limit must be positive".into()));
        }
        if self.outreach.batch_size == 0 {
            return Err(PipelineError::Config("outreach.batch_size must be positive".into()));
        }
        if self.scheduling.duration_minutes == 0 {
            return Err(PipelineError::Config(
                "scheduling.duration_minutes must be positive".into(),
            ));
        }
        self.scheduling.first_slot_time()?;
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the document is malformed or invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PipelineError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from disk. Returns defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if the file exists but cannot be read, or
    /// `PipelineError::Config` if it is malformed or invalid.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Serialization` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Serialization(e.to_string()))
    }
}
