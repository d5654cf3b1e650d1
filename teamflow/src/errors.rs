//! Error types for teamflow pipelines.
//!
//! Every failure inside a stage is a [`PipelineError`]. Failures raised by
//! injected collaborators are [`CollaboratorError`]s and convert into
//! `PipelineError::Collaborator` through `?`, so a stage can call a
//! collaborator and propagate its error unchanged.
//!
//! A failed compliance gate is deliberately absent from this taxonomy: it is
//! reported as a boolean flag in the context and the run still succeeds.

use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for pipeline construction and execution.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage read a context key that no earlier stage (or the caller) wrote.
    #[error("Missing dependency: stage '{stage}' requires context key '{key}'")]
    MissingDependency {
        /// The stage that needed the key.
        stage: String,
        /// The absent key.
        key: String,
    },

    /// A context key was present but held the wrong kind of value.
    #[error("Unexpected value: stage '{stage}' expected '{key}' to be {expected}, found {found}")]
    UnexpectedType {
        /// The stage that read the key.
        stage: String,
        /// The offending key.
        key: String,
        /// The kind of value the stage expected.
        expected: &'static str,
        /// The kind of value actually present.
        found: &'static str,
    },

    /// A stage returned successfully without writing a key it owns.
    #[error("Stage contract violated: stage '{stage}' finished without writing '{key}'")]
    StageContract {
        /// The stage that broke its contract.
        stage: String,
        /// The key it failed to write.
        key: String,
    },

    /// A client team was requested for an empty or blank identifier.
    #[error("Invalid client identifier: {client_id:?}")]
    InvalidClient {
        /// The rejected identifier.
        client_id: String,
    },

    /// An injected collaborator failed.
    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    /// A team was assembled incorrectly.
    #[error("Team validation error: {0}")]
    Validation(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Creates a missing dependency error.
    #[must_use]
    pub fn missing_dependency(stage: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingDependency {
            stage: stage.into(),
            key: key.into(),
        }
    }

    /// Creates an unexpected type error.
    #[must_use]
    pub fn unexpected_type(
        stage: impl Into<String>,
        key: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::UnexpectedType {
            stage: stage.into(),
            key: key.into(),
            expected,
            found,
        }
    }

    /// Creates an invalid client error.
    #[must_use]
    pub fn invalid_client(client_id: impl Into<String>) -> Self {
        Self::InvalidClient {
            client_id: client_id.into(),
        }
    }

    /// Returns the stable name of this error kind.
    ///
    /// Collaborator failures report the collaborator's own kind
    /// (`DeliveryError`, `RateLimited`, ...).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingDependency { .. } => "MissingDependency",
            Self::UnexpectedType { .. } => "UnexpectedType",
            Self::StageContract { .. } => "StageContract",
            Self::InvalidClient { .. } => "InvalidClient",
            Self::Collaborator(inner) => inner.kind(),
            Self::Validation(_) => "Validation",
            Self::Config(_) => "Config",
            Self::Serialization(_) => "Serialization",
            Self::Io(_) => "Io",
        }
    }

    /// Returns true if the error came from a collaborator call.
    #[must_use]
    pub fn is_collaborator(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = match self {
            Self::Collaborator(inner) => inner.to_dict(),
            _ => HashMap::new(),
        };

        match self {
            Self::MissingDependency { stage, key } | Self::StageContract { stage, key } => {
                map.insert("stage".to_string(), json!(stage));
                map.insert("key".to_string(), json!(key));
            }
            Self::UnexpectedType {
                stage,
                key,
                expected,
                found,
            } => {
                map.insert("stage".to_string(), json!(stage));
                map.insert("key".to_string(), json!(key));
                map.insert("expected".to_string(), json!(expected));
                map.insert("found".to_string(), json!(found));
            }
            Self::InvalidClient { client_id } => {
                map.insert("client_id".to_string(), json!(client_id));
            }
            _ => {}
        }

        map.insert("type".to_string(), json!(self.kind()));
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised by collaborator implementations.
///
/// Transient failures (`Delivery`, `RateLimited`) are never retried by the
/// pipeline; a collaborator that wants retries must do them itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// A message could not be delivered.
    #[error("Delivery to '{to}' failed: {reason}")]
    Delivery {
        /// The recipient address.
        to: String,
        /// The transport failure.
        reason: String,
    },

    /// The daily outbound-message limit has been reached.
    #[error("Rate limited: daily limit of {limit} messages reached")]
    RateLimited {
        /// The configured daily limit.
        limit: u32,
    },

    /// A meeting could not be scheduled.
    #[error("Scheduling for '{invitee}' failed: {reason}")]
    Scheduling {
        /// The invitee address.
        invitee: String,
        /// The failure reason.
        reason: String,
    },

    /// A relationship record could not be written.
    #[error("Record update for '{email}' failed: {reason}")]
    Record {
        /// The contact address.
        email: String,
        /// The failure reason.
        reason: String,
    },

    /// Leads could not be fetched.
    #[error("Lead source failed: {reason}")]
    LeadSource {
        /// The failure reason.
        reason: String,
    },
}

impl CollaboratorError {
    /// Creates a delivery error.
    #[must_use]
    pub fn delivery(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Delivery {
            to: to.into(),
            reason: reason.into(),
        }
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(limit: u32) -> Self {
        Self::RateLimited { limit }
    }

    /// Creates a scheduling error.
    #[must_use]
    pub fn scheduling(invitee: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Scheduling {
            invitee: invitee.into(),
            reason: reason.into(),
        }
    }

    /// Creates a record error.
    #[must_use]
    pub fn record(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Record {
            email: email.into(),
            reason: reason.into(),
        }
    }

    /// Creates a lead source error.
    #[must_use]
    pub fn lead_source(reason: impl Into<String>) -> Self {
        Self::LeadSource {
            reason: reason.into(),
        }
    }

    /// Returns the stable name of this error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delivery { .. } => "DeliveryError",
            Self::RateLimited { .. } => "RateLimited",
            Self::Scheduling { .. } => "SchedulingError",
            Self::Record { .. } => "RecordError",
            Self::LeadSource { .. } => "LeadSourceError",
        }
    }

    /// Returns true for failures a collaborator could reasonably retry later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Delivery { .. } | Self::RateLimited { .. })
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::Delivery { to, reason } => {
                map.insert("to".to_string(), json!(to));
                map.insert("reason".to_string(), json!(reason));
            }
            Self::RateLimited { limit } => {
                map.insert("limit".to_string(), json!(limit));
            }
            Self::Scheduling { invitee, reason } => {
                map.insert("invitee".to_string(), json!(invitee));
                map.insert("reason".to_string(), json!(reason));
            }
            Self::Record { email, reason } => {
                map.insert("email".to_string(), json!(email));
                map.insert("reason".to_string(), json!(reason));
            }
            Self::LeadSource { reason } => {
                map.insert("reason".to_string(), json!(reason));
            }
        }

        map.insert("type".to_string(), json!(self.kind()));
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}
