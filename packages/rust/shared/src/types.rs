//! Core domain types for component generation requests.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ComponentType
// ---------------------------------------------------------------------------

/// The category of artifact being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Action,
    WebhookSource,
    PollingSource,
    App,
}

impl ComponentType {
    /// Every component type, in registry order.
    pub const ALL: [ComponentType; 4] = [
        Self::Action,
        Self::WebhookSource,
        Self::PollingSource,
        Self::App,
    ];

    /// The tag used on the command line and in the registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::WebhookSource => "webhook_source",
            Self::PollingSource => "polling_source",
            Self::App => "app",
        }
    }

    /// Parse a registry tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// The filtering family used by the context assembler.
    ///
    /// Webhook and polling sources share the generic `source` family.
    pub fn family(&self) -> ComponentFamily {
        match self {
            Self::Action => ComponentFamily::Action,
            Self::WebhookSource | Self::PollingSource => ComponentFamily::Source,
            Self::App => ComponentFamily::App,
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ComponentFamily
// ---------------------------------------------------------------------------

/// Normalized component tag that drives file filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentFamily {
    Action,
    Source,
    App,
}

impl ComponentFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Source => "source",
            Self::App => "app",
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// A generation request as supplied by the caller, before validation.
///
/// Fields are kept loosely typed so that the validator can report every
/// malformed input with its own error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// App name slug (e.g. `google_drive`).
    pub app: String,
    /// Requested component type tag.
    pub component_type: String,
    /// Free-text instructions: prompt plus API docs.
    pub instructions: String,
    /// Maximum generation attempts delegated to the pipeline.
    pub tries: i64,
}
