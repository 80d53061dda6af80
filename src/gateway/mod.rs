//! API gateway for the strategy wizard.
//!
//! Supports:
//! - **Mock**: deterministic in-process responses after a fixed delay
//! - **Remote**: the strategy backend over HTTP via reqwest
//!
//! The variant is picked once by `create_gateway`; step controllers only see
//! `Arc<dyn Gateway>`.

pub mod mock;
pub mod remote;

pub use mock::MockGateway;
pub use remote::RemoteGateway;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::flow::{Goal, OptionCard};

/// Base name of the exported plan file.
pub const PLAN_FILE_STEM: &str = "career-strategy-plan";

/// Result of submitting the entry answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryReceipt {
    pub session_id: String,
}

/// Result of framing a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramingReceipt {
    pub framing_id: String,
}

/// Input for option generation: the goal plus the original entry answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsRequest {
    #[serde(flatten)]
    pub goal: Goal,
    pub entry_answer: String,
}

/// Checklist generated for one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub items: Vec<String>,
}

/// Everything the final document is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub entry_answer: String,
    pub goal: Goal,
    pub option: OptionCard,
    pub checklist: Vec<String>,
}

/// An exported plan, opaque bytes plus their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDocument {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl PlanDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// Download file name derived from the media type.
    pub fn file_name(&self) -> String {
        let media = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        let ext = match media {
            "text/plain" => "txt",
            "application/pdf" => "pdf",
            _ => "bin",
        };
        format!("{PLAN_FILE_STEM}.{ext}")
    }

    /// Body as text, if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// The five remote operations the wizard depends on.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Short name for logs ("mock" or "remote").
    fn name(&self) -> &str;

    /// Start a session from the entry answer.
    async fn submit_entry(&self, answer: &str) -> Result<EntryReceipt, GatewayError>;

    /// Frame the user's goal.
    async fn frame_goal(&self, goal: &Goal) -> Result<FramingReceipt, GatewayError>;

    /// Generate strategic options for a goal.
    async fn fetch_options(&self, request: &OptionsRequest)
        -> Result<Vec<OptionCard>, GatewayError>;

    /// Generate the action checklist for one option.
    async fn fetch_checklist(&self, option: &OptionCard) -> Result<Checklist, GatewayError>;

    /// Render the final plan document.
    async fn export_plan(&self, request: &ExportRequest) -> Result<PlanDocument, GatewayError>;
}

/// Configuration for creating a gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Use the deterministic mock instead of the network.
    pub use_mock: bool,
    /// Base URL of the strategy backend.
    pub api_base_url: String,
    /// Artificial latency applied to every mock call.
    pub mock_delay: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            api_base_url: "http://localhost:8000".to_string(),
            mock_delay: mock::DEFAULT_MOCK_DELAY,
        }
    }
}

/// Create a gateway from configuration.
pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn Gateway>, GatewayError> {
    if config.use_mock {
        tracing::info!(delay_ms = config.mock_delay.as_millis() as u64, "Using mock gateway");
        return Ok(Arc::new(MockGateway::new(config.mock_delay)));
    }

    let gateway = RemoteGateway::new(&config.api_base_url)?;
    tracing::info!("Using remote gateway (base url: {})", config.api_base_url);
    Ok(Arc::new(gateway))
}
