//! Mock gateway — deterministic stand-in for the strategy backend.
//!
//! Every call waits the same artificial delay and never fails. Responses are
//! fixed or derived from the input only, so tests can pin them.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::flow::{Goal, OptionCard};

use super::{
    Checklist, EntryReceipt, ExportRequest, FramingReceipt, Gateway, OptionsRequest, PlanDocument,
};

/// Default artificial latency per call.
pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(250);

/// Deterministic in-process gateway.
#[derive(Debug, Clone)]
pub struct MockGateway {
    delay: Duration,
}

impl MockGateway {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Mock with no delay, for tests.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    async fn respond<T>(&self, operation: &str, value: T) -> T {
        tracing::debug!(operation, "Mock gateway call");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        value
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_DELAY)
    }
}

/// UTF-16 length, with 1 standing in for empty input. Characters outside the
/// Basic Multilingual Plane count twice, as they do for browser clients.
fn length_or_one(text: &str) -> usize {
    match text.encode_utf16().count() {
        0 => 1,
        n => n,
    }
}

/// Assemble the plain-text plan document.
pub fn render_plan_text(request: &ExportRequest) -> String {
    let mut lines = vec![
        "Life/Career Strategy Plan".to_string(),
        String::new(),
        format!("Entry: {}", request.entry_answer),
        format!("North star: {}", request.goal.north_star),
        format!("Constraints: {}", request.goal.constraints),
        format!("Selected option: {}", request.option.title),
        String::new(),
        "Checklist:".to_string(),
    ];
    lines.extend(
        request
            .checklist
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, item)),
    );
    lines.join("\n")
}

fn mock_options() -> Vec<OptionCard> {
    vec![
        OptionCard::new(
            "option-1",
            "Deepen current role",
            "Double down on scope expansion in your existing company.",
        ),
        OptionCard::new(
            "option-2",
            "External pivot",
            "Target a role switch aligned with your north star and constraints.",
        ),
        OptionCard::new(
            "option-3",
            "Portfolio approach",
            "Combine your current position with a strategic side project.",
        ),
    ]
}

#[async_trait]
impl Gateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit_entry(&self, answer: &str) -> Result<EntryReceipt, GatewayError> {
        let session_id = format!("mock-{}", length_or_one(answer.trim()));
        Ok(self
            .respond("submit_entry", EntryReceipt { session_id })
            .await)
    }

    async fn frame_goal(&self, goal: &Goal) -> Result<FramingReceipt, GatewayError> {
        let framing_id = format!("frame-{}", length_or_one(&goal.north_star));
        Ok(self
            .respond("frame_goal", FramingReceipt { framing_id })
            .await)
    }

    async fn fetch_options(
        &self,
        _request: &OptionsRequest,
    ) -> Result<Vec<OptionCard>, GatewayError> {
        Ok(self.respond("fetch_options", mock_options()).await)
    }

    async fn fetch_checklist(&self, option: &OptionCard) -> Result<Checklist, GatewayError> {
        let items = vec![
            format!("Clarify success criteria for \"{}\"", option.title),
            "Schedule 3 stakeholder conversations in week 1".to_string(),
            "Block a 90-day execution cadence on your calendar".to_string(),
        ];
        Ok(self
            .respond("fetch_checklist", Checklist { items })
            .await)
    }

    async fn export_plan(&self, request: &ExportRequest) -> Result<PlanDocument, GatewayError> {
        let document = PlanDocument::new(render_plan_text(request), "text/plain");
        Ok(self.respond("export_plan", document).await)
    }
}
