//! Error types for Strategy Copilot.

use crate::flow::WizardStep;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Gateway errors. Each one names the operation that failed; the detail is
/// for logs only and never reaches the user.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{operation} request failed: {reason}")]
    Transport { operation: String, reason: String },

    #[error("{operation} returned status {status}")]
    Status { operation: String, status: u16 },

    #[error("Invalid response from {operation}: {reason}")]
    Decode { operation: String, reason: String },

    #[error("Gateway configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// The operation this error belongs to, if any.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::Transport { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. } => Some(operation),
            Self::Configuration(_) => None,
        }
    }
}

/// Durable slot errors.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A store mutation was rejected; the state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("{field} must not be blank")]
    BlankField { field: &'static str },

    #[error("Cannot set {field} before {requires}")]
    MissingPrerequisite {
        field: &'static str,
        requires: &'static str,
    },

    #[error("Option {id} is not among the current options")]
    UnknownOption { id: String },
}

/// Errors surfaced at the step controller boundary.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("A request for this step is already in flight")]
    Busy,

    #[error("Step prerequisites not met, redirect to {0}")]
    Redirect(WizardStep),
}

impl StepError {
    /// The single message shown to the user for a failure on `step`.
    ///
    /// Validation messages are shown as-is; everything else collapses into a
    /// generic per-step message with no status codes or internals.
    pub fn user_message(&self, step: WizardStep) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Busy => "Please wait for the current request to finish.".to_string(),
            Self::Redirect(target) => format!("Please complete the {target} step first."),
            Self::Gateway(_) | Self::Flow(_) => generic_failure(step).to_string(),
        }
    }
}

fn generic_failure(step: WizardStep) -> &'static str {
    match step {
        WizardStep::Entry => "Unable to start the flow right now.",
        WizardStep::GoalFraming => "Something went wrong while generating options.",
        WizardStep::Options => "Unable to generate the checklist.",
        WizardStep::Checklist => "Unable to continue right now.",
        WizardStep::Export => "Export is unavailable at the moment.",
    }
}
