//! Wizard steps — the strictly ordered chain a user walks through.

use serde::{Deserialize, Serialize};

/// The steps of the strategy wizard.
///
/// Progresses linearly: Entry → GoalFraming → Options → Checklist → Export.
/// Stepping back goes to [`WizardStep::previous`]; a reset lands on Entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    Entry,
    GoalFraming,
    Options,
    Checklist,
    Export,
}

impl WizardStep {
    /// All steps in wizard order.
    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::Entry,
            WizardStep::GoalFraming,
            WizardStep::Options,
            WizardStep::Checklist,
            WizardStep::Export,
        ]
    }

    /// Get the next step in the chain, if any.
    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Entry => Some(GoalFraming),
            GoalFraming => Some(Options),
            Options => Some(Checklist),
            Checklist => Some(Export),
            Export => None,
        }
    }

    /// Get the previous step in the chain, if any.
    pub fn previous(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Entry => None,
            GoalFraming => Some(Entry),
            Options => Some(GoalFraming),
            Checklist => Some(Options),
            Export => Some(Checklist),
        }
    }

    /// Stable identifier, also used as the route segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::GoalFraming => "goal-framing",
            Self::Options => "options",
            Self::Checklist => "checklist",
            Self::Export => "export",
        }
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::Entry
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
