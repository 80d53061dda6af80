//! Wizard data model — the single aggregate persisted between steps.

use serde::{Deserialize, Serialize};

/// Number of option cards shown to the user. Presentation-only: the store
/// keeps whatever list it is given.
pub const MAX_VISIBLE_OPTIONS: usize = 3;

/// The user's framed goal. Both fields are set together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub north_star: String,
    pub constraints: String,
}

impl Goal {
    pub fn new(north_star: impl Into<String>, constraints: impl Into<String>) -> Self {
        Self {
            north_star: north_star.into(),
            constraints: constraints.into(),
        }
    }

    /// A goal is set once its north star is non-empty.
    pub fn is_set(&self) -> bool {
        !self.north_star.is_empty()
    }
}

/// A strategic choice presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCard {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl OptionCard {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Wizard progress. Stored as JSON in the durable slot under
/// [`settings_keys::FLOW_STATE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub entry_answer: String,
    pub session_id: String,
    pub goal: Goal,
    pub framing_id: String,
    pub options: Vec<OptionCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<OptionCard>,
    pub checklist: Vec<String>,
}

impl WizardState {
    pub fn has_entry(&self) -> bool {
        !self.entry_answer.is_empty()
    }

    /// The options the user actually gets to pick from.
    pub fn visible_options(&self) -> &[OptionCard] {
        let end = self.options.len().min(MAX_VISIBLE_OPTIONS);
        &self.options[..end]
    }

    /// Look up one of the visible options by id. Stored cards past the
    /// display cap are never returned.
    pub fn visible_option(&self, id: &str) -> Option<&OptionCard> {
        self.visible_options().iter().find(|o| o.id == id)
    }

    /// Whether each populated field has its prerequisites populated too.
    ///
    /// goal needs an entry, options need a goal, a selection must be one of
    /// the options, and a checklist needs a selection.
    pub fn is_consistent(&self) -> bool {
        if self.goal.is_set() && !self.has_entry() {
            return false;
        }
        if !self.options.is_empty() && !self.goal.is_set() {
            return false;
        }
        if let Some(ref selected) = self.selected_option {
            if !self.options.contains(selected) {
                return false;
            }
        }
        if !self.checklist.is_empty() && self.selected_option.is_none() {
            return false;
        }
        true
    }
}

/// Keys used for durable slot persistence.
pub mod settings_keys {
    /// Key for the WizardState JSON blob.
    pub const FLOW_STATE: &str = "career-flow-state";
}
