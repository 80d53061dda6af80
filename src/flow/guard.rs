//! Step guard — decides whether a step may activate for a given state.

use super::model::WizardState;
use super::step::WizardStep;

/// Return the step to redirect to when `step` cannot activate, or `None` if
/// its prerequisites are met.
///
/// Prerequisites accumulate along the chain and are checked in chain order,
/// so the target is always the earliest unsatisfied step. A state with
/// nothing in it sends every step back to Entry.
pub fn redirect_for(step: WizardStep, state: &WizardState) -> Option<WizardStep> {
    if step > WizardStep::Entry && !state.has_entry() {
        return Some(WizardStep::Entry);
    }
    if step >= WizardStep::Options && !has_framing(state) {
        return Some(WizardStep::GoalFraming);
    }
    if step >= WizardStep::Checklist && !has_checklist(state) {
        return Some(WizardStep::Options);
    }
    None
}

/// Whether `step` may activate.
pub fn can_activate(step: WizardStep, state: &WizardState) -> bool {
    redirect_for(step, state).is_none()
}

/// The furthest step the state allows, used to resume a session.
pub fn resume_step(state: &WizardState) -> WizardStep {
    WizardStep::all()
        .iter()
        .rev()
        .copied()
        .find(|step| can_activate(*step, state))
        .unwrap_or_default()
}

// Options depend on the goal, so either one is enough to show the options step.
fn has_framing(state: &WizardState) -> bool {
    state.goal.is_set() || !state.options.is_empty()
}

fn has_checklist(state: &WizardState) -> bool {
    state.selected_option.is_some() && !state.checklist.is_empty()
}
