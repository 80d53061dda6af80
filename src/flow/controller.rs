//! Step controllers — one method per wizard step.
//!
//! Each method checks the guard for its step, validates input, calls the
//! gateway, merges the result into the store and names the next step. A call
//! that is still in flight blocks any other submission until it settles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{GatewayError, StepError};
use crate::gateway::{ExportRequest, Gateway, OptionsRequest, PlanDocument};

use super::guard::{redirect_for, resume_step};
use super::model::{Goal, MAX_VISIBLE_OPTIONS};
use super::step::WizardStep;
use super::store::FlowStore;

/// Inline validation messages.
pub mod messages {
    pub const ENTRY_REQUIRED: &str = "Please answer the question.";
    pub const GOAL_FIELDS_REQUIRED: &str = "All fields are required.";
    pub const OPTION_REQUIRED: &str = "Select an option to continue.";
}

/// Drives the wizard: store + gateway + the in-flight flag.
pub struct Wizard {
    store: FlowStore,
    gateway: Arc<dyn Gateway>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Wizard {
    pub fn new(store: FlowStore, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            store,
            gateway,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &FlowStore {
        &self.store
    }

    /// Whether a submission is currently suspended on the gateway.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Navigation hook: the step to redirect to instead of `step`, if any.
    pub async fn activate(&self, step: WizardStep) -> Option<WizardStep> {
        let state = self.store.snapshot().await;
        let target = redirect_for(step, &state);
        if let Some(target) = target {
            tracing::info!(requested = %step, redirect = %target, "Step guard redirect");
        }
        target
    }

    /// Step back from `step`. The guard still applies to the earlier step, so
    /// the result may be further back than `step.previous()`.
    pub async fn back(&self, step: WizardStep) -> WizardStep {
        let target = step.previous().unwrap_or(step);
        self.activate(target).await.unwrap_or(target)
    }

    /// The furthest step the persisted state allows.
    pub async fn resume(&self) -> WizardStep {
        resume_step(&self.store.snapshot().await)
    }

    /// Entry step: start a session from the user's answer.
    pub async fn submit_entry(&self, answer: &str) -> Result<WizardStep, StepError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(StepError::Validation(messages::ENTRY_REQUIRED.into()));
        }
        let _flight = self.begin()?;

        let receipt = self
            .gateway
            .submit_entry(answer)
            .await
            .inspect_err(log_failure)?;
        self.store.set_entry(answer, &receipt.session_id).await?;
        Ok(WizardStep::GoalFraming)
    }

    /// Goal-framing step: frame the goal and fetch options concurrently.
    pub async fn submit_goal(
        &self,
        north_star: &str,
        constraints: &str,
    ) -> Result<WizardStep, StepError> {
        self.ensure_reachable(WizardStep::GoalFraming).await?;
        let goal = Goal::new(north_star.trim(), constraints.trim());
        if goal.north_star.is_empty() || goal.constraints.is_empty() {
            return Err(StepError::Validation(messages::GOAL_FIELDS_REQUIRED.into()));
        }
        let _flight = self.begin()?;

        let request = OptionsRequest {
            goal: goal.clone(),
            entry_answer: self.store.snapshot().await.entry_answer,
        };
        let (framing, mut options) = tokio::try_join!(
            self.gateway.frame_goal(&goal),
            self.gateway.fetch_options(&request),
        )
        .inspect_err(log_failure)?;

        options.truncate(MAX_VISIBLE_OPTIONS);
        self.store.set_goal(goal, &framing.framing_id).await?;
        self.store.set_options(options).await?;
        Ok(WizardStep::Options)
    }

    /// Options step: pick an option and generate its checklist.
    ///
    /// With no options to pick from, the user is sent back to goal framing to
    /// fetch a new set.
    pub async fn choose_option(&self, option_id: &str) -> Result<WizardStep, StepError> {
        self.ensure_reachable(WizardStep::Options).await?;
        let state = self.store.snapshot().await;
        if state.visible_options().is_empty() {
            return Err(StepError::Redirect(WizardStep::GoalFraming));
        }
        let Some(option) = state.visible_option(option_id.trim()).cloned() else {
            return Err(StepError::Validation(messages::OPTION_REQUIRED.into()));
        };
        let _flight = self.begin()?;

        let checklist = self
            .gateway
            .fetch_checklist(&option)
            .await
            .inspect_err(log_failure)?;
        self.store.select_option(&option).await?;
        self.store.set_checklist(checklist.items).await?;
        Ok(WizardStep::Checklist)
    }

    /// Checklist step: nothing to submit, just move on.
    pub async fn confirm_checklist(&self) -> Result<WizardStep, StepError> {
        self.ensure_reachable(WizardStep::Checklist).await?;
        Ok(WizardStep::Export)
    }

    /// Export step: render the plan document. Does not touch the state.
    pub async fn export(&self) -> Result<PlanDocument, StepError> {
        self.ensure_reachable(WizardStep::Export).await?;
        let state = self.store.snapshot().await;
        let Some(option) = state.selected_option else {
            return Err(StepError::Redirect(WizardStep::Options));
        };
        let _flight = self.begin()?;

        let request = ExportRequest {
            entry_answer: state.entry_answer,
            goal: state.goal,
            option,
            checklist: state.checklist,
        };
        let document = self
            .gateway
            .export_plan(&request)
            .await
            .inspect_err(log_failure)?;
        Ok(document)
    }

    /// Start over from an empty state.
    pub async fn restart(&self) -> WizardStep {
        self.store.reset().await;
        WizardStep::Entry
    }

    async fn ensure_reachable(&self, step: WizardStep) -> Result<(), StepError> {
        match self.activate(step).await {
            Some(target) => Err(StepError::Redirect(target)),
            None => Ok(()),
        }
    }

    fn begin(&self) -> Result<InFlight<'_>, StepError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| StepError::Busy)?;
        Ok(InFlight(&self.in_flight))
    }
}

fn log_failure(e: &GatewayError) {
    tracing::warn!(
        operation = e.operation().unwrap_or("gateway"),
        "Gateway call failed: {}",
        e
    );
}
