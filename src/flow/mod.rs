//! Wizard flow — state, persistence, ordering rules and step controllers.
//!
//! The user walks a fixed chain of steps (entry, goal framing, options,
//! checklist, export). Each step's output lands in a single `WizardState`
//! owned by the `FlowStore`, which persists the whole aggregate to a durable
//! slot after every mutation. The guard decides which step a given state may
//! show, and the `Wizard` controller ties the store to the gateway.

pub mod controller;
pub mod guard;
pub mod model;
pub mod slot;
pub mod step;
pub mod store;

pub use controller::Wizard;
pub use guard::{can_activate, redirect_for, resume_step};
pub use model::{Goal, OptionCard, WizardState, MAX_VISIBLE_OPTIONS};
pub use slot::{FileSlot, MemorySlot, StateSlot};
pub use step::WizardStep;
pub use store::FlowStore;
