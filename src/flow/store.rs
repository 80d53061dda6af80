//! FlowStore — the persisted wizard state container.
//!
//! Holds the one `WizardState` for the session. All writes go through the six
//! named mutations; each computes the next state from the previous one, swaps
//! it in under the write lock and persists the whole aggregate before the lock
//! is released, so no reader ever sees an unpersisted state.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::FlowError;

use super::model::{settings_keys, Goal, OptionCard, WizardState};
use super::slot::StateSlot;

/// Shared handle to the wizard state. Cloning yields another handle to the
/// same state.
#[derive(Clone)]
pub struct FlowStore {
    slot: Arc<dyn StateSlot>,
    state: Arc<RwLock<WizardState>>,
}

impl FlowStore {
    /// Open the store, replacing the empty default with whatever the slot
    /// holds. Unreadable, unparsable or inconsistent payloads are logged and
    /// ignored.
    pub async fn open(slot: Arc<dyn StateSlot>) -> Self {
        let state = load_state(slot.as_ref()).await;
        Self {
            slot,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> WizardState {
        self.state.read().await.clone()
    }

    /// Record the entry answer and the session id it produced.
    pub async fn set_entry(&self, answer: &str, session_id: &str) -> Result<(), FlowError> {
        self.mutate(|prev| {
            if answer.trim().is_empty() {
                return Err(FlowError::BlankField {
                    field: "entryAnswer",
                });
            }
            Ok(WizardState {
                entry_answer: answer.to_string(),
                session_id: session_id.to_string(),
                ..prev.clone()
            })
        })
        .await
    }

    /// Record the framed goal and its framing id.
    pub async fn set_goal(&self, goal: Goal, framing_id: &str) -> Result<(), FlowError> {
        self.mutate(|prev| {
            if !prev.has_entry() {
                return Err(FlowError::MissingPrerequisite {
                    field: "goal",
                    requires: "entryAnswer",
                });
            }
            if goal.north_star.trim().is_empty() {
                return Err(FlowError::BlankField { field: "northStar" });
            }
            if goal.constraints.trim().is_empty() {
                return Err(FlowError::BlankField {
                    field: "constraints",
                });
            }
            Ok(WizardState {
                goal,
                framing_id: framing_id.to_string(),
                ..prev.clone()
            })
        })
        .await
    }

    /// Replace the option set. Any selection and checklist refer to the old
    /// set, so both are cleared, even if the new set is identical.
    pub async fn set_options(&self, options: Vec<OptionCard>) -> Result<(), FlowError> {
        self.mutate(|prev| {
            if !prev.goal.is_set() {
                return Err(FlowError::MissingPrerequisite {
                    field: "options",
                    requires: "goal",
                });
            }
            Ok(WizardState {
                options,
                selected_option: None,
                checklist: Vec::new(),
                ..prev.clone()
            })
        })
        .await
    }

    /// Select one of the stored options. The checklist is left untouched.
    pub async fn select_option(&self, option: &OptionCard) -> Result<(), FlowError> {
        self.mutate(|prev| {
            if !prev.options.contains(option) {
                return Err(FlowError::UnknownOption {
                    id: option.id.clone(),
                });
            }
            Ok(WizardState {
                selected_option: Some(option.clone()),
                ..prev.clone()
            })
        })
        .await
    }

    /// Record the checklist generated for the selected option.
    pub async fn set_checklist(&self, items: Vec<String>) -> Result<(), FlowError> {
        self.mutate(|prev| {
            if prev.selected_option.is_none() {
                return Err(FlowError::MissingPrerequisite {
                    field: "checklist",
                    requires: "selectedOption",
                });
            }
            Ok(WizardState {
                checklist: items,
                ..prev.clone()
            })
        })
        .await
    }

    /// Return to the empty initial state.
    pub async fn reset(&self) {
        self.replace(WizardState::default()).await;
    }

    async fn mutate<F>(&self, f: F) -> Result<(), FlowError>
    where
        F: FnOnce(&WizardState) -> Result<WizardState, FlowError>,
    {
        let mut state = self.state.write().await;
        let next = f(&state)?;
        *state = next;
        self.persist(&state).await;
        Ok(())
    }

    /// Swap in `next` unconditionally and persist it.
    async fn replace(&self, next: WizardState) {
        let mut state = self.state.write().await;
        *state = next;
        self.persist(&state).await;
    }

    /// Persist the full aggregate. Failures are logged, never propagated.
    async fn persist(&self, state: &WizardState) {
        let payload = match serde_json::to_string(state) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to serialize wizard state: {}", e);
                return;
            }
        };
        match self.slot.save(settings_keys::FLOW_STATE, &payload).await {
            Ok(()) => debug!(key = settings_keys::FLOW_STATE, "Wizard state persisted"),
            Err(e) => warn!(
                key = settings_keys::FLOW_STATE,
                "Failed to persist wizard state: {}", e
            ),
        }
    }
}

async fn load_state(slot: &dyn StateSlot) -> WizardState {
    let raw = match slot.load(settings_keys::FLOW_STATE).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return WizardState::default(),
        Err(e) => {
            warn!(
                key = settings_keys::FLOW_STATE,
                "Failed to read wizard state, starting fresh: {}", e
            );
            return WizardState::default();
        }
    };

    match serde_json::from_str::<WizardState>(&raw) {
        Ok(state) if state.is_consistent() => {
            debug!(key = settings_keys::FLOW_STATE, "Wizard state restored");
            state
        }
        Ok(_) => {
            warn!(
                key = settings_keys::FLOW_STATE,
                "Stored wizard state breaks the step dependency chain, starting fresh"
            );
            WizardState::default()
        }
        Err(e) => {
            warn!(
                key = settings_keys::FLOW_STATE,
                "Stored wizard state is corrupt, starting fresh: {}", e
            );
            WizardState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlotError;
    use crate::flow::slot::MemorySlot;
    use async_trait::async_trait;

    fn cards(prefix: &str, n: usize) -> Vec<OptionCard> {
        (1..=n)
            .map(|i| {
                OptionCard::new(
                    format!("{prefix}-{i}"),
                    format!("{prefix} {i}"),
                    format!("description {i}"),
                )
            })
            .collect()
    }

    async fn store_with(slot: Arc<MemorySlot>) -> FlowStore {
        FlowStore::open(slot).await
    }

    /// Store walked all the way to a generated checklist.
    async fn populated_store(slot: Arc<MemorySlot>) -> FlowStore {
        let store = store_with(slot).await;
        store.set_entry("Should I change jobs?", "mock-21").await.unwrap();
        store
            .set_goal(Goal::new("Head of Product", "Stay in Paris"), "frame-15")
            .await
            .unwrap();
        let options = cards("option", 3);
        store.set_options(options.clone()).await.unwrap();
        store.select_option(&options[1]).await.unwrap();
        store
            .set_checklist(vec!["a".into(), "b".into()])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn opens_empty_without_stored_state() {
        let store = store_with(Arc::new(MemorySlot::new())).await;
        assert_eq!(store.snapshot().await, WizardState::default());
    }

    #[tokio::test]
    async fn set_entry_leaves_downstream_alone() {
        let store = populated_store(Arc::new(MemorySlot::new())).await;
        store.set_entry("New question", "mock-12").await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.entry_answer, "New question");
        assert_eq!(state.session_id, "mock-12");
        assert_eq!(state.goal.north_star, "Head of Product");
        assert_eq!(state.checklist.len(), 2);
    }

    #[tokio::test]
    async fn set_options_clears_selection_and_checklist() {
        let store = populated_store(Arc::new(MemorySlot::new())).await;
        store.set_options(cards("fresh", 2)).await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.options.len(), 2);
        assert!(state.selected_option.is_none());
        assert!(state.checklist.is_empty());
    }

    #[tokio::test]
    async fn set_options_clears_even_for_identical_list() {
        let store = populated_store(Arc::new(MemorySlot::new())).await;
        let same = store.snapshot().await.options;
        store.set_options(same).await.unwrap();

        let state = store.snapshot().await;
        assert!(state.selected_option.is_none());
        assert!(state.checklist.is_empty());
    }

    #[tokio::test]
    async fn store_keeps_more_than_three_options() {
        let store = populated_store(Arc::new(MemorySlot::new())).await;
        store.set_options(cards("many", 5)).await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.options.len(), 5);
        assert_eq!(state.visible_options().len(), 3);
    }

    #[tokio::test]
    async fn select_option_leaves_checklist_alone() {
        let store = populated_store(Arc::new(MemorySlot::new())).await;
        let other = store.snapshot().await.options[2].clone();
        store.select_option(&other).await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.selected_option.as_ref(), Some(&other));
        assert_eq!(state.checklist, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn out_of_order_mutations_are_rejected() {
        let store = store_with(Arc::new(MemorySlot::new())).await;

        let err = store
            .set_goal(Goal::new("n", "c"), "frame-1")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingPrerequisite { field: "goal", .. }));

        let err = store.set_options(cards("option", 3)).await.unwrap_err();
        assert!(matches!(err, FlowError::MissingPrerequisite { field: "options", .. }));

        let err = store.set_checklist(vec!["x".into()]).await.unwrap_err();
        assert!(matches!(err, FlowError::MissingPrerequisite { field: "checklist", .. }));

        let card = OptionCard::new("ghost", "Ghost", "not stored");
        let err = store.select_option(&card).await.unwrap_err();
        assert_eq!(err, FlowError::UnknownOption { id: "ghost".into() });

        assert_eq!(store.snapshot().await, WizardState::default());
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let store = store_with(Arc::new(MemorySlot::new())).await;
        assert_eq!(
            store.set_entry("   ", "mock-1").await.unwrap_err(),
            FlowError::BlankField {
                field: "entryAnswer"
            }
        );

        store.set_entry("answer", "mock-6").await.unwrap();
        assert_eq!(
            store
                .set_goal(Goal::new("north", " "), "frame-5")
                .await
                .unwrap_err(),
            FlowError::BlankField {
                field: "constraints"
            }
        );
        assert!(!store.snapshot().await.goal.is_set());
    }

    #[tokio::test]
    async fn any_mutation_sequence_stays_consistent() {
        #[derive(Clone, Copy, Debug)]
        enum Op {
            Entry,
            Goal,
            Options3,
            Options2,
            SelectFirst,
            SelectForeign,
            Checklist,
            Reset,
        }
        const OPS: [Op; 8] = [
            Op::Entry,
            Op::Goal,
            Op::Options3,
            Op::Options2,
            Op::SelectFirst,
            Op::SelectForeign,
            Op::Checklist,
            Op::Reset,
        ];

        for a in OPS {
            for b in OPS {
                for c in OPS {
                    for d in OPS {
                        let store = store_with(Arc::new(MemorySlot::new())).await;
                        for op in [a, b, c, d] {
                            let _ = match op {
                                Op::Entry => store.set_entry("q", "mock-1").await,
                                Op::Goal => store.set_goal(Goal::new("n", "c"), "frame-1").await,
                                Op::Options3 => store.set_options(cards("a", 3)).await,
                                Op::Options2 => store.set_options(cards("b", 2)).await,
                                Op::SelectFirst => {
                                    let state = store.snapshot().await;
                                    match state.options.first() {
                                        Some(first) => store.select_option(first).await,
                                        None => Ok(()),
                                    }
                                }
                                Op::SelectForeign => {
                                    store
                                        .select_option(&OptionCard::new("z", "Z", "z"))
                                        .await
                                }
                                Op::Checklist => store.set_checklist(vec!["x".into()]).await,
                                Op::Reset => {
                                    store.reset().await;
                                    Ok(())
                                }
                            };
                            let state = store.snapshot().await;
                            assert!(
                                state.is_consistent(),
                                "inconsistent after {:?}: {state:?}",
                                [a, b, c, d]
                            );
                        }
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn reset_returns_exact_default() {
        let slot = Arc::new(MemorySlot::new());
        let store = populated_store(Arc::clone(&slot)).await;
        store.reset().await;
        assert_eq!(store.snapshot().await, WizardState::default());

        store.reset().await;
        assert_eq!(store.snapshot().await, WizardState::default());

        let reopened = store_with(slot).await;
        assert_eq!(reopened.snapshot().await, WizardState::default());
    }

    #[tokio::test]
    async fn reload_restores_persisted_state() {
        let slot = Arc::new(MemorySlot::new());
        let store = populated_store(Arc::clone(&slot)).await;
        let before = store.snapshot().await;

        let reloaded = store_with(slot).await;
        assert_eq!(reloaded.snapshot().await, before);
    }

    #[tokio::test]
    async fn every_mutation_is_persisted_in_full() {
        let slot = Arc::new(MemorySlot::new());
        let store = store_with(Arc::clone(&slot)).await;
        store.set_entry("q", "mock-1").await.unwrap();

        let raw = slot.load(settings_keys::FLOW_STATE).await.unwrap().unwrap();
        let persisted: WizardState = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, store.snapshot().await);
        assert_eq!(persisted.checklist, Vec::<String>::new());
    }

    #[tokio::test]
    async fn rejected_mutation_is_not_persisted() {
        let slot = Arc::new(MemorySlot::new());
        let store = store_with(Arc::clone(&slot)).await;
        let _ = store.set_checklist(vec!["x".into()]).await;
        assert!(slot.load(settings_keys::FLOW_STATE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_payload_falls_back_to_empty() {
        let slot = Arc::new(MemorySlot::with_entry(
            settings_keys::FLOW_STATE,
            "{ not json",
        ));
        let store = store_with(slot).await;
        assert_eq!(store.snapshot().await, WizardState::default());
    }

    #[tokio::test]
    async fn inconsistent_payload_falls_back_to_empty() {
        let broken = serde_json::json!({
            "entryAnswer": "",
            "sessionId": "",
            "goal": { "northStar": "", "constraints": "" },
            "framingId": "",
            "options": [],
            "selectedOption": { "id": "option-1", "title": "T", "description": "D" },
            "checklist": ["a"]
        });
        let slot = Arc::new(MemorySlot::with_entry(
            settings_keys::FLOW_STATE,
            broken.to_string(),
        ));
        let store = store_with(slot).await;
        assert_eq!(store.snapshot().await, WizardState::default());
    }

    struct FailingSlot;

    #[async_trait]
    impl StateSlot for FailingSlot {
        async fn load(&self, _key: &str) -> Result<Option<String>, SlotError> {
            Err(SlotError::Io(std::io::Error::other("disk gone")))
        }
        async fn save(&self, _key: &str, _payload: &str) -> Result<(), SlotError> {
            Err(SlotError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn slot_failures_do_not_reach_callers() {
        let store = FlowStore::open(Arc::new(FailingSlot)).await;
        assert_eq!(store.snapshot().await, WizardState::default());

        store.set_entry("still works", "mock-11").await.unwrap();
        assert_eq!(store.snapshot().await.entry_answer, "still works");
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = store_with(Arc::new(MemorySlot::new())).await;
        let other = store.clone();
        store.set_entry("shared", "mock-6").await.unwrap();
        assert_eq!(other.snapshot().await.entry_answer, "shared");
    }
}
