//! The single current view state and the rules for replacing it.
//!
//! Idle -> Loading -> (Results | Error) -> Loading -> ...
//! Nothing skips Loading, and Loading cannot be entered twice.

use crate::error::SearchError;
use crate::model::SearchResult;
use crate::view::ProductCardView;
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Results {
        result: SearchResult,
        views: Vec<ProductCardView>,
    },
    Error {
        error: SearchError,
    },
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ViewState::Results { .. } | ViewState::Error { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::Results { .. } => "results",
            ViewState::Error { .. } => "error",
        }
    }

    pub fn can_transition_to(&self, next: &ViewState) -> bool {
        match (self, next) {
            (ViewState::Loading, ViewState::Loading) => false,
            (_, ViewState::Loading) => true,
            (ViewState::Loading, next) => next.is_terminal(),
            _ => false,
        }
    }
}

/// Owns the current [`ViewState`] and publishes every replacement.
pub struct ViewStateMachine {
    tx: watch::Sender<ViewState>,
}

impl ViewStateMachine {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ViewState::Idle);
        Self { tx }
    }

    pub fn current(&self) -> ViewState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.tx.subscribe()
    }

    /// Enter Loading. Returns false, leaving the state alone, while a
    /// search is already in flight.
    pub fn begin_loading(&self) -> bool {
        self.replace(ViewState::Loading)
    }

    /// Settle an in-flight search with its outcome.
    pub fn settle(&self, outcome: ViewState) -> bool {
        self.replace(outcome)
    }

    fn replace(&self, next: ViewState) -> bool {
        let mut refused_from = None;
        let applied = self.tx.send_if_modified(|state| {
            if state.can_transition_to(&next) {
                *state = next.clone();
                true
            } else {
                refused_from = Some(state.name());
                false
            }
        });
        if let Some(from) = refused_from {
            tracing::debug!("Refused view transition {} -> {}", from, next.name());
        }
        applied
    }
}

impl Default for ViewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
