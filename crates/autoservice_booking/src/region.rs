// --- File: crates/autoservice_booking/src/region.rs ---
use serde::Serialize;

/// Lifecycle of one independently updated part of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum RegionState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

impl<T> Default for RegionState<T> {
    fn default() -> Self {
        RegionState::Idle
    }
}

impl<T> RegionState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RegionState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            RegionState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            RegionState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// State of the submit button region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Succeeded(String),
    Failed(String),
}

impl SubmitState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SubmitState::Submitting)
    }
}
