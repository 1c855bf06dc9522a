//! Engine lifecycle states.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lifecycle of a [`CollectionEngine`](super::CollectionEngine).
///
/// `Stopped → Starting → Running → Stopping → Stopped`. A failed start goes
/// straight from `Starting` back to `Stopped`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EngineState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl EngineState {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}
