use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::registry::TimerId;

/// The kind of sanction a pending timed action will reverse.
///
/// The reversals themselves (unban/unmute) are emitted as audit events, not
/// persisted states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Ban,
    Mute,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Ban => write!(f, "ban"),
            ActionType::Mute => write!(f, "mute"),
        }
    }
}

impl FromStr for ActionType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ban" => Ok(ActionType::Ban),
            "mute" => Ok(ActionType::Mute),
            _ => Err(format!("Invalid action type: {}", s).into()),
        }
    }
}

// Serde impls for ActionType
impl Serialize for ActionType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&format!("{}", self))
    }
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D>(deserializer: D) -> Result<ActionType, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ActionType::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A pending timed action, both the persisted row and the in-flight form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedAction {
    /// Target of the original sanction
    pub user_id: String,
    /// Server the sanction was applied in
    pub server_id: String,
    /// What will be reversed when the timer fires
    pub action: ActionType,
    /// When the sanction was applied, seconds since the unix epoch
    pub start_time: i64,
    /// When the sanction should lapse. Always greater than start_time
    pub end_time: i64,
    /// Registry id of the armed timer. Only meaningful within the process
    /// that armed it, recovery issues a fresh one
    pub handle: TimerId,
    /// Role to strip on reversal. Present iff action is Mute
    pub mute_role_id: Option<String>,
}

/// Persisted table of pending timed actions, keyed by
/// (user_id, action, server_id).
///
/// insert() must upsert on that key so recovery can re-arm without
/// duplicating rows. delete_and_return_handle() is the arbiter of the
/// cancel-vs-fire race: whoever gets the handle back owns the cleanup.
#[async_trait]
pub trait ActionLedger: Send + Sync {
    async fn insert(&self, action: &TimedAction) -> Result<(), crate::Error>;

    async fn delete_and_return_handle(
        &self,
        user_id: &str,
        action: ActionType,
        server_id: &str,
    ) -> Result<Option<TimerId>, crate::Error>;

    /// Used only by startup recovery
    async fn list_all(&self) -> Result<Vec<TimedAction>, crate::Error>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_action_type_round_trip() {
        for action in [ActionType::Ban, ActionType::Mute] {
            assert_eq!(ActionType::from_str(&action.to_string()).unwrap(), action);
        }

        assert!(ActionType::from_str("unban").is_err());
        assert!(ActionType::from_str("").is_err());
    }
}
