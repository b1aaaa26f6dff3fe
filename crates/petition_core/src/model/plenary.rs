//! Plenary sessions, calendar items and floor actions.

use crate::model::petition::PetitionId;
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;
pub type CalendarItemId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlenarySession {
    pub id: SessionId,
    pub name: String,
    /// Epoch ms.
    pub scheduled_for: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItem {
    pub id: CalendarItemId,
    pub session_id: SessionId,
    pub petition_id: PetitionId,
    /// One-based position on the session calendar.
    pub item_order: u32,
    pub actions: Vec<PlenaryAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlenaryActionKind {
    Adopt,
    Defeat,
    Debate,
    Refer,
}

impl PlenaryActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Adopt => "ADOPT",
            Self::Defeat => "DEFEAT",
            Self::Debate => "DEBATE",
            Self::Refer => "REFER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADOPT" => Some(Self::Adopt),
            "DEFEAT" => Some(Self::Defeat),
            "DEBATE" => Some(Self::Debate),
            "REFER" => Some(Self::Refer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlenaryAction {
    pub id: i64,
    pub calendar_item_id: CalendarItemId,
    pub action: PlenaryActionKind,
    pub notes: Option<String>,
    pub actor_id: UserId,
    pub created_at: i64,
}
