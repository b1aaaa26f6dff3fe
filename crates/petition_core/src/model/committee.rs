//! Committees, memberships, petition assignments and the committee audit trail.
//!
//! # Invariants
//! - At most one assignment exists per `(petition_id, committee_id)` pair.
//! - Assignment status is independent from the owning petition status, except
//!   for the `InProgress` side effect owned by `crate::lifecycle`.
//! - Committee actions are append-only.

use crate::model::document::{BookId, SectionId};
use crate::model::petition::PetitionId;
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type CommitteeId = Uuid;
pub type AssignmentId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Committee {
    pub id: CommitteeId,
    pub name: String,
    pub abbreviation: String,
    pub description: String,
}

/// Role a user holds inside one committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitteeRole {
    Chair,
    ViceChair,
    Secretary,
    Member,
}

impl CommitteeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chair => "CHAIR",
            Self::ViceChair => "VICE_CHAIR",
            Self::Secretary => "SECRETARY",
            Self::Member => "MEMBER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CHAIR" => Some(Self::Chair),
            "VICE_CHAIR" => Some(Self::ViceChair),
            "SECRETARY" => Some(Self::Secretary),
            "MEMBER" => Some(Self::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeMember {
    pub committee_id: CommitteeId,
    pub user_id: UserId,
    pub role: CommitteeRole,
}

/// One jurisdiction rule: a committee owns a whole book or one section of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JurisdictionRule {
    pub committee_id: CommitteeId,
    pub book_id: BookId,
    /// `None` means the rule covers the whole book.
    pub section_id: Option<SectionId>,
}

/// Review progress of one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    InProgress,
    Completed,
    Deferred,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Deferred => "DEFERRED",
        }
    }

    /// Parses the exact wire value; anything else is an illegal status.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            "DEFERRED" => Some(Self::Deferred),
            _ => None,
        }
    }
}

impl Display for AssignmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionAssignment {
    pub id: AssignmentId,
    pub petition_id: PetitionId,
    pub committee_id: CommitteeId,
    pub status: AssignmentStatus,
    pub assigned_by: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Kind of audit entry recorded against an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitteeActionKind {
    StatusChanged,
    Note,
    Hearing,
    RecommendApproval,
    RecommendRejection,
    Amend,
}

impl CommitteeActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatusChanged => "status_changed",
            Self::Note => "note",
            Self::Hearing => "hearing",
            Self::RecommendApproval => "recommend_approval",
            Self::RecommendRejection => "recommend_rejection",
            Self::Amend => "amend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "status_changed" => Some(Self::StatusChanged),
            "note" => Some(Self::Note),
            "hearing" => Some(Self::Hearing),
            "recommend_approval" => Some(Self::RecommendApproval),
            "recommend_rejection" => Some(Self::RecommendRejection),
            "amend" => Some(Self::Amend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeAction {
    pub id: i64,
    pub assignment_id: AssignmentId,
    pub action: CommitteeActionKind,
    pub from_status: Option<AssignmentStatus>,
    pub to_status: Option<AssignmentStatus>,
    pub notes: Option<String>,
    pub actor_id: UserId,
    pub created_at: i64,
}
