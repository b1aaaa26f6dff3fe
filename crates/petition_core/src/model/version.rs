//! Immutable petition version snapshots.
//!
//! # Invariants
//! - `version_num` increases by one per petition and is never reused.
//! - Snapshots are written once and never mutated.

use crate::model::document::{DocumentRef, ParagraphId, ResolutionId};
use crate::model::petition::{ChangeType, PetitionId, PetitionStatus, PetitionTarget};
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type VersionId = Uuid;

/// Target as captured inside a version snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionTarget {
    pub paragraph_id: Option<ParagraphId>,
    pub resolution_id: Option<ResolutionId>,
    pub change_type: ChangeType,
    pub proposed_text: Option<String>,
}

impl VersionTarget {
    pub fn document_ref(&self) -> Option<DocumentRef> {
        DocumentRef::from_parts(self.paragraph_id, self.resolution_id)
    }

    /// Key used to pair the same target across two snapshots.
    pub fn identity_key(&self) -> TargetKey {
        TargetKey {
            document: self.document_ref(),
            change_type: self.change_type,
        }
    }
}

impl From<&PetitionTarget> for VersionTarget {
    fn from(target: &PetitionTarget) -> Self {
        Self {
            paragraph_id: target.paragraph_id,
            resolution_id: target.resolution_id,
            change_type: target.change_type,
            proposed_text: target.proposed_text.clone(),
        }
    }
}

/// Stable identity of a target: canonical reference plus change kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub document: Option<DocumentRef>,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionVersion {
    pub id: VersionId,
    pub petition_id: PetitionId,
    pub version_num: u32,
    /// Petition status the snapshot was taken at.
    pub stage: PetitionStatus,
    pub targets: Vec<VersionTarget>,
    pub created_by: UserId,
    pub created_at: i64,
}
