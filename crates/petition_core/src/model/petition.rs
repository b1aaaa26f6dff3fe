//! Petition aggregate and its proposed textual targets.
//!
//! # Invariants
//! - `status` transitions are governed by `crate::lifecycle`, never by callers.
//! - A petition outside `Draft` has a frozen target set.
//! - A target references at most one canonical unit (paragraph or resolution).

use crate::model::document::{ParagraphId, ResolutionId};
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type PetitionId = Uuid;
pub type TargetId = Uuid;
/// Reference to the conference a petition was filed for.
pub type ConferenceId = Uuid;

/// Upper bound on proposed text per target, in characters.
pub const MAX_PROPOSED_TEXT_CHARS: usize = 100_000;

/// Review pipeline state of a petition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetitionStatus {
    Draft,
    Submitted,
    UnderReview,
    InCommittee,
    Amended,
    ApprovedByCommittee,
    RejectedByCommittee,
    OnCalendar,
    Adopted,
    Defeated,
    Withdrawn,
}

impl PetitionStatus {
    pub const ALL: [PetitionStatus; 11] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::InCommittee,
        Self::Amended,
        Self::ApprovedByCommittee,
        Self::RejectedByCommittee,
        Self::OnCalendar,
        Self::Adopted,
        Self::Defeated,
        Self::Withdrawn,
    ];

    /// Stable string used in storage and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::InCommittee => "IN_COMMITTEE",
            Self::Amended => "AMENDED",
            Self::ApprovedByCommittee => "APPROVED_BY_COMMITTEE",
            Self::RejectedByCommittee => "REJECTED_BY_COMMITTEE",
            Self::OnCalendar => "ON_CALENDAR",
            Self::Adopted => "ADOPTED",
            Self::Defeated => "DEFEATED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Final dispositions; nothing follows them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Adopted | Self::Defeated | Self::Withdrawn)
    }
}

impl Display for PetitionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of textual change a target proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    AddText,
    DeleteText,
    ReplaceText,
    AddParagraph,
    DeleteParagraph,
    Restructure,
}

impl ChangeType {
    pub const ALL: [ChangeType; 6] = [
        Self::AddText,
        Self::DeleteText,
        Self::ReplaceText,
        Self::AddParagraph,
        Self::DeleteParagraph,
        Self::Restructure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddText => "ADD_TEXT",
            Self::DeleteText => "DELETE_TEXT",
            Self::ReplaceText => "REPLACE_TEXT",
            Self::AddParagraph => "ADD_PARAGRAPH",
            Self::DeleteParagraph => "DELETE_PARAGRAPH",
            Self::Restructure => "RESTRUCTURE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Whether the change is meaningless without proposed text.
    pub fn requires_proposed_text(self) -> bool {
        matches!(self, Self::AddText | Self::ReplaceText | Self::AddParagraph)
    }
}

impl Display for ChangeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Petition record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Petition {
    pub id: PetitionId,
    pub conference_id: ConferenceId,
    /// Human-facing number, unique within one conference (`P-0001`).
    pub display_number: String,
    pub title: String,
    pub summary: String,
    pub status: PetitionStatus,
    pub submitter_id: UserId,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
    /// Epoch ms of the `Draft -> Submitted` transition.
    pub submitted_at: Option<i64>,
}

/// Input for creating a new draft petition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPetition {
    pub conference_id: ConferenceId,
    pub title: String,
    pub summary: String,
}

/// One persisted proposed change of a petition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionTarget {
    pub id: TargetId,
    pub petition_id: PetitionId,
    /// Zero-based order inside the petition.
    pub position: u32,
    pub paragraph_id: Option<ParagraphId>,
    pub resolution_id: Option<ResolutionId>,
    pub change_type: ChangeType,
    pub proposed_text: Option<String>,
}

/// Caller-supplied target used by full target-set replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDraft {
    #[serde(default)]
    pub paragraph_id: Option<ParagraphId>,
    #[serde(default)]
    pub resolution_id: Option<ResolutionId>,
    pub change_type: ChangeType,
    #[serde(default)]
    pub proposed_text: Option<String>,
}

impl TargetDraft {
    /// Validates structural target rules that do not need the store.
    ///
    /// # Errors
    /// - Both a paragraph and a resolution are referenced.
    /// - Proposed text is missing for a change kind that needs it.
    /// - Proposed text exceeds `MAX_PROPOSED_TEXT_CHARS`.
    /// - A paragraph deletion references no paragraph.
    pub fn validate(&self) -> Result<(), TargetValidationError> {
        if self.paragraph_id.is_some() && self.resolution_id.is_some() {
            return Err(TargetValidationError::AmbiguousReference);
        }

        let text_is_blank = self
            .proposed_text
            .as_deref()
            .map_or(true, |text| text.trim().is_empty());
        if self.change_type.requires_proposed_text() && text_is_blank {
            return Err(TargetValidationError::MissingProposedText(self.change_type));
        }

        if let Some(text) = self.proposed_text.as_deref() {
            let chars = text.chars().count();
            if chars > MAX_PROPOSED_TEXT_CHARS {
                return Err(TargetValidationError::ProposedTextTooLong { chars });
            }
        }

        if self.change_type == ChangeType::DeleteParagraph && self.paragraph_id.is_none() {
            return Err(TargetValidationError::MissingParagraph);
        }

        Ok(())
    }
}

/// Structural target validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetValidationError {
    AmbiguousReference,
    MissingProposedText(ChangeType),
    ProposedTextTooLong { chars: usize },
    MissingParagraph,
}

impl Display for TargetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AmbiguousReference => {
                write!(f, "target must reference a paragraph or a resolution, not both")
            }
            Self::MissingProposedText(kind) => {
                write!(f, "change type {kind} requires proposed text")
            }
            Self::ProposedTextTooLong { chars } => write!(
                f,
                "proposed text has {chars} characters, limit is {MAX_PROPOSED_TEXT_CHARS}"
            ),
            Self::MissingParagraph => write!(f, "DELETE_PARAGRAPH requires a paragraph reference"),
        }
    }
}

impl Error for TargetValidationError {}

#[cfg(test)]
mod tests {
    use super::{ChangeType, PetitionStatus, TargetDraft, TargetValidationError};
    use uuid::Uuid;

    fn draft(change_type: ChangeType, text: Option<&str>) -> TargetDraft {
        TargetDraft {
            paragraph_id: Some(Uuid::new_v4()),
            resolution_id: None,
            change_type,
            proposed_text: text.map(str::to_string),
        }
    }

    #[test]
    fn status_strings_round_trip() {
        for status in PetitionStatus::ALL {
            assert_eq!(PetitionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PetitionStatus::parse("under_review"), None);
    }

    #[test]
    fn change_type_serializes_as_screaming_snake() {
        let json = serde_json::to_string(&ChangeType::DeleteParagraph).unwrap();
        assert_eq!(json, "\"DELETE_PARAGRAPH\"");
    }

    #[test]
    fn rejects_target_with_both_references() {
        let mut target = draft(ChangeType::ReplaceText, Some("new"));
        target.resolution_id = Some(Uuid::new_v4());
        assert_eq!(
            target.validate(),
            Err(TargetValidationError::AmbiguousReference)
        );
    }

    #[test]
    fn replace_requires_non_blank_text() {
        let target = draft(ChangeType::ReplaceText, Some("   "));
        assert_eq!(
            target.validate(),
            Err(TargetValidationError::MissingProposedText(
                ChangeType::ReplaceText
            ))
        );
        assert!(draft(ChangeType::DeleteText, None).validate().is_ok());
    }

    #[test]
    fn delete_paragraph_needs_paragraph() {
        let target = TargetDraft {
            paragraph_id: None,
            resolution_id: None,
            change_type: ChangeType::DeleteParagraph,
            proposed_text: None,
        };
        assert_eq!(
            target.validate(),
            Err(TargetValidationError::MissingParagraph)
        );
    }
}
