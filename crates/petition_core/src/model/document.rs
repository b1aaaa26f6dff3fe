//! Canonical published text units.
//!
//! Paragraphs and resolutions belong to a book/section tree and are read-only
//! to the petition core; the seeding helpers in `repo::document_repo` exist for
//! fixtures and local tooling.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BookId = Uuid;
pub type SectionId = Uuid;
pub type ParagraphId = Uuid;
pub type ResolutionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    /// Short citation prefix such as `BOD`.
    pub identifier: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub book_id: BookId,
    pub parent_id: Option<SectionId>,
    pub title: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub id: ParagraphId,
    pub section_id: SectionId,
    pub number: String,
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub id: ResolutionId,
    pub section_id: SectionId,
    pub number: String,
    pub title: String,
    pub text: String,
}

/// Reference from a target to the canonical unit it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentRef {
    Paragraph(ParagraphId),
    Resolution(ResolutionId),
}

impl DocumentRef {
    /// Builds a reference from the optional target columns.
    ///
    /// A paragraph wins when both are present; validation rejects that shape
    /// before persistence.
    pub fn from_parts(
        paragraph_id: Option<ParagraphId>,
        resolution_id: Option<ResolutionId>,
    ) -> Option<Self> {
        match (paragraph_id, resolution_id) {
            (Some(id), _) => Some(Self::Paragraph(id)),
            (None, Some(id)) => Some(Self::Resolution(id)),
            (None, None) => None,
        }
    }
}

/// Current canonical text of a unit plus what is needed to label and route it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUnit {
    pub reference: DocumentRef,
    pub book_id: BookId,
    pub section_id: SectionId,
    /// Book identifier, e.g. `BOD`.
    pub book_identifier: String,
    pub number: String,
    pub title: Option<String>,
    pub text: String,
}

impl CanonicalUnit {
    /// Human-readable label: document identifier, number and title.
    pub fn label(&self) -> String {
        let marker = match self.reference {
            DocumentRef::Paragraph(_) => "¶",
            DocumentRef::Resolution(_) => "R",
        };
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => {
                format!("{} {}{} {}", self.book_identifier, marker, self.number, title)
            }
            _ => format!("{} {}{}", self.book_identifier, marker, self.number),
        }
    }

    /// Jurisdiction scope of the unit.
    pub fn scope(&self) -> TargetScope {
        TargetScope {
            book_id: self.book_id,
            section_id: self.section_id,
        }
    }
}

/// Book and section a target falls under; input to jurisdiction lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetScope {
    pub book_id: BookId,
    pub section_id: SectionId,
}
