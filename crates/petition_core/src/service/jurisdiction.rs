//! Jurisdiction policy consumed by auto-routing.
//!
//! A section rule claims targets in exactly that section; a book-wide rule
//! claims every target in the book.

use crate::error::CoreResult;
use crate::model::committee::{CommitteeId, JurisdictionRule};
use crate::model::document::TargetScope;
use crate::repo::committee_repo::CommitteeRepository;

/// Maps a target scope to the committees responsible for it.
pub trait JurisdictionPolicy {
    /// Committees in rule order, without duplicates.
    fn committees_for(&self, scope: &TargetScope) -> Vec<CommitteeId>;
}

/// In-memory rule table, usually loaded from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JurisdictionTable {
    rules: Vec<JurisdictionRule>,
}

impl JurisdictionTable {
    pub fn new(rules: Vec<JurisdictionRule>) -> Self {
        Self { rules }
    }

    pub fn load<R: CommitteeRepository>(repo: &R) -> CoreResult<Self> {
        Ok(Self::new(repo.list_jurisdictions()?))
    }

    pub fn rules(&self) -> &[JurisdictionRule] {
        &self.rules
    }
}

impl JurisdictionPolicy for JurisdictionTable {
    fn committees_for(&self, scope: &TargetScope) -> Vec<CommitteeId> {
        let mut committees = Vec::new();
        for rule in &self.rules {
            let matches = rule.book_id == scope.book_id
                && rule
                    .section_id
                    .map_or(true, |section_id| section_id == scope.section_id);
            if matches && !committees.contains(&rule.committee_id) {
                committees.push(rule.committee_id);
            }
        }
        committees
    }
}

#[cfg(test)]
mod tests {
    use super::{JurisdictionPolicy, JurisdictionTable};
    use crate::model::committee::JurisdictionRule;
    use crate::model::document::TargetScope;
    use uuid::Uuid;

    #[test]
    fn section_rule_only_matches_its_section() {
        let committee = Uuid::new_v4();
        let book = Uuid::new_v4();
        let section = Uuid::new_v4();
        let table = JurisdictionTable::new(vec![JurisdictionRule {
            committee_id: committee,
            book_id: book,
            section_id: Some(section),
        }]);

        let inside = TargetScope {
            book_id: book,
            section_id: section,
        };
        let elsewhere = TargetScope {
            book_id: book,
            section_id: Uuid::new_v4(),
        };
        assert_eq!(table.committees_for(&inside), vec![committee]);
        assert!(table.committees_for(&elsewhere).is_empty());
    }

    #[test]
    fn book_rule_matches_every_section_and_dedupes() {
        let committee = Uuid::new_v4();
        let other = Uuid::new_v4();
        let book = Uuid::new_v4();
        let section = Uuid::new_v4();
        let table = JurisdictionTable::new(vec![
            JurisdictionRule {
                committee_id: committee,
                book_id: book,
                section_id: None,
            },
            JurisdictionRule {
                committee_id: other,
                book_id: Uuid::new_v4(),
                section_id: None,
            },
            JurisdictionRule {
                committee_id: committee,
                book_id: book,
                section_id: Some(section),
            },
        ]);

        let scope = TargetScope {
            book_id: book,
            section_id: section,
        };
        assert_eq!(table.committees_for(&scope), vec![committee]);
    }
}
