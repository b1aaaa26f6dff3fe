//! Committee administration: committees, members, jurisdiction rules.

use crate::auth::{Principal, Role};
use crate::error::{CoreError, CoreResult};
use crate::model::committee::{
    Committee, CommitteeId, CommitteeMember, CommitteeRole, JurisdictionRule,
};
use crate::model::document::{BookId, SectionId};
use crate::model::UserId;
use crate::repo::committee_repo::{CommitteeRepository, NewCommittee};
use crate::service::jurisdiction::JurisdictionTable;
use crate::service::log_outcome;
use std::time::Instant;

pub struct CommitteeService<R: CommitteeRepository> {
    repo: R,
}

impl<R: CommitteeRepository> CommitteeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Admin only. Duplicate abbreviations are a `Conflict`.
    pub fn create_committee(
        &self,
        principal: &Principal,
        input: &NewCommittee,
    ) -> CoreResult<Committee> {
        let started = Instant::now();
        let result = principal
            .require(Role::Admin)
            .and_then(|()| Ok(self.repo.create_committee(input)?));
        let context = match &result {
            Ok(committee) => format!("committee_id={}", committee.id),
            Err(_) => String::new(),
        };
        log_outcome("committee_create", "committee", started, &context, result)
    }

    pub fn get_committee(&self, id: CommitteeId) -> CoreResult<Committee> {
        self.repo
            .get_committee(id)?
            .ok_or_else(|| CoreError::not_found("committee", id))
    }

    pub fn list_committees(&self) -> CoreResult<Vec<Committee>> {
        Ok(self.repo.list_committees()?)
    }

    pub fn add_member(
        &self,
        principal: &Principal,
        committee_id: CommitteeId,
        user_id: UserId,
        role: CommitteeRole,
    ) -> CoreResult<CommitteeMember> {
        let started = Instant::now();
        let result = principal
            .require(Role::Admin)
            .and_then(|()| Ok(self.repo.add_member(committee_id, user_id, role)?));
        let context = format!(
            "committee_id={committee_id} user_id={user_id} role={}",
            role.as_str()
        );
        log_outcome("committee_add_member", "committee", started, &context, result)
    }

    pub fn list_members(&self, committee_id: CommitteeId) -> CoreResult<Vec<CommitteeMember>> {
        Ok(self.repo.list_members(committee_id)?)
    }

    /// Admin only. `section_id: None` claims the whole book.
    pub fn add_jurisdiction(
        &self,
        principal: &Principal,
        committee_id: CommitteeId,
        book_id: BookId,
        section_id: Option<SectionId>,
    ) -> CoreResult<JurisdictionRule> {
        let started = Instant::now();
        let result = principal.require(Role::Admin).and_then(|()| {
            Ok(self
                .repo
                .add_jurisdiction(committee_id, book_id, section_id)?)
        });
        let context = format!("committee_id={committee_id} book_id={book_id}");
        log_outcome("committee_add_jurisdiction", "committee", started, &context, result)
    }

    /// Snapshot of every jurisdiction rule, for auto-routing.
    pub fn jurisdiction_table(&self) -> CoreResult<JurisdictionTable> {
        JurisdictionTable::load(&self.repo)
    }
}
