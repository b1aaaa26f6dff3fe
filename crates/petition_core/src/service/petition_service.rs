//! Petition use-case service.
//!
//! # Responsibility
//! - Authorize and run petition creation, target replacement and
//!   lifecycle moves.
//! - Expose version history reads.
//!
//! # Invariants
//! - Target replacement, submission and withdrawal are open to the submitter
//!   or to `Staff` and above.
//! - The generic `transition` only covers committee-decided statuses; every
//!   other status has a dedicated operation elsewhere.

use crate::auth::{Principal, Role};
use crate::error::{CoreError, CoreResult};
use crate::model::petition::{
    NewPetition, Petition, PetitionId, PetitionStatus, PetitionTarget, TargetDraft,
};
use crate::model::version::{PetitionVersion, VersionId};
use crate::repo::petition_repo::{PetitionListQuery, PetitionRepository, StatusChange};
use crate::service::log_outcome;
use std::time::Instant;

/// Statuses staff may set through `transition`.
pub const STAFF_SETTABLE_STATUSES: [PetitionStatus; 3] = [
    PetitionStatus::Amended,
    PetitionStatus::ApprovedByCommittee,
    PetitionStatus::RejectedByCommittee,
];

/// Petition service facade over a repository implementation.
pub struct PetitionService<R: PetitionRepository> {
    repo: R,
}

impl<R: PetitionRepository> PetitionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a `DRAFT` petition owned by `principal`.
    pub fn create_petition(
        &self,
        principal: &Principal,
        input: &NewPetition,
    ) -> CoreResult<Petition> {
        let started = Instant::now();
        let result = principal
            .require(Role::Delegate)
            .and_then(|()| Ok(self.repo.create_petition(input, principal.id)?));
        let context = match &result {
            Ok(petition) => format!("petition_id={} conference_id={}", petition.id, input.conference_id),
            Err(_) => format!("conference_id={}", input.conference_id),
        };
        log_outcome("petition_create", "petition", started, &context, result)
    }

    pub fn get_petition(&self, id: PetitionId) -> CoreResult<Petition> {
        self.repo
            .get_petition(id)?
            .ok_or_else(|| CoreError::not_found("petition", id))
    }

    pub fn list_petitions(&self, query: &PetitionListQuery) -> CoreResult<Vec<Petition>> {
        Ok(self.repo.list_petitions(query)?)
    }

    pub fn list_targets(&self, id: PetitionId) -> CoreResult<Vec<PetitionTarget>> {
        self.get_petition(id)?;
        Ok(self.repo.list_targets(id)?)
    }

    /// Replaces the whole target set of a `DRAFT` petition.
    pub fn replace_targets(
        &self,
        principal: &Principal,
        id: PetitionId,
        targets: &[TargetDraft],
    ) -> CoreResult<Vec<PetitionTarget>> {
        let started = Instant::now();
        let result = self.get_petition(id).and_then(|petition| {
            principal.require_owner_or(petition.submitter_id, Role::Staff)?;
            Ok(self.repo.replace_targets(id, targets)?)
        });
        let context = format!("petition_id={id} target_count={}", targets.len());
        log_outcome("petition_replace_targets", "petition", started, &context, result)
    }

    /// `DRAFT -> SUBMITTED`; needs at least one target.
    pub fn submit(&self, principal: &Principal, id: PetitionId) -> CoreResult<StatusChange> {
        self.owner_move(principal, id, PetitionStatus::Submitted, "petition_submit")
    }

    /// Moves any pre-terminal petition to `WITHDRAWN`.
    pub fn withdraw(&self, principal: &Principal, id: PetitionId) -> CoreResult<StatusChange> {
        self.owner_move(principal, id, PetitionStatus::Withdrawn, "petition_withdraw")
    }

    /// Staff-driven committee outcome: amended, approved or rejected.
    pub fn transition(
        &self,
        principal: &Principal,
        id: PetitionId,
        to: PetitionStatus,
    ) -> CoreResult<StatusChange> {
        let started = Instant::now();
        let result = principal.require(Role::Staff).and_then(|()| {
            if !STAFF_SETTABLE_STATUSES.contains(&to) {
                return Err(CoreError::validation(format!(
                    "status {to} cannot be set directly"
                )));
            }
            Ok(self.repo.transition_status(id, to, principal.id)?)
        });
        let context = format!("petition_id={id} to={to}");
        log_outcome("petition_transition", "petition", started, &context, result)
    }

    /// Versions in ascending `version_num` order.
    pub fn list_versions(&self, id: PetitionId) -> CoreResult<Vec<PetitionVersion>> {
        self.get_petition(id)?;
        Ok(self.repo.list_versions(id)?)
    }

    pub fn get_version(
        &self,
        petition_id: PetitionId,
        version_id: VersionId,
    ) -> CoreResult<PetitionVersion> {
        self.repo
            .get_version(petition_id, version_id)?
            .ok_or_else(|| CoreError::not_found("version", version_id))
    }

    fn owner_move(
        &self,
        principal: &Principal,
        id: PetitionId,
        to: PetitionStatus,
        event: &str,
    ) -> CoreResult<StatusChange> {
        let started = Instant::now();
        let result = self.get_petition(id).and_then(|petition| {
            principal.require_owner_or(petition.submitter_id, Role::Staff)?;
            Ok(self.repo.transition_status(id, to, principal.id)?)
        });
        let context = format!("petition_id={id} to={to}");
        log_outcome(event, "petition", started, &context, result)
    }
}
