//! Routing and assignment engine.
//!
//! # Responsibility
//! - Assign a petition to one committee, exactly once per pair.
//! - Auto-route a petition to every committee with jurisdiction over its
//!   targets, one transaction per committee.
//! - Drive assignment status and the committee audit trail.
//!
//! # Invariants
//! - A failed assignment leaves no row and no petition status change.
//! - Auto-route keeps earlier successes when a later committee fails.
//! - Removing an assignment never reverts the petition status.

use crate::auth::{Principal, Role};
use crate::error::{CoreError, CoreResult};
use crate::lifecycle::status_after_assignment;
use crate::model::committee::{
    AssignmentId, AssignmentStatus, CommitteeAction, CommitteeActionKind, CommitteeId,
    PetitionAssignment,
};
use crate::model::document::DocumentRef;
use crate::model::petition::PetitionId;
use crate::repo::assignment_repo::{AssignmentCreated, AssignmentRepository, AssignmentStatusUpdate};
use crate::repo::document_repo::CanonicalTextSource;
use crate::repo::petition_repo::PetitionRepository;
use crate::service::jurisdiction::JurisdictionPolicy;
use crate::service::log_outcome;
use log::{debug, warn};
use serde::Serialize;
use std::time::Instant;

/// Per-committee result of auto-routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    Assigned { assignment: PetitionAssignment },
    AlreadyAssigned,
    Ineligible { reason: String },
    /// Store failure on this committee only; details are in the log.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeRouteResult {
    pub committee_id: CommitteeId,
    #[serde(flatten)]
    pub outcome: RouteOutcome,
}

/// Routing service over assignment, petition and canonical text stores.
pub struct RoutingService<A, P, S>
where
    A: AssignmentRepository,
    P: PetitionRepository,
    S: CanonicalTextSource,
{
    assignments: A,
    petitions: P,
    canonical: S,
}

impl<A, P, S> RoutingService<A, P, S>
where
    A: AssignmentRepository,
    P: PetitionRepository,
    S: CanonicalTextSource,
{
    pub fn new(assignments: A, petitions: P, canonical: S) -> Self {
        Self {
            assignments,
            petitions,
            canonical,
        }
    }

    /// Creates a `PENDING` assignment and moves the petition to `UNDER_REVIEW`.
    ///
    /// Safe to retry: a repeated call resolves to `Conflict`.
    pub fn assign(
        &self,
        principal: &Principal,
        petition_id: PetitionId,
        committee_id: CommitteeId,
    ) -> CoreResult<AssignmentCreated> {
        let started = Instant::now();
        let result = principal.require(Role::Staff).and_then(|()| {
            Ok(self
                .assignments
                .create_assignment(petition_id, committee_id, principal.id)?)
        });
        let context = format!("petition_id={petition_id} committee_id={committee_id}");
        log_outcome("assign", "routing", started, &context, result)
    }

    /// Assigns the petition to every committee with jurisdiction over one of
    /// its targets.
    ///
    /// Fails as a whole only when nothing can be routed: the petition is
    /// missing, not assignable, or no committee claims any target.
    pub fn auto_route<J: JurisdictionPolicy + ?Sized>(
        &self,
        principal: &Principal,
        petition_id: PetitionId,
        policy: &J,
    ) -> CoreResult<Vec<CommitteeRouteResult>> {
        let started = Instant::now();
        let result = principal
            .require(Role::Staff)
            .and_then(|()| self.route_candidates(petition_id, policy))
            .map(|candidates| {
                candidates
                    .into_iter()
                    .map(|committee_id| CommitteeRouteResult {
                        committee_id,
                        outcome: self.route_one(principal, petition_id, committee_id),
                    })
                    .collect::<Vec<_>>()
            });
        let context = match &result {
            Ok(results) => format!(
                "petition_id={petition_id} committees={} assigned={}",
                results.len(),
                results
                    .iter()
                    .filter(|result| matches!(result.outcome, RouteOutcome::Assigned { .. }))
                    .count()
            ),
            Err(_) => format!("petition_id={petition_id}"),
        };
        log_outcome("auto_route", "routing", started, &context, result)
    }

    /// Sets an assignment status; `IN_PROGRESS` moves the petition to
    /// `IN_COMMITTEE` in the same transaction.
    pub fn update_assignment_status(
        &self,
        principal: &Principal,
        assignment_id: AssignmentId,
        status: AssignmentStatus,
    ) -> CoreResult<AssignmentStatusUpdate> {
        let started = Instant::now();
        let result = principal.require(Role::CommitteeChair).and_then(|()| {
            Ok(self
                .assignments
                .update_assignment_status(assignment_id, status, principal.id)?)
        });
        let context = format!("assignment_id={assignment_id} to={status}");
        log_outcome("assignment_status", "routing", started, &context, result)
    }

    /// Hard-deletes an assignment. The petition status is left as is.
    pub fn remove_assignment(
        &self,
        principal: &Principal,
        assignment_id: AssignmentId,
    ) -> CoreResult<PetitionAssignment> {
        let started = Instant::now();
        let result = principal
            .require(Role::Admin)
            .and_then(|()| Ok(self.assignments.delete_assignment(assignment_id)?));
        let context = format!("assignment_id={assignment_id}");
        log_outcome("assignment_remove", "routing", started, &context, result)
    }

    pub fn get_assignment(&self, assignment_id: AssignmentId) -> CoreResult<PetitionAssignment> {
        self.assignments
            .get_assignment(assignment_id)?
            .ok_or_else(|| CoreError::not_found("assignment", assignment_id))
    }

    pub fn list_assignments(&self, petition_id: PetitionId) -> CoreResult<Vec<PetitionAssignment>> {
        Ok(self.assignments.list_assignments(petition_id)?)
    }

    /// Appends a free-form committee action (note, hearing, recommendation).
    pub fn record_committee_action(
        &self,
        principal: &Principal,
        assignment_id: AssignmentId,
        action: CommitteeActionKind,
        notes: Option<&str>,
    ) -> CoreResult<CommitteeAction> {
        let started = Instant::now();
        let result = principal.require(Role::CommitteeMember).and_then(|()| {
            Ok(self
                .assignments
                .record_action(assignment_id, action, notes, principal.id)?)
        });
        let context = format!("assignment_id={assignment_id} action={}", action.as_str());
        log_outcome("committee_action", "routing", started, &context, result)
    }

    pub fn list_committee_actions(
        &self,
        assignment_id: AssignmentId,
    ) -> CoreResult<Vec<CommitteeAction>> {
        Ok(self.assignments.list_actions(assignment_id)?)
    }

    fn route_candidates<J: JurisdictionPolicy + ?Sized>(
        &self,
        petition_id: PetitionId,
        policy: &J,
    ) -> CoreResult<Vec<CommitteeId>> {
        let petition = self
            .petitions
            .get_petition(petition_id)?
            .ok_or_else(|| CoreError::not_found("petition", petition_id))?;
        status_after_assignment(petition.status)?;

        let mut candidates: Vec<CommitteeId> = Vec::new();
        for target in self.petitions.list_targets(petition_id)? {
            let Some(reference) = DocumentRef::from_parts(target.paragraph_id, target.resolution_id)
            else {
                debug!(
                    "event=auto_route module=routing status=skip petition_id={petition_id} target_id={} reason=unattached",
                    target.id
                );
                continue;
            };
            let Some(unit) = self.canonical.canonical_unit(reference)? else {
                warn!(
                    "event=auto_route module=routing status=skip petition_id={petition_id} target_id={} reason=dangling_reference",
                    target.id
                );
                continue;
            };
            for committee_id in policy.committees_for(&unit.scope()) {
                if !candidates.contains(&committee_id) {
                    candidates.push(committee_id);
                }
            }
        }

        if candidates.is_empty() {
            return Err(CoreError::validation(format!(
                "no committee has jurisdiction over the targets of petition {petition_id}"
            )));
        }
        Ok(candidates)
    }

    fn route_one(
        &self,
        principal: &Principal,
        petition_id: PetitionId,
        committee_id: CommitteeId,
    ) -> RouteOutcome {
        match self.assign(principal, petition_id, committee_id) {
            Ok(created) => RouteOutcome::Assigned {
                assignment: created.assignment,
            },
            Err(CoreError::Conflict(_)) => RouteOutcome::AlreadyAssigned,
            Err(err @ CoreError::Unexpected(_)) => RouteOutcome::Failed {
                reason: err.public_message(),
            },
            Err(err) => RouteOutcome::Ineligible {
                reason: err.public_message(),
            },
        }
    }
}
