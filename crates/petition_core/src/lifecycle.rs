//! Petition lifecycle state machine.
//!
//! # Responsibility
//! - Define the legal petition status transitions.
//! - Compute the status a petition is forced into by routing side effects.
//!
//! # Invariants
//! - Mandatory review cannot be skipped (no `Draft -> OnCalendar`).
//! - `Withdrawn` is reachable from every pre-terminal state.
//! - Terminal states accept no transition.
//! - Functions here are pure; callers apply them inside a store transaction.

use crate::model::petition::PetitionStatus;
use crate::model::plenary::PlenaryActionKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::petition::PetitionStatus::{
    Adopted, Amended, ApprovedByCommittee, Defeated, Draft, InCommittee, OnCalendar,
    RejectedByCommittee, Submitted, UnderReview, Withdrawn,
};

/// Lifecycle rule violations. The petition is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// No edge `from -> to` exists.
    Illegal {
        from: PetitionStatus,
        to: PetitionStatus,
    },
    /// Targets may only be replaced while the petition is a draft.
    TargetsFrozen(PetitionStatus),
    /// Committee assignment requires `Submitted` or `UnderReview`.
    NotAssignable(PetitionStatus),
    /// Committee work cannot start on an unassigned or disposed petition.
    CommitteeWorkClosed(PetitionStatus),
    /// Only committee-decided petitions can be calendared.
    NotSchedulable(PetitionStatus),
    /// Floor actions require `OnCalendar`.
    NotOnCalendar(PetitionStatus),
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Illegal { from, to } => {
                write!(f, "illegal petition status transition {from} -> {to}")
            }
            Self::TargetsFrozen(status) => {
                write!(f, "petition targets can only change in DRAFT, status is {status}")
            }
            Self::NotAssignable(status) => write!(
                f,
                "petition must be SUBMITTED or UNDER_REVIEW to be assigned, status is {status}"
            ),
            Self::CommitteeWorkClosed(status) => {
                write!(f, "committee work cannot start on a petition in {status}")
            }
            Self::NotSchedulable(status) => write!(
                f,
                "only committee-decided petitions can be calendared, status is {status}"
            ),
            Self::NotOnCalendar(status) => {
                write!(f, "petition must be ON_CALENDAR for floor action, status is {status}")
            }
        }
    }
}

impl Error for TransitionError {}

/// Direct successors of `status`.
pub fn next_statuses(status: PetitionStatus) -> &'static [PetitionStatus] {
    match status {
        Draft => &[Submitted, Withdrawn],
        Submitted => &[UnderReview, Withdrawn],
        UnderReview => &[InCommittee, Withdrawn],
        InCommittee => &[Amended, ApprovedByCommittee, RejectedByCommittee, Withdrawn],
        Amended => &[InCommittee, ApprovedByCommittee, RejectedByCommittee, Withdrawn],
        ApprovedByCommittee | RejectedByCommittee => &[OnCalendar, InCommittee, Withdrawn],
        OnCalendar => &[Adopted, Defeated, InCommittee, Withdrawn],
        Adopted | Defeated | Withdrawn => &[],
    }
}

pub fn can_transition(from: PetitionStatus, to: PetitionStatus) -> bool {
    next_statuses(from).contains(&to)
}

pub fn ensure_transition(from: PetitionStatus, to: PetitionStatus) -> Result<(), TransitionError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(TransitionError::Illegal { from, to })
    }
}

pub fn ensure_targets_mutable(status: PetitionStatus) -> Result<(), TransitionError> {
    if status == Draft {
        Ok(())
    } else {
        Err(TransitionError::TargetsFrozen(status))
    }
}

/// Status a petition holds after a committee assignment is created.
///
/// Idempotent for `UnderReview`.
pub fn status_after_assignment(status: PetitionStatus) -> Result<PetitionStatus, TransitionError> {
    match status {
        Submitted | UnderReview => Ok(UnderReview),
        other => Err(TransitionError::NotAssignable(other)),
    }
}

/// Status a petition is forced into when an assignment moves to `IN_PROGRESS`.
///
/// Idempotent for `InCommittee`. Amended, committee-decided and calendared
/// petitions re-enter committee; terminal ones stay closed.
pub fn status_after_work_started(
    status: PetitionStatus,
) -> Result<PetitionStatus, TransitionError> {
    match status {
        UnderReview | InCommittee | Amended | ApprovedByCommittee | RejectedByCommittee
        | OnCalendar => Ok(InCommittee),
        other => Err(TransitionError::CommitteeWorkClosed(other)),
    }
}

/// Status a petition holds once placed on a plenary calendar.
pub fn status_after_scheduling(status: PetitionStatus) -> Result<PetitionStatus, TransitionError> {
    match status {
        ApprovedByCommittee | RejectedByCommittee => Ok(OnCalendar),
        other => Err(TransitionError::NotSchedulable(other)),
    }
}

/// Status after a floor action; `None` when the action does not dispose.
pub fn status_after_plenary_action(
    status: PetitionStatus,
    action: PlenaryActionKind,
) -> Result<Option<PetitionStatus>, TransitionError> {
    if status != OnCalendar {
        return Err(TransitionError::NotOnCalendar(status));
    }
    Ok(match action {
        PlenaryActionKind::Adopt => Some(Adopted),
        PlenaryActionKind::Defeat => Some(Defeated),
        PlenaryActionKind::Debate | PlenaryActionKind::Refer => None,
    })
}
