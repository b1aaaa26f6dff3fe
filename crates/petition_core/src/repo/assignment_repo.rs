//! Petition-to-committee assignments and the committee audit trail.
//!
//! # Responsibility
//! - Create assignments exactly once per `(petition, committee)` pair.
//! - Apply assignment status changes together with their petition cascade.
//!
//! # Invariants
//! - Creation checks run inside one `IMMEDIATE` transaction, in order:
//!   petition exists, petition is assignable, committee exists, pair is free.
//! - The `UNIQUE(petition_id, committee_id)` constraint backs the explicit
//!   duplicate check; its violation maps to the same `Conflict`.
//! - Setting an assignment `IN_PROGRESS` moves the petition to `IN_COMMITTEE`
//!   in the same transaction (`apply_assignment_status_in_tx`).
//! - Deleting an assignment never touches the petition status.

use crate::db::is_unique_violation;
use crate::lifecycle::{status_after_assignment, status_after_work_started};
use crate::model::committee::{
    AssignmentId, AssignmentStatus, CommitteeAction, CommitteeActionKind, CommitteeId,
    PetitionAssignment,
};
use crate::model::petition::PetitionId;
use crate::model::UserId;
use crate::repo::petition_repo::{apply_status_in_tx, petition_status_in, StatusChange};
use crate::repo::{begin_immediate, exists_in, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction};
use uuid::Uuid;

const ASSIGNMENT_SELECT_SQL: &str = "SELECT
    id,
    petition_id,
    committee_id,
    status,
    assigned_by,
    created_at,
    updated_at
FROM petition_assignments";

/// Result of a successful assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentCreated {
    pub assignment: PetitionAssignment,
    pub petition_change: StatusChange,
}

/// Result of an assignment status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentStatusUpdate {
    pub assignment: PetitionAssignment,
    pub previous: AssignmentStatus,
    /// Petition cascade; `None` unless the new status is `IN_PROGRESS`.
    pub petition_change: Option<StatusChange>,
}

pub trait AssignmentRepository {
    fn create_assignment(
        &self,
        petition_id: PetitionId,
        committee_id: CommitteeId,
        assigned_by: UserId,
    ) -> RepoResult<AssignmentCreated>;
    fn get_assignment(&self, id: AssignmentId) -> RepoResult<Option<PetitionAssignment>>;
    /// Assignments of one petition in creation order.
    fn list_assignments(&self, petition_id: PetitionId) -> RepoResult<Vec<PetitionAssignment>>;
    fn update_assignment_status(
        &self,
        id: AssignmentId,
        status: AssignmentStatus,
        actor: UserId,
    ) -> RepoResult<AssignmentStatusUpdate>;
    /// Hard delete; returns the removed row.
    fn delete_assignment(&self, id: AssignmentId) -> RepoResult<PetitionAssignment>;
    fn record_action(
        &self,
        assignment_id: AssignmentId,
        action: CommitteeActionKind,
        notes: Option<&str>,
        actor: UserId,
    ) -> RepoResult<CommitteeAction>;
    /// Audit trail in insertion order.
    fn list_actions(&self, assignment_id: AssignmentId) -> RepoResult<Vec<CommitteeAction>>;
}

pub struct SqliteAssignmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssignmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AssignmentRepository for SqliteAssignmentRepository<'_> {
    fn create_assignment(
        &self,
        petition_id: PetitionId,
        committee_id: CommitteeId,
        assigned_by: UserId,
    ) -> RepoResult<AssignmentCreated> {
        let tx = begin_immediate(self.conn)?;

        let current = petition_status_in(&tx, petition_id)?;
        let next = status_after_assignment(current)?;
        if !exists_in(&tx, "committees", &committee_id)? {
            return Err(RepoError::not_found("committee", committee_id));
        }
        let duplicate: i64 = tx.query_row(
            "SELECT COUNT(*) FROM petition_assignments
             WHERE petition_id = ?1 AND committee_id = ?2;",
            params![petition_id.to_string(), committee_id.to_string()],
            |row| row.get(0),
        )?;
        if duplicate > 0 {
            return Err(duplicate_assignment(petition_id, committee_id));
        }

        let id = Uuid::new_v4();
        insert_assignment_in(&tx, id, petition_id, committee_id, assigned_by)?;

        let petition_change = apply_status_in_tx(&tx, petition_id, current, next, assigned_by)?;
        let assignment =
            load_assignment_in(&tx, id)?.ok_or_else(|| RepoError::not_found("assignment", id))?;
        tx.commit()?;
        Ok(AssignmentCreated {
            assignment,
            petition_change,
        })
    }

    fn get_assignment(&self, id: AssignmentId) -> RepoResult<Option<PetitionAssignment>> {
        load_assignment_in(self.conn, id)
    }

    fn list_assignments(&self, petition_id: PetitionId) -> RepoResult<Vec<PetitionAssignment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ASSIGNMENT_SELECT_SQL} WHERE petition_id = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([petition_id.to_string()])?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next()? {
            assignments.push(parse_assignment_row(row)?);
        }
        Ok(assignments)
    }

    fn update_assignment_status(
        &self,
        id: AssignmentId,
        status: AssignmentStatus,
        actor: UserId,
    ) -> RepoResult<AssignmentStatusUpdate> {
        let tx = begin_immediate(self.conn)?;
        let assignment =
            load_assignment_in(&tx, id)?.ok_or_else(|| RepoError::not_found("assignment", id))?;
        let update = apply_assignment_status_in_tx(&tx, &assignment, status, actor)?;
        tx.commit()?;
        Ok(update)
    }

    fn delete_assignment(&self, id: AssignmentId) -> RepoResult<PetitionAssignment> {
        let tx = begin_immediate(self.conn)?;
        let assignment =
            load_assignment_in(&tx, id)?.ok_or_else(|| RepoError::not_found("assignment", id))?;
        tx.execute(
            "DELETE FROM petition_assignments WHERE id = ?1;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(assignment)
    }

    fn record_action(
        &self,
        assignment_id: AssignmentId,
        action: CommitteeActionKind,
        notes: Option<&str>,
        actor: UserId,
    ) -> RepoResult<CommitteeAction> {
        if action == CommitteeActionKind::StatusChanged {
            return Err(RepoError::Validation(
                "status_changed entries are written by assignment status updates".to_string(),
            ));
        }
        let tx = begin_immediate(self.conn)?;
        if !exists_in(&tx, "petition_assignments", &assignment_id)? {
            return Err(RepoError::not_found("assignment", assignment_id));
        }
        let notes = notes.map(str::trim).filter(|value| !value.is_empty());
        let action = insert_action_in(&tx, assignment_id, action, None, None, notes, actor)?;
        tx.commit()?;
        Ok(action)
    }

    fn list_actions(&self, assignment_id: AssignmentId) -> RepoResult<Vec<CommitteeAction>> {
        if !exists_in(self.conn, "petition_assignments", &assignment_id)? {
            return Err(RepoError::not_found("assignment", assignment_id));
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, assignment_id, action, from_status, to_status, notes, actor_id, created_at
             FROM committee_actions
             WHERE assignment_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([assignment_id.to_string()])?;
        let mut actions = Vec::new();
        while let Some(row) = rows.next()? {
            actions.push(parse_action_row(row)?);
        }
        Ok(actions)
    }
}

/// Applies an assignment status change and its petition cascade in `tx`.
///
/// `IN_PROGRESS` forces the owning petition into `IN_COMMITTEE` whoever made
/// the change; other statuses leave the petition alone. A real status change
/// appends a `status_changed` audit entry.
pub(crate) fn apply_assignment_status_in_tx(
    tx: &Transaction<'_>,
    assignment: &PetitionAssignment,
    status: AssignmentStatus,
    actor: UserId,
) -> RepoResult<AssignmentStatusUpdate> {
    let previous = assignment.status;

    let petition_change = if status == AssignmentStatus::InProgress {
        let current = petition_status_in(tx, assignment.petition_id)?;
        let next = status_after_work_started(current)?;
        Some(apply_status_in_tx(
            tx,
            assignment.petition_id,
            current,
            next,
            actor,
        )?)
    } else {
        None
    };

    if previous != status {
        tx.execute(
            "UPDATE petition_assignments
             SET status = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![assignment.id.to_string(), status.as_str()],
        )?;
        insert_action_in(
            tx,
            assignment.id,
            CommitteeActionKind::StatusChanged,
            Some(previous),
            Some(status),
            None,
            actor,
        )?;
    }

    let assignment = load_assignment_in(tx, assignment.id)?
        .ok_or_else(|| RepoError::not_found("assignment", assignment.id))?;
    Ok(AssignmentStatusUpdate {
        assignment,
        previous,
        petition_change,
    })
}

fn duplicate_assignment(petition_id: PetitionId, committee_id: CommitteeId) -> RepoError {
    RepoError::Conflict(format!(
        "petition {petition_id} is already assigned to committee {committee_id}"
    ))
}

/// Inserts a `PENDING` row; the pair's UNIQUE constraint maps to `Conflict`.
fn insert_assignment_in(
    conn: &Connection,
    id: AssignmentId,
    petition_id: PetitionId,
    committee_id: CommitteeId,
    assigned_by: UserId,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO petition_assignments (id, petition_id, committee_id, status, assigned_by)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            id.to_string(),
            petition_id.to_string(),
            committee_id.to_string(),
            AssignmentStatus::Pending.as_str(),
            assigned_by.to_string(),
        ],
    )
    .map_err(|err| {
        if is_unique_violation(&err) {
            duplicate_assignment(petition_id, committee_id)
        } else {
            RepoError::from(err)
        }
    })?;
    Ok(())
}

fn insert_action_in(
    conn: &Connection,
    assignment_id: AssignmentId,
    action: CommitteeActionKind,
    from_status: Option<AssignmentStatus>,
    to_status: Option<AssignmentStatus>,
    notes: Option<&str>,
    actor: UserId,
) -> RepoResult<CommitteeAction> {
    conn.execute(
        "INSERT INTO committee_actions (
            assignment_id,
            action,
            from_status,
            to_status,
            notes,
            actor_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            assignment_id.to_string(),
            action.as_str(),
            from_status.map(AssignmentStatus::as_str),
            to_status.map(AssignmentStatus::as_str),
            notes,
            actor.to_string(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    let mut stmt = conn.prepare(
        "SELECT id, assignment_id, action, from_status, to_status, notes, actor_id, created_at
         FROM committee_actions
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => parse_action_row(row),
        None => Err(RepoError::not_found("committee action", id)),
    }
}

pub(crate) fn load_assignment_in(
    conn: &Connection,
    id: AssignmentId,
) -> RepoResult<Option<PetitionAssignment>> {
    let mut stmt = conn.prepare(&format!("{ASSIGNMENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_assignment_row(row)?)),
        None => Ok(None),
    }
}

fn parse_assignment_row(row: &Row<'_>) -> RepoResult<PetitionAssignment> {
    let status: String = row.get("status")?;
    Ok(PetitionAssignment {
        id: parse_uuid(&row.get::<_, String>("id")?, "petition_assignments.id")?,
        petition_id: parse_uuid(
            &row.get::<_, String>("petition_id")?,
            "petition_assignments.petition_id",
        )?,
        committee_id: parse_uuid(
            &row.get::<_, String>("committee_id")?,
            "petition_assignments.committee_id",
        )?,
        status: parse_assignment_status(&status, "petition_assignments.status")?,
        assigned_by: parse_uuid(
            &row.get::<_, String>("assigned_by")?,
            "petition_assignments.assigned_by",
        )?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_action_row(row: &Row<'_>) -> RepoResult<CommitteeAction> {
    let action: String = row.get("action")?;
    let from_status: Option<String> = row.get("from_status")?;
    let to_status: Option<String> = row.get("to_status")?;
    Ok(CommitteeAction {
        id: row.get("id")?,
        assignment_id: parse_uuid(
            &row.get::<_, String>("assignment_id")?,
            "committee_actions.assignment_id",
        )?,
        action: CommitteeActionKind::parse(&action).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid committee action `{action}` in committee_actions.action"
            ))
        })?,
        from_status: from_status
            .map(|value| parse_assignment_status(&value, "committee_actions.from_status"))
            .transpose()?,
        to_status: to_status
            .map(|value| parse_assignment_status(&value, "committee_actions.to_status"))
            .transpose()?,
        notes: row.get("notes")?,
        actor_id: parse_uuid(&row.get::<_, String>("actor_id")?, "committee_actions.actor_id")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_assignment_status(value: &str, column: &str) -> RepoResult<AssignmentStatus> {
    AssignmentStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid assignment status `{value}` in {column}"))
    })
}
