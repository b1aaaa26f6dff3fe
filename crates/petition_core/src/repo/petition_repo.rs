//! Petition, target and version repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the petition aggregate: petition row, ordered targets, versions.
//! - Own the transactional status-change primitive shared by routing and
//!   plenary repositories (`apply_status_in_tx`).
//!
//! # Invariants
//! - Targets are replaced as a whole set, only while the petition is `DRAFT`,
//!   in one transaction that validates every target before deleting anything.
//! - Every committed status change appends exactly one version snapshot in
//!   the same transaction.
//! - Listing is deterministic: `updated_at DESC, id ASC`.

use crate::lifecycle::{ensure_targets_mutable, ensure_transition};
use crate::model::document::DocumentRef;
use crate::model::petition::{
    ChangeType, ConferenceId, NewPetition, Petition, PetitionId, PetitionStatus, PetitionTarget,
    TargetDraft,
};
use crate::model::version::{PetitionVersion, VersionId, VersionTarget};
use crate::model::UserId;
use crate::repo::document_repo::require_unit_exists;
use crate::repo::{
    begin_immediate, parse_optional_uuid, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use uuid::Uuid;

const PETITION_SELECT_SQL: &str = "SELECT
    id,
    conference_id,
    display_number,
    title,
    summary,
    status,
    submitter_id,
    created_at,
    updated_at,
    submitted_at
FROM petitions";

const PETITIONS_DEFAULT_LIMIT: u32 = 50;
const PETITIONS_LIMIT_MAX: u32 = 200;

/// Query options for listing petitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetitionListQuery {
    pub status: Option<PetitionStatus>,
    pub conference_id: Option<ConferenceId>,
    pub submitter_id: Option<UserId>,
    /// Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Outcome of one status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub petition_id: PetitionId,
    pub from: PetitionStatus,
    pub to: PetitionStatus,
    /// Snapshot written for the change; `None` when the status was unchanged.
    pub version_num: Option<u32>,
}

/// Repository interface for the petition aggregate.
pub trait PetitionRepository {
    /// Creates a `DRAFT` petition with the next display number of its conference.
    fn create_petition(&self, input: &NewPetition, submitter_id: UserId) -> RepoResult<Petition>;
    fn get_petition(&self, id: PetitionId) -> RepoResult<Option<Petition>>;
    fn list_petitions(&self, query: &PetitionListQuery) -> RepoResult<Vec<Petition>>;
    /// Targets in position order.
    fn list_targets(&self, id: PetitionId) -> RepoResult<Vec<PetitionTarget>>;
    /// Replaces the full target set of a `DRAFT` petition atomically.
    fn replace_targets(
        &self,
        id: PetitionId,
        targets: &[TargetDraft],
    ) -> RepoResult<Vec<PetitionTarget>>;
    /// Moves the petition along one lifecycle edge and snapshots a version.
    fn transition_status(
        &self,
        id: PetitionId,
        to: PetitionStatus,
        actor: UserId,
    ) -> RepoResult<StatusChange>;
    /// Versions in ascending `version_num` order.
    fn list_versions(&self, id: PetitionId) -> RepoResult<Vec<PetitionVersion>>;
    fn get_version(
        &self,
        petition_id: PetitionId,
        version_id: VersionId,
    ) -> RepoResult<Option<PetitionVersion>>;
}

/// SQLite-backed petition repository.
pub struct SqlitePetitionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePetitionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PetitionRepository for SqlitePetitionRepository<'_> {
    fn create_petition(&self, input: &NewPetition, submitter_id: UserId) -> RepoResult<Petition> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(RepoError::Validation(
                "petition title must not be blank".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let tx = begin_immediate(self.conn)?;
        let next_number: i64 = tx.query_row(
            "SELECT COUNT(*) + 1 FROM petitions WHERE conference_id = ?1;",
            [input.conference_id.to_string()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO petitions (
                id,
                conference_id,
                display_number,
                title,
                summary,
                status,
                submitter_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                input.conference_id.to_string(),
                format!("P-{next_number:04}"),
                title,
                input.summary.trim(),
                PetitionStatus::Draft.as_str(),
                submitter_id.to_string(),
            ],
        )?;
        let petition = load_petition_in(&tx, id)?.ok_or_else(|| RepoError::not_found("petition", id))?;
        tx.commit()?;
        Ok(petition)
    }

    fn get_petition(&self, id: PetitionId) -> RepoResult<Option<Petition>> {
        load_petition_in(self.conn, id)
    }

    fn list_petitions(&self, query: &PetitionListQuery) -> RepoResult<Vec<Petition>> {
        let mut sql = format!("{PETITION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(conference_id) = query.conference_id {
            sql.push_str(" AND conference_id = ?");
            bind_values.push(Value::Text(conference_id.to_string()));
        }
        if let Some(submitter_id) = query.submitter_id {
            sql.push_str(" AND submitter_id = ?");
            bind_values.push(Value::Text(submitter_id.to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_petition_limit(
            query.limit,
        ))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut petitions = Vec::new();
        while let Some(row) = rows.next()? {
            petitions.push(parse_petition_row(row)?);
        }
        Ok(petitions)
    }

    fn list_targets(&self, id: PetitionId) -> RepoResult<Vec<PetitionTarget>> {
        load_targets_in(self.conn, id)
    }

    fn replace_targets(
        &self,
        id: PetitionId,
        targets: &[TargetDraft],
    ) -> RepoResult<Vec<PetitionTarget>> {
        for (idx, target) in targets.iter().enumerate() {
            target
                .validate()
                .map_err(|err| RepoError::Validation(format!("target {idx}: {err}")))?;
        }

        let tx = begin_immediate(self.conn)?;
        let status = petition_status_in(&tx, id)?;
        ensure_targets_mutable(status)?;

        for (idx, target) in targets.iter().enumerate() {
            if let Some(reference) =
                DocumentRef::from_parts(target.paragraph_id, target.resolution_id)
            {
                require_unit_exists(&tx, reference).map_err(|err| match err {
                    RepoError::NotFound { entity, id } => {
                        RepoError::Validation(format!("target {idx}: {entity} not found: {id}"))
                    }
                    other => other,
                })?;
            }
        }

        tx.execute(
            "DELETE FROM petition_targets WHERE petition_id = ?1;",
            [id.to_string()],
        )?;
        for (position, target) in targets.iter().enumerate() {
            tx.execute(
                "INSERT INTO petition_targets (
                    id,
                    petition_id,
                    position,
                    paragraph_id,
                    resolution_id,
                    change_type,
                    proposed_text
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    Uuid::new_v4().to_string(),
                    id.to_string(),
                    position as i64,
                    target.paragraph_id.map(|value| value.to_string()),
                    target.resolution_id.map(|value| value.to_string()),
                    target.change_type.as_str(),
                    target.proposed_text.as_deref(),
                ],
            )?;
        }
        tx.execute(
            "UPDATE petitions
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;

        let replaced = load_targets_in(&tx, id)?;
        tx.commit()?;
        Ok(replaced)
    }

    fn transition_status(
        &self,
        id: PetitionId,
        to: PetitionStatus,
        actor: UserId,
    ) -> RepoResult<StatusChange> {
        let tx = begin_immediate(self.conn)?;
        let from = petition_status_in(&tx, id)?;
        ensure_transition(from, to)?;
        let change = apply_status_in_tx(&tx, id, from, to, actor)?;
        tx.commit()?;
        Ok(change)
    }

    fn list_versions(&self, id: PetitionId) -> RepoResult<Vec<PetitionVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, petition_id, version_num, stage, targets_json, created_by, created_at
             FROM petition_versions
             WHERE petition_id = ?1
             ORDER BY version_num ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(parse_version_row(row)?);
        }
        Ok(versions)
    }

    fn get_version(
        &self,
        petition_id: PetitionId,
        version_id: VersionId,
    ) -> RepoResult<Option<PetitionVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, petition_id, version_num, stage, targets_json, created_by, created_at
             FROM petition_versions
             WHERE id = ?1 AND petition_id = ?2;",
        )?;
        let mut rows = stmt.query([version_id.to_string(), petition_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_version_row(row)?)),
            None => Ok(None),
        }
    }
}

/// Normalizes list limit according to the petitions listing contract.
pub fn normalize_petition_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => PETITIONS_DEFAULT_LIMIT,
        Some(value) if value > PETITIONS_LIMIT_MAX => PETITIONS_LIMIT_MAX,
        Some(value) => value,
    }
}

pub(crate) fn load_petition_in(conn: &Connection, id: PetitionId) -> RepoResult<Option<Petition>> {
    let mut stmt = conn.prepare(&format!("{PETITION_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_petition_row(row)?)),
        None => Ok(None),
    }
}

/// Reads the current petition status, failing with `NotFound`.
pub(crate) fn petition_status_in(conn: &Connection, id: PetitionId) -> RepoResult<PetitionStatus> {
    let mut stmt = conn.prepare("SELECT status FROM petitions WHERE id = ?1;")?;
    let mut rows = stmt.query([id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Err(RepoError::not_found("petition", id));
    };
    let value: String = row.get(0)?;
    parse_status(&value)
}

/// Writes a status change and its version snapshot inside `tx`.
///
/// `from == to` is a no-op. Any other pair must be a lifecycle edge; callers
/// that force a status (routing side effects) compute `to` through
/// `crate::lifecycle` first.
pub(crate) fn apply_status_in_tx(
    tx: &Transaction<'_>,
    id: PetitionId,
    from: PetitionStatus,
    to: PetitionStatus,
    actor: UserId,
) -> RepoResult<StatusChange> {
    if from == to {
        return Ok(StatusChange {
            petition_id: id,
            from,
            to,
            version_num: None,
        });
    }
    ensure_transition(from, to)?;

    if to == PetitionStatus::Submitted {
        let target_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM petition_targets WHERE petition_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if target_count == 0 {
            return Err(RepoError::Validation(
                "petition needs at least one target before submission".to_string(),
            ));
        }
    }

    let changed = tx.execute(
        "UPDATE petitions
         SET
            status = ?2,
            updated_at = (strftime('%s', 'now') * 1000),
            submitted_at = CASE
                WHEN ?2 = 'SUBMITTED' THEN (strftime('%s', 'now') * 1000)
                ELSE submitted_at
            END
         WHERE id = ?1 AND status = ?3;",
        params![id.to_string(), to.as_str(), from.as_str()],
    )?;
    if changed == 0 {
        return Err(RepoError::not_found("petition", id));
    }

    let version_num = snapshot_version_in_tx(tx, id, to, actor)?;
    Ok(StatusChange {
        petition_id: id,
        from,
        to,
        version_num: Some(version_num),
    })
}

fn snapshot_version_in_tx(
    tx: &Transaction<'_>,
    id: PetitionId,
    stage: PetitionStatus,
    actor: UserId,
) -> RepoResult<u32> {
    let targets: Vec<VersionTarget> = load_targets_in(tx, id)?
        .iter()
        .map(VersionTarget::from)
        .collect();
    let targets_json = serde_json::to_string(&targets)
        .map_err(|err| RepoError::InvalidData(format!("version snapshot encoding: {err}")))?;

    let version_num: u32 = tx.query_row(
        "SELECT COALESCE(MAX(version_num), 0) + 1 FROM petition_versions WHERE petition_id = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )?;
    tx.execute(
        "INSERT INTO petition_versions (
            id,
            petition_id,
            version_num,
            stage,
            targets_json,
            created_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            Uuid::new_v4().to_string(),
            id.to_string(),
            version_num,
            stage.as_str(),
            targets_json,
            actor.to_string(),
        ],
    )?;
    Ok(version_num)
}

fn load_targets_in(conn: &Connection, id: PetitionId) -> RepoResult<Vec<PetitionTarget>> {
    let mut stmt = conn.prepare(
        "SELECT id, petition_id, position, paragraph_id, resolution_id, change_type, proposed_text
         FROM petition_targets
         WHERE petition_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut targets = Vec::new();
    while let Some(row) = rows.next()? {
        let change_type: String = row.get("change_type")?;
        targets.push(PetitionTarget {
            id: parse_uuid(&row.get::<_, String>("id")?, "petition_targets.id")?,
            petition_id: parse_uuid(
                &row.get::<_, String>("petition_id")?,
                "petition_targets.petition_id",
            )?,
            position: row.get("position")?,
            paragraph_id: parse_optional_uuid(
                row.get("paragraph_id")?,
                "petition_targets.paragraph_id",
            )?,
            resolution_id: parse_optional_uuid(
                row.get("resolution_id")?,
                "petition_targets.resolution_id",
            )?,
            change_type: ChangeType::parse(&change_type).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid change type `{change_type}` in petition_targets.change_type"
                ))
            })?,
            proposed_text: row.get("proposed_text")?,
        });
    }
    Ok(targets)
}

fn parse_petition_row(row: &Row<'_>) -> RepoResult<Petition> {
    let status: String = row.get("status")?;
    Ok(Petition {
        id: parse_uuid(&row.get::<_, String>("id")?, "petitions.id")?,
        conference_id: parse_uuid(
            &row.get::<_, String>("conference_id")?,
            "petitions.conference_id",
        )?,
        display_number: row.get("display_number")?,
        title: row.get("title")?,
        summary: row.get("summary")?,
        status: parse_status(&status)?,
        submitter_id: parse_uuid(
            &row.get::<_, String>("submitter_id")?,
            "petitions.submitter_id",
        )?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        submitted_at: row.get("submitted_at")?,
    })
}

fn parse_version_row(row: &Row<'_>) -> RepoResult<PetitionVersion> {
    let stage: String = row.get("stage")?;
    let targets_json: String = row.get("targets_json")?;
    let targets: Vec<VersionTarget> = serde_json::from_str(&targets_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid petition_versions.targets_json: {err}"))
    })?;
    Ok(PetitionVersion {
        id: parse_uuid(&row.get::<_, String>("id")?, "petition_versions.id")?,
        petition_id: parse_uuid(
            &row.get::<_, String>("petition_id")?,
            "petition_versions.petition_id",
        )?,
        version_num: row.get("version_num")?,
        stage: parse_status(&stage)?,
        targets,
        created_by: parse_uuid(
            &row.get::<_, String>("created_by")?,
            "petition_versions.created_by",
        )?,
        created_at: row.get("created_at")?,
    })
}

fn parse_status(value: &str) -> RepoResult<PetitionStatus> {
    PetitionStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid petition status `{value}` in petitions.status"))
    })
}
