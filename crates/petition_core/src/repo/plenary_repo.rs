//! Plenary sessions, calendar items and floor actions.
//!
//! # Invariants
//! - A petition appears at most once per session (`UNIQUE(petition_id, session_id)`).
//! - `item_order` is dense per session, starting at 1.
//! - Scheduling and disposing floor actions change the petition status in the
//!   same transaction that writes the calendar row.

use crate::db::is_unique_violation;
use crate::lifecycle::{status_after_plenary_action, status_after_scheduling};
use crate::model::petition::PetitionId;
use crate::model::plenary::{
    CalendarItem, CalendarItemId, PlenaryAction, PlenaryActionKind, PlenarySession, SessionId,
};
use crate::model::UserId;
use crate::repo::petition_repo::{apply_status_in_tx, petition_status_in, StatusChange};
use crate::repo::{begin_immediate, exists_in, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub item: CalendarItem,
    pub petition_change: StatusChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorActionRecorded {
    pub action: PlenaryAction,
    /// Set only for disposing actions (`ADOPT`, `DEFEAT`).
    pub petition_change: Option<StatusChange>,
}

pub trait PlenaryRepository {
    fn create_session(&self, name: &str, scheduled_for: i64) -> RepoResult<PlenarySession>;
    fn get_session(&self, id: SessionId) -> RepoResult<Option<PlenarySession>>;
    fn schedule_petition(
        &self,
        petition_id: PetitionId,
        session_id: SessionId,
        actor: UserId,
    ) -> RepoResult<Scheduled>;
    fn record_action(
        &self,
        item_id: CalendarItemId,
        action: PlenaryActionKind,
        notes: Option<&str>,
        actor: UserId,
    ) -> RepoResult<FloorActionRecorded>;
    /// Items of one session by `item_order`, each with its actions.
    fn list_calendar(&self, session_id: SessionId) -> RepoResult<Vec<CalendarItem>>;
}

pub struct SqlitePlenaryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlenaryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PlenaryRepository for SqlitePlenaryRepository<'_> {
    fn create_session(&self, name: &str, scheduled_for: i64) -> RepoResult<PlenarySession> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::Validation(
                "session name must not be blank".to_string(),
            ));
        }
        let session = PlenarySession {
            id: Uuid::new_v4(),
            name: name.to_string(),
            scheduled_for,
        };
        self.conn.execute(
            "INSERT INTO plenary_sessions (id, name, scheduled_for) VALUES (?1, ?2, ?3);",
            params![session.id.to_string(), session.name, session.scheduled_for],
        )?;
        Ok(session)
    }

    fn get_session(&self, id: SessionId) -> RepoResult<Option<PlenarySession>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, scheduled_for FROM plenary_sessions WHERE id = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(PlenarySession {
                id: parse_uuid(&row.get::<_, String>("id")?, "plenary_sessions.id")?,
                name: row.get("name")?,
                scheduled_for: row.get("scheduled_for")?,
            })),
            None => Ok(None),
        }
    }

    fn schedule_petition(
        &self,
        petition_id: PetitionId,
        session_id: SessionId,
        actor: UserId,
    ) -> RepoResult<Scheduled> {
        let tx = begin_immediate(self.conn)?;
        let current = petition_status_in(&tx, petition_id)?;
        let next = status_after_scheduling(current)?;
        if !exists_in(&tx, "plenary_sessions", &session_id)? {
            return Err(RepoError::not_found("session", session_id));
        }
        let duplicate: i64 = tx.query_row(
            "SELECT COUNT(*) FROM calendar_items WHERE petition_id = ?1 AND session_id = ?2;",
            params![petition_id.to_string(), session_id.to_string()],
            |row| row.get(0),
        )?;
        if duplicate > 0 {
            return Err(already_calendared(petition_id, session_id));
        }

        let item_order: u32 = tx.query_row(
            "SELECT COALESCE(MAX(item_order), 0) + 1 FROM calendar_items WHERE session_id = ?1;",
            [session_id.to_string()],
            |row| row.get(0),
        )?;
        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO calendar_items (id, session_id, petition_id, item_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                session_id.to_string(),
                petition_id.to_string(),
                item_order,
            ],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                already_calendared(petition_id, session_id)
            } else {
                RepoError::from(err)
            }
        })?;

        let petition_change = apply_status_in_tx(&tx, petition_id, current, next, actor)?;
        tx.commit()?;
        Ok(Scheduled {
            item: CalendarItem {
                id,
                session_id,
                petition_id,
                item_order,
                actions: Vec::new(),
            },
            petition_change,
        })
    }

    fn record_action(
        &self,
        item_id: CalendarItemId,
        action: PlenaryActionKind,
        notes: Option<&str>,
        actor: UserId,
    ) -> RepoResult<FloorActionRecorded> {
        let tx = begin_immediate(self.conn)?;
        let petition_raw: Option<String> = {
            let mut stmt = tx.prepare("SELECT petition_id FROM calendar_items WHERE id = ?1;")?;
            let mut rows = stmt.query([item_id.to_string()])?;
            match rows.next()? {
                Some(row) => Some(row.get(0)?),
                None => None,
            }
        };
        let Some(petition_raw) = petition_raw else {
            return Err(RepoError::not_found("calendar item", item_id));
        };
        let petition_id = parse_uuid(&petition_raw, "calendar_items.petition_id")?;

        let current = petition_status_in(&tx, petition_id)?;
        let petition_change = match status_after_plenary_action(current, action)? {
            Some(next) => Some(apply_status_in_tx(&tx, petition_id, current, next, actor)?),
            None => None,
        };

        let notes = notes.map(str::trim).filter(|value| !value.is_empty());
        tx.execute(
            "INSERT INTO plenary_actions (calendar_item_id, action, notes, actor_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![item_id.to_string(), action.as_str(), notes, actor.to_string()],
        )?;
        let action_id = tx.last_insert_rowid();
        let recorded = {
            let mut stmt = tx.prepare(
                "SELECT id, calendar_item_id, action, notes, actor_id, created_at
                 FROM plenary_actions WHERE id = ?1;",
            )?;
            let mut rows = stmt.query([action_id])?;
            match rows.next()? {
                Some(row) => parse_action_row(row)?,
                None => return Err(RepoError::not_found("plenary action", action_id)),
            }
        };
        tx.commit()?;
        Ok(FloorActionRecorded {
            action: recorded,
            petition_change,
        })
    }

    fn list_calendar(&self, session_id: SessionId) -> RepoResult<Vec<CalendarItem>> {
        if !exists_in(self.conn, "plenary_sessions", &session_id)? {
            return Err(RepoError::not_found("session", session_id));
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, petition_id, item_order
             FROM calendar_items
             WHERE session_id = ?1
             ORDER BY item_order ASC;",
        )?;
        let mut rows = stmt.query([session_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(CalendarItem {
                id: parse_uuid(&row.get::<_, String>("id")?, "calendar_items.id")?,
                session_id: parse_uuid(
                    &row.get::<_, String>("session_id")?,
                    "calendar_items.session_id",
                )?,
                petition_id: parse_uuid(
                    &row.get::<_, String>("petition_id")?,
                    "calendar_items.petition_id",
                )?,
                item_order: row.get("item_order")?,
                actions: Vec::new(),
            });
        }

        let mut action_stmt = self.conn.prepare(
            "SELECT id, calendar_item_id, action, notes, actor_id, created_at
             FROM plenary_actions
             WHERE calendar_item_id = ?1
             ORDER BY id ASC;",
        )?;
        for item in &mut items {
            let mut rows = action_stmt.query([item.id.to_string()])?;
            while let Some(row) = rows.next()? {
                item.actions.push(parse_action_row(row)?);
            }
        }
        Ok(items)
    }
}

fn already_calendared(petition_id: PetitionId, session_id: SessionId) -> RepoError {
    RepoError::Conflict(format!(
        "petition {petition_id} is already on the calendar of session {session_id}"
    ))
}

fn parse_action_row(row: &Row<'_>) -> RepoResult<PlenaryAction> {
    let action: String = row.get("action")?;
    Ok(PlenaryAction {
        id: row.get("id")?,
        calendar_item_id: parse_uuid(
            &row.get::<_, String>("calendar_item_id")?,
            "plenary_actions.calendar_item_id",
        )?,
        action: PlenaryActionKind::parse(&action).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid plenary action `{action}` in plenary_actions.action"
            ))
        })?,
        notes: row.get("notes")?,
        actor_id: parse_uuid(&row.get::<_, String>("actor_id")?, "plenary_actions.actor_id")?,
        created_at: row.get("created_at")?,
    })
}
