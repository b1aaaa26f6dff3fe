//! Plenary calendar: sessions, scheduling and floor actions.
//!
//! # Invariants
//! - Only committee-decided petitions are scheduled; scheduling moves them to
//!   `ON_CALENDAR`.
//! - `ADOPT` and `DEFEAT` dispose the petition; `DEBATE` and `REFER` only
//!   append to the item's action list.

use crate::auth::{Principal, Role};
use crate::error::{CoreError, CoreResult};
use crate::model::petition::PetitionId;
use crate::model::plenary::{
    CalendarItem, CalendarItemId, PlenaryActionKind, PlenarySession, SessionId,
};
use crate::repo::plenary_repo::{FloorActionRecorded, PlenaryRepository, Scheduled};
use crate::service::log_outcome;
use std::time::Instant;

pub struct PlenaryService<R: PlenaryRepository> {
    repo: R,
}

impl<R: PlenaryRepository> PlenaryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_session(
        &self,
        principal: &Principal,
        name: &str,
        scheduled_for: i64,
    ) -> CoreResult<PlenarySession> {
        let started = Instant::now();
        let result = principal
            .require(Role::Staff)
            .and_then(|()| Ok(self.repo.create_session(name, scheduled_for)?));
        let context = match &result {
            Ok(session) => format!("session_id={}", session.id),
            Err(_) => String::new(),
        };
        log_outcome("session_create", "plenary", started, &context, result)
    }

    pub fn get_session(&self, id: SessionId) -> CoreResult<PlenarySession> {
        self.repo
            .get_session(id)?
            .ok_or_else(|| CoreError::not_found("session", id))
    }

    pub fn schedule(
        &self,
        principal: &Principal,
        petition_id: PetitionId,
        session_id: SessionId,
    ) -> CoreResult<Scheduled> {
        let started = Instant::now();
        let result = principal.require(Role::Staff).and_then(|()| {
            Ok(self
                .repo
                .schedule_petition(petition_id, session_id, principal.id)?)
        });
        let context = format!("petition_id={petition_id} session_id={session_id}");
        log_outcome("calendar_schedule", "plenary", started, &context, result)
    }

    pub fn record_plenary_action(
        &self,
        principal: &Principal,
        item_id: CalendarItemId,
        action: PlenaryActionKind,
        notes: Option<&str>,
    ) -> CoreResult<FloorActionRecorded> {
        let started = Instant::now();
        let result = principal.require(Role::Staff).and_then(|()| {
            Ok(self
                .repo
                .record_action(item_id, action, notes, principal.id)?)
        });
        let context = format!("calendar_item_id={item_id} action={}", action.as_str());
        log_outcome("plenary_action", "plenary", started, &context, result)
    }

    /// Calendar of one session by `item_order`.
    pub fn calendar(&self, session_id: SessionId) -> CoreResult<Vec<CalendarItem>> {
        Ok(self.repo.list_calendar(session_id)?)
    }
}
