//! Committee, membership and jurisdiction repository.
//!
//! # Invariants
//! - Committee abbreviations are unique, upper-case and stored trimmed.
//! - A user holds at most one role per committee.
//! - A jurisdiction section, when given, must belong to the rule's book.

use crate::db::is_unique_violation;
use crate::model::committee::{
    Committee, CommitteeId, CommitteeMember, CommitteeRole, JurisdictionRule,
};
use crate::model::document::{BookId, SectionId};
use crate::model::UserId;
use crate::repo::{begin_immediate, exists_in, parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

static ABBREVIATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9&]{0,15}$").expect("valid abbreviation regex"));

/// Input for committee creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommittee {
    pub name: String,
    pub abbreviation: String,
    pub description: String,
}

pub trait CommitteeRepository {
    fn create_committee(&self, input: &NewCommittee) -> RepoResult<Committee>;
    fn get_committee(&self, id: CommitteeId) -> RepoResult<Option<Committee>>;
    /// All committees ordered by abbreviation.
    fn list_committees(&self) -> RepoResult<Vec<Committee>>;
    fn add_member(
        &self,
        committee_id: CommitteeId,
        user_id: UserId,
        role: CommitteeRole,
    ) -> RepoResult<CommitteeMember>;
    fn list_members(&self, committee_id: CommitteeId) -> RepoResult<Vec<CommitteeMember>>;
    fn add_jurisdiction(
        &self,
        committee_id: CommitteeId,
        book_id: BookId,
        section_id: Option<SectionId>,
    ) -> RepoResult<JurisdictionRule>;
    /// Every rule in the store, ordered by insertion.
    fn list_jurisdictions(&self) -> RepoResult<Vec<JurisdictionRule>>;
}

pub struct SqliteCommitteeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommitteeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CommitteeRepository for SqliteCommitteeRepository<'_> {
    fn create_committee(&self, input: &NewCommittee) -> RepoResult<Committee> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(RepoError::Validation(
                "committee name must not be blank".to_string(),
            ));
        }
        let abbreviation = normalize_abbreviation(&input.abbreviation)?;

        let committee = Committee {
            id: Uuid::new_v4(),
            name: name.to_string(),
            abbreviation,
            description: input.description.trim().to_string(),
        };
        self.conn
            .execute(
                "INSERT INTO committees (id, name, abbreviation, description)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    committee.id.to_string(),
                    committee.name,
                    committee.abbreviation,
                    committee.description,
                ],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Conflict(format!(
                        "committee abbreviation already exists: {}",
                        committee.abbreviation
                    ))
                } else {
                    RepoError::from(err)
                }
            })?;
        Ok(committee)
    }

    fn get_committee(&self, id: CommitteeId) -> RepoResult<Option<Committee>> {
        load_committee_in(self.conn, id)
    }

    fn list_committees(&self) -> RepoResult<Vec<Committee>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, abbreviation, description
             FROM committees
             ORDER BY abbreviation ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut committees = Vec::new();
        while let Some(row) = rows.next()? {
            committees.push(parse_committee_row(row)?);
        }
        Ok(committees)
    }

    fn add_member(
        &self,
        committee_id: CommitteeId,
        user_id: UserId,
        role: CommitteeRole,
    ) -> RepoResult<CommitteeMember> {
        let tx = begin_immediate(self.conn)?;
        if !exists_in(&tx, "committees", &committee_id)? {
            return Err(RepoError::not_found("committee", committee_id));
        }
        tx.execute(
            "INSERT INTO committee_memberships (committee_id, user_id, role)
             VALUES (?1, ?2, ?3);",
            params![committee_id.to_string(), user_id.to_string(), role.as_str()],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                RepoError::Conflict(format!(
                    "user {user_id} is already a member of committee {committee_id}"
                ))
            } else {
                RepoError::from(err)
            }
        })?;
        tx.commit()?;
        Ok(CommitteeMember {
            committee_id,
            user_id,
            role,
        })
    }

    fn list_members(&self, committee_id: CommitteeId) -> RepoResult<Vec<CommitteeMember>> {
        if !exists_in(self.conn, "committees", &committee_id)? {
            return Err(RepoError::not_found("committee", committee_id));
        }
        let mut stmt = self.conn.prepare(
            "SELECT committee_id, user_id, role
             FROM committee_memberships
             WHERE committee_id = ?1
             ORDER BY created_at ASC, user_id ASC;",
        )?;
        let mut rows = stmt.query([committee_id.to_string()])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            let role: String = row.get("role")?;
            members.push(CommitteeMember {
                committee_id: parse_uuid(
                    &row.get::<_, String>("committee_id")?,
                    "committee_memberships.committee_id",
                )?,
                user_id: parse_uuid(
                    &row.get::<_, String>("user_id")?,
                    "committee_memberships.user_id",
                )?,
                role: CommitteeRole::parse(&role).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid committee role `{role}` in committee_memberships.role"
                    ))
                })?,
            });
        }
        Ok(members)
    }

    fn add_jurisdiction(
        &self,
        committee_id: CommitteeId,
        book_id: BookId,
        section_id: Option<SectionId>,
    ) -> RepoResult<JurisdictionRule> {
        let tx = begin_immediate(self.conn)?;
        if !exists_in(&tx, "committees", &committee_id)? {
            return Err(RepoError::not_found("committee", committee_id));
        }
        if !exists_in(&tx, "books", &book_id)? {
            return Err(RepoError::not_found("book", book_id));
        }
        if let Some(section_id) = section_id {
            let section_book: Option<String> = tx
                .query_row(
                    "SELECT book_id FROM sections WHERE id = ?1;",
                    [section_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            match section_book {
                None => return Err(RepoError::not_found("section", section_id)),
                Some(value) if value != book_id.to_string() => {
                    return Err(RepoError::Validation(format!(
                        "section {section_id} does not belong to book {book_id}"
                    )));
                }
                Some(_) => {}
            }
        }

        tx.execute(
            "INSERT INTO committee_jurisdictions (committee_id, book_id, section_id)
             VALUES (?1, ?2, ?3);",
            params![
                committee_id.to_string(),
                book_id.to_string(),
                section_id.map(|value| value.to_string()),
            ],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                RepoError::Conflict(format!(
                    "jurisdiction rule already exists for committee {committee_id}"
                ))
            } else {
                RepoError::from(err)
            }
        })?;
        tx.commit()?;
        Ok(JurisdictionRule {
            committee_id,
            book_id,
            section_id,
        })
    }

    fn list_jurisdictions(&self) -> RepoResult<Vec<JurisdictionRule>> {
        let mut stmt = self.conn.prepare(
            "SELECT committee_id, book_id, section_id
             FROM committee_jurisdictions
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut rules = Vec::new();
        while let Some(row) = rows.next()? {
            rules.push(JurisdictionRule {
                committee_id: parse_uuid(
                    &row.get::<_, String>("committee_id")?,
                    "committee_jurisdictions.committee_id",
                )?,
                book_id: parse_uuid(
                    &row.get::<_, String>("book_id")?,
                    "committee_jurisdictions.book_id",
                )?,
                section_id: parse_optional_uuid(
                    row.get("section_id")?,
                    "committee_jurisdictions.section_id",
                )?,
            });
        }
        Ok(rules)
    }
}

/// Trims and upper-cases an abbreviation, rejecting anything outside
/// `[A-Z][A-Z0-9&]{0,15}`.
pub fn normalize_abbreviation(value: &str) -> RepoResult<String> {
    let normalized = value.trim().to_ascii_uppercase();
    if ABBREVIATION_RE.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(RepoError::Validation(format!(
            "invalid committee abbreviation `{}`",
            value.trim()
        )))
    }
}

pub(crate) fn load_committee_in(conn: &Connection, id: CommitteeId) -> RepoResult<Option<Committee>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, abbreviation, description FROM committees WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_committee_row(row)?)),
        None => Ok(None),
    }
}

fn parse_committee_row(row: &Row<'_>) -> RepoResult<Committee> {
    Ok(Committee {
        id: parse_uuid(&row.get::<_, String>("id")?, "committees.id")?,
        name: row.get("name")?,
        abbreviation: row.get("abbreviation")?,
        description: row.get("description")?,
    })
}
