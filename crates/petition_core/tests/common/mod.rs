#![allow(dead_code)]

use petition_core::auth::{Principal, Role};
use petition_core::db::{open_db, open_db_in_memory};
use petition_core::model::committee::Committee;
use petition_core::model::document::{Book, Paragraph, Resolution, Section};
use petition_core::model::petition::{ChangeType, NewPetition, Petition, TargetDraft};
use petition_core::repo::committee_repo::{NewCommittee, SqliteCommitteeRepository};
use petition_core::repo::document_repo::{DocumentRepository, SqliteDocumentRepository};
use petition_core::repo::petition_repo::SqlitePetitionRepository;
use petition_core::service::committee_service::CommitteeService;
use petition_core::service::petition_service::PetitionService;
use rusqlite::Connection;
use std::path::Path;
use uuid::Uuid;

pub const CANONICAL_TEXT: &str = "The church shall ordain the quick elders of each district.";

pub struct Actors {
    pub delegate: Principal,
    pub member: Principal,
    pub chair: Principal,
    pub staff: Principal,
    pub admin: Principal,
}

impl Actors {
    pub fn new() -> Self {
        Self {
            delegate: Principal::new(Uuid::new_v4(), Role::Delegate),
            member: Principal::new(Uuid::new_v4(), Role::CommitteeMember),
            chair: Principal::new(Uuid::new_v4(), Role::CommitteeChair),
            staff: Principal::new(Uuid::new_v4(), Role::Staff),
            admin: Principal::new(Uuid::new_v4(), Role::Admin),
        }
    }
}

/// Canonical documents seeded into every fixture store.
pub struct Canon {
    pub book: Book,
    pub section: Section,
    pub other_section: Section,
    pub paragraph: Paragraph,
    pub other_paragraph: Paragraph,
    pub resolution: Resolution,
}

pub struct Fixture {
    pub conn: Connection,
    pub actors: Actors,
    pub canon: Canon,
    pub conference_id: Uuid,
}

pub fn fixture() -> Fixture {
    build(open_db_in_memory().unwrap())
}

pub fn fixture_at(path: &Path) -> Fixture {
    build(open_db(path).unwrap())
}

fn build(conn: Connection) -> Fixture {
    let canon = seed_canon(&conn);
    Fixture {
        conn,
        actors: Actors::new(),
        canon,
        conference_id: Uuid::new_v4(),
    }
}

fn seed_canon(conn: &Connection) -> Canon {
    let docs = SqliteDocumentRepository::new(conn);
    let book = docs.create_book("BOD", "Book of Discipline").unwrap();
    let section = docs.create_section(book.id, None, "Ministry").unwrap();
    let other_section = docs.create_section(book.id, None, "Property").unwrap();
    let paragraph = docs
        .create_paragraph(section.id, "304", Some("Qualifications"), CANONICAL_TEXT)
        .unwrap();
    let other_paragraph = docs
        .create_paragraph(
            other_section.id,
            "2501",
            None,
            "All property is held in trust.",
        )
        .unwrap();
    let resolution = docs
        .create_resolution(section.id, "3141", "Creation Care", "We care for creation.")
        .unwrap();
    Canon {
        book,
        section,
        other_section,
        paragraph,
        other_paragraph,
        resolution,
    }
}

impl Fixture {
    pub fn petitions(&self) -> PetitionService<SqlitePetitionRepository<'_>> {
        PetitionService::new(SqlitePetitionRepository::new(&self.conn))
    }

    pub fn committees(&self) -> CommitteeService<SqliteCommitteeRepository<'_>> {
        CommitteeService::new(SqliteCommitteeRepository::new(&self.conn))
    }

    pub fn committee(&self, abbreviation: &str) -> Committee {
        self.committees()
            .create_committee(
                &self.actors.admin,
                &NewCommittee {
                    name: format!("{abbreviation} committee"),
                    abbreviation: abbreviation.to_string(),
                    description: String::new(),
                },
            )
            .unwrap()
    }

    pub fn replace_target(&self, text: &str) -> TargetDraft {
        TargetDraft {
            paragraph_id: Some(self.canon.paragraph.id),
            resolution_id: None,
            change_type: ChangeType::ReplaceText,
            proposed_text: Some(text.to_string()),
        }
    }

    /// Draft petition owned by the delegate with the given targets.
    pub fn draft(&self, targets: &[TargetDraft]) -> Petition {
        let petitions = self.petitions();
        let petition = petitions
            .create_petition(
                &self.actors.delegate,
                &NewPetition {
                    conference_id: self.conference_id,
                    title: "Amend ordination standards".to_string(),
                    summary: "Replaces one word.".to_string(),
                },
            )
            .unwrap();
        if !targets.is_empty() {
            petitions
                .replace_targets(&self.actors.delegate, petition.id, targets)
                .unwrap();
        }
        petition
    }

    /// Submitted petition with one replace target on the seeded paragraph.
    pub fn submitted(&self) -> Petition {
        let petition =
            self.draft(&[self.replace_target("The church shall ordain the slow elders of each district.")]);
        self.petitions()
            .submit(&self.actors.delegate, petition.id)
            .unwrap();
        self.petitions().get_petition(petition.id).unwrap()
    }
}
