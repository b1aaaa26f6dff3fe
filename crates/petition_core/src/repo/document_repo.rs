//! Canonical document repository and canonical text lookup.
//!
//! # Responsibility
//! - Seed and read books, sections, paragraphs and resolutions.
//! - Resolve a target reference to its current text, label parts and scope.
//!
//! # Invariants
//! - Canonical units are never modified through the petition workflow.

use crate::model::document::{
    Book, BookId, CanonicalUnit, DocumentRef, Paragraph, ParagraphId, Resolution, ResolutionId,
    Section, SectionId,
};
use crate::repo::{exists_in, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use uuid::Uuid;

/// Resolves the canonical unit a target points at.
pub trait CanonicalTextSource {
    fn canonical_unit(&self, reference: DocumentRef) -> RepoResult<Option<CanonicalUnit>>;
}

impl CanonicalTextSource for HashMap<DocumentRef, CanonicalUnit> {
    fn canonical_unit(&self, reference: DocumentRef) -> RepoResult<Option<CanonicalUnit>> {
        Ok(self.get(&reference).cloned())
    }
}

/// Repository interface for canonical documents.
pub trait DocumentRepository {
    fn create_book(&self, identifier: &str, title: &str) -> RepoResult<Book>;
    fn create_section(
        &self,
        book_id: BookId,
        parent_id: Option<SectionId>,
        title: &str,
    ) -> RepoResult<Section>;
    fn create_paragraph(
        &self,
        section_id: SectionId,
        number: &str,
        title: Option<&str>,
        text: &str,
    ) -> RepoResult<Paragraph>;
    fn create_resolution(
        &self,
        section_id: SectionId,
        number: &str,
        title: &str,
        text: &str,
    ) -> RepoResult<Resolution>;
    fn get_paragraph(&self, id: ParagraphId) -> RepoResult<Option<Paragraph>>;
    fn get_resolution(&self, id: ResolutionId) -> RepoResult<Option<Resolution>>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn create_book(&self, identifier: &str, title: &str) -> RepoResult<Book> {
        let book = Book {
            id: Uuid::new_v4(),
            identifier: identifier.trim().to_string(),
            title: title.trim().to_string(),
        };
        self.conn.execute(
            "INSERT INTO books (id, identifier, title) VALUES (?1, ?2, ?3);",
            params![book.id.to_string(), book.identifier, book.title],
        )?;
        Ok(book)
    }

    fn create_section(
        &self,
        book_id: BookId,
        parent_id: Option<SectionId>,
        title: &str,
    ) -> RepoResult<Section> {
        let sort_order: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0)
             FROM sections
             WHERE book_id = ?1 AND parent_id IS ?2;",
            params![book_id.to_string(), parent_id.map(|id| id.to_string())],
            |row| row.get(0),
        )?;
        let section = Section {
            id: Uuid::new_v4(),
            book_id,
            parent_id,
            title: title.trim().to_string(),
            sort_order,
        };
        self.conn.execute(
            "INSERT INTO sections (id, book_id, parent_id, title, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                section.id.to_string(),
                book_id.to_string(),
                parent_id.map(|id| id.to_string()),
                section.title,
                sort_order,
            ],
        )?;
        Ok(section)
    }

    fn create_paragraph(
        &self,
        section_id: SectionId,
        number: &str,
        title: Option<&str>,
        text: &str,
    ) -> RepoResult<Paragraph> {
        let paragraph = Paragraph {
            id: Uuid::new_v4(),
            section_id,
            number: number.trim().to_string(),
            title: title.map(|title| title.trim().to_string()),
            text: text.to_string(),
        };
        self.conn.execute(
            "INSERT INTO paragraphs (id, section_id, number, title, text)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                paragraph.id.to_string(),
                section_id.to_string(),
                paragraph.number,
                paragraph.title,
                paragraph.text,
            ],
        )?;
        Ok(paragraph)
    }

    fn create_resolution(
        &self,
        section_id: SectionId,
        number: &str,
        title: &str,
        text: &str,
    ) -> RepoResult<Resolution> {
        let resolution = Resolution {
            id: Uuid::new_v4(),
            section_id,
            number: number.trim().to_string(),
            title: title.trim().to_string(),
            text: text.to_string(),
        };
        self.conn.execute(
            "INSERT INTO resolutions (id, section_id, number, title, text)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                resolution.id.to_string(),
                section_id.to_string(),
                resolution.number,
                resolution.title,
                resolution.text,
            ],
        )?;
        Ok(resolution)
    }

    fn get_paragraph(&self, id: ParagraphId) -> RepoResult<Option<Paragraph>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, section_id, number, title, text FROM paragraphs WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("id")?,
                        row.get::<_, String>("section_id")?,
                        row.get::<_, String>("number")?,
                        row.get::<_, Option<String>>("title")?,
                        row.get::<_, String>("text")?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, section_id, number, title, text)| {
            Ok(Paragraph {
                id: parse_uuid(&id, "paragraphs.id")?,
                section_id: parse_uuid(&section_id, "paragraphs.section_id")?,
                number,
                title,
                text,
            })
        })
        .transpose()
    }

    fn get_resolution(&self, id: ResolutionId) -> RepoResult<Option<Resolution>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, section_id, number, title, text FROM resolutions WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("id")?,
                        row.get::<_, String>("section_id")?,
                        row.get::<_, String>("number")?,
                        row.get::<_, String>("title")?,
                        row.get::<_, String>("text")?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, section_id, number, title, text)| {
            Ok(Resolution {
                id: parse_uuid(&id, "resolutions.id")?,
                section_id: parse_uuid(&section_id, "resolutions.section_id")?,
                number,
                title,
                text,
            })
        })
        .transpose()
    }
}

impl CanonicalTextSource for SqliteDocumentRepository<'_> {
    fn canonical_unit(&self, reference: DocumentRef) -> RepoResult<Option<CanonicalUnit>> {
        canonical_unit_in(self.conn, reference)
    }
}

/// Loads a canonical unit on any connection or open transaction.
pub(crate) fn canonical_unit_in(
    conn: &Connection,
    reference: DocumentRef,
) -> RepoResult<Option<CanonicalUnit>> {
    let (table, id) = match reference {
        DocumentRef::Paragraph(id) => ("paragraphs", id),
        DocumentRef::Resolution(id) => ("resolutions", id),
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT
            u.number AS number,
            u.title AS title,
            u.text AS text,
            s.id AS section_id,
            b.id AS book_id,
            b.identifier AS book_identifier
         FROM {table} u
         INNER JOIN sections s ON s.id = u.section_id
         INNER JOIN books b ON b.id = s.book_id
         WHERE u.id = ?1;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_unit_row(row, reference)?)),
        None => Ok(None),
    }
}

fn parse_unit_row(row: &Row<'_>, reference: DocumentRef) -> RepoResult<CanonicalUnit> {
    let section_id: String = row.get("section_id")?;
    let book_id: String = row.get("book_id")?;
    Ok(CanonicalUnit {
        reference,
        book_id: parse_uuid(&book_id, "books.id")?,
        section_id: parse_uuid(&section_id, "sections.id")?,
        book_identifier: row.get("book_identifier")?,
        number: row.get("number")?,
        title: row.get("title")?,
        text: row.get("text")?,
    })
}

/// Errors when a referenced canonical unit is missing.
pub(crate) fn require_unit_exists(conn: &Connection, reference: DocumentRef) -> RepoResult<()> {
    let (table, entity, id) = match reference {
        DocumentRef::Paragraph(id) => ("paragraphs", "paragraph", id),
        DocumentRef::Resolution(id) => ("resolutions", "resolution", id),
    };
    if exists_in(conn, table, &id)? {
        Ok(())
    } else {
        Err(RepoError::not_found(entity, id))
    }
}
