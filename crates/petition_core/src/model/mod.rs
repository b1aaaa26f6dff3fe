//! Domain model for petitions, committees, canonical documents and the
//! plenary calendar.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own the string encodings used by both the store and the JSON surface.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID.
//! - `Petition` is the aggregate root; targets, versions, assignments and
//!   calendar items exist only in relation to one petition.

pub mod committee;
pub mod document;
pub mod petition;
pub mod plenary;
pub mod version;

use uuid::Uuid;

/// Identity of an acting user, issued by the external auth provider.
pub type UserId = Uuid;
