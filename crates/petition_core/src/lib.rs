//! Core domain logic for the legislative petition tracker.
//! This crate is the single source of truth for business invariants.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{ApiResponse, PetitionApi};
pub use auth::{has_min_role, AuthProvider, Principal, Role, StaticAuthProvider};
pub use config::{ConfigError, CoreConfig, LoggingConfig};
pub use diff::{
    build_version_diffs, compare_version_targets, diff_words, diff_words_with_limits,
    render_inline, DiffError, DiffLimits, DiffOrigin, DiffStats, Segment, SegmentKind,
    TargetDiff,
};
pub use error::{CoreError, CoreResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::committee::{AssignmentStatus, CommitteeActionKind, CommitteeRole};
pub use model::petition::{ChangeType, PetitionStatus, TargetDraft};
pub use model::plenary::PlenaryActionKind;
pub use repo::{RepoError, RepoResult};
pub use service::jurisdiction::{JurisdictionPolicy, JurisdictionTable};
pub use service::routing_service::{CommitteeRouteResult, RouteOutcome};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
