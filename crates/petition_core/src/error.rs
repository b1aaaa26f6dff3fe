//! Domain error taxonomy shared by services and the JSON surface.
//!
//! # Invariants
//! - Every failure carries exactly one status classification.
//! - Store uniqueness violations classify as `Conflict`, never `Unexpected`.
//! - `Unexpected` details are for logs only; `public_message` hides them.

use crate::auth::Role;
use crate::diff::DiffError;
use crate::lifecycle::TransitionError;
use crate::model::petition::TargetValidationError;
use crate::repo::RepoError;
use log::warn;

/// Public text for store-level uniqueness violations; constraint details stay in the log.
const STORE_CONFLICT_MESSAGE: &str = "conflicting record already exists";

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("role {actual} is below required role {required}")]
    AuthorizationDenied { required: Role, actual: Role },

    #[error("{0}")]
    ValidationFailed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} not found: {id}"))
    }

    /// Response status code for this classification.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AuthenticationRequired => 401,
            Self::AuthorizationDenied { .. } => 403,
            Self::ValidationFailed(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Unexpected(_) => 500,
        }
    }

    /// Stable machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::AuthorizationDenied { .. } => "authorization_denied",
            Self::ValidationFailed(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unexpected(_) => "unexpected",
        }
    }

    /// Message safe to hand to callers.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unexpected(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) if err.is_unique_violation() => {
                warn!("event=store_conflict module=error status=error error={err}");
                Self::Conflict(STORE_CONFLICT_MESSAGE.to_string())
            }
            RepoError::Db(err) => Self::Unexpected(err.to_string()),
            RepoError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            RepoError::Conflict(message) => Self::Conflict(message),
            RepoError::Transition(err) => Self::ValidationFailed(err.to_string()),
            RepoError::Validation(message) => Self::ValidationFailed(message),
            RepoError::InvalidData(message) => Self::Unexpected(message),
        }
    }
}

impl From<TransitionError> for CoreError {
    fn from(value: TransitionError) -> Self {
        Self::ValidationFailed(value.to_string())
    }
}

impl From<TargetValidationError> for CoreError {
    fn from(value: TargetValidationError) -> Self {
        Self::ValidationFailed(value.to_string())
    }
}

impl From<DiffError> for CoreError {
    fn from(value: DiffError) -> Self {
        Self::ValidationFailed(value.to_string())
    }
}
