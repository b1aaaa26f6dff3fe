//! JSON request/response surface consumed by a presentation layer.
//!
//! # Responsibility
//! - Resolve the acting principal, parse path ids and request bodies.
//! - Run the matching use case and map the outcome to a status code and
//!   a JSON body.
//!
//! # Invariants
//! - Handlers never panic and never return an error; every failure becomes
//!   `{ "error": <kind>, "message": <text> }` with its classified status.
//! - `Unexpected` failures expose only `internal error`; details go to the log.

use crate::auth::AuthProvider;
use crate::diff::{DiffLimits, TargetDiff};
use crate::error::{CoreError, CoreResult};
use crate::model::committee::AssignmentStatus;
use crate::model::version::PetitionVersion;
use crate::repo::assignment_repo::SqliteAssignmentRepository;
use crate::repo::committee_repo::SqliteCommitteeRepository;
use crate::repo::document_repo::SqliteDocumentRepository;
use crate::repo::petition_repo::SqlitePetitionRepository;
use crate::service::committee_service::CommitteeService;
use crate::service::routing_service::RoutingService;
use crate::service::version_service::VersionService;
use log::error;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self { status, body },
            Err(err) => Self::error(&CoreError::Unexpected(format!(
                "response encoding failed: {err}"
            ))),
        }
    }

    fn error(err: &CoreError) -> Self {
        if let CoreError::Unexpected(details) = err {
            error!("event=api_error module=api status=error error_code=unexpected error={details}");
        }
        Self {
            status: err.status_code(),
            body: json!({
                "error": err.kind(),
                "message": err.public_message(),
            }),
        }
    }

    fn from_result<T: Serialize>(status: u16, result: CoreResult<T>) -> Self {
        match result {
            Ok(payload) => Self::json(status, &payload),
            Err(err) => Self::error(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    #[serde(default, alias = "committee_id")]
    committee_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssignmentPatchRequest {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionResponse {
    version: PetitionVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    compare_with: Option<PetitionVersion>,
    diffs: Vec<TargetDiff>,
}

/// Endpoint handlers bound to one store connection and auth provider.
pub struct PetitionApi<'conn, A: AuthProvider> {
    conn: &'conn Connection,
    auth: A,
    limits: DiffLimits,
}

impl<'conn, A: AuthProvider> PetitionApi<'conn, A> {
    pub fn new(conn: &'conn Connection, auth: A) -> Self {
        Self::with_limits(conn, auth, DiffLimits::default())
    }

    pub fn with_limits(conn: &'conn Connection, auth: A, limits: DiffLimits) -> Self {
        Self { conn, auth, limits }
    }

    /// `POST /petitions/{id}/assign {committeeId}` -> 201 + assignment.
    pub fn assign(&self, petition_id: &str, body: &Value) -> ApiResponse {
        let result = (|| -> CoreResult<_> {
            let principal = self.auth.require_principal()?;
            let petition_id = parse_id("petition id", petition_id)?;
            let request: AssignRequest = parse_body(body)?;
            let committee_id = request
                .committee_id
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| CoreError::validation("committeeId is required"))?;
            let committee_id = parse_id("committeeId", committee_id)?;
            let created = self.routing().assign(&principal, petition_id, committee_id)?;
            Ok(created.assignment)
        })();
        ApiResponse::from_result(201, result)
    }

    /// `POST /petitions/{id}/route-petition {}` -> 200 + per-committee outcomes.
    pub fn route_petition(&self, petition_id: &str) -> ApiResponse {
        let result = (|| -> CoreResult<_> {
            let principal = self.auth.require_principal()?;
            let petition_id = parse_id("petition id", petition_id)?;
            let table = CommitteeService::new(SqliteCommitteeRepository::new(self.conn))
                .jurisdiction_table()?;
            self.routing().auto_route(&principal, petition_id, &table)
        })();
        ApiResponse::from_result(200, result)
    }

    /// `PATCH /assignments/{id} {status}` -> 200 + updated assignment.
    pub fn update_assignment(&self, assignment_id: &str, body: &Value) -> ApiResponse {
        let result = (|| -> CoreResult<_> {
            let principal = self.auth.require_principal()?;
            let assignment_id = parse_id("assignment id", assignment_id)?;
            let request: AssignmentPatchRequest = parse_body(body)?;
            let raw = request
                .status
                .ok_or_else(|| CoreError::validation("status is required"))?;
            let status = AssignmentStatus::parse(raw.trim()).ok_or_else(|| {
                CoreError::validation(format!(
                    "invalid assignment status `{}`; expected PENDING|IN_PROGRESS|COMPLETED|DEFERRED",
                    raw.trim()
                ))
            })?;
            let update = self
                .routing()
                .update_assignment_status(&principal, assignment_id, status)?;
            Ok(update.assignment)
        })();
        ApiResponse::from_result(200, result)
    }

    /// `GET /petitions/{id}/versions/{versionId}[?compareWith=<versionId>]`.
    ///
    /// Version reads need no principal.
    pub fn get_version(
        &self,
        petition_id: &str,
        version_id: &str,
        compare_with: Option<&str>,
    ) -> ApiResponse {
        let result = (|| -> CoreResult<_> {
            let petition_id = parse_id("petition id", petition_id)?;
            let version_id = parse_id("version id", version_id)?;
            let compare_with = compare_with
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| parse_id("compareWith", value))
                .transpose()?;
            let view = VersionService::new(
                SqlitePetitionRepository::new(self.conn),
                SqliteDocumentRepository::new(self.conn),
                self.limits,
            )
            .version_view(petition_id, version_id, compare_with)?;
            Ok(VersionResponse {
                version: view.version,
                compare_with: view.compare_with,
                diffs: view.diffs,
            })
        })();
        ApiResponse::from_result(200, result)
    }

    fn routing(
        &self,
    ) -> RoutingService<
        SqliteAssignmentRepository<'conn>,
        SqlitePetitionRepository<'conn>,
        SqliteDocumentRepository<'conn>,
    > {
        RoutingService::new(
            SqliteAssignmentRepository::new(self.conn),
            SqlitePetitionRepository::new(self.conn),
            SqliteDocumentRepository::new(self.conn),
        )
    }
}

fn parse_id(field: &str, value: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| CoreError::validation(format!("{field} is not a valid id: `{}`", value.trim())))
}

fn parse_body<T: DeserializeOwned>(body: &Value) -> CoreResult<T> {
    let body = if body.is_null() {
        Value::Object(Default::default())
    } else {
        body.clone()
    };
    serde_json::from_value(body)
        .map_err(|err| CoreError::validation(format!("malformed request body: {err}")))
}
