//! Core use-case services.
//!
//! # Responsibility
//! - Resolve authorization against the acting principal.
//! - Orchestrate repository calls into use-case level APIs.
//! - Emit one metadata-only `event=... status=ok|error` line per mutation.

use crate::error::{CoreError, CoreResult};
use log::{error, info, warn};
use std::time::Instant;

pub mod committee_service;
pub mod jurisdiction;
pub mod petition_service;
pub mod plenary_service;
pub mod routing_service;
pub mod version_service;

/// Logs the outcome of one use-case call and passes the result through.
///
/// `context` is a pre-formatted `key=value` list of ids; it must not carry
/// petition or proposed text.
pub(crate) fn log_outcome<T>(
    event: &str,
    module: &str,
    started: Instant,
    context: &str,
    result: CoreResult<T>,
) -> CoreResult<T> {
    let duration_ms = started.elapsed().as_millis();
    match &result {
        Ok(_) => info!(
            "event={event} module={module} status=ok {context} duration_ms={duration_ms}"
        ),
        Err(err @ CoreError::Unexpected(_)) => error!(
            "event={event} module={module} status=error {context} duration_ms={duration_ms} error_code={} error={err}",
            err.kind()
        ),
        Err(err) => warn!(
            "event={event} module={module} status=error {context} duration_ms={duration_ms} error_code={}",
            err.kind()
        ),
    }
    result
}
