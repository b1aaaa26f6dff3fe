//! Per-target diff results for petitions and version snapshots.
//!
//! # Invariants
//! - `build_version_diffs` output order matches input target order.
//! - `compare_version_targets` output follows newer-snapshot order, then the
//!   targets that only exist in the older snapshot, in older order.
//! - A target that vanished between snapshots is reported as
//!   `DiffOrigin::RemovedInNewer`, never dropped.

use crate::diff::text::{diff_words_with_limits, DiffLimits, DiffStats, Segment};
use crate::error::CoreResult;
use crate::model::document::{CanonicalUnit, DocumentRef, ParagraphId, ResolutionId};
use crate::model::petition::ChangeType;
use crate::model::version::{TargetKey, VersionTarget};
use crate::repo::document_repo::CanonicalTextSource;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// What a diff result compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOrigin {
    /// Proposed text against the currently published text.
    Canonical,
    /// Same target in both snapshots.
    BothVersions,
    /// Target exists only in the newer snapshot.
    AddedInNewer,
    /// Target exists only in the older snapshot.
    RemovedInNewer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDiff {
    pub label: String,
    pub paragraph_id: Option<ParagraphId>,
    pub resolution_id: Option<ResolutionId>,
    pub change_type: ChangeType,
    pub origin: DiffOrigin,
    pub segments: Vec<Segment>,
    pub stats: DiffStats,
}

/// Diffs each target's proposed text against its canonical current text.
///
/// `ADD_PARAGRAPH` diffs against an empty canonical side and
/// `DELETE_PARAGRAPH` against an empty proposed side.
pub fn build_version_diffs<S>(
    source: &S,
    targets: &[VersionTarget],
    limits: DiffLimits,
) -> CoreResult<Vec<TargetDiff>>
where
    S: CanonicalTextSource + ?Sized,
{
    let mut diffs = Vec::with_capacity(targets.len());
    for target in targets {
        let unit = resolve_unit(source, target)?;
        let canonical = unit.as_ref().map_or("", |unit| unit.text.as_str());
        let proposed = target.proposed_text.as_deref().unwrap_or("");

        let (before, after) = match target.change_type {
            ChangeType::AddParagraph => ("", proposed),
            ChangeType::DeleteParagraph => (canonical, ""),
            _ => (canonical, proposed),
        };

        let segments = diff_words_with_limits(before, after, limits)?;
        diffs.push(target_diff(
            target,
            label_for(target, unit.as_ref()),
            DiffOrigin::Canonical,
            segments,
        ));
    }

    debug!(
        "event=version_diffs_built module=diff status=ok targets={}",
        diffs.len()
    );
    Ok(diffs)
}

/// Diffs proposed text between two version snapshots, pairing targets by
/// canonical reference plus change type.
pub fn compare_version_targets<S>(
    source: &S,
    older: &[VersionTarget],
    newer: &[VersionTarget],
    limits: DiffLimits,
) -> CoreResult<Vec<TargetDiff>>
where
    S: CanonicalTextSource + ?Sized,
{
    let mut unmatched_older: HashMap<TargetKey, VecDeque<usize>> = HashMap::new();
    for (idx, target) in older.iter().enumerate() {
        unmatched_older
            .entry(target.identity_key())
            .or_default()
            .push_back(idx);
    }

    let mut consumed = vec![false; older.len()];
    let mut diffs = Vec::with_capacity(newer.len().max(older.len()));

    for target in newer {
        let paired = unmatched_older
            .get_mut(&target.identity_key())
            .and_then(VecDeque::pop_front);
        let newer_text = target.proposed_text.as_deref().unwrap_or("");

        let (origin, older_text) = match paired {
            Some(idx) => {
                consumed[idx] = true;
                (
                    DiffOrigin::BothVersions,
                    older[idx].proposed_text.as_deref().unwrap_or(""),
                )
            }
            None => (DiffOrigin::AddedInNewer, ""),
        };

        let unit = resolve_unit(source, target)?;
        let segments = diff_words_with_limits(older_text, newer_text, limits)?;
        diffs.push(target_diff(
            target,
            label_for(target, unit.as_ref()),
            origin,
            segments,
        ));
    }

    for (idx, target) in older.iter().enumerate() {
        if consumed[idx] {
            continue;
        }
        let unit = resolve_unit(source, target)?;
        let older_text = target.proposed_text.as_deref().unwrap_or("");
        let segments = diff_words_with_limits(older_text, "", limits)?;
        diffs.push(target_diff(
            target,
            label_for(target, unit.as_ref()),
            DiffOrigin::RemovedInNewer,
            segments,
        ));
    }

    debug!(
        "event=version_compare module=diff status=ok older={} newer={} results={}",
        older.len(),
        newer.len(),
        diffs.len()
    );
    Ok(diffs)
}

fn resolve_unit<S>(source: &S, target: &VersionTarget) -> CoreResult<Option<CanonicalUnit>>
where
    S: CanonicalTextSource + ?Sized,
{
    let Some(reference) = target.document_ref() else {
        return Ok(None);
    };
    let unit = source.canonical_unit(reference)?;
    if unit.is_none() {
        warn!(
            "event=canonical_lookup module=diff status=missing reference={:?}",
            reference
        );
    }
    Ok(unit)
}

fn label_for(target: &VersionTarget, unit: Option<&CanonicalUnit>) -> String {
    match (unit, target.document_ref()) {
        (Some(unit), _) => unit.label(),
        (None, Some(DocumentRef::Paragraph(id))) => format!("Unknown paragraph {id}"),
        (None, Some(DocumentRef::Resolution(id))) => format!("Unknown resolution {id}"),
        (None, None) => format!("Unattached {} target", target.change_type),
    }
}

fn target_diff(
    target: &VersionTarget,
    label: String,
    origin: DiffOrigin,
    segments: Vec<Segment>,
) -> TargetDiff {
    let stats = DiffStats::from_segments(&segments);
    TargetDiff {
        label,
        paragraph_id: target.paragraph_id,
        resolution_id: target.resolution_id,
        change_type: target.change_type,
        origin,
        segments,
        stats,
    }
}
