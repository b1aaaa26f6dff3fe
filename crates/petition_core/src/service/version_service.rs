//! Version history views with rendered diffs.

use crate::diff::{build_version_diffs, compare_version_targets, DiffLimits, TargetDiff};
use crate::error::{CoreError, CoreResult};
use crate::model::petition::PetitionId;
use crate::model::version::{PetitionVersion, VersionId, VersionTarget};
use crate::repo::document_repo::CanonicalTextSource;
use crate::repo::petition_repo::PetitionRepository;
use log::debug;
use std::time::Instant;

/// One version, optionally compared with another version of the same petition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionView {
    pub version: PetitionVersion,
    pub compare_with: Option<PetitionVersion>,
    pub diffs: Vec<TargetDiff>,
}

pub struct VersionService<P: PetitionRepository, S: CanonicalTextSource> {
    petitions: P,
    canonical: S,
    limits: DiffLimits,
}

impl<P: PetitionRepository, S: CanonicalTextSource> VersionService<P, S> {
    pub fn new(petitions: P, canonical: S, limits: DiffLimits) -> Self {
        Self {
            petitions,
            canonical,
            limits,
        }
    }

    /// Current targets of a petition against the published text.
    pub fn petition_diffs(&self, petition_id: PetitionId) -> CoreResult<Vec<TargetDiff>> {
        if self.petitions.get_petition(petition_id)?.is_none() {
            return Err(CoreError::not_found("petition", petition_id));
        }
        let targets: Vec<VersionTarget> = self
            .petitions
            .list_targets(petition_id)?
            .iter()
            .map(VersionTarget::from)
            .collect();
        build_version_diffs(&self.canonical, &targets, self.limits)
    }

    /// Without `compare_with`, diffs the version's targets against the
    /// published text. With it, diffs the older of the two snapshots (by
    /// `version_num`) against the newer.
    pub fn version_view(
        &self,
        petition_id: PetitionId,
        version_id: VersionId,
        compare_with: Option<VersionId>,
    ) -> CoreResult<VersionView> {
        let started = Instant::now();
        let version = self.load_version(petition_id, version_id)?;

        let view = match compare_with {
            None => {
                let diffs = build_version_diffs(&self.canonical, &version.targets, self.limits)?;
                VersionView {
                    version,
                    compare_with: None,
                    diffs,
                }
            }
            Some(other_id) => {
                let other = self.load_version(petition_id, other_id)?;
                let (older, newer) = if other.version_num <= version.version_num {
                    (&other, &version)
                } else {
                    (&version, &other)
                };
                let diffs = compare_version_targets(
                    &self.canonical,
                    &older.targets,
                    &newer.targets,
                    self.limits,
                )?;
                VersionView {
                    version,
                    compare_with: Some(other),
                    diffs,
                }
            }
        };

        debug!(
            "event=version_view module=version status=ok petition_id={petition_id} version_id={version_id} compared={} diffs={} duration_ms={}",
            view.compare_with.is_some(),
            view.diffs.len(),
            started.elapsed().as_millis()
        );
        Ok(view)
    }

    fn load_version(
        &self,
        petition_id: PetitionId,
        version_id: VersionId,
    ) -> CoreResult<PetitionVersion> {
        self.petitions
            .get_version(petition_id, version_id)?
            .ok_or_else(|| CoreError::not_found("version", version_id))
    }
}
