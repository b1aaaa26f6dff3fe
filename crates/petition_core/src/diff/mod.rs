//! Word-level text diff engine and petition version diff builder.
//!
//! # Responsibility
//! - Compute stable, minimal edit scripts between two flat texts.
//! - Turn petition targets and version snapshots into labeled diff results.
//!
//! # Invariants
//! - Diffing is pure and deterministic; it never touches the store directly.
//! - `equal`+`removed` segments rebuild `before`; `equal`+`added` rebuild `after`.

pub mod text;
pub mod version;

pub use text::{
    diff_words, diff_words_with_limits, render_inline, DiffError, DiffLimits, DiffStats,
    Segment, SegmentKind, DEFAULT_MAX_LCS_CELLS,
};
pub use version::{build_version_diffs, compare_version_targets, DiffOrigin, TargetDiff};
