//! Word-granularity LCS diff.
//!
//! Text is split into alternating runs of whitespace and non-whitespace, so
//! punctuation stays attached to its word and every byte of the input lands in
//! exactly one token. The common token prefix and suffix are matched first;
//! only the differing interior goes through the LCS table, which costs
//! `O(n * m)` time and memory in interior token counts. Interiors larger than
//! `DiffLimits::max_lcs_cells` are rejected with `DiffError::InputTooLarge`.

use serde::{Deserialize, Serialize};

/// Default cap on LCS table cells (about 2000 x 2000 interior tokens).
pub const DEFAULT_MAX_LCS_CELLS: usize = 4_000_000;

/// Resource bounds for one diff computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffLimits {
    pub max_lcs_cells: usize,
}

impl Default for DiffLimits {
    fn default() -> Self {
        Self {
            max_lcs_cells: DEFAULT_MAX_LCS_CELLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error(
        "diff input too large: {before_tokens} x {after_tokens} differing tokens exceeds limit of {limit} cells"
    )]
    InputTooLarge {
        before_tokens: usize,
        after_tokens: usize,
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Equal,
    Added,
    Removed,
}

/// Contiguous run of text carrying one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    pub fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Word counts of a diff, for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub added_words: usize,
    pub removed_words: usize,
}

impl DiffStats {
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut stats = Self::default();
        for segment in segments {
            let words = segment.text.split_whitespace().count();
            match segment.kind {
                SegmentKind::Added => stats.added_words += words,
                SegmentKind::Removed => stats.removed_words += words,
                SegmentKind::Equal => {}
            }
        }
        stats
    }

    pub fn is_unchanged(&self) -> bool {
        self.added_words == 0 && self.removed_words == 0
    }
}

/// Diffs two texts with default limits.
pub fn diff_words(before: &str, after: &str) -> Result<Vec<Segment>, DiffError> {
    diff_words_with_limits(before, after, DiffLimits::default())
}

/// Diffs two texts at word granularity.
///
/// Changed runs are emitted as one `removed` segment followed by one `added`
/// segment; adjacent segments of the same kind are always merged.
///
/// # Errors
/// - `DiffError::InputTooLarge` when the differing interior needs more LCS
///   cells than `limits.max_lcs_cells`.
pub fn diff_words_with_limits(
    before: &str,
    after: &str,
    limits: DiffLimits,
) -> Result<Vec<Segment>, DiffError> {
    let old_tokens = tokenize(before);
    let new_tokens = tokenize(after);

    let prefix = old_tokens
        .iter()
        .zip(&new_tokens)
        .take_while(|(old, new)| old == new)
        .count();
    let suffix = old_tokens[prefix..]
        .iter()
        .rev()
        .zip(new_tokens[prefix..].iter().rev())
        .take_while(|(old, new)| old == new)
        .count();

    let old_mid = &old_tokens[prefix..old_tokens.len() - suffix];
    let new_mid = &new_tokens[prefix..new_tokens.len() - suffix];

    let mut ops = Vec::with_capacity(old_tokens.len().max(new_tokens.len()));
    ops.extend(
        old_tokens[..prefix]
            .iter()
            .map(|token| (SegmentKind::Equal, *token)),
    );
    interior_ops(old_mid, new_mid, limits, &mut ops)?;
    ops.extend(
        old_tokens[old_tokens.len() - suffix..]
            .iter()
            .map(|token| (SegmentKind::Equal, *token)),
    );

    Ok(coalesce(ops))
}

/// Renders segments inline: `[-removed-]` and `{+added+}` markers.
pub fn render_inline(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment.kind {
            SegmentKind::Equal => out.push_str(&segment.text),
            SegmentKind::Removed => {
                out.push_str("[-");
                out.push_str(&segment.text);
                out.push_str("-]");
            }
            SegmentKind::Added => {
                out.push_str("{+");
                out.push_str(&segment.text);
                out.push_str("+}");
            }
        }
    }
    out
}

fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match in_space {
            Some(current) if current != is_space => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn interior_ops<'a>(
    old: &[&'a str],
    new: &[&'a str],
    limits: DiffLimits,
    ops: &mut Vec<(SegmentKind, &'a str)>,
) -> Result<(), DiffError> {
    if old.is_empty() || new.is_empty() {
        ops.extend(old.iter().map(|token| (SegmentKind::Removed, *token)));
        ops.extend(new.iter().map(|token| (SegmentKind::Added, *token)));
        return Ok(());
    }

    let n = old.len();
    let m = new.len();
    let cells = (n + 1).saturating_mul(m + 1);
    if cells > limits.max_lcs_cells {
        return Err(DiffError::InputTooLarge {
            before_tokens: n,
            after_tokens: m,
            limit: limits.max_lcs_cells,
        });
    }

    // lcs[i * width + j] = LCS length of old[i..] and new[j..].
    let width = m + 1;
    let mut lcs = vec![0u32; cells];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if old[i] == new[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut i = 0;
    let mut j = 0;
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push((SegmentKind::Equal, old[i]));
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            ops.push((SegmentKind::Removed, old[i]));
            i += 1;
        } else {
            ops.push((SegmentKind::Added, new[j]));
            j += 1;
        }
    }
    ops.extend(old[i..].iter().map(|token| (SegmentKind::Removed, *token)));
    ops.extend(new[j..].iter().map(|token| (SegmentKind::Added, *token)));
    Ok(())
}

/// Merges token ops into segments; each changed run becomes removed-then-added.
fn coalesce(ops: Vec<(SegmentKind, &str)>) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut removed = String::new();
    let mut added = String::new();

    fn flush(segments: &mut Vec<Segment>, removed: &mut String, added: &mut String) {
        if !removed.is_empty() {
            segments.push(Segment::new(SegmentKind::Removed, std::mem::take(removed)));
        }
        if !added.is_empty() {
            segments.push(Segment::new(SegmentKind::Added, std::mem::take(added)));
        }
    }

    for (kind, token) in ops {
        match kind {
            SegmentKind::Removed => removed.push_str(token),
            SegmentKind::Added => added.push_str(token),
            SegmentKind::Equal => {
                flush(&mut segments, &mut removed, &mut added);
                match segments.last_mut() {
                    Some(last) if last.kind == SegmentKind::Equal => last.text.push_str(token),
                    _ => segments.push(Segment::new(SegmentKind::Equal, token)),
                }
            }
        }
    }
    flush(&mut segments, &mut removed, &mut added);
    segments
}

#[cfg(test)]
mod tests {
    use super::{coalesce, tokenize, SegmentKind};

    #[test]
    fn tokenize_keeps_punctuation_with_word() {
        assert_eq!(
            tokenize("Hello,  world!\n"),
            vec!["Hello,", "  ", "world!", "\n"]
        );
        assert_eq!(tokenize("  lead"), vec!["  ", "lead"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokenize_handles_multibyte_characters() {
        assert_eq!(tokenize("¶ 12 café"), vec!["¶", " ", "12", " ", "café"]);
    }

    #[test]
    fn coalesce_orders_removed_before_added_within_a_run() {
        let segments = coalesce(vec![
            (SegmentKind::Added, "x"),
            (SegmentKind::Removed, "a"),
            (SegmentKind::Added, "y"),
            (SegmentKind::Equal, " "),
            (SegmentKind::Equal, "z"),
        ]);
        let kinds: Vec<_> = segments.iter().map(|segment| segment.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Removed, SegmentKind::Added, SegmentKind::Equal]
        );
        assert_eq!(segments[1].text, "xy");
        assert_eq!(segments[2].text, " z");
    }
}
