use petition_core::diff::{
    build_version_diffs, compare_version_targets, DiffLimits, DiffOrigin, Segment, SegmentKind,
};
use petition_core::model::document::{CanonicalUnit, DocumentRef};
use petition_core::model::petition::ChangeType;
use petition_core::model::version::VersionTarget;
use std::collections::HashMap;
use uuid::Uuid;

struct Source {
    units: HashMap<DocumentRef, CanonicalUnit>,
    paragraph: Uuid,
    resolution: Uuid,
}

fn source() -> Source {
    let book_id = Uuid::new_v4();
    let section_id = Uuid::new_v4();
    let paragraph = Uuid::new_v4();
    let resolution = Uuid::new_v4();
    let mut units = HashMap::new();
    units.insert(
        DocumentRef::Paragraph(paragraph),
        CanonicalUnit {
            reference: DocumentRef::Paragraph(paragraph),
            book_id,
            section_id,
            book_identifier: "BOD".to_string(),
            number: "304".to_string(),
            title: Some("Qualifications".to_string()),
            text: "the quick fox".to_string(),
        },
    );
    units.insert(
        DocumentRef::Resolution(resolution),
        CanonicalUnit {
            reference: DocumentRef::Resolution(resolution),
            book_id,
            section_id,
            book_identifier: "BOR".to_string(),
            number: "3141".to_string(),
            title: None,
            text: "We care for creation.".to_string(),
        },
    );
    Source {
        units,
        paragraph,
        resolution,
    }
}

fn paragraph_target(id: Uuid, change_type: ChangeType, text: Option<&str>) -> VersionTarget {
    VersionTarget {
        paragraph_id: Some(id),
        resolution_id: None,
        change_type,
        proposed_text: text.map(str::to_string),
    }
}

#[test]
fn proposed_text_is_diffed_against_canonical_text() {
    let src = source();
    let targets = vec![paragraph_target(
        src.paragraph,
        ChangeType::ReplaceText,
        Some("the slow fox"),
    )];

    let diffs = build_version_diffs(&src.units, &targets, DiffLimits::default()).unwrap();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].label, "BOD ¶304 Qualifications");
    assert_eq!(diffs[0].origin, DiffOrigin::Canonical);
    assert_eq!(
        diffs[0].segments,
        vec![
            Segment::new(SegmentKind::Equal, "the "),
            Segment::new(SegmentKind::Removed, "quick"),
            Segment::new(SegmentKind::Added, "slow"),
            Segment::new(SegmentKind::Equal, " fox"),
        ]
    );
}

#[test]
fn paragraph_level_changes_use_an_empty_side() {
    let src = source();
    let targets = vec![
        paragraph_target(src.paragraph, ChangeType::DeleteParagraph, None),
        VersionTarget {
            paragraph_id: None,
            resolution_id: None,
            change_type: ChangeType::AddParagraph,
            proposed_text: Some("A brand new paragraph.".to_string()),
        },
        VersionTarget {
            paragraph_id: None,
            resolution_id: Some(src.resolution),
            change_type: ChangeType::AddText,
            proposed_text: Some("We care for creation. Always.".to_string()),
        },
    ];

    let diffs = build_version_diffs(&src.units, &targets, DiffLimits::default()).unwrap();
    assert_eq!(
        diffs[0].segments,
        vec![Segment::new(SegmentKind::Removed, "the quick fox")]
    );
    assert_eq!(diffs[1].label, "Unattached ADD_PARAGRAPH target");
    assert_eq!(
        diffs[1].segments,
        vec![Segment::new(SegmentKind::Added, "A brand new paragraph.")]
    );
    assert_eq!(diffs[2].label, "BOR R3141");
    assert_eq!(diffs[2].stats.added_words, 1);
    assert_eq!(diffs[2].stats.removed_words, 0);
}

#[test]
fn dangling_reference_gets_placeholder_label() {
    let src = source();
    let missing = Uuid::new_v4();
    let targets = vec![paragraph_target(missing, ChangeType::ReplaceText, Some("x"))];

    let diffs = build_version_diffs(&src.units, &targets, DiffLimits::default()).unwrap();
    assert_eq!(diffs[0].label, format!("Unknown paragraph {missing}"));
    assert_eq!(diffs[0].segments, vec![Segment::new(SegmentKind::Added, "x")]);
}

#[test]
fn identical_snapshots_have_no_changes() {
    let src = source();
    let targets = vec![
        paragraph_target(src.paragraph, ChangeType::ReplaceText, Some("the slow fox")),
        paragraph_target(src.paragraph, ChangeType::DeleteText, None),
    ];

    let diffs =
        compare_version_targets(&src.units, &targets, &targets, DiffLimits::default()).unwrap();
    assert_eq!(diffs.len(), 2);
    assert!(diffs
        .iter()
        .all(|diff| diff.origin == DiffOrigin::BothVersions && diff.stats.is_unchanged()));
}

#[test]
fn added_and_removed_targets_are_reported_in_order() {
    let src = source();
    let kept = paragraph_target(src.paragraph, ChangeType::ReplaceText, Some("the slow fox"));
    let dropped = paragraph_target(src.paragraph, ChangeType::DeleteText, None);
    let dropped_resolution = VersionTarget {
        paragraph_id: None,
        resolution_id: Some(src.resolution),
        change_type: ChangeType::ReplaceText,
        proposed_text: Some("We protect creation.".to_string()),
    };
    let added = paragraph_target(src.paragraph, ChangeType::AddText, Some("and the hound"));

    let older = vec![dropped, kept.clone(), dropped_resolution];
    let mut revised = kept;
    revised.proposed_text = Some("the slow brown fox".to_string());
    let newer = vec![added, revised];

    let diffs = compare_version_targets(&src.units, &older, &newer, DiffLimits::default()).unwrap();
    let origins: Vec<_> = diffs.iter().map(|diff| diff.origin).collect();
    assert_eq!(
        origins,
        vec![
            DiffOrigin::AddedInNewer,
            DiffOrigin::BothVersions,
            DiffOrigin::RemovedInNewer,
            DiffOrigin::RemovedInNewer,
        ]
    );
    assert_eq!(
        diffs[0].segments,
        vec![Segment::new(SegmentKind::Added, "and the hound")]
    );
    assert_eq!(
        diffs[1].segments,
        vec![
            Segment::new(SegmentKind::Equal, "the slow "),
            Segment::new(SegmentKind::Added, "brown "),
            Segment::new(SegmentKind::Equal, "fox"),
        ]
    );
    // Older-only targets follow their older order.
    assert_eq!(diffs[2].change_type, ChangeType::DeleteText);
    assert_eq!(diffs[3].resolution_id, Some(src.resolution));
    assert_eq!(
        diffs[3].segments,
        vec![Segment::new(SegmentKind::Removed, "We protect creation.")]
    );
}
