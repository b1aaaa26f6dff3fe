mod common;

use common::{fixture, CANONICAL_TEXT};
use petition_core::auth::{Principal, Role};
use petition_core::error::CoreError;
use petition_core::model::petition::{ChangeType, NewPetition, PetitionStatus, TargetDraft};
use uuid::Uuid;

#[test]
fn display_numbers_are_sequential_per_conference() {
    let fx = fixture();
    let first = fx.draft(&[]);
    let second = fx.draft(&[]);
    assert_eq!(first.display_number, "P-0001");
    assert_eq!(second.display_number, "P-0002");
    assert_eq!(first.status, PetitionStatus::Draft);
    assert_eq!(first.submitter_id, fx.actors.delegate.id);

    let other_conference = fx
        .petitions()
        .create_petition(
            &fx.actors.delegate,
            &NewPetition {
                conference_id: Uuid::new_v4(),
                title: "Elsewhere".to_string(),
                summary: String::new(),
            },
        )
        .unwrap();
    assert_eq!(other_conference.display_number, "P-0001");
}

#[test]
fn public_callers_cannot_create_petitions() {
    let fx = fixture();
    let public = Principal::new(Uuid::new_v4(), Role::Public);
    let err = fx
        .petitions()
        .create_petition(
            &public,
            &NewPetition {
                conference_id: fx.conference_id,
                title: "t".to_string(),
                summary: String::new(),
            },
        )
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
}

#[test]
fn replace_targets_keeps_input_order() {
    let fx = fixture();
    let petition = fx.draft(&[]);
    let targets = vec![
        TargetDraft {
            paragraph_id: None,
            resolution_id: Some(fx.canon.resolution.id),
            change_type: ChangeType::DeleteText,
            proposed_text: None,
        },
        fx.replace_target("The church shall ordain elders."),
    ];

    let stored = fx
        .petitions()
        .replace_targets(&fx.actors.delegate, petition.id, &targets)
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].position, 0);
    assert_eq!(stored[0].resolution_id, Some(fx.canon.resolution.id));
    assert_eq!(stored[1].position, 1);
    assert_eq!(stored[1].change_type, ChangeType::ReplaceText);
}

#[test]
fn invalid_batch_leaves_previous_targets_untouched() {
    let fx = fixture();
    let original = fx.replace_target("The church shall ordain the slow elders.");
    let petition = fx.draft(&[original]);
    let before = fx.petitions().list_targets(petition.id).unwrap();

    let dangling = TargetDraft {
        paragraph_id: Some(Uuid::new_v4()),
        resolution_id: None,
        change_type: ChangeType::ReplaceText,
        proposed_text: Some("text".to_string()),
    };
    let err = fx
        .petitions()
        .replace_targets(
            &fx.actors.delegate,
            petition.id,
            &[fx.replace_target("first is fine"), dangling],
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed(_)), "{err:?}");

    let malformed = TargetDraft {
        paragraph_id: Some(fx.canon.paragraph.id),
        resolution_id: None,
        change_type: ChangeType::AddText,
        proposed_text: None,
    };
    let err = fx
        .petitions()
        .replace_targets(&fx.actors.delegate, petition.id, &[malformed])
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let after = fx.petitions().list_targets(petition.id).unwrap();
    assert_eq!(after, before);
}

#[test]
fn targets_are_frozen_after_submission() {
    let fx = fixture();
    let petition = fx.submitted();
    assert_eq!(petition.status, PetitionStatus::Submitted);
    assert!(petition.submitted_at.is_some());

    let err = fx
        .petitions()
        .replace_targets(
            &fx.actors.delegate,
            petition.id,
            &[fx.replace_target("late change")],
        )
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(fx.petitions().list_targets(petition.id).unwrap().len(), 1);
}

#[test]
fn only_owner_or_staff_may_edit_targets() {
    let fx = fixture();
    let petition = fx.draft(&[]);
    let stranger = Principal::new(Uuid::new_v4(), Role::Delegate);

    let err = fx
        .petitions()
        .replace_targets(&stranger, petition.id, &[fx.replace_target("x")])
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    fx.petitions()
        .replace_targets(&fx.actors.staff, petition.id, &[fx.replace_target("x")])
        .unwrap();
}

#[test]
fn submission_requires_a_target_and_snapshots_version_one() {
    let fx = fixture();
    let petition = fx.draft(&[]);

    let err = fx
        .petitions()
        .submit(&fx.actors.delegate, petition.id)
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(fx.petitions().list_versions(petition.id).unwrap().is_empty());

    fx.petitions()
        .replace_targets(
            &fx.actors.delegate,
            petition.id,
            &[fx.replace_target(CANONICAL_TEXT)],
        )
        .unwrap();
    let change = fx
        .petitions()
        .submit(&fx.actors.delegate, petition.id)
        .unwrap();
    assert_eq!(change.from, PetitionStatus::Draft);
    assert_eq!(change.to, PetitionStatus::Submitted);
    assert_eq!(change.version_num, Some(1));

    let versions = fx.petitions().list_versions(petition.id).unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].stage, PetitionStatus::Submitted);
    assert_eq!(versions[0].created_by, fx.actors.delegate.id);
    assert_eq!(versions[0].targets.len(), 1);
    assert_eq!(
        versions[0].targets[0].proposed_text.as_deref(),
        Some(CANONICAL_TEXT)
    );

    let fetched = fx
        .petitions()
        .get_version(petition.id, versions[0].id)
        .unwrap();
    assert_eq!(fetched, versions[0]);
}

#[test]
fn withdraw_works_from_any_pre_terminal_state_once() {
    let fx = fixture();
    let petition = fx.submitted();

    let change = fx
        .petitions()
        .withdraw(&fx.actors.delegate, petition.id)
        .unwrap();
    assert_eq!(change.to, PetitionStatus::Withdrawn);
    assert_eq!(change.version_num, Some(2));

    let err = fx
        .petitions()
        .withdraw(&fx.actors.delegate, petition.id)
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(
        fx.petitions().get_petition(petition.id).unwrap().status,
        PetitionStatus::Withdrawn
    );
}

#[test]
fn generic_transition_is_limited_to_committee_outcomes() {
    let fx = fixture();
    let petition = fx.submitted();

    let err = fx
        .petitions()
        .transition(&fx.actors.staff, petition.id, PetitionStatus::OnCalendar)
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    // SUBMITTED has no edge to APPROVED_BY_COMMITTEE.
    let err = fx
        .petitions()
        .transition(
            &fx.actors.staff,
            petition.id,
            PetitionStatus::ApprovedByCommittee,
        )
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let err = fx
        .petitions()
        .transition(&fx.actors.delegate, petition.id, PetitionStatus::Amended)
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    assert_eq!(
        fx.petitions().get_petition(petition.id).unwrap().status,
        PetitionStatus::Submitted
    );
    assert_eq!(fx.petitions().list_versions(petition.id).unwrap().len(), 1);
}

#[test]
fn unknown_petition_is_not_found() {
    let fx = fixture();
    let err = fx.petitions().get_petition(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.status_code(), 404);
    let err = fx
        .petitions()
        .submit(&fx.actors.staff, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}
