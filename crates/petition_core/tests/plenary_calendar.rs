mod common;

use common::{fixture, Fixture};
use petition_core::model::committee::AssignmentStatus;
use petition_core::model::petition::{Petition, PetitionStatus};
use petition_core::model::plenary::PlenaryActionKind;
use petition_core::repo::assignment_repo::SqliteAssignmentRepository;
use petition_core::repo::document_repo::SqliteDocumentRepository;
use petition_core::repo::petition_repo::SqlitePetitionRepository;
use petition_core::repo::plenary_repo::SqlitePlenaryRepository;
use petition_core::service::plenary_service::PlenaryService;
use petition_core::service::routing_service::RoutingService;
use uuid::Uuid;

const SESSION_START: i64 = 1_780_000_000_000;

fn plenary(fx: &Fixture) -> PlenaryService<SqlitePlenaryRepository<'_>> {
    PlenaryService::new(SqlitePlenaryRepository::new(&fx.conn))
}

/// Submitted petition carried through committee to the given decision.
fn decided(fx: &Fixture, abbreviation: &str, decision: PetitionStatus) -> Petition {
    let petition = fx.submitted();
    let committee = fx.committee(abbreviation);
    let routing = RoutingService::new(
        SqliteAssignmentRepository::new(&fx.conn),
        SqlitePetitionRepository::new(&fx.conn),
        SqliteDocumentRepository::new(&fx.conn),
    );
    let assignment = routing
        .assign(&fx.actors.staff, petition.id, committee.id)
        .unwrap()
        .assignment;
    routing
        .update_assignment_status(&fx.actors.chair, assignment.id, AssignmentStatus::InProgress)
        .unwrap();
    fx.petitions()
        .transition(&fx.actors.staff, petition.id, decision)
        .unwrap();
    fx.petitions().get_petition(petition.id).unwrap()
}

fn status_of(fx: &Fixture, petition_id: Uuid) -> PetitionStatus {
    fx.petitions().get_petition(petition_id).unwrap().status
}

#[test]
fn create_session_requires_staff_and_a_name() {
    let fx = fixture();
    let plenary = plenary(&fx);

    let err = plenary
        .create_session(&fx.actors.chair, "Morning", SESSION_START)
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
    let err = plenary
        .create_session(&fx.actors.staff, "  ", SESSION_START)
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let session = plenary
        .create_session(&fx.actors.staff, " Morning plenary ", SESSION_START)
        .unwrap();
    assert_eq!(session.name, "Morning plenary");
    assert_eq!(plenary.get_session(session.id).unwrap(), session);
    assert_eq!(plenary.get_session(Uuid::new_v4()).unwrap_err().status_code(), 404);
}

#[test]
fn only_committee_decided_petitions_are_scheduled() {
    let fx = fixture();
    let plenary = plenary(&fx);
    let session = plenary
        .create_session(&fx.actors.staff, "Morning", SESSION_START)
        .unwrap();

    let submitted = fx.submitted();
    let err = plenary
        .schedule(&fx.actors.staff, submitted.id, session.id)
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(plenary.calendar(session.id).unwrap().is_empty());

    let approved = decided(&fx, "FA", PetitionStatus::ApprovedByCommittee);
    let rejected = decided(&fx, "CS", PetitionStatus::RejectedByCommittee);

    let first = plenary
        .schedule(&fx.actors.staff, approved.id, session.id)
        .unwrap();
    let second = plenary
        .schedule(&fx.actors.staff, rejected.id, session.id)
        .unwrap();
    assert_eq!(first.item.item_order, 1);
    assert_eq!(second.item.item_order, 2);
    assert_eq!(first.petition_change.to, PetitionStatus::OnCalendar);
    assert_eq!(second.petition_change.from, PetitionStatus::RejectedByCommittee);
    assert_eq!(status_of(&fx, approved.id), PetitionStatus::OnCalendar);

    let calendar = plenary.calendar(session.id).unwrap();
    let petitions: Vec<_> = calendar.iter().map(|item| item.petition_id).collect();
    assert_eq!(petitions, vec![approved.id, rejected.id]);
}

#[test]
fn scheduling_checks_session_and_rejects_repeats() {
    let fx = fixture();
    let plenary = plenary(&fx);
    let session = plenary
        .create_session(&fx.actors.staff, "Morning", SESSION_START)
        .unwrap();
    let approved = decided(&fx, "FA", PetitionStatus::ApprovedByCommittee);

    let err = plenary
        .schedule(&fx.actors.staff, approved.id, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(status_of(&fx, approved.id), PetitionStatus::ApprovedByCommittee);

    plenary
        .schedule(&fx.actors.staff, approved.id, session.id)
        .unwrap();
    let err = plenary
        .schedule(&fx.actors.staff, approved.id, session.id)
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(plenary.calendar(session.id).unwrap().len(), 1);
}

#[test]
fn floor_actions_dispose_or_annotate() {
    let fx = fixture();
    let plenary = plenary(&fx);
    let session = plenary
        .create_session(&fx.actors.staff, "Morning", SESSION_START)
        .unwrap();
    let approved = decided(&fx, "FA", PetitionStatus::ApprovedByCommittee);
    let item = plenary
        .schedule(&fx.actors.staff, approved.id, session.id)
        .unwrap()
        .item;

    let debate = plenary
        .record_plenary_action(
            &fx.actors.staff,
            item.id,
            PlenaryActionKind::Debate,
            Some("Two speeches for, one against"),
        )
        .unwrap();
    assert_eq!(debate.petition_change, None);
    assert_eq!(status_of(&fx, approved.id), PetitionStatus::OnCalendar);

    let adopt = plenary
        .record_plenary_action(&fx.actors.staff, item.id, PlenaryActionKind::Adopt, None)
        .unwrap();
    let change = adopt.petition_change.expect("adoption changes status");
    assert_eq!(change.to, PetitionStatus::Adopted);
    assert!(change.version_num.is_some());
    assert_eq!(status_of(&fx, approved.id), PetitionStatus::Adopted);

    // Disposed petitions take no further floor actions.
    let err = plenary
        .record_plenary_action(&fx.actors.staff, item.id, PlenaryActionKind::Refer, None)
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let calendar = plenary.calendar(session.id).unwrap();
    let kinds: Vec<_> = calendar[0].actions.iter().map(|action| action.action).collect();
    assert_eq!(kinds, vec![PlenaryActionKind::Debate, PlenaryActionKind::Adopt]);
    assert_eq!(
        calendar[0].actions[0].notes.as_deref(),
        Some("Two speeches for, one against")
    );
}

#[test]
fn unknown_calendar_item_or_session_is_not_found() {
    let fx = fixture();
    let plenary = plenary(&fx);
    let err = plenary
        .record_plenary_action(&fx.actors.staff, Uuid::new_v4(), PlenaryActionKind::Defeat, None)
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(plenary.calendar(Uuid::new_v4()).unwrap_err().status_code(), 404);
}
