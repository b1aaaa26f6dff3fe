mod common;

use common::fixture;
use petition_core::model::committee::CommitteeRole;
use petition_core::model::document::DocumentRef;
use petition_core::repo::committee_repo::NewCommittee;
use petition_core::repo::document_repo::{
    CanonicalTextSource, DocumentRepository, SqliteDocumentRepository,
};
use petition_core::service::jurisdiction::JurisdictionPolicy;
use uuid::Uuid;

fn new_committee(name: &str, abbreviation: &str) -> NewCommittee {
    NewCommittee {
        name: name.to_string(),
        abbreviation: abbreviation.to_string(),
        description: String::new(),
    }
}

#[test]
fn committee_abbreviations_are_normalized_and_unique() {
    let fx = fixture();
    let committees = fx.committees();

    let created = committees
        .create_committee(&fx.actors.admin, &new_committee("Faith and Order", " fa "))
        .unwrap();
    assert_eq!(created.abbreviation, "FA");
    assert_eq!(committees.get_committee(created.id).unwrap(), created);

    let err = committees
        .create_committee(&fx.actors.admin, &new_committee("Finance", "FA"))
        .unwrap_err();
    assert_eq!(err.status_code(), 409);

    let err = committees
        .create_committee(&fx.actors.staff, &new_committee("Church and Society", "CS"))
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    let err = committees
        .create_committee(&fx.actors.admin, &new_committee("  ", "CS"))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    committees
        .create_committee(&fx.actors.admin, &new_committee("Church and Society", "CS"))
        .unwrap();
    let abbreviations: Vec<_> = committees
        .list_committees()
        .unwrap()
        .into_iter()
        .map(|committee| committee.abbreviation)
        .collect();
    assert_eq!(abbreviations, vec!["CS", "FA"]);
}

#[test]
fn membership_is_unique_per_committee() {
    let fx = fixture();
    let committee = fx.committee("FA");
    let committees = fx.committees();
    let user = Uuid::new_v4();

    let member = committees
        .add_member(&fx.actors.admin, committee.id, user, CommitteeRole::Chair)
        .unwrap();
    assert_eq!(member.role, CommitteeRole::Chair);

    let err = committees
        .add_member(&fx.actors.admin, committee.id, user, CommitteeRole::Member)
        .unwrap_err();
    assert_eq!(err.status_code(), 409);

    let err = committees
        .add_member(&fx.actors.admin, Uuid::new_v4(), user, CommitteeRole::Member)
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let members = committees.list_members(committee.id).unwrap();
    assert_eq!(members, vec![member]);
}

#[test]
fn jurisdiction_rules_validate_scope() {
    let fx = fixture();
    let committee = fx.committee("FA");
    let committees = fx.committees();
    let other_book = SqliteDocumentRepository::new(&fx.conn)
        .create_book("BOR", "Book of Resolutions")
        .unwrap();

    let err = committees
        .add_jurisdiction(
            &fx.actors.admin,
            committee.id,
            other_book.id,
            Some(fx.canon.section.id),
        )
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let err = committees
        .add_jurisdiction(&fx.actors.admin, committee.id, Uuid::new_v4(), None)
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    committees
        .add_jurisdiction(
            &fx.actors.admin,
            committee.id,
            fx.canon.book.id,
            Some(fx.canon.section.id),
        )
        .unwrap();
    let err = committees
        .add_jurisdiction(
            &fx.actors.admin,
            committee.id,
            fx.canon.book.id,
            Some(fx.canon.section.id),
        )
        .unwrap_err();
    assert_eq!(err.status_code(), 409);

    let table = committees.jurisdiction_table().unwrap();
    assert_eq!(table.rules().len(), 1);
    let docs = SqliteDocumentRepository::new(&fx.conn);
    let unit = docs
        .canonical_unit(DocumentRef::Paragraph(fx.canon.paragraph.id))
        .unwrap()
        .unwrap();
    assert_eq!(table.committees_for(&unit.scope()), vec![committee.id]);
}
