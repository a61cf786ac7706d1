//! End-to-end flows over the relationship core against an in-memory
//! database: accounts, project rosters, reactions, and the friend
//! request lifecycle.

use uuid::Uuid;

use atelier_db::{Database, StoreError};
use atelier_types::models::Role;

fn db() -> Database {
    Database::open_in_memory().unwrap()
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn seed_user(db: &Database, name: &str) -> String {
    let uid = new_id();
    db.create_user(
        &uid,
        &format!("{}@test.com", name.to_lowercase()),
        name,
        "not-a-real-hash",
    )
    .unwrap();
    uid
}

fn seed_project(db: &Database, owner: &str, name: &str, status: &str) -> String {
    let pid = new_id();
    db.create_project(&pid, owner, name, None, status).unwrap();
    pid
}

// -- Users --

#[test]
fn duplicate_email_or_username_conflicts() {
    let db = db();
    seed_user(&db, "Alice");

    let same_email = db.create_user(&new_id(), "alice@test.com", "Alice2", "h");
    assert!(matches!(same_email, Err(StoreError::Conflict(_))));

    let same_username = db.create_user(&new_id(), "other@test.com", "Alice", "h");
    assert!(matches!(same_username, Err(StoreError::Conflict(_))));

    // Only the first account exists.
    assert_eq!(db.list_users(10).unwrap().len(), 1);
}

#[test]
fn get_user_not_found() {
    let db = db();
    assert!(matches!(
        db.get_user(&new_id()),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn list_users_respects_limit() {
    let db = db();
    for name in ["A1", "A2", "A3", "A4"] {
        seed_user(&db, name);
    }
    assert_eq!(db.list_users(2).unwrap().len(), 2);
    assert_eq!(db.list_users(10).unwrap().len(), 4);
}

#[test]
fn account_field_updates() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");

    let updated = db.update_email(&alice, "alice@new.com").unwrap();
    assert_eq!(updated.email, "alice@new.com");

    // Taking Bob's username conflicts; a fresh one works.
    assert!(matches!(
        db.update_username(&alice, "Bob"),
        Err(StoreError::Conflict(_))
    ));
    assert_eq!(db.update_username(&alice, "Alicia").unwrap().username, "Alicia");

    db.update_password(&alice, "new-hash").unwrap();
    assert_eq!(db.get_user(&alice).unwrap().password, "new-hash");

    assert!(matches!(
        db.update_email(&new_id(), "x@y.com"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn combined_account_update_is_all_or_nothing() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    seed_user(&db, "Bob");

    // Username conflicts with Bob's, so the email change must not land
    // either.
    let err = db.update_account(&alice, Some("alice@new.com"), Some("Bob"), None);
    assert!(matches!(err, Err(StoreError::Conflict(_))));

    let row = db.get_user(&alice).unwrap();
    assert_eq!(row.email, "alice@test.com");
    assert_eq!(row.username, "Alice");

    // With no conflict, all requested fields apply together.
    let row = db
        .update_account(&alice, Some("alice@new.com"), Some("Alicia"), Some("h2"))
        .unwrap();
    assert_eq!(row.email, "alice@new.com");
    assert_eq!(row.username, "Alicia");
    assert_eq!(row.password, "h2");

    assert!(matches!(
        db.update_account(&new_id(), Some("x@y.com"), None, None),
        Err(StoreError::NotFound(_))
    ));
}

// -- Projects and roster --

#[test]
fn create_project_seeds_owner_membership() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let pid = seed_project(&db, &alice, "P", "DRAFT");

    let roster = db.get_roster(&pid).unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].member.uid, alice);
    assert_eq!(roster[0].member.role(), Role::Owner);
}

#[test]
fn create_project_requires_existing_owner() {
    let db = db();
    let err = db.create_project(&new_id(), &new_id(), "P", None, "DRAFT");
    assert!(matches!(err, Err(StoreError::NotFound(_))));
}

#[test]
fn list_published_filters_by_status() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    seed_project(&db, &alice, "Draft", "DRAFT");
    let published = seed_project(&db, &alice, "Live", "PUBLISHED");

    let listed = db.list_published().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].pid, published);
}

#[test]
fn update_project_replaces_mutable_fields() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let pid = seed_project(&db, &alice, "P", "DRAFT");

    let row = db
        .update_project(&pid, "P2", Some("now with words"), "PUBLISHED")
        .unwrap();
    assert_eq!(row.name, "P2");
    assert_eq!(row.description.as_deref(), Some("now with words"));
    assert_eq!(row.status, "PUBLISHED");

    // Description is part of the replace: passing None clears it.
    let row = db.update_project(&pid, "P2", None, "PUBLISHED").unwrap();
    assert_eq!(row.description, None);

    assert!(matches!(
        db.update_project(&new_id(), "X", None, "DRAFT"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn add_member_twice_conflicts_update_member_overwrites() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let pid = seed_project(&db, &alice, "P", "DRAFT");

    db.add_member(&pid, &bob, Role::Viewer).unwrap();
    assert!(matches!(
        db.add_member(&pid, &bob, Role::Editor),
        Err(StoreError::Conflict(_))
    ));

    // update_member never fails on an existing row, only overwrites.
    let row = db.update_member(&pid, &bob, Role::Editor).unwrap();
    assert_eq!(row.role(), Role::Editor);
    assert_eq!(db.get_roster(&pid).unwrap().len(), 2);
}

#[test]
fn update_member_inserts_when_absent() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let pid = seed_project(&db, &alice, "P", "DRAFT");

    let row = db.update_member(&pid, &bob, Role::Viewer).unwrap();
    assert_eq!(row.role(), Role::Viewer);
    assert_eq!(db.get_roster(&pid).unwrap().len(), 2);
}

#[test]
fn petition_then_approval() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let charlie = seed_user(&db, "Charlie");
    let pid = seed_project(&db, &alice, "P", "PUBLISHED");

    // Petitioning is an add; petitioning twice conflicts like any add.
    db.add_member(&pid, &charlie, Role::Petition).unwrap();
    assert!(matches!(
        db.add_member(&pid, &charlie, Role::Petition),
        Err(StoreError::Conflict(_))
    ));
    assert_eq!(
        db.get_member(&pid, &charlie).unwrap().unwrap().role(),
        Role::Petition
    );

    // Approval is an update of the same row.
    db.update_member(&pid, &charlie, Role::Viewer).unwrap();
    assert_eq!(
        db.get_member(&pid, &charlie).unwrap().unwrap().role(),
        Role::Viewer
    );
    assert_eq!(db.get_roster(&pid).unwrap().len(), 2);
}

#[test]
fn remove_member() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let pid = seed_project(&db, &alice, "P", "DRAFT");

    db.add_member(&pid, &bob, Role::Viewer).unwrap();
    db.remove_member(&pid, &bob).unwrap();
    assert!(db.get_member(&pid, &bob).unwrap().is_none());
    assert!(matches!(
        db.remove_member(&pid, &bob),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn deleting_a_project_cascades_memberships_and_reactions() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let pid = seed_project(&db, &alice, "P", "PUBLISHED");

    db.add_member(&pid, &bob, Role::Editor).unwrap();
    db.upsert_reaction(&new_id(), &pid, &bob, "UPVOTE").unwrap();

    db.delete_project(&pid).unwrap();

    assert!(matches!(db.get_project(&pid), Err(StoreError::NotFound(_))));
    assert!(db.get_member(&pid, &bob).unwrap().is_none());
    assert_eq!(db.count_reactions(&pid).unwrap(), 0);
    // The users themselves are untouched.
    db.get_user(&bob).unwrap();
}

// -- Reactions --

#[test]
fn reaction_upsert_is_single_row_last_write_wins() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let pid = seed_project(&db, &alice, "P", "PUBLISHED");

    let first = db.upsert_reaction(&new_id(), &pid, &alice, "UPVOTE").unwrap();
    let second = db.upsert_reaction(&new_id(), &pid, &alice, "UPVOTE").unwrap();
    // Same row both times, not a second insert.
    assert_eq!(first.rid, second.rid);
    assert_eq!(db.count_reactions(&pid).unwrap(), 1);
    assert_eq!(db.count_reactions_by_type(&pid, "UPVOTE").unwrap(), 1);

    let changed = db.upsert_reaction(&new_id(), &pid, &alice, "LIKE").unwrap();
    assert_eq!(changed.rid, first.rid);
    assert_eq!(changed.kind, "LIKE");
    assert_eq!(db.count_reactions(&pid).unwrap(), 1);
    assert_eq!(db.count_reactions_by_type(&pid, "UPVOTE").unwrap(), 0);
    assert_eq!(db.count_reactions_by_type(&pid, "LIKE").unwrap(), 1);
}

#[test]
fn reaction_counts_are_zero_for_unknown_project() {
    let db = db();
    assert_eq!(db.count_reactions(&new_id()).unwrap(), 0);
    assert_eq!(db.count_reactions_by_type(&new_id(), "UPVOTE").unwrap(), 0);
}

// -- Friend requests --

#[test]
fn self_friend_request_is_invalid() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    assert!(matches!(
        db.send_friend_request(&alice, &alice),
        Err(StoreError::InvalidArgument(_))
    ));
}

#[test]
fn friend_request_pair_is_unordered() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");

    db.send_friend_request(&alice, &bob).unwrap();
    // Same pair, either direction, any status: blocked.
    assert!(matches!(
        db.send_friend_request(&alice, &bob),
        Err(StoreError::Conflict(_))
    ));
    assert!(matches!(
        db.send_friend_request(&bob, &alice),
        Err(StoreError::Conflict(_))
    ));
}

#[test]
fn accept_requires_original_direction() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");

    db.send_friend_request(&alice, &bob).unwrap();
    // Reversed endpoints do not match the directed record.
    assert!(matches!(
        db.accept_friend_request(&bob, &alice),
        Err(StoreError::NotFound(_))
    ));

    let row = db.accept_friend_request(&alice, &bob).unwrap();
    assert_eq!(row.status, "ACCEPTED");
}

#[test]
fn accepted_friendship_is_symmetric() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");

    db.send_friend_request(&alice, &bob).unwrap();
    db.accept_friend_request(&alice, &bob).unwrap();

    let alices_friends = db.get_friends(&alice).unwrap();
    assert_eq!(alices_friends.len(), 1);
    assert_eq!(alices_friends[0].uid, bob);

    let bobs_friends = db.get_friends(&bob).unwrap();
    assert_eq!(bobs_friends.len(), 1);
    assert_eq!(bobs_friends[0].uid, alice);
}

#[test]
fn rejection_blocks_rerequesting() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");

    db.send_friend_request(&alice, &bob).unwrap();
    let row = db.reject_friend_request(&alice, &bob).unwrap();
    assert_eq!(row.status, "REJECTED");

    // The record stays and keeps blocking both directions.
    assert!(matches!(
        db.send_friend_request(&alice, &bob),
        Err(StoreError::Conflict(_))
    ));
    assert!(matches!(
        db.send_friend_request(&bob, &alice),
        Err(StoreError::Conflict(_))
    ));
    assert!(db.get_friends(&alice).unwrap().is_empty());
}

#[test]
fn pending_requests_are_listed_for_the_recipient() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let charlie = seed_user(&db, "Charlie");

    db.send_friend_request(&alice, &charlie).unwrap();
    db.send_friend_request(&bob, &charlie).unwrap();

    let pending = db.pending_requests_for(&charlie).unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|r| r.recipient_uid == charlie));
    assert!(db.pending_requests_for(&alice).unwrap().is_empty());

    // Acceptance moves it out of the pending list.
    db.accept_friend_request(&alice, &charlie).unwrap();
    assert_eq!(db.pending_requests_for(&charlie).unwrap().len(), 1);
}

// -- The full scenario from the drawing board --

#[test]
fn collaboration_scenario() {
    let db = db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let charlie = seed_user(&db, "Charlie");

    let pid = seed_project(&db, &alice, "Alice's Public Project", "PUBLISHED");
    db.add_member(&pid, &bob, Role::Editor).unwrap();

    let (_, owner, roster) = db.get_project_detail(&pid).unwrap();
    assert_eq!(owner.uid, alice);
    assert_eq!(roster.len(), 2);

    db.upsert_reaction(&new_id(), &pid, &alice, "UPVOTE").unwrap();
    db.upsert_reaction(&new_id(), &pid, &bob, "UPVOTE").unwrap();
    db.upsert_reaction(&new_id(), &pid, &charlie, "LIKE").unwrap();

    assert_eq!(db.count_reactions_by_type(&pid, "UPVOTE").unwrap(), 2);
    assert_eq!(db.count_reactions(&pid).unwrap(), 3);

    // Alice changes her mind.
    db.upsert_reaction(&new_id(), &pid, &alice, "LIKE").unwrap();
    assert_eq!(db.count_reactions_by_type(&pid, "UPVOTE").unwrap(), 1);
    assert_eq!(db.count_reactions_by_type(&pid, "LIKE").unwrap(), 2);
    assert_eq!(db.count_reactions(&pid).unwrap(), 3);
}
