mod common;

use common::{annotations, candidate, stored_submission, test_db};
use textmining_api::storage::models::{Status, TextMiningMessage, UserRecord};

#[test]
fn test_put_and_get_submission() {
    let (_dir, db) = test_db();
    let submission = candidate("PMC1", "alice", &[("a.txt", "http://y.org/a")]);

    let written = db.put_submission(&submission).unwrap();
    assert!(written.id.is_some());
    assert!(written.date_inserted.is_some());
    assert_eq!(written.date_inserted, written.date_modified);

    let retrieved = db
        .get_submission("PMC1", "alice")
        .unwrap()
        .expect("submission should exist");
    assert_eq!(retrieved, written);
    assert_eq!(retrieved.status, Status::Pending);
    assert_eq!(retrieved.files[0].status, Status::Pending);
    assert_eq!(retrieved.callback, "http://x.org/cb");
}

#[test]
fn test_get_submission_is_scoped_by_user() {
    let (_dir, db) = test_db();
    stored_submission(&db, "PMC1", "alice", Status::Pending);

    assert!(db.get_submission("PMC1", "bob").unwrap().is_none());
    assert!(db.get_submission("PMC2", "alice").unwrap().is_none());
}

#[test]
fn test_put_submission_keeps_id_and_insertion_time() {
    let (_dir, db) = test_db();
    let first = stored_submission(&db, "PMC1", "alice", Status::Success);

    let mut replacement = candidate("PMC1", "alice", &[("b.txt", "http://y.org/b")]);
    replacement.id = first.id.clone();
    replacement.date_inserted = first.date_inserted;
    let second = db.put_submission(&replacement).unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.date_inserted, first.date_inserted);
    assert!(second.date_modified >= first.date_modified);

    let retrieved = db.get_submission("PMC1", "alice").unwrap().unwrap();
    assert_eq!(retrieved.files.len(), 1);
    assert_eq!(retrieved.files[0].filename, "b.txt");
    assert_eq!(retrieved.status, Status::Pending);
}

#[test]
fn test_get_submissions_by_ft_id() {
    let (_dir, db) = test_db();
    stored_submission(&db, "PMC1", "alice", Status::Pending);
    stored_submission(&db, "PMC1", "bob", Status::Success);
    stored_submission(&db, "PMC10", "alice", Status::Pending);
    stored_submission(&db, "PMC2", "alice", Status::Pending);

    let submissions = db.get_submissions_by_ft_id("PMC1").unwrap();
    let users: Vec<&str> = submissions.iter().map(|s| s.user.as_str()).collect();
    assert_eq!(users, vec!["alice", "bob"]);
    assert!(submissions.iter().all(|s| s.ft_id == "PMC1"));

    assert!(db.get_submissions_by_ft_id("PMC3").unwrap().is_empty());
}

#[test]
fn test_annotations_are_listed_per_owner() {
    let (_dir, db) = test_db();
    db.put_annotations(&annotations("PMC1", "alice", "a.txt"))
        .unwrap();
    db.put_annotations(&annotations("PMC1", "alice", "b.txt"))
        .unwrap();
    db.put_annotations(&annotations("PMC1", "bob", "a.txt")).unwrap();

    let found = db
        .get_annotations("PMC1", "alice", "b.txt")
        .unwrap()
        .expect("annotations should exist");
    assert_eq!(found.filename, "b.txt");
    assert_eq!(found.anns.len(), 1);
    assert!(found.id.is_some());

    let listed = db.list_annotations("PMC1", "alice").unwrap();
    let names: Vec<&str> = listed.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);

    assert_eq!(db.list_annotations("PMC1", "bob").unwrap().len(), 1);
    assert!(db.list_annotations("PMC1", "carol").unwrap().is_empty());
    assert!(db.get_annotations("PMC1", "bob", "b.txt").unwrap().is_none());
}

#[test]
fn test_delete_submission_removes_annotations() {
    for transactional in [true, false] {
        let (_dir, db) = test_db();
        stored_submission(&db, "PMC1", "alice", Status::Success);
        stored_submission(&db, "PMC1", "bob", Status::Success);
        db.put_annotations(&annotations("PMC1", "alice", "a.txt"))
            .unwrap();
        db.put_annotations(&annotations("PMC1", "bob", "a.txt")).unwrap();

        assert!(db.delete_submission("PMC1", "alice", transactional).unwrap());

        assert!(db.get_submission("PMC1", "alice").unwrap().is_none());
        assert!(db.list_annotations("PMC1", "alice").unwrap().is_empty());
        // Other owners are untouched
        assert!(db.get_submission("PMC1", "bob").unwrap().is_some());
        assert_eq!(db.list_annotations("PMC1", "bob").unwrap().len(), 1);
    }
}

#[test]
fn test_delete_missing_submission() {
    let (_dir, db) = test_db();
    assert!(!db.delete_submission("PMC1", "alice", true).unwrap());
    assert!(!db.delete_submission("PMC1", "alice", false).unwrap());
}

#[test]
fn test_put_and_get_user() {
    let (_dir, db) = test_db();
    db.put_user(&UserRecord {
        username: "alice".to_string(),
        password_hash: "$2b$04$hash".to_string(),
    })
    .unwrap();

    let user = db.get_user("alice").unwrap().expect("user should exist");
    assert_eq!(user.password_hash, "$2b$04$hash");
    assert!(db.get_user("bob").unwrap().is_none());
}

fn message(filename: &str) -> TextMiningMessage {
    TextMiningMessage {
        user: "alice".to_string(),
        ft_id: "PMC1".to_string(),
        status: Status::Pending,
        filename: filename.to_string(),
        url: format!("http://y.org/{filename}"),
    }
}

#[test]
fn test_outbox_sequences_per_queue() {
    let (_dir, db) = test_db();

    assert_eq!(db.append_message("submissions", "", &message("a")).unwrap(), 1);
    assert_eq!(db.append_message("submissions", "", &message("b")).unwrap(), 2);
    assert_eq!(db.append_message("other", "ex", &message("c")).unwrap(), 1);
    assert_eq!(db.append_message("submissions", "", &message("d")).unwrap(), 3);

    let pending = db.pending_messages("submissions").unwrap();
    let filenames: Vec<&str> = pending
        .iter()
        .map(|m| m.message.filename.as_str())
        .collect();
    assert_eq!(filenames, vec!["a", "b", "d"]);
    assert_eq!(pending[2].sequence, 3);

    let other = db.pending_messages("other").unwrap();
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].exchange, "ex");

    assert!(db.pending_messages("missing").unwrap().is_empty());
}

#[test]
fn test_purge_all_keeps_users() {
    let (_dir, db) = test_db();
    stored_submission(&db, "PMC1", "alice", Status::Pending);
    stored_submission(&db, "PMC2", "alice", Status::Success);
    db.put_annotations(&annotations("PMC2", "alice", "a.txt"))
        .unwrap();
    db.append_message("submissions", "", &message("a")).unwrap();
    db.put_user(&UserRecord {
        username: "alice".to_string(),
        password_hash: "hash".to_string(),
    })
    .unwrap();

    let stats = db.purge_all().unwrap();
    assert_eq!(stats.submissions, 2);
    assert_eq!(stats.annotations, 1);
    assert_eq!(stats.messages, 1);

    assert!(db.get_submissions_by_ft_id("PMC1").unwrap().is_empty());
    assert!(db.list_annotations("PMC2", "alice").unwrap().is_empty());
    assert!(db.pending_messages("submissions").unwrap().is_empty());
    assert!(db.get_user("alice").unwrap().is_some());

    // Sequences restart once the outbox is empty
    assert_eq!(db.append_message("submissions", "", &message("b")).unwrap(), 1);
}
