//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use textmining_api::auth::CurrentUser;
use textmining_api::config::QueueConfig;
use textmining_api::queue::QueuePublisher;
use textmining_api::service::SubmissionService;
use textmining_api::storage::models::{
    Annotations, FileRequest, Status, Submission, SubmissionRequest, TextMiningMessage,
};
use textmining_api::storage::{Database, DatabaseError, RedbStore, SubmissionStore};
use textmining_api::validator::SubmissionValidator;

pub fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

pub fn alice() -> CurrentUser {
    CurrentUser::new("alice")
}

pub fn request(ft_id: &str, files: &[(&str, &str)]) -> SubmissionRequest {
    SubmissionRequest {
        ft_id: ft_id.to_string(),
        callback: "http://x.org/cb".to_string(),
        files: Some(
            files
                .iter()
                .map(|(filename, url)| FileRequest {
                    filename: filename.to_string(),
                    url: url.to_string(),
                })
                .collect(),
        ),
    }
}

/// A stamped candidate, as the service hands it to the validator
pub fn candidate(ft_id: &str, user: &str, files: &[(&str, &str)]) -> Submission {
    Submission::from_request(request(ft_id, files), user)
}

/// Store a submission for `user` in the given status
pub fn stored_submission(db: &Database, ft_id: &str, user: &str, status: Status) -> Submission {
    let mut submission = candidate(ft_id, user, &[("a.txt", "http://y.org/a")]);
    submission.status = status;
    for file in &mut submission.files {
        file.status = status;
    }
    db.put_submission(&submission).unwrap()
}

pub fn annotations(ft_id: &str, user: &str, filename: &str) -> Annotations {
    Annotations {
        id: None,
        ft_id: ft_id.to_string(),
        user: user.to_string(),
        filename: filename.to_string(),
        anns: vec![serde_json::json!({"exact": "BRCA1", "type": "Gene_Proteins"})],
        date_inserted: None,
        date_modified: None,
    }
}

/// Publisher that records messages and refuses the n-th one (1-based)
#[derive(Default)]
pub struct RecordingPublisher {
    pub fail_on: Option<usize>,
    pub attempts: Mutex<usize>,
    pub published: Mutex<Vec<(String, String, TextMiningMessage)>>,
}

impl RecordingPublisher {
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<TextMiningMessage> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl QueuePublisher for RecordingPublisher {
    async fn publish(&self, queue: &str, message: &TextMiningMessage, exchange: &str) -> bool {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if self.fail_on == Some(attempt) {
            return false;
        }
        self.published.lock().unwrap().push((
            queue.to_string(),
            exchange.to_string(),
            message.clone(),
        ));
        true
    }
}

/// Store wrapper whose writes can be made to fail
pub struct FlakyStore {
    inner: RedbStore,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(db: Database) -> Self {
        Self {
            inner: RedbStore::new(db, true),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool) -> Result<(), DatabaseError> {
        if flag.load(Ordering::SeqCst) {
            return Err(DatabaseError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated storage failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for FlakyStore {
    async fn find_submission(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<Option<Submission>, DatabaseError> {
        Self::check(&self.fail_reads)?;
        self.inner.find_submission(ft_id, user).await
    }

    async fn find_submissions(&self, ft_id: &str) -> Result<Vec<Submission>, DatabaseError> {
        Self::check(&self.fail_reads)?;
        self.inner.find_submissions(ft_id).await
    }

    async fn find_annotations(
        &self,
        ft_id: &str,
        user: &str,
        filename: &str,
    ) -> Result<Option<Annotations>, DatabaseError> {
        Self::check(&self.fail_reads)?;
        self.inner.find_annotations(ft_id, user, filename).await
    }

    async fn list_annotations(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<Vec<Annotations>, DatabaseError> {
        Self::check(&self.fail_reads)?;
        self.inner.list_annotations(ft_id, user).await
    }

    async fn store_submission(&self, submission: &Submission) -> Result<(), DatabaseError> {
        Self::check(&self.fail_writes)?;
        self.inner.store_submission(submission).await
    }

    async fn delete_submission(&self, ft_id: &str, user: &str) -> Result<(), DatabaseError> {
        Self::check(&self.fail_writes)?;
        self.inner.delete_submission(ft_id, user).await
    }
}

pub fn service(
    store: Arc<dyn SubmissionStore>,
    publisher: Arc<dyn QueuePublisher>,
) -> SubmissionService {
    let validator = SubmissionValidator::new(Arc::clone(&store));
    let queue = QueueConfig {
        exchange: "tm-exchange".to_string(),
        submissions_queue: "tm-submissions".to_string(),
        ..Default::default()
    };
    SubmissionService::new(store, publisher, validator, &queue)
}
