use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a submission and of each of its files.
///
/// Only `Pending` is ever assigned by this service; the text-mining worker
/// moves records to the other states when it writes its results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Failed,
    Pending,
    Success,
}

impl Status {
    pub fn is_pending(self) -> bool {
        matches!(self, Status::Pending)
    }
}

/// A file belonging to a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub filename: String,
    pub url: String,
    pub status: Status,
    /// Diagnostic written by the worker when processing of this file fails
    #[serde(default)]
    pub error_component: Option<String>,
}

/// A submission record stored in redb, keyed by `(ft_id, user)`.
///
/// `id`, `date_inserted` and `date_modified` are owned by the store and are
/// filled in on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub id: Option<String>,
    pub ft_id: String,
    pub user: String,
    pub callback: String,
    pub status: Status,
    pub files: Vec<FileInfo>,
    #[serde(default)]
    pub date_inserted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_modified: Option<DateTime<Utc>>,
}

impl Submission {
    /// Build the candidate record for a request made by `user`.
    ///
    /// The owner and the initial `Pending` status are stamped here, on the
    /// submission and on every file, so the record is validated and stored in
    /// its final initial state.
    pub fn from_request(request: SubmissionRequest, user: &str) -> Self {
        let files = request
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|file| FileInfo {
                filename: file.filename,
                url: file.url,
                status: Status::Pending,
                error_component: None,
            })
            .collect();

        Self {
            id: None,
            ft_id: request.ft_id,
            user: user.to_string(),
            callback: request.callback,
            status: Status::Pending,
            files,
            date_inserted: None,
            date_modified: None,
        }
    }
}

/// Text-mining output for one file of a submission, written by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    #[serde(default)]
    pub id: Option<String>,
    pub ft_id: String,
    pub user: String,
    pub filename: String,
    #[serde(default)]
    pub anns: Vec<serde_json::Value>,
    #[serde(default)]
    pub date_inserted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_modified: Option<DateTime<Utc>>,
}

/// An API account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    /// bcrypt hash
    pub password_hash: String,
}

// ============================================================================
// Wire types
// ============================================================================

/// Body of `POST /submit`.
///
/// There is deliberately no `user` or `status` here: unknown fields are
/// ignored, so a client cannot set them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ft_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub callback: String,
    #[serde(default)]
    pub files: Option<Vec<FileRequest>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub filename: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

/// An explicit `null` reads as an empty string, so it reaches the validator.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One unit of work for the text-mining worker, published per file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMiningMessage {
    pub user: String,
    pub ft_id: String,
    pub status: Status,
    pub filename: String,
    pub url: String,
}

/// Public projection of a submission; store-owned fields, the owner and
/// worker diagnostics are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub ft_id: String,
    pub callback: String,
    pub status: Status,
    pub files: Vec<FileView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileView {
    pub filename: String,
    pub url: String,
    pub status: Status,
}

/// Public projection of an annotations record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationsView {
    pub ft_id: String,
    pub filename: String,
    pub anns: Vec<serde_json::Value>,
}

impl From<Submission> for SubmissionView {
    fn from(submission: Submission) -> Self {
        Self {
            ft_id: submission.ft_id,
            callback: submission.callback,
            status: submission.status,
            files: submission
                .files
                .into_iter()
                .map(|file| FileView {
                    filename: file.filename,
                    url: file.url,
                    status: file.status,
                })
                .collect(),
        }
    }
}

impl From<Annotations> for AnnotationsView {
    fn from(annotations: Annotations) -> Self {
        Self {
            ft_id: annotations.ft_id,
            filename: annotations.filename,
            anns: annotations.anns,
        }
    }
}

/// A message held in the local queue outbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    pub sequence: u64,
    pub exchange: String,
    pub message: TextMiningMessage,
    pub enqueued_at: DateTime<Utc>,
}
