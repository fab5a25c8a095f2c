//! Submission lifecycle: validation, persistence and queue fan-out.

use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::config::QueueConfig;
use crate::queue::QueuePublisher;
use crate::storage::models::{
    AnnotationsView, Submission, SubmissionRequest, SubmissionView, TextMiningMessage,
};
use crate::storage::{DatabaseError, SubmissionStore};
use crate::validator::SubmissionValidator;

pub const INTERNAL_DELETION_ERROR: &str =
    "Internal errors prevented submission to be deleted successfully";
pub const DB_ERROR_MSG: &str = "Network errors prevented messages to be stored successfully";
pub const NETWORK_ERROR_MSG: &str = "Network errors prevented messages to be processed successfully";

/// How a request ended, for mapping onto an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Ok,
    ClientError,
    NotFound,
    ServerError,
}

#[derive(Debug)]
pub struct Outcome {
    pub accepted: bool,
    pub errors: Vec<String>,
    pub kind: OutcomeKind,
}

impl Outcome {
    fn ok() -> Self {
        Self {
            accepted: true,
            errors: Vec::new(),
            kind: OutcomeKind::Ok,
        }
    }

    fn rejected(kind: OutcomeKind, errors: Vec<String>) -> Self {
        Self {
            accepted: false,
            errors,
            kind,
        }
    }
}

pub struct SubmissionService {
    exchange: String,
    publisher: Arc<dyn QueuePublisher>,
    store: Arc<dyn SubmissionStore>,
    submissions_queue: String,
    validator: SubmissionValidator,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        publisher: Arc<dyn QueuePublisher>,
        validator: SubmissionValidator,
        queue: &QueueConfig,
    ) -> Self {
        Self {
            exchange: queue.exchange.clone(),
            publisher,
            store,
            submissions_queue: queue.submissions_queue.clone(),
            validator,
        }
    }

    /// Accept a submission: validate it, store it as pending and queue one
    /// message per file.
    ///
    /// Publishing stops at the first file the queue refuses. The stored
    /// submission is kept in that case, so it can have fewer queued messages
    /// than files; nothing here reconciles the two.
    pub async fn process_submission(
        &self,
        user: &CurrentUser,
        request: Option<SubmissionRequest>,
    ) -> Outcome {
        let candidate = request.map(|request| Submission::from_request(request, user.name()));
        let ft_id = candidate
            .as_ref()
            .map(|s| s.ft_id.clone())
            .unwrap_or_default();

        tracing::info!(ft_id = %ft_id, user = %user.name(), "Received submission");

        let verdict = match self.validator.validate_submission(candidate.as_ref()).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(ft_id = %ft_id, user = %user.name(), error = %e, "Failed to read existing submission");
                return Outcome::rejected(OutcomeKind::ClientError, vec![DB_ERROR_MSG.to_string()]);
            }
        };

        let mut submission = match candidate {
            Some(submission) if verdict.accepted => submission,
            _ => {
                tracing::error!(
                    ft_id = %ft_id,
                    user = %user.name(),
                    errors = %verdict.errors.join("\n"),
                    "Submission was rejected as invalid"
                );
                return Outcome::rejected(OutcomeKind::ClientError, verdict.errors);
            }
        };

        let updating = verdict.previous.is_some();
        if let Some(previous) = verdict.previous {
            submission.id = previous.id;
            submission.date_inserted = previous.date_inserted;
        }

        if let Err(e) = self.store.store_submission(&submission).await {
            tracing::error!(ft_id = %ft_id, user = %user.name(), error = %e, "Failed to store submission");
            return Outcome::rejected(OutcomeKind::ClientError, vec![DB_ERROR_MSG.to_string()]);
        }
        tracing::info!(
            ft_id = %ft_id,
            user = %user.name(),
            files = submission.files.len(),
            "{} submission",
            if updating { "Updated" } else { "Inserted new" }
        );

        for file in &submission.files {
            let message = TextMiningMessage {
                user: submission.user.clone(),
                ft_id: submission.ft_id.clone(),
                status: file.status,
                filename: file.filename.clone(),
                url: file.url.clone(),
            };

            if !self
                .publisher
                .publish(&self.submissions_queue, &message, &self.exchange)
                .await
            {
                tracing::error!(
                    ft_id = %ft_id,
                    user = %user.name(),
                    filename = %file.filename,
                    queue = %self.submissions_queue,
                    "Failed to publish submission message, remaining files not queued"
                );
                return Outcome::rejected(
                    OutcomeKind::ClientError,
                    vec![NETWORK_ERROR_MSG.to_string()],
                );
            }
        }

        tracing::info!(ft_id = %ft_id, user = %user.name(), "Processed submission");
        Outcome::ok()
    }

    /// Delete a submission that is no longer pending.
    pub async fn process_deletion(&self, user: &CurrentUser, ft_id: &str) -> Outcome {
        tracing::info!(ft_id, user = %user.name(), "Received deletion");

        let verdict = match self.validator.validate_deletion(ft_id, user.name()).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(ft_id, user = %user.name(), error = %e, "Failed to read submission for deletion");
                return Outcome::rejected(
                    OutcomeKind::ServerError,
                    vec![INTERNAL_DELETION_ERROR.to_string()],
                );
            }
        };

        if !verdict.accepted {
            tracing::error!(
                ft_id,
                user = %user.name(),
                errors = %verdict.errors.join("\n"),
                "Deletion request was rejected as invalid"
            );
            let kind = if verdict.not_found {
                OutcomeKind::NotFound
            } else {
                OutcomeKind::ClientError
            };
            return Outcome::rejected(kind, verdict.errors);
        }

        if let Err(e) = self.store.delete_submission(ft_id, user.name()).await {
            tracing::error!(ft_id, user = %user.name(), error = %e, "Failed to delete submission");
            return Outcome::rejected(
                OutcomeKind::ServerError,
                vec![INTERNAL_DELETION_ERROR.to_string()],
            );
        }

        tracing::info!(ft_id, user = %user.name(), "Submission deleted");
        Outcome::ok()
    }

    pub async fn submission_status(
        &self,
        user: &CurrentUser,
        ft_id: &str,
    ) -> Result<Option<SubmissionView>, DatabaseError> {
        let found = self.store.find_submission(ft_id, user.name()).await?;
        if found.is_none() {
            tracing::info!(ft_id, user = %user.name(), "No submission found");
        }
        Ok(found.map(SubmissionView::from))
    }

    pub async fn annotations_for_file(
        &self,
        user: &CurrentUser,
        ft_id: &str,
        filename: &str,
    ) -> Result<Option<AnnotationsView>, DatabaseError> {
        let found = self
            .store
            .find_annotations(ft_id, user.name(), filename)
            .await?;
        if found.is_none() {
            tracing::info!(ft_id, user = %user.name(), filename, "No annotations found");
        }
        Ok(found.map(AnnotationsView::from))
    }

    pub async fn annotations(
        &self,
        user: &CurrentUser,
        ft_id: &str,
    ) -> Result<Vec<AnnotationsView>, DatabaseError> {
        let list = self.store.list_annotations(ft_id, user.name()).await?;
        if list.is_empty() {
            tracing::info!(ft_id, user = %user.name(), "No annotations found");
        }
        Ok(list.into_iter().map(AnnotationsView::from).collect())
    }

    /// Every user's submission for an ft_id, unprojected
    pub async fn submissions_for_ft_id(
        &self,
        ft_id: &str,
    ) -> Result<Vec<Submission>, DatabaseError> {
        self.store.find_submissions(ft_id).await
    }
}
