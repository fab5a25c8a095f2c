//! Acceptance rules for submissions and deletions.
//!
//! Every applicable check runs and all violations are reported together, in
//! a fixed order. Checks that need a field (per-file checks need files, the
//! store lookup needs an ft_id) are skipped when that field is missing.

use std::collections::HashSet;
use std::sync::Arc;

use crate::europepmc::DocumentRegistry;
use crate::storage::models::{FileInfo, Submission};
use crate::storage::{DatabaseError, SubmissionStore};

pub const NULL_ERROR: &str = "Submission message can not be empty";
pub const FT_ID_EMPTY_ERROR: &str = "ft_id field can not be empty";
pub const FT_ID_EMPTY_URL_PATH_DELETE_ERROR: &str =
    "ft_id parameter mandatory in the URL path (i.e. /delete/PMC1234567)";
pub const FT_ID_NOT_EXISTING_IN_EPMC_ERROR: &str = "ft_id not existing in Europe PMC";
pub const SUBMISSION_ALREADY_EXISTING_ERROR: &str =
    "It exists already a submission for this user and ft_id in pending state";
pub const CALLBACK_EMPTY_ERROR: &str = "callback field can not be empty";
pub const CALLBACK_INVALID_URL_ERROR: &str = "callback field must be a valid URL";
pub const NO_FILE_ERROR: &str = "The submission should contain at least one file";

pub fn file_url_not_valid_error(index: usize) -> String {
    format!("The url is not valid for file number {index}")
}

pub fn file_url_empty_error(index: usize) -> String {
    format!("The url is not populated for file number {index}")
}

pub fn file_name_empty_error(index: usize) -> String {
    format!("The filename is not populated for file number {index}")
}

pub fn submission_not_found_error(ft_id: &str) -> String {
    format!("Can not be found a submission with ft_id {ft_id}")
}

pub fn submission_pending_deletion_error(ft_id: &str) -> String {
    format!(
        "Submission with ft_id {ft_id} still to be fully processed. \
         It can be deleted only afterwards the processing has been fully completed"
    )
}

pub fn duplicate_filename_error(filename: &str) -> String {
    format!("File {filename} appears more than once in the request body")
}

const URL_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Outcome of validating a submission candidate.
#[derive(Debug, Default)]
pub struct SubmissionVerdict {
    pub accepted: bool,
    pub errors: Vec<String>,
    /// Existing, no longer pending submission for the same `(ft_id, user)`.
    /// The new record replaces it and keeps its id and insertion time.
    pub previous: Option<Submission>,
}

/// Outcome of validating a deletion request.
#[derive(Debug, Default)]
pub struct DeletionVerdict {
    pub accepted: bool,
    pub errors: Vec<String>,
    /// Rejected because there is nothing to delete
    pub not_found: bool,
}

/// Ordered, duplicate-free list of violation messages
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.0.contains(&message) {
            self.0.push(message);
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

pub struct SubmissionValidator {
    store: Arc<dyn SubmissionStore>,
    registry: Option<Arc<dyn DocumentRegistry>>,
}

impl SubmissionValidator {
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self {
            store,
            registry: None,
        }
    }

    /// Also require ft_ids to be known to the given registry.
    pub fn with_registry(mut self, registry: Arc<dyn DocumentRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate a fully stamped submission candidate (owner and status set).
    ///
    /// Fails only when the store cannot be read.
    pub async fn validate_submission(
        &self,
        candidate: Option<&Submission>,
    ) -> Result<SubmissionVerdict, DatabaseError> {
        let Some(submission) = candidate else {
            return Ok(SubmissionVerdict {
                accepted: false,
                errors: vec![NULL_ERROR.to_string()],
                previous: None,
            });
        };

        let mut violations = Violations::default();
        let mut previous = None;

        if is_blank(&submission.ft_id) {
            violations.push(FT_ID_EMPTY_ERROR);
        } else {
            if let Some(existing) = self
                .store
                .find_submission(&submission.ft_id, &submission.user)
                .await?
            {
                if existing.status.is_pending() {
                    violations.push(SUBMISSION_ALREADY_EXISTING_ERROR);
                } else {
                    previous = Some(existing);
                }
            }

            if !self.ft_id_known(&submission.ft_id).await {
                violations.push(FT_ID_NOT_EXISTING_IN_EPMC_ERROR);
            }
        }

        if is_blank(&submission.callback) {
            violations.push(CALLBACK_EMPTY_ERROR);
        } else if !is_valid_url(&submission.callback) {
            violations.push(CALLBACK_INVALID_URL_ERROR);
        }

        if submission.files.is_empty() {
            violations.push(NO_FILE_ERROR);
        }

        for (i, file) in submission.files.iter().enumerate() {
            let index = i + 1;
            if is_blank(&file.filename) {
                violations.push(file_name_empty_error(index));
            }
            if is_blank(&file.url) {
                violations.push(file_url_empty_error(index));
            } else if !is_valid_url(&file.url) {
                violations.push(file_url_not_valid_error(index));
            }
        }

        if let Some(filename) = first_duplicate_filename(&submission.files) {
            violations.push(duplicate_filename_error(filename));
        }

        let accepted = violations.is_empty();
        if !accepted {
            tracing::debug!(
                ft_id = %submission.ft_id,
                user = %submission.user,
                violations = violations.0.len(),
                "Submission failed validation"
            );
        }

        Ok(SubmissionVerdict {
            accepted,
            errors: violations.into_vec(),
            previous: if accepted { previous } else { None },
        })
    }

    /// Validate deleting the submission `user` made for `ft_id`.
    pub async fn validate_deletion(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<DeletionVerdict, DatabaseError> {
        if is_blank(ft_id) {
            return Ok(DeletionVerdict {
                accepted: false,
                errors: vec![FT_ID_EMPTY_URL_PATH_DELETE_ERROR.to_string()],
                not_found: false,
            });
        }

        match self.store.find_submission(ft_id, user).await? {
            None => Ok(DeletionVerdict {
                accepted: false,
                errors: vec![submission_not_found_error(ft_id)],
                not_found: true,
            }),
            Some(existing) if existing.status.is_pending() => Ok(DeletionVerdict {
                accepted: false,
                errors: vec![submission_pending_deletion_error(ft_id)],
                not_found: false,
            }),
            Some(_) => Ok(DeletionVerdict {
                accepted: true,
                errors: Vec::new(),
                not_found: false,
            }),
        }
    }

    /// A registry outage does not block submissions.
    async fn ft_id_known(&self, ft_id: &str) -> bool {
        let Some(registry) = &self.registry else {
            return true;
        };

        match registry.ft_id_exists(ft_id).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(ft_id, error = %e, "Could not verify ft_id, skipping check");
                true
            }
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// The first non-blank filename that repeats an earlier one.
fn first_duplicate_filename(files: &[FileInfo]) -> Option<&str> {
    let mut seen = HashSet::new();
    files
        .iter()
        .map(|file| file.filename.as_str())
        .filter(|filename| !is_blank(filename))
        .find(|filename| !seen.insert(*filename))
}

/// URL syntax check: http, https or ftp with a host. Local hosts
/// (single-label names, loopback and other IP literals) are accepted.
pub fn is_valid_url(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((scheme, rest)) = raw.split_once("://") else {
        return false;
    };
    if !URL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) || rest.is_empty() {
        return false;
    }

    let Ok(url) = reqwest::Url::parse(raw) else {
        return false;
    };

    match url.host_str() {
        Some(host) if host.starts_with('[') => true,
        Some(host) if host.parse::<std::net::Ipv4Addr>().is_ok() => true,
        Some(host) => is_valid_hostname(host),
        None => false,
    }
}

fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if !labels.iter().all(|label| is_valid_label(label)) {
        return false;
    }

    match labels.as_slice() {
        [_] => true,
        [.., tld] => {
            tld.starts_with("xn--")
                || (tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        }
        [] => false,
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::Status;

    fn file(filename: &str) -> FileInfo {
        FileInfo {
            filename: filename.to_string(),
            url: "http://y.org/a".to_string(),
            status: Status::Pending,
            error_component: None,
        }
    }

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_url("http://x.org/cb"));
        assert!(is_valid_url("https://europepmc.org/api/fulltextRepo?pprId=PPR1"));
        assert!(is_valid_url("ftp://files.example.org/a.txt"));
        assert!(is_valid_url("http://localhost:8080/cb"));
        assert!(is_valid_url("http://worker/cb"));
        assert!(is_valid_url("http://127.0.0.1/a"));
        assert!(is_valid_url("http://[::1]:9000/a"));
        assert!(is_valid_url("HTTP://X.ORG/cb"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("www.example.org"));
        assert!(!is_valid_url("http://"));
        assert!(!is_valid_url("http:/x.org"));
        assert!(!is_valid_url("mailto:someone@x.org"));
        assert!(!is_valid_url("file:///etc/passwd"));
        assert!(!is_valid_url("http://-bad-.org"));
        assert!(!is_valid_url("http://x.org/a b"));
        assert!(!is_valid_url("http://under_score.org"));
        assert!(!is_valid_url("http://example.123"));
    }

    #[test]
    fn test_first_duplicate_filename() {
        assert_eq!(first_duplicate_filename(&[file("a"), file("b")]), None);
        assert_eq!(
            first_duplicate_filename(&[file("a"), file("b"), file("b"), file("a")]),
            Some("b")
        );
        assert_eq!(first_duplicate_filename(&[file(""), file(" "), file("")]), None);
    }

    #[test]
    fn test_violations_are_deduplicated() {
        let mut violations = Violations::default();
        violations.push("one");
        violations.push("two");
        violations.push("one");
        assert_eq!(violations.into_vec(), vec!["one", "two"]);
    }
}
