mod admin;
mod annotations;
mod submissions;

pub use admin::{admin_purge, admin_submissions, health};
pub use annotations::{get_annotations, get_file_annotations};
pub use submissions::{
    delete_submission, delete_submission_without_ft_id, result, submission_status, submit,
};
