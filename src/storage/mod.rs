mod annotations;
pub mod db;
pub mod models;
mod outbox;
mod store;
mod submissions;
mod tables;
mod users;

pub use db::{Database, DatabaseError};
pub use store::{RedbStore, SubmissionStore};
pub use tables::*;
