//! Persistence layer: libSQL-backed submissions and user settings.

pub mod backup;
pub mod libsql_backend;
pub mod migrations;
pub mod preferences;
pub mod submissions;
pub mod traits;

pub use backup::BackupManager;
pub use libsql_backend::LibSqlBackend;
pub use preferences::PreferenceStore;
pub use submissions::SubmissionRepository;
pub use traits::{Database, NewSubmission, Submission, UserCounts};
