//! `Database` trait: single async interface for all persistence.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::channels::UserId;
use crate::conversation::Group;
use crate::error::DatabaseError;
use crate::validation::{ChildName, SubmissionDate};

/// A completed parent submission, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub id: i64,
    pub user_id: UserId,
    pub display_name: String,
    pub group_name: String,
    /// Canonical `dd.mm.yyyy`.
    pub date: String,
    pub child_name: String,
    pub video_attachment: String,
    pub created_at: DateTime<Utc>,
}

/// A submission that has not been written yet. Only constructible from
/// validated parts, so every stored row satisfies the field invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    user_id: UserId,
    display_name: String,
    group_name: String,
    date: String,
    child_name: String,
    video_attachment: String,
}

impl NewSubmission {
    /// Returns `None` if the display name or the video reference is blank.
    pub fn new(
        user_id: UserId,
        display_name: &str,
        group: Group,
        date: SubmissionDate,
        child_name: &ChildName,
        video_attachment: &str,
    ) -> Option<Self> {
        if display_name.trim().is_empty() || video_attachment.trim().is_empty() {
            return None;
        }
        Some(Self {
            user_id,
            display_name: display_name.to_string(),
            group_name: group.as_str().to_string(),
            date: date.to_storage_string(),
            child_name: child_name.as_str().to_string(),
            video_attachment: video_attachment.to_string(),
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
    pub fn group_name(&self) -> &str {
        &self.group_name
    }
    pub fn date(&self) -> &str {
        &self.date
    }
    pub fn child_name(&self) -> &str {
        &self.child_name
    }
    pub fn video_attachment(&self) -> &str {
        &self.video_attachment
    }
}

/// Counts over the `user_settings` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UserCounts {
    pub total_users: u64,
    pub message_mode_users: u64,
}

/// Backend-agnostic database trait covering submissions and user settings.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Submissions ─────────────────────────────────────────────────

    /// Append a submission; assigns `id` and `created_at`.
    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, DatabaseError>;

    /// All submissions for a `dd.mm.yyyy` date, most recent first.
    async fn submissions_by_date(&self, date: &str) -> Result<Vec<Submission>, DatabaseError>;

    /// Number of submissions for a `dd.mm.yyyy` date.
    async fn count_submissions_by_date(&self, date: &str) -> Result<u64, DatabaseError>;

    /// Total number of submissions.
    async fn count_submissions(&self) -> Result<u64, DatabaseError>;

    /// Latest submissions, most recent first.
    async fn recent_submissions(&self, limit: usize) -> Result<Vec<Submission>, DatabaseError>;

    // ── User settings ───────────────────────────────────────────────

    /// Stored `use_bot` flag, or `None` if the user has no row.
    async fn get_use_bot(&self, user_id: UserId) -> Result<Option<bool>, DatabaseError>;

    /// Upsert the `use_bot` flag with a fresh `updated_at`.
    async fn set_use_bot(&self, user_id: UserId, use_bot: bool) -> Result<(), DatabaseError>;

    /// Total users with settings and how many of them are in message mode.
    async fn user_counts(&self) -> Result<UserCounts, DatabaseError>;

    // ── Maintenance ─────────────────────────────────────────────────

    /// Write a consistent copy of the whole database to `path`.
    async fn backup_to(&self, path: &Path) -> Result<(), DatabaseError>;
}
