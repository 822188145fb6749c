//! SubmissionRepository: append-only store of completed parent submissions.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::DatabaseError;
use crate::store::traits::{Database, NewSubmission, Submission};
use crate::validation::SubmissionDate;

/// Append and query-by-date over the `submissions` table.
pub struct SubmissionRepository {
    db: Arc<dyn Database>,
}

impl SubmissionRepository {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Write a submission. Storage faults are logged and reported as `false`.
    pub async fn append(&self, new: &NewSubmission) -> bool {
        match self.db.insert_submission(new).await {
            Ok(stored) => {
                debug!(
                    submission_id = stored.id,
                    user_id = stored.user_id,
                    group = %stored.group_name,
                    date = %stored.date,
                    "Submission saved"
                );
                true
            }
            Err(e) => {
                error!(user_id = new.user_id(), date = new.date(), "Failed to save submission: {e}");
                false
            }
        }
    }

    /// All submissions for `date`, most recent first. No matches is an
    /// empty list.
    pub async fn find_by_date(
        &self,
        date: &SubmissionDate,
    ) -> Result<Vec<Submission>, DatabaseError> {
        self.db.submissions_by_date(&date.to_storage_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Group;
    use crate::store::LibSqlBackend;
    use crate::validation::{validate_date, validate_name};

    async fn repo() -> SubmissionRepository {
        SubmissionRepository::new(Arc::new(LibSqlBackend::new_memory().await.unwrap()))
    }

    fn submission(date: &str, child: &str) -> NewSubmission {
        NewSubmission::new(
            42,
            "Анна Петрова",
            Group::parse("Комета").unwrap(),
            validate_date(date).unwrap(),
            &validate_name(child).unwrap(),
            "video-1_456",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn append_then_find_returns_exact_entry() {
        let repo = repo().await;
        let new = submission("01.12.2024", "Ivan Ivanov");
        assert!(repo.append(&new).await);

        let found = repo
            .find_by_date(&validate_date("01.12.2024").unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let s = &found[0];
        assert_eq!(s.user_id, 42);
        assert_eq!(s.display_name, "Анна Петрова");
        assert_eq!(s.group_name, "Комета");
        assert_eq!(s.date, "01.12.2024");
        assert_eq!(s.child_name, "Ivan Ivanov");
        assert_eq!(s.video_attachment, "video-1_456");
    }

    #[tokio::test]
    async fn find_with_no_matches_is_empty() {
        let repo = repo().await;
        let found = repo
            .find_by_date(&validate_date("15.06.2023").unwrap())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn unpadded_dates_match_canonical_rows() {
        let repo = repo().await;
        assert!(repo.append(&submission("1.2.2024", "Ivan Ivanov")).await);

        let found = repo
            .find_by_date(&validate_date("01.02.2024").unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date, "01.02.2024");
    }

    #[test]
    fn new_submission_rejects_blank_fields() {
        let group = Group::parse("Вега").unwrap();
        let date = validate_date("01.12.2024").unwrap();
        let name = validate_name("Ivan Ivanov").unwrap();
        assert!(NewSubmission::new(1, "  ", group, date, &name, "video1_2").is_none());
        assert!(NewSubmission::new(1, "Анна", group, date, &name, "").is_none());
        assert!(NewSubmission::new(1, "Анна", group, date, &name, "video1_2").is_some());
    }
}
