//! Status endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Local;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::DatabaseError;
use crate::store::{BackupManager, Database, Submission};
use crate::validation::DATE_FORMAT;

/// Latest submissions listed on `/stats`.
const RECENT_LIMIT: usize = 5;

/// Shared state for status routes.
#[derive(Clone)]
pub struct StatusState {
    pub db: Arc<dyn Database>,
    pub backups: Arc<BackupManager>,
}

#[derive(Debug, Serialize)]
struct RecentSubmission {
    child_name: String,
    group: String,
    date: String,
    time: String,
}

impl From<Submission> for RecentSubmission {
    fn from(s: Submission) -> Self {
        Self {
            child_name: s.child_name,
            group: s.group_name,
            date: s.date,
            time: s.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Stats {
    status: &'static str,
    total_submissions: u64,
    total_users: u64,
    message_mode_users: u64,
    recent_submissions: Vec<RecentSubmission>,
    timestamp: String,
}

/// GET /
///
/// Human-readable status page with today's submission count.
async fn index(State(state): State<StatusState>) -> Html<String> {
    let now = Local::now();
    let today = now.format(DATE_FORMAT).to_string();
    let count = state
        .db
        .count_submissions_by_date(&today)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to count today's submissions: {e}");
            0
        });

    Html(format!(
        r#"<html>
    <head>
        <title>VK Video Bot</title>
        <meta charset="utf-8">
        <style>
            body {{ font-family: Arial, sans-serif; margin: 40px; }}
            .status {{ color: green; font-weight: bold; }}
        </style>
    </head>
    <body>
        <h1>✅ Бот для ВКонтакте работает!</h1>
        <p>Время сервера: {time}</p>
        <p>Статус: <span class="status">🟢 Активен</span></p>
        <p>Заявок сегодня: {count}</p>
        <p><a href="/health">Проверка здоровья</a> | <a href="/stats">Статистика</a> | <a href="/backup">Создать бэкап</a></p>
    </body>
</html>"#,
        time = now.format("%Y-%m-%d %H:%M:%S"),
    ))
}

/// GET /health
async fn health() -> &'static str {
    "OK"
}

async fn collect_stats(db: &dyn Database) -> Result<Stats, DatabaseError> {
    let total_submissions = db.count_submissions().await?;
    let users = db.user_counts().await?;
    let recent = db.recent_submissions(RECENT_LIMIT).await?;
    Ok(Stats {
        status: "active",
        total_submissions,
        total_users: users.total_users,
        message_mode_users: users.message_mode_users,
        recent_submissions: recent.into_iter().map(RecentSubmission::from).collect(),
        timestamp: Local::now().to_rfc3339(),
    })
}

/// GET /stats
///
/// Pretty-printed JSON counters, or `{"error": ...}` with a 500.
async fn stats(State(state): State<StatusState>) -> Response {
    let (status, body) = match collect_stats(state.db.as_ref()).await {
        Ok(stats) => (
            StatusCode::OK,
            serde_json::to_string_pretty(&stats).unwrap_or_default(),
        ),
        Err(e) => {
            error!("Failed to collect stats: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": e.to_string() }).to_string(),
            )
        }
    };
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response()
}

/// GET /backup
async fn backup(State(state): State<StatusState>) -> String {
    match state.backups.create_snapshot().await {
        Ok(_) => "✅ Бэкап создан успешно!".to_string(),
        Err(e) => {
            error!("Backup failed: {e}");
            format!("❌ Ошибка создания бэкапа: {e}")
        }
    }
}

/// Build the status routes.
pub fn status_routes(state: StatusState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/backup", get(backup))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
