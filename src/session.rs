//! Typed access to the per-browser session.
//!
//! The session carries the authenticated user's id, the most recent
//! diagnosis (read by the PDF report) and one-shot flash notices.

use serde::{Deserialize, Serialize};
use tower_sessions::{session, Session};

pub const USER_ID_KEY: &str = "user_id";
pub const DIAGNOSIS_KEY: &str = "diagnosis";
const FLASHES_KEY: &str = "_flashes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn css_class(self) -> &'static str {
        match self {
            Level::Info => "notice-info",
            Level::Success => "notice-success",
            Level::Warning => "notice-warning",
            Level::Error => "notice-error",
        }
    }
}

/// A notice shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

/// Marks the session as belonging to `user_id`, issuing a fresh session id.
///
/// Whatever the browser held before (another user's login or diagnosis)
/// is dropped.
pub async fn sign_in(session: &Session, user_id: i64) -> Result<(), session::Error> {
    session.clear().await;
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user_id).await
}

pub async fn user_id(session: &Session) -> Result<Option<i64>, session::Error> {
    session.get::<i64>(USER_ID_KEY).await
}

/// Drops everything held by the session, including the diagnosis.
pub async fn clear(session: &Session) -> Result<(), session::Error> {
    session.flush().await
}

pub async fn set_diagnosis(session: &Session, diagnosis: &str) -> Result<(), session::Error> {
    session.insert(DIAGNOSIS_KEY, diagnosis).await
}

pub async fn diagnosis(session: &Session) -> Result<Option<String>, session::Error> {
    session.get::<String>(DIAGNOSIS_KEY).await
}

pub async fn flash(
    session: &Session,
    level: Level,
    message: impl Into<String>,
) -> Result<(), session::Error> {
    let mut flashes = session
        .get::<Vec<Flash>>(FLASHES_KEY)
        .await?
        .unwrap_or_default();
    flashes.push(Flash {
        level,
        message: message.into(),
    });
    session.insert(FLASHES_KEY, flashes).await
}

pub async fn take_flashes(session: &Session) -> Result<Vec<Flash>, session::Error> {
    Ok(session
        .remove::<Vec<Flash>>(FLASHES_KEY)
        .await?
        .unwrap_or_default())
}
