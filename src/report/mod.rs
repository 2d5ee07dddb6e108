use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use time::OffsetDateTime;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::{auth::extractors::CurrentUser, error::AppError, session, state::AppState};

pub mod pdf;

use pdf::{render_report, ReportData};

/// Shown when the session holds no diagnosis yet.
pub const NO_DIAGNOSIS: &str = "N/A";

pub fn router() -> Router<AppState> {
    Router::new().route("/generate-pdf", get(generate_pdf))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn generate_pdf(
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let diagnosis = session::diagnosis(&session)
        .await?
        .unwrap_or_else(|| NO_DIAGNOSIS.to_string());

    let bytes = render_report(&ReportData {
        username: &user.username,
        diagnosis: &diagnosis,
        generated_at: OffsetDateTime::now_utc(),
    })?;
    info!(bytes = bytes.len(), "report generated");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"report.pdf\""),
        ],
        bytes,
    )
        .into_response())
}
