use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use tower_sessions::Session;
use tracing::{error, instrument, warn};

use super::{
    repo,
    services::{run_prediction, PredictError, Upload},
};
use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    pages::{
        respond,
        views::{self, HistoryRow, PredictionView},
    },
    session::{self, Level},
    state::AppState,
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const UPLOAD_FIELD: &str = "imagefile";

pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/predict", get(predict_page).post(predict))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

pub fn history_routes() -> Router<AppState> {
    Router::new().route("/history", get(history))
}

pub async fn predict_page(
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    respond(&session, Some(&user.username), "Predict", &views::home(true, None)).await
}

/// POST /predict (multipart, field `imagefile`)
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn predict(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    mut mp: Multipart,
) -> Result<Html<String>, AppError> {
    let outcome = match read_upload(&mut mp).await {
        Ok(Some(upload)) => run_prediction(&state, user.id, upload).await,
        Ok(None) => Err(PredictError::MissingFile),
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(prediction) => {
            session::set_diagnosis(&session, &prediction.record.result).await?;
            let view = PredictionView {
                diagnosis: prediction.diagnosis,
                image_url: prediction.image_url,
            };
            respond(&session, Some(&user.username), "Result", &views::home(true, Some(&view))).await
        }
        Err(PredictError::MissingFile) => {
            warn!("predict without a file");
            session::flash(&session, Level::Warning, "No file selected.").await?;
            predict_page(session, CurrentUser(user)).await
        }
        Err(PredictError::Upload(e)) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(error = %e, "upload over size limit");
            session::flash(&session, Level::Warning, "File too large. The limit is 20 MiB.").await?;
            predict_page(session, CurrentUser(user)).await
        }
        Err(e) => {
            error!(error = %e, "prediction failed");
            session::flash(
                &session,
                Level::Error,
                "Prediction failed. Please try another image.",
            )
            .await?;
            predict_page(session, CurrentUser(user)).await
        }
    }
}

/// First `imagefile` field of the form, `None` when the form has none.
async fn read_upload(mp: &mut Multipart) -> Result<Option<Upload>, MultipartError> {
    while let Some(field) = mp.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let body = field.bytes().await?;
        return Ok(Some(Upload {
            file_name,
            content_type,
            body,
        }));
    }
    Ok(None)
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn history(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let rows: Vec<HistoryRow> = repo::list_by_user(&state.db, user.id)
        .await?
        .into_iter()
        .map(|r| HistoryRow {
            image_url: state.storage.public_url(&r.image_path),
            result: r.result,
            created_at: r.created_at,
        })
        .collect();
    respond(&session, Some(&user.username), "History", &views::history(&rows)).await
}
