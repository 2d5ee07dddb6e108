use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{repo, repo_types::HistoryRecord};
use crate::{
    model::{Diagnosis, InferenceError},
    state::AppState,
    storage::upload_key,
};

/// An image received from the upload form.
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

pub struct Prediction {
    pub record: HistoryRecord,
    pub diagnosis: Diagnosis,
    pub image_url: String,
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("no file uploaded")]
    MissingFile,
    #[error("reading upload failed: {0}")]
    Upload(#[from] axum::extract::multipart::MultipartError),
    #[error("storing upload failed: {0}")]
    Storage(anyhow::Error),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("inference worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    #[error("saving history failed: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// Stores the upload, classifies it and records the outcome.
///
/// Either every step succeeds and exactly one history record exists
/// for it, or nothing is kept: the stored file is removed and no
/// record is written.
pub async fn run_prediction(
    state: &AppState,
    user_id: i64,
    upload: Upload,
) -> Result<Prediction, PredictError> {
    if upload.file_name.trim().is_empty() || upload.body.is_empty() {
        return Err(PredictError::MissingFile);
    }

    let key = upload_key(user_id, upload.content_type.as_deref(), &upload.file_name);
    state
        .storage
        .put_object(&key, upload.body.clone())
        .await
        .map_err(PredictError::Storage)?;
    debug!(%key, bytes = upload.body.len(), "upload stored");

    match classify_and_record(state, user_id, &key, upload.body).await {
        Ok(prediction) => Ok(prediction),
        Err(e) => {
            if let Err(cleanup) = state.storage.delete_object(&key).await {
                warn!(error = %cleanup, %key, "failed to remove upload after error");
            }
            Err(e)
        }
    }
}

async fn classify_and_record(
    state: &AppState,
    user_id: i64,
    key: &str,
    body: Bytes,
) -> Result<Prediction, PredictError> {
    let classifier = state.classifier.clone();
    let probability = tokio::task::spawn_blocking(move || classifier.classify(&body)).await??;
    let diagnosis = Diagnosis::from_probability(probability);
    let result = diagnosis.to_string();

    let mut tx = state.db.begin().await?;
    let record = repo::insert_record_tx(&mut tx, user_id, key, &result).await?;
    tx.commit().await?;

    info!(user_id, record_id = record.id, probability, %result, "prediction recorded");
    Ok(Prediction {
        image_url: state.storage.public_url(key),
        record,
        diagnosis,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::repo_types::User,
        model::testing::{FailingClassifier, FixedClassifier},
    };

    fn upload(name: &str, body: &'static [u8]) -> Upload {
        Upload {
            file_name: name.into(),
            content_type: Some("image/png".into()),
            body: Bytes::from_static(body),
        }
    }

    fn stored_files(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|e| {
                        if e.path().is_dir() {
                            stored_files(&e.path())
                        } else {
                            1
                        }
                    })
                    .sum()
            })
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn successful_prediction_creates_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(Arc::new(FixedClassifier(0.82)), dir.path()).await;
        let alice = User::create(&state.db, "alice", "h").await.unwrap();

        let prediction = run_prediction(&state, alice.id, upload("scan.png", b"img"))
            .await
            .unwrap();
        assert_eq!(prediction.record.result, "Positive for Pneumonia (82.00%)");
        assert_eq!(prediction.record.user_id, alice.id);
        assert!(prediction.image_url.starts_with(&format!("/uploads/{}/", alice.id)));

        let records = repo::list_by_user(&state.db, alice.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, prediction.record.id);
        assert_eq!(stored_files(dir.path()), 1);
    }

    #[tokio::test]
    async fn same_file_name_from_two_users_does_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(Arc::new(FixedClassifier(0.2)), dir.path()).await;
        let alice = User::create(&state.db, "alice", "h").await.unwrap();
        let bob = User::create(&state.db, "bob", "h").await.unwrap();

        let a = run_prediction(&state, alice.id, upload("scan.png", b"a")).await.unwrap();
        let b = run_prediction(&state, bob.id, upload("scan.png", b"b")).await.unwrap();
        assert_ne!(a.record.image_path, b.record.image_path);
        assert_eq!(stored_files(dir.path()), 2);
    }

    #[tokio::test]
    async fn failed_inference_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(Arc::new(FailingClassifier), dir.path()).await;
        let alice = User::create(&state.db, "alice", "h").await.unwrap();

        let err = run_prediction(&state, alice.id, upload("scan.png", b"img"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PredictError::Inference(_)));
        assert!(repo::list_by_user(&state.db, alice.id).await.unwrap().is_empty());
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn failed_insert_removes_upload() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(Arc::new(FixedClassifier(0.9)), dir.path()).await;

        // no such user: the foreign key rejects the row
        let err = run_prediction(&state, 4242, upload("scan.png", b"img"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PredictError::Persistence(_)));
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_file_is_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(Arc::new(FixedClassifier(0.9)), dir.path()).await;

        let err = run_prediction(&state, 1, upload("", b"img")).await.err().unwrap();
        assert!(matches!(err, PredictError::MissingFile));
        let err = run_prediction(&state, 1, upload("scan.png", b"")).await.err().unwrap();
        assert!(matches!(err, PredictError::MissingFile));
        assert_eq!(stored_files(dir.path()), 0);
    }
}
