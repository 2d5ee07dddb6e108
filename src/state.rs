use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::model::{self, Classifier};
use crate::storage::{LocalStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub classifier: Arc<dyn Classifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = crate::db::connect(&config.database_url).await?;
        crate::db::migrate(&db).await?;

        let storage = Arc::new(LocalStorage::new(&config.upload_dir).await?) as Arc<dyn StorageClient>;

        // loaded once, shared read-only by every request
        let model_path = config.model_path.clone();
        let classifier = tokio::task::spawn_blocking(move || model::load(&model_path)).await??;

        Ok(Self::from_parts(db, config, storage, classifier))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
            classifier,
        }
    }

    /// In-memory database, uploads under `upload_dir`, the given classifier.
    #[cfg(test)]
    pub async fn for_tests(classifier: Arc<dyn Classifier>, upload_dir: &std::path::Path) -> Self {
        use crate::config::SessionConfig;

        let db = crate::db::memory().await;
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            session: SessionConfig {
                secret_key: "test-secret".into(),
                ttl_minutes: 5,
                secure_cookies: false,
            },
            model_path: "unused.onnx".into(),
            upload_dir: upload_dir.to_path_buf(),
        });
        let storage = Arc::new(
            LocalStorage::new(upload_dir)
                .await
                .expect("upload dir is creatable"),
        ) as Arc<dyn StorageClient>;
        Self::from_parts(db, config, storage, classifier)
    }
}
