use std::path::PathBuf;

use serde::Deserialize;

const DEV_SECRET_KEY: &str = "pneumoscan-dev-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret_key: String,
    pub ttl_minutes: i64,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub model_path: PathBuf,
    pub upload_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://pneumoscan.db".into());

        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(v) if !v.is_empty() => v,
            _ => {
                tracing::warn!("SECRET_KEY not set; using development key");
                DEV_SECRET_KEY.to_string()
            }
        };
        let session = SessionConfig {
            secret_key,
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60),
            secure_cookies: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };

        let model_path = std::env::var("MODEL_PATH")
            .unwrap_or_else(|_| "models/pneumonia.onnx".into())
            .into();
        let upload_dir = std::env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "uploads".into())
            .into();

        Ok(Self {
            database_url,
            session,
            model_path,
            upload_dir,
        })
    }
}
