use std::net::SocketAddr;

use axum::Router;
use sha2::{Digest, Sha512};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{
    cookie::{Key, SameSite},
    Expiry, MemoryStore, SessionManagerLayer,
};

use crate::state::AppState;
use crate::storage::PUBLIC_PREFIX;
use crate::{auth, pages, predictions, report};

pub fn build_app(state: AppState) -> Router {
    let session_cfg = &state.config.session;
    // cookie signing needs 64 bytes of key material
    let key = Key::from(Sha512::digest(session_cfg.secret_key.as_bytes()).as_slice());
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(session_cfg.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_cfg.ttl_minutes,
        )))
        .with_signed(key);

    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .merge(pages::router())
        .merge(auth::router())
        .merge(predictions::router())
        .merge(report::router())
        .nest_service(PUBLIC_PREFIX, uploads)
        .with_state(state)
        .layer(sessions)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
