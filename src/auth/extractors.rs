use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::warn;

use crate::{
    auth::repo_types::User,
    error::AppError,
    session::{self, Level},
    state::AppState,
};

/// The logged-in user. Rejects by redirecting to the login page.
pub struct CurrentUser(pub User);

/// The logged-in user, if any. Never rejects for a missing login.
pub struct MaybeUser(pub Option<User>);

async fn resolve(parts: &mut Parts, state: &AppState) -> Result<(Session, Option<User>), AppError> {
    let session = Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| AppError::Internal(anyhow::anyhow!(msg)))?;

    let Some(user_id) = session::user_id(&session).await? else {
        return Ok((session, None));
    };
    let user = User::find_by_id(&state.db, user_id).await?;
    if user.is_none() {
        warn!(user_id, "session refers to missing user");
    }
    Ok((session, user))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await? {
            (_, Some(user)) => Ok(CurrentUser(user)),
            (session, None) => {
                session::flash(&session, Level::Info, "Please log in to access this page.").await?;
                Err(AppError::Unauthenticated)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let (_, user) = resolve(parts, state).await?;
        Ok(MaybeUser(user))
    }
}
