use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tower_sessions::Session;
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{LoginForm, SignupForm},
        extractors::CurrentUser,
        services::{self, AuthError},
    },
    error::AppError,
    pages::{respond, views},
    session::{self, Level},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/signup", get(signup_page).post(signup))
        .route("/logout", get(logout))
}

pub async fn login_page(session: Session) -> Result<Response, AppError> {
    Ok(respond(&session, None, "Log in", &views::login()).await?.into_response())
}

pub async fn signup_page(session: Session) -> Result<Response, AppError> {
    Ok(respond(&session, None, "Sign up", &views::signup()).await?.into_response())
}

#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match services::login(&state.db, &form.username, &form.password).await {
        Ok(user) => {
            session::sign_in(&session, user.id).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_facing() => {
            session::flash(&session, Level::Error, e.to_string()).await?;
            login_page(session).await
        }
        Err(e) => {
            error!(error = %e, "login failed");
            Err(e.into())
        }
    }
}

#[instrument(skip_all, fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    match services::signup(&state.db, &form.username, &form.password).await {
        Ok(_) => {
            session::flash(&session, Level::Success, "Signup successful. Please log in.").await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e @ (AuthError::DuplicateUsername | AuthError::InvalidUsername | AuthError::EmptyPassword)) => {
            session::flash(&session, Level::Error, e.to_string()).await?;
            signup_page(session).await
        }
        Err(e) => {
            error!(error = %e, "signup failed");
            Err(e.into())
        }
    }
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn logout(session: Session, CurrentUser(user): CurrentUser) -> Result<Response, AppError> {
    services::logout(&session).await?;
    Ok(Redirect::to("/").into_response())
}
