use axum::{
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use super::{respond, views};
use crate::{
    auth::extractors::{CurrentUser, MaybeUser},
    error::AppError,
    session::{self, Level},
};

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[instrument(skip_all)]
pub async fn home(session: Session, MaybeUser(user): MaybeUser) -> Result<Html<String>, AppError> {
    let username = user.as_ref().map(|u| u.username.as_str());
    respond(&session, username, "Home", &views::home(user.is_some(), None)).await
}

pub async fn about(session: Session, MaybeUser(user): MaybeUser) -> Result<Html<String>, AppError> {
    let username = user.as_ref().map(|u| u.username.as_str());
    respond(&session, username, "About", &views::about()).await
}

pub async fn contact(session: Session, MaybeUser(user): MaybeUser) -> Result<Html<String>, AppError> {
    let username = user.as_ref().map(|u| u.username.as_str());
    respond(&session, username, "Contact", &views::contact()).await
}

pub async fn doctors(session: Session, CurrentUser(user): CurrentUser) -> Result<Html<String>, AppError> {
    respond(&session, Some(&user.username), "Doctors", &views::doctors()).await
}

#[instrument(skip_all)]
pub async fn contact_submit(
    session: Session,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let name = form.name.trim();
    let email = form.email.trim();
    let message = form.message.trim();

    if name.is_empty() || email.is_empty() || message.is_empty() {
        warn!("incomplete contact form");
        session::flash(&session, Level::Warning, "Please fill in every field.").await?;
        return Ok(Redirect::to("/contact").into_response());
    }

    info!(%name, %email, %message, "contact message received");
    session::flash(
        &session,
        Level::Success,
        "Thank you for contacting us! We will get back to you soon.",
    )
    .await?;
    Ok(Redirect::to("/contact").into_response())
}
