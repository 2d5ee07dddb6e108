use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use thiserror::Error;
use tower_sessions::Session;
use tracing::{debug, info, warn};

use crate::{
    auth::{
        password::{hash_password, verify_password},
        repo_types::User,
    },
    session,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Username already exists!")]
    DuplicateUsername,
    #[error("Username must be 3-150 characters: letters, digits, '.', '_' or '-'.")]
    InvalidUsername,
    #[error("Password must not be empty.")]
    EmptyPassword,
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Errors whose message can be shown back on the form.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::DuplicateUsername
                | AuthError::InvalidUsername
                | AuthError::EmptyPassword
        )
    }
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9._-]{3,150}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub async fn signup(db: &SqlitePool, username: &str, password: &str) -> Result<User, AuthError> {
    let username = username.trim();
    if !is_valid_username(username) {
        return Err(AuthError::InvalidUsername);
    }
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }

    if User::find_by_username(db, username).await?.is_some() {
        warn!(%username, "username already registered");
        return Err(AuthError::DuplicateUsername);
    }

    let hash = hash_password(password)?;
    let user = match User::create(db, username, &hash).await {
        Ok(u) => u,
        // lost a race with a concurrent signup for the same name
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!(%username, "username taken by concurrent signup");
            return Err(AuthError::DuplicateUsername);
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn login(db: &SqlitePool, username: &str, password: &str) -> Result<User, AuthError> {
    let username = username.trim();
    let Some(user) = User::find_by_username(db, username).await? else {
        // keep the unknown-user path as slow as a wrong password
        let _ = verify_password(password, &DUMMY_HASH);
        warn!(%username, "login unknown username");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(%username, user_id = user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = user.id, %username, "user logged in");
    Ok(user)
}

pub async fn logout(session: &Session) -> Result<(), tower_sessions::session::Error> {
    let user_id = session::user_id(session).await?;
    session::clear(session).await?;
    debug!(?user_id, "session cleared");
    Ok(())
}

lazy_static! {
    static ref DUMMY_HASH: String = hash_password("pneumoscan-timing-equalizer").unwrap_or_default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn username_rules() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("dr.house_01-x"));
        assert!(!is_valid_username("al"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("<script>"));
        assert!(!is_valid_username(&"a".repeat(151)));
    }

    #[tokio::test]
    async fn signup_then_login_succeeds() {
        let db = db::memory().await;
        let user = signup(&db, "alice", "pw1").await.unwrap();
        assert_ne!(user.password_hash, "pw1");

        let logged = login(&db, "alice", "pw1").await.unwrap();
        assert_eq!(logged.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_signup_fails_regardless_of_password() {
        let db = db::memory().await;
        signup(&db, "alice", "pw1").await.unwrap();
        for pw in ["pw1", "other", "x"] {
            let err = signup(&db, "alice", pw).await.unwrap_err();
            assert!(matches!(err, AuthError::DuplicateUsername), "got {err:?}");
        }
        // surrounding whitespace does not create a second account
        let err = signup(&db, "  alice ", "pw1").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
    }

    #[tokio::test]
    async fn concurrent_signups_yield_one_account() {
        let db = db::memory().await;
        let (a, b) = tokio::join!(signup(&db, "carol", "a"), signup(&db, "carol", "b"));
        let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(oks, 1);
        let failed = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(failed, AuthError::DuplicateUsername));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_user() {
        let db = db::memory().await;
        signup(&db, "alice", "pw1").await.unwrap();

        let err = login(&db, "alice", "pw2").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        let err = login(&db, "mallory", "pw1").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn signup_validates_input() {
        let db = db::memory().await;
        assert!(matches!(
            signup(&db, "a b", "pw").await.unwrap_err(),
            AuthError::InvalidUsername
        ));
        assert!(matches!(
            signup(&db, "alice", "").await.unwrap_err(),
            AuthError::EmptyPassword
        ));
    }
}
