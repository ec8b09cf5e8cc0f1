//! Authentication service: credential checks and the session lifecycle.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use soulsync_db::DbError;
use soulsync_db::models::NewUser;
use soulsync_db::password::{hash_password, verify_password};
use soulsync_types::api::{RegisterForm, SessionClaims};
use soulsync_types::{Identity, models::User};

use crate::state::AppStateInner;

pub const SESSION_TTL_DAYS: i64 = 30;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Check credentials and open a session. Returns the signed session token.
/// A failed login writes nothing.
pub fn login(state: &AppStateInner, email: &str, password: &str) -> Result<String, AuthError> {
    let row = state
        .db
        .get_user_by_email(email.trim())?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &row.password_hash) {
        debug!("Password mismatch for user {}", row.id);
        return Err(AuthError::InvalidCredentials);
    }

    let user = User::from(row);
    let token = start_session(state, &user)?;
    info!("User {} logged in", user.id);
    Ok(token)
}

/// Issue a session for anything with an id.
pub fn start_session(state: &AppStateInner, identity: &impl Identity) -> Result<String, AuthError> {
    let session_id = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

    state.db.create_session(session_id, identity.id(), expires_at)?;

    let token = create_token(&state.secret_key, identity.id(), session_id, expires_at)?;
    Ok(token)
}

/// Revoke the session behind `token`. Unknown or malformed tokens are ignored.
pub fn logout(state: &AppStateInner, token: &str) -> Result<(), AuthError> {
    if let Some(claims) = decode_token(&state.secret_key, token) {
        if state.db.delete_session(claims.sid)? {
            info!("User {} logged out", claims.sub);
        }
    }
    Ok(())
}

/// Resolve a session token to a live user.
///
/// Returns `None` when the token is missing, badly signed or expired, when the
/// session row was revoked, or when the user no longer exists.
pub fn current_user(state: &AppStateInner, token: Option<&str>) -> Result<Option<User>, AuthError> {
    let Some(claims) = token.and_then(|t| decode_token(&state.secret_key, t)) else {
        return Ok(None);
    };

    let Some(session) = state.db.get_session(claims.sid)? else {
        return Ok(None);
    };
    if session.is_expired(Utc::now()) || session.user_id != claims.sub.to_string() {
        return Ok(None);
    }

    Ok(state.db.get_user_by_id(claims.sub)?.map(User::from))
}

/// Validate a registration form and create the account.
pub fn register(state: &AppStateInner, form: &RegisterForm) -> Result<User, AuthError> {
    let username = form.username.trim();
    let email = form.email.trim();
    let full_name = form.full_name.trim();

    if username.is_empty() || email.is_empty() || full_name.is_empty() || form.password.is_empty() {
        return Err(AuthError::Validation("Please fill in all fields.".into()));
    }
    if username.len() < 3 || username.len() > 32 {
        return Err(AuthError::Validation(
            "Username must be between 3 and 32 characters.".into(),
        ));
    }
    if !email.contains('@') {
        return Err(AuthError::Validation("Please enter a valid email address.".into()));
    }
    validate_password(&form.password)?;
    if form.password != form.confirm_password {
        return Err(AuthError::Validation("Passwords do not match.".into()));
    }

    if state.db.get_user_by_email(email)?.is_some() {
        return Err(AuthError::Validation("That email is already registered.".into()));
    }
    if state.db.get_user_by_username(username)?.is_some() {
        return Err(AuthError::Validation("That username is taken.".into()));
    }

    let password_hash = hash_password(&form.password)?;
    let id = Uuid::new_v4();
    state.db.create_user(&NewUser {
        id,
        username,
        email,
        full_name,
        password_hash: &password_hash,
    })?;

    info!("Registered user {}", id);
    state
        .db
        .get_user_by_id(id)?
        .map(User::from)
        .ok_or_else(|| AuthError::Db(DbError::Corrupt(format!("user {id} vanished after insert"))))
}

/// Re-hash after checking the current password.
pub fn change_password(
    state: &AppStateInner,
    user_id: Uuid,
    current: &str,
    new: &str,
) -> Result<(), AuthError> {
    let row = state
        .db
        .get_user_by_id(user_id)?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(current, &row.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }
    validate_password(new)?;

    let password_hash = hash_password(new)?;
    state.db.update_password(user_id, &password_hash)?;
    info!("User {} changed password", user_id);
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

fn create_token(
    secret: &str,
    user_id: Uuid,
    session_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = SessionClaims {
        sub: user_id,
        sid: session_id,
        exp: expires_at.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn decode_token(secret: &str, token: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use soulsync_db::{Database, Table};

    fn state() -> AppState {
        AppStateInner::new(Database::open_in_memory().unwrap(), "test-secret")
    }

    fn form(username: &str, email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            email: email.into(),
            full_name: "Test Person".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    fn registered(state: &AppStateInner) -> User {
        register(state, &form("alice", "alice@example.com", "password123", "password123")).unwrap()
    }

    #[test]
    fn login_with_correct_password_opens_a_session() {
        let state = state();
        let user = registered(&state);

        let token = login(&state, "alice@example.com", "password123").unwrap();
        let resolved = current_user(&state, Some(&token)).unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(state.db.count_rows(Table::Sessions).unwrap(), 1);
    }

    #[test]
    fn login_with_unknown_email_is_invalid_and_writes_nothing() {
        let state = state();
        registered(&state);

        let err = login(&state, "nobody@example.com", "password123").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(state.db.count_rows(Table::Sessions).unwrap(), 0);
    }

    #[test]
    fn login_with_wrong_password_is_invalid() {
        let state = state();
        registered(&state);

        let err = login(&state, "alice@example.com", "password124").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(state.db.count_rows(Table::Sessions).unwrap(), 0);
    }

    #[test]
    fn logout_revokes_the_session() {
        let state = state();
        registered(&state);

        let token = login(&state, "alice@example.com", "password123").unwrap();
        logout(&state, &token).unwrap();

        assert!(current_user(&state, Some(&token)).unwrap().is_none());
        // Logging out twice is harmless.
        logout(&state, &token).unwrap();
    }

    #[test]
    fn current_user_rejects_missing_and_forged_tokens() {
        let state = state();
        let user = registered(&state);

        assert!(current_user(&state, None).unwrap().is_none());
        assert!(current_user(&state, Some("garbage")).unwrap().is_none());

        let forged = create_token(
            "some-other-secret",
            user.id,
            Uuid::new_v4(),
            Utc::now() + Duration::days(1),
        )
        .unwrap();
        assert!(current_user(&state, Some(&forged)).unwrap().is_none());
    }

    #[test]
    fn current_user_rejects_expired_tokens() {
        let state = state();
        let user = registered(&state);

        let sid = Uuid::new_v4();
        let past = Utc::now() - Duration::hours(2);
        state.db.create_session(sid, user.id, past).unwrap();
        let token = create_token("test-secret", user.id, sid, past).unwrap();

        assert!(current_user(&state, Some(&token)).unwrap().is_none());
    }

    #[test]
    fn register_validates_input() {
        let state = state();

        let cases = [
            form("", "a@example.com", "password123", "password123"),
            form("ab", "a@example.com", "password123", "password123"),
            form("alice", "not-an-email", "password123", "password123"),
            form("alice", "a@example.com", "short", "short"),
            form("alice", "a@example.com", "password123", "password321"),
        ];
        for case in &cases {
            let err = register(&state, case).unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)), "{case:?} gave {err:?}");
        }
        assert_eq!(state.db.count_rows(Table::Users).unwrap(), 0);
    }

    #[test]
    fn register_rejects_duplicates() {
        let state = state();
        registered(&state);

        let same_email = form("alice2", "alice@example.com", "password123", "password123");
        assert!(matches!(register(&state, &same_email), Err(AuthError::Validation(_))));

        let same_username = form("alice", "other@example.com", "password123", "password123");
        assert!(matches!(register(&state, &same_username), Err(AuthError::Validation(_))));
    }

    #[test]
    fn change_password_rehashes() {
        let state = state();
        let user = registered(&state);

        let err = change_password(&state, user.id, "wrong-password", "newpassword1").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        change_password(&state, user.id, "password123", "newpassword1").unwrap();
        assert!(login(&state, "alice@example.com", "password123").is_err());
        assert!(login(&state, "alice@example.com", "newpassword1").is_ok());
    }
}
