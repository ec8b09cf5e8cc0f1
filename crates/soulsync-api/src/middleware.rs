use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use soulsync_types::models::User;

use crate::auth;
use crate::error::AppError;
use crate::state::{AppState, run_blocking};

pub const SESSION_COOKIE: &str = "soulsync_session";

/// The signed-in user, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the session cookie to a live user or redirect to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = resolve_user(&state, &jar).await?.ok_or(AppError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Same lookup for public pages that only adapt to a signed-in user.
pub async fn resolve_user(state: &AppState, jar: &CookieJar) -> Result<Option<User>, AppError> {
    let token = session_token(jar);
    run_blocking(state, move |s| Ok(auth::current_user(s, token.as_deref())?)).await
}

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
