use axum::{
    Extension, Form,
    extract::{State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::debug;

use soulsync_types::api::{ChangePasswordForm, LoginForm, RegisterForm};
use soulsync_types::models::{CommunityPost, MoodEntry, User};

use crate::auth;
use crate::error::AppError;
use crate::middleware::{CurrentUser, clear_session_cookie, resolve_user, session_cookie, session_token};
use crate::state::{AppState, run_blocking};
use crate::views;

const DASHBOARD_MOODS: u32 = 5;
const DASHBOARD_POSTS: u32 = 3;
const MISSING_FIELDS: &str = "Please fill in all fields.";

/// GET /
pub async fn landing(State(state): State<AppState>, jar: CookieJar) -> Result<Html<String>, AppError> {
    let user = resolve_user(&state, &jar).await?;
    Ok(views::landing(user.as_ref()))
}

/// GET /login
pub async fn login_form() -> Html<String> {
    views::login(None, "")
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Rejected login body: {}", rejection);
            return Ok(views::login(Some(MISSING_FIELDS), "").into_response());
        }
    };
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Ok(views::login(Some(MISSING_FIELDS), &form.email).into_response());
    }

    let email = form.email.clone();
    let result = run_blocking(&state, move |s| Ok(auth::login(s, &form.email, &form.password)?)).await;

    match result {
        Ok(token) => Ok((jar.add(session_cookie(token)), Redirect::to("/dashboard")).into_response()),
        Err(e) => match e.form_message() {
            Some(msg) => Ok(views::login(Some(&msg), &email).into_response()),
            None => Err(e),
        },
    }
}

/// GET /register
pub async fn register_form() -> Html<String> {
    views::register(None, "", "", "")
}

/// POST /register. Signs the new user in on success.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Rejected registration body: {}", rejection);
            return Ok(views::register(Some(MISSING_FIELDS), "", "", "").into_response());
        }
    };
    let (username, email, full_name) = (form.username.clone(), form.email.clone(), form.full_name.clone());

    let result = run_blocking(&state, move |s| {
        let user = auth::register(s, &form)?;
        Ok(auth::start_session(s, &user)?)
    })
    .await;

    match result {
        Ok(token) => Ok((jar.add(session_cookie(token)), Redirect::to("/dashboard")).into_response()),
        Err(e) => match e.form_message() {
            Some(msg) => Ok(views::register(Some(&msg), &username, &email, &full_name).into_response()),
            None => Err(e),
        },
    }
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render_dashboard(&state, user, None).await
}

async fn render_dashboard(state: &AppState, user: User, error: Option<&str>) -> Result<Html<String>, AppError> {
    let user_id = user.id;
    let (stats, moods, posts) = run_blocking(state, move |s| {
        let stats = s.db.mood_stats(user_id, Utc::now().date_naive())?;
        let moods: Vec<MoodEntry> = s
            .db
            .list_mood_entries(user_id, DASHBOARD_MOODS)?
            .into_iter()
            .map(Into::into)
            .collect();
        let posts: Vec<CommunityPost> = s
            .db
            .list_posts(DASHBOARD_POSTS)?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok((stats, moods, posts))
    })
    .await?;

    Ok(views::dashboard(&user, &stats, &moods, &posts, error))
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    if let Some(token) = session_token(&jar) {
        run_blocking(&state, move |s| Ok(auth::logout(s, &token)?)).await?;
    }
    Ok((clear_session_cookie(jar), Redirect::to("/login")).into_response())
}

/// POST /account/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response, AppError> {
    let user_id = user.id;
    let result = run_blocking(&state, move |s| {
        Ok(auth::change_password(s, user_id, &form.current_password, &form.new_password)?)
    })
    .await;

    match result {
        Ok(()) => Ok(Redirect::to("/dashboard").into_response()),
        Err(e) => match e.form_message() {
            Some(msg) => Ok(render_dashboard(&state, user, Some(&msg)).await?.into_response()),
            None => Err(e),
        },
    }
}
