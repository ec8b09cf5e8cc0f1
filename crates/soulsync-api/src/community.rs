use axum::{
    Extension, Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use soulsync_db::models::NewPost;
use soulsync_types::api::PostForm;
use soulsync_types::models::{CommunityPost, User};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};
use crate::views;

const FEED_LIMIT: u32 = 50;
const MAX_POST_CHARS: usize = 2000;
const DEFAULT_EMOTION_TAG: &str = "general";

/// GET /community
pub async fn feed(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render(&state, &user, None).await
}

/// POST /community
pub async fn create_post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let content = form.content.trim().to_string();
    if content.is_empty() {
        return Ok(render(&state, &user, Some("Please write something to share!"))
            .await?
            .into_response());
    }
    if content.chars().count() > MAX_POST_CHARS {
        let msg = format!("Posts are limited to {MAX_POST_CHARS} characters.");
        return Ok(render(&state, &user, Some(&msg)).await?.into_response());
    }

    let emotion_tag = match form.emotion_tag.trim() {
        "" => DEFAULT_EMOTION_TAG.to_string(),
        tag => tag.to_lowercase(),
    };
    let is_anonymous = form.anonymous.is_some();
    let user_id = user.id;

    run_blocking(&state, move |s| {
        s.db.insert_post(&NewPost {
            id: Uuid::new_v4(),
            user_id,
            content: &content,
            emotion_tag: Some(emotion_tag.as_str()),
            is_anonymous,
            created_at: None,
        })?;
        Ok(())
    })
    .await?;

    Ok(Redirect::to("/community").into_response())
}

async fn render(state: &AppState, user: &User, error: Option<&str>) -> Result<Html<String>, AppError> {
    let posts: Vec<CommunityPost> = run_blocking(state, |s| {
        Ok(s.db.list_posts(FEED_LIMIT)?.into_iter().map(Into::into).collect())
    })
    .await?;

    Ok(views::community(user, &posts, error))
}
