//! Pairwise chat rooms. Delivery is request/response only; a page reload
//! shows new messages.

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::info;
use uuid::Uuid;

use soulsync_db::models::NewChatMessage;
use soulsync_types::api::{ChatMessageForm, NewChatForm};
use soulsync_types::models::{ChatMessage, ChatParticipant, ChatRoom, User};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, AppStateInner, run_blocking};
use crate::views::{self, RoomSummary};

const MESSAGE_LIMIT: u32 = 100;
const MAX_MESSAGE_CHARS: usize = 2000;
const MAX_ROOM_NAME_CHARS: usize = 100;

/// GET /chats
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render_list(&state, &user, None).await
}

/// POST /chats. Opens (or reuses) a one-to-one room with another user.
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<NewChatForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_string();
    let name = form.name.trim().to_string();
    if username.is_empty() {
        return list_with_error(&state, &user, "Please enter a username.").await;
    }
    if name.chars().count() > MAX_ROOM_NAME_CHARS {
        return list_with_error(&state, &user, "Room name is too long.").await;
    }

    let me = user.id;
    let result = run_blocking(&state, move |s| {
        let Some(other) = s.db.get_user_by_username(&username)? else {
            return Err(AppError::Validation(format!("No user named {username}.")));
        };
        let other_id: Uuid = other
            .id
            .parse()
            .map_err(|e| AppError::Internal(format!("corrupt user id '{}': {}", other.id, e)))?;
        if other_id == me {
            return Err(AppError::Validation("You can't start a chat with yourself.".into()));
        }

        if let Some(existing) = s.db.find_direct_room(me, other_id)? {
            return Ok(existing);
        }

        let room_id = Uuid::new_v4();
        let name = (!name.is_empty()).then_some(name.as_str());
        s.db.create_room(room_id, name, false, &[me, other_id])?;
        info!("User {} opened chat room {}", me, room_id);
        Ok(room_id.to_string())
    })
    .await;

    match result {
        Ok(room_id) => Ok(Redirect::to(&format!("/chats/{room_id}")).into_response()),
        Err(e) => match e.form_message() {
            Some(msg) => list_with_error(&state, &user, &msg).await,
            None => Err(e),
        },
    }
}

/// GET /chats/{room_id}
pub async fn show_chat(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render_room(&state, &user, room_id, None).await
}

/// POST /chats/{room_id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<ChatMessageForm>,
) -> Result<Response, AppError> {
    let content = form.content.trim().to_string();
    if content.is_empty() || content.chars().count() > MAX_MESSAGE_CHARS {
        let msg = format!("Messages must be between 1 and {MAX_MESSAGE_CHARS} characters.");
        return Ok(render_room(&state, &user, room_id, Some(&msg)).await?.into_response());
    }

    let sender_id = user.id;
    let is_anonymous = form.anonymous.is_some();
    run_blocking(&state, move |s| {
        ensure_participant(s, room_id, sender_id)?;
        s.db.insert_chat_message(&NewChatMessage {
            id: Uuid::new_v4(),
            room_id,
            sender_id,
            content: &content,
            is_anonymous,
        })?;
        Ok(())
    })
    .await?;

    Ok(Redirect::to(&format!("/chats/{room_id}")).into_response())
}

/// Rooms are invisible to non-participants, so both cases read as not found.
fn ensure_participant(s: &AppStateInner, room_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    if s.db.is_participant(room_id, user_id)? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

async fn list_with_error(state: &AppState, user: &User, msg: &str) -> Result<Response, AppError> {
    Ok(render_list(state, user, Some(msg)).await?.into_response())
}

async fn render_list(state: &AppState, user: &User, error: Option<&str>) -> Result<Html<String>, AppError> {
    let user_id = user.id;
    let rooms = run_blocking(state, move |s| {
        let mut rooms = Vec::new();
        for row in s.db.list_rooms_for_user(user_id)? {
            let room: ChatRoom = row.into();
            let participants: Vec<ChatParticipant> = s
                .db
                .list_participants(room.id)?
                .into_iter()
                .map(Into::into)
                .collect();
            rooms.push(RoomSummary { room, participants });
        }
        Ok(rooms)
    })
    .await?;

    Ok(views::chats(user, &rooms, error))
}

async fn render_room(
    state: &AppState,
    user: &User,
    room_id: Uuid,
    error: Option<&str>,
) -> Result<Html<String>, AppError> {
    let user_id = user.id;
    let (room, participants, messages) = run_blocking(state, move |s| {
        ensure_participant(s, room_id, user_id)?;
        let room: ChatRoom = s.db.get_room(room_id)?.ok_or(AppError::NotFound)?.into();
        let participants: Vec<ChatParticipant> = s
            .db
            .list_participants(room_id)?
            .into_iter()
            .map(Into::into)
            .collect();
        let messages: Vec<ChatMessage> = s
            .db
            .list_chat_messages(room_id, MESSAGE_LIMIT)?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok((room, participants, messages))
    })
    .await?;

    Ok(views::chat_room(user, &room, &participants, &messages, error))
}
