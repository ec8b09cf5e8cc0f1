use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{catalog, chat, community, matches, moods, pages};

/// All application routes. Transport layers (tracing, CORS) are added by the
/// server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(pages::landing))
        .route("/login", get(pages::login_form).post(pages::login))
        .route("/register", get(pages::register_form).post(pages::register))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/logout", get(pages::logout))
        .route("/account/password", post(pages::change_password))
        .route("/moods", get(moods::list_moods).post(moods::create_mood))
        .route("/community", get(community::feed).post(community::create_post))
        .route("/achievements", get(catalog::achievements))
        .route("/groups", get(catalog::groups))
        .route("/chats", get(chat::list_chats).post(chat::create_chat))
        .route("/chats/{room_id}", get(chat::show_chat))
        .route("/chats/{room_id}/messages", post(chat::send_message))
        .route("/matches", get(matches::show_matches).post(matches::save_preferences))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
