pub mod auth;
pub mod catalog;
pub mod chat;
pub mod community;
pub mod error;
pub mod matches;
pub mod middleware;
pub mod moods;
pub mod pages;
pub mod routes;
pub mod state;
pub mod views;

pub use routes::router;
pub use state::{AppState, AppStateInner};
