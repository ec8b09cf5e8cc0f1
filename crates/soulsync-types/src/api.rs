use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Session claims --

/// Signed into the session cookie. `sid` points at a row in the sessions
/// table so logout can revoke the token before `exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

// -- Moods --

/// Intensity arrives as text so a malformed value can be reported back on the
/// form instead of being rejected by the extractor.
#[derive(Debug, Deserialize)]
pub struct MoodForm {
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub intensity: String,
    #[serde(default)]
    pub triggers: String,
    #[serde(default)]
    pub journal_text: String,
}

impl MoodForm {
    pub fn trigger_list(&self) -> Vec<String> {
        split_tags(&self.triggers)
    }
}

// -- Community --

#[derive(Debug, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub emotion_tag: String,
    /// HTML checkboxes are absent when unchecked.
    pub anonymous: Option<String>,
}

// -- Chat --

#[derive(Debug, Deserialize)]
pub struct NewChatForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageForm {
    #[serde(default)]
    pub content: String,
    pub anonymous: Option<String>,
}

// -- Matching --

#[derive(Debug, Deserialize)]
pub struct PreferenceForm {
    #[serde(default)]
    pub tags: String,
}

impl PreferenceForm {
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }
}

/// Split a comma separated list into trimmed, lowercased, de-duplicated tags.
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',') {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}
