//! Database row types. These map directly to SQLite rows and stay distinct
//! from the soulsync-types models so the schema can evolve on its own.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use soulsync_types::models::{
    Achievement, ChatMessage, ChatParticipant, ChatRoom, CommunityPost, MatchPreference,
    MoodEntry, SupportGroup, User,
};

/// Every timestamp column uses this UTC layout, matching the column defaults.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        // Rows written by plain `datetime('now')` carry no zone marker.
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|ndt| ndt.and_utc())
    })
}

fn timestamp_or_default(raw: &str, what: &str, id: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt {} '{}' on row '{}'", what, raw, id);
        DateTime::default()
    })
}

fn uuid_or_default(raw: &str, what: &str, id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", what, raw, id, e);
        Uuid::default()
    })
}

/// Serialized tag lists are JSON arrays of strings.
pub fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub fn decode_tags(raw: Option<&str>, id: &str) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(raw) if raw.trim().is_empty() => Vec::new(),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!("Corrupt tag list '{}' on row '{}': {}", raw, id, e);
            Vec::new()
        }),
    }
}

// -- Inserts --

pub struct NewUser<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
}

pub struct NewMoodEntry<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub emoji: &'a str,
    pub label: &'a str,
    pub intensity: u8,
    pub triggers: &'a [String],
    pub journal_text: Option<&'a str>,
    /// `None` lets the column default stamp the row.
    pub created_at: Option<DateTime<Utc>>,
}

pub struct NewPost<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: &'a str,
    pub emotion_tag: Option<&'a str>,
    pub is_anonymous: bool,
    pub created_at: Option<DateTime<Utc>>,
}

pub struct NewChatMessage<'a> {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: &'a str,
    pub is_anonymous: bool,
}

// -- Rows --

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "user id", &row.id),
            created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
            username: row.username,
            email: row.email,
            full_name: row.full_name,
        }
    }
}

pub struct MoodEntryRow {
    pub id: String,
    pub user_id: String,
    pub mood_emoji: String,
    pub mood_label: String,
    pub intensity: i64,
    pub triggers: Option<String>,
    pub journal_text: Option<String>,
    pub created_at: String,
}

impl From<MoodEntryRow> for MoodEntry {
    fn from(row: MoodEntryRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "mood id", &row.id),
            user_id: uuid_or_default(&row.user_id, "user_id", &row.id),
            intensity: u8::try_from(row.intensity).unwrap_or_default(),
            triggers: decode_tags(row.triggers.as_deref(), &row.id),
            created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
            emoji: row.mood_emoji,
            label: row.mood_label,
            journal_text: row.journal_text,
        }
    }
}

pub struct PostRow {
    pub id: String,
    pub user_id: String,
    pub author_username: String,
    pub content: String,
    pub emotion_tag: Option<String>,
    pub is_anonymous: bool,
    pub created_at: String,
}

impl From<PostRow> for CommunityPost {
    fn from(row: PostRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "post id", &row.id),
            user_id: uuid_or_default(&row.user_id, "user_id", &row.id),
            created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
            author_username: row.author_username,
            content: row.content,
            emotion_tag: row.emotion_tag,
            is_anonymous: row.is_anonymous,
        }
    }
}

pub struct AchievementRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub created_at: String,
}

impl From<AchievementRow> for Achievement {
    fn from(row: AchievementRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "achievement id", &row.id),
            created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
            title: row.title,
            description: row.description,
            icon: row.icon,
        }
    }
}

pub struct SupportGroupRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

impl From<SupportGroupRow> for SupportGroup {
    fn from(row: SupportGroupRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "group id", &row.id),
            created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
            name: row.name,
            description: row.description,
        }
    }
}

pub struct ChatRoomRow {
    pub id: String,
    pub room_name: Option<String>,
    pub is_group: bool,
    pub created_at: String,
}

impl From<ChatRoomRow> for ChatRoom {
    fn from(row: ChatRoomRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "room id", &row.id),
            created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
            name: row.room_name,
            is_group: row.is_group,
        }
    }
}

pub struct ChatParticipantRow {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub username: String,
    pub is_identity_revealed: bool,
}

impl From<ChatParticipantRow> for ChatParticipant {
    fn from(row: ChatParticipantRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "participant id", &row.id),
            room_id: uuid_or_default(&row.room_id, "room_id", &row.id),
            user_id: uuid_or_default(&row.user_id, "user_id", &row.id),
            username: row.username,
            is_identity_revealed: row.is_identity_revealed,
        }
    }
}

pub struct ChatMessageRow {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: String,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "message id", &row.id),
            room_id: uuid_or_default(&row.room_id, "room_id", &row.id),
            sender_id: uuid_or_default(&row.sender_id, "sender_id", &row.id),
            created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
            sender_username: row.sender_username,
            content: row.content,
            is_anonymous: row.is_anonymous,
        }
    }
}

pub struct MatchPreferenceRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub preferences: String,
    pub created_at: String,
}

impl From<MatchPreferenceRow> for MatchPreference {
    fn from(row: MatchPreferenceRow) -> Self {
        Self {
            id: uuid_or_default(&row.id, "preference id", &row.id),
            user_id: uuid_or_default(&row.user_id, "user_id", &row.id),
            tags: decode_tags(Some(&row.preferences), &row.id),
            created_at: timestamp_or_default(&row.created_at, "created_at", &row.id),
            username: row.username,
        }
    }
}

pub struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
}

impl SessionRow {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match parse_timestamp(&self.expires_at) {
            Some(expires_at) => expires_at <= now,
            None => {
                warn!("Corrupt expires_at '{}' on session '{}'", self.expires_at, self.id);
                true
            }
        }
    }
}
