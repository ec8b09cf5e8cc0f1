use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anything a session can be issued for. Authentication only ever needs the id.
pub trait Identity {
    fn id(&self) -> Uuid;
}

/// A registered account. The password hash never leaves the db crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl Identity for User {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub emoji: String,
    pub label: String,
    pub intensity: u8,
    pub triggers: Vec<String>,
    pub journal_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodStats {
    pub total_entries: u32,
    pub average_intensity: Option<f64>,
    /// Consecutive days, ending today or yesterday, with at least one entry.
    pub current_streak: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub emotion_tag: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl CommunityPost {
    /// Name shown next to the post. The real author is always stored.
    pub fn display_author(&self) -> &str {
        if self.is_anonymous {
            "Anonymous"
        } else {
            &self.author_username
        }
    }
}

// Catalog titles that carry an earning rule.
pub const FIRST_STEP: &str = "First Step";
pub const WEEK_WARRIOR: &str = "Week Warrior";
pub const COMMUNITY_HELPER: &str = "Community Helper";
pub const MINDFUL_MONTH: &str = "Mindful Month";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportGroup {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: Uuid,
    pub name: Option<String>,
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatParticipant {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub is_identity_revealed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn display_sender(&self) -> &str {
        if self.is_anonymous {
            "Anonymous"
        } else {
            &self.sender_username
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPreference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A ranked match candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub user_id: Uuid,
    pub username: String,
    pub common_tags: Vec<String>,
    /// Percentage of shared tags over the union of both tag sets.
    pub score: u8,
}
