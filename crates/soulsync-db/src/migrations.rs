use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Current schema version. Bump together with a new `if version < N` block.
pub const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    MoodEntries,
    CommunityPosts,
    Achievements,
    SupportGroups,
    ChatRooms,
    ChatParticipants,
    ChatMessages,
    MatchPreferences,
    Sessions,
}

impl Table {
    /// Dependency order, parents first.
    pub const ALL: [Table; 10] = [
        Table::Users,
        Table::MoodEntries,
        Table::CommunityPosts,
        Table::Achievements,
        Table::SupportGroups,
        Table::ChatRooms,
        Table::ChatParticipants,
        Table::ChatMessages,
        Table::MatchPreferences,
        Table::Sessions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::MoodEntries => "mood_entries",
            Table::CommunityPosts => "community_posts",
            Table::Achievements => "achievements",
            Table::SupportGroups => "support_groups",
            Table::ChatRooms => "chat_rooms",
            Table::ChatParticipants => "chat_participants",
            Table::ChatMessages => "chat_messages",
            Table::MatchPreferences => "match_preferences",
            Table::Sessions => "sessions",
        }
    }
}

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                full_name       TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE TABLE mood_entries (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id),
                mood_emoji      TEXT NOT NULL,
                mood_label      TEXT NOT NULL,
                intensity       INTEGER NOT NULL CHECK (intensity BETWEEN 1 AND 5),
                triggers        TEXT,
                journal_text    TEXT,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE INDEX idx_mood_entries_user
                ON mood_entries(user_id, created_at);

            CREATE TABLE community_posts (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL CHECK (length(trim(content)) > 0),
                emotion_tag     TEXT,
                is_anonymous    INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE INDEX idx_community_posts_user
                ON community_posts(user_id);

            CREATE INDEX idx_community_posts_created
                ON community_posts(created_at);

            CREATE TABLE achievements (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL,
                icon            TEXT,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE TABLE support_groups (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                description     TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE TABLE chat_rooms (
                id              TEXT PRIMARY KEY,
                room_name       TEXT,
                is_group        INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE TABLE chat_participants (
                id                      TEXT PRIMARY KEY,
                room_id                 TEXT NOT NULL REFERENCES chat_rooms(id),
                user_id                 TEXT NOT NULL REFERENCES users(id),
                is_identity_revealed    INTEGER NOT NULL DEFAULT 0,
                UNIQUE(room_id, user_id)
            );

            CREATE INDEX idx_chat_participants_user
                ON chat_participants(user_id);

            CREATE TABLE chat_messages (
                id              TEXT PRIMARY KEY,
                room_id         TEXT NOT NULL REFERENCES chat_rooms(id),
                sender_id       TEXT NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL,
                is_anonymous    INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE INDEX idx_chat_messages_room
                ON chat_messages(room_id, created_at);

            CREATE INDEX idx_chat_messages_sender
                ON chat_messages(sender_id);

            -- UNIQUE(user_id) doubles as the foreign key index
            CREATE TABLE match_preferences (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL UNIQUE REFERENCES users(id),
                preferences     TEXT NOT NULL DEFAULT '[]',
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE TABLE sessions (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id),
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
                expires_at      TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_user
                ON sessions(user_id);

            CREATE INDEX idx_sessions_expires
                ON sessions(expires_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", SCHEMA_VERSION);
    Ok(())
}

/// Drop every table, children first. Only the seed utility calls this.
pub fn drop_all(conn: &Connection) -> Result<()> {
    for table in Table::ALL.iter().rev() {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", table.name()))?;
    }
    conn.execute_batch("DROP TABLE IF EXISTS schema_version;")?;

    info!("Dropped all tables");
    Ok(())
}
