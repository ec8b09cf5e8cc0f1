use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use soulsync_types::models::MoodStats;

use crate::Database;
use crate::migrations::Table;
use crate::models::{
    AchievementRow, ChatMessageRow, ChatParticipantRow, ChatRoomRow, MatchPreferenceRow,
    MoodEntryRow, NewChatMessage, NewMoodEntry, NewPost, NewUser, PostRow, SessionRow,
    SupportGroupRow, UserRow, encode_tags, format_timestamp,
};
use crate::Result;

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn(|conn| insert_user(conn, user))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// All users in insertion order.
    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(query_users)
    }

    /// Store a freshly computed hash. Returns false if the user is gone.
    pub fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![password_hash, user_id.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Moods --

    pub fn insert_mood_entry(&self, entry: &NewMoodEntry<'_>) -> Result<()> {
        self.with_conn(|conn| insert_mood_entry(conn, entry))
    }

    /// Newest first.
    pub fn list_mood_entries(&self, user_id: Uuid, limit: u32) -> Result<Vec<MoodEntryRow>> {
        self.with_conn(|conn| query_mood_entries(conn, user_id, limit))
    }

    pub fn mood_stats(&self, user_id: Uuid, today: NaiveDate) -> Result<MoodStats> {
        self.with_conn(|conn| query_mood_stats(conn, user_id, today))
    }

    // -- Community --

    pub fn insert_post(&self, post: &NewPost<'_>) -> Result<()> {
        self.with_conn(|conn| insert_post(conn, post))
    }

    /// Newest first, joined with the author's username.
    pub fn list_posts(&self, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| query_posts(conn, limit))
    }

    pub fn count_posts_by_user(&self, user_id: Uuid) -> Result<u32> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM community_posts WHERE user_id = ?1",
                [user_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        })
    }

    // -- Catalog --

    pub fn insert_achievement(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
        icon: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| insert_achievement(conn, id, title, description, icon))
    }

    pub fn list_achievements(&self) -> Result<Vec<AchievementRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, icon, created_at
                 FROM achievements ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(AchievementRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        icon: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_support_group(&self, id: Uuid, name: &str, description: &str) -> Result<()> {
        self.with_conn(|conn| insert_support_group(conn, id, name, description))
    }

    pub fn list_support_groups(&self) -> Result<Vec<SupportGroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, created_at
                 FROM support_groups ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SupportGroupRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Chat --

    /// Create a room and its participants in one transaction.
    pub fn create_room(
        &self,
        id: Uuid,
        name: Option<&str>,
        is_group: bool,
        participants: &[Uuid],
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO chat_rooms (id, room_name, is_group) VALUES (?1, ?2, ?3)",
                params![id.to_string(), name, is_group],
            )?;
            for user_id in participants {
                tx.execute(
                    "INSERT INTO chat_participants (id, room_id, user_id) VALUES (?1, ?2, ?3)",
                    params![Uuid::new_v4().to_string(), id.to_string(), user_id.to_string()],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// The existing one-to-one room between two users, if any.
    pub fn find_direct_room(&self, a: Uuid, b: Uuid) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT r.id
                 FROM chat_rooms r
                 JOIN chat_participants pa ON pa.room_id = r.id AND pa.user_id = ?1
                 JOIN chat_participants pb ON pb.room_id = r.id AND pb.user_id = ?2
                 WHERE r.is_group = 0
                 LIMIT 1",
                params![a.to_string(), b.to_string()],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn get_room(&self, room_id: Uuid) -> Result<Option<ChatRoomRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, room_name, is_group, created_at FROM chat_rooms WHERE id = ?1",
                [room_id.to_string()],
                map_room,
            )
            .optional()
        })
    }

    pub fn list_rooms_for_user(&self, user_id: Uuid) -> Result<Vec<ChatRoomRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.room_name, r.is_group, r.created_at
                 FROM chat_rooms r
                 JOIN chat_participants p ON p.room_id = r.id
                 WHERE p.user_id = ?1
                 ORDER BY r.created_at DESC, r.rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id.to_string()], map_room)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_participant(&self, room_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM chat_participants WHERE room_id = ?1 AND user_id = ?2",
                    params![room_id.to_string(), user_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list_participants(&self, room_id: Uuid) -> Result<Vec<ChatParticipantRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.room_id, p.user_id, u.username, p.is_identity_revealed
                 FROM chat_participants p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.room_id = ?1
                 ORDER BY p.rowid",
            )?;
            let rows = stmt
                .query_map([room_id.to_string()], |row| {
                    Ok(ChatParticipantRow {
                        id: row.get(0)?,
                        room_id: row.get(1)?,
                        user_id: row.get(2)?,
                        username: row.get(3)?,
                        is_identity_revealed: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_chat_message(&self, message: &NewChatMessage<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (id, room_id, sender_id, content, is_anonymous)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id.to_string(),
                    message.room_id.to_string(),
                    message.sender_id.to_string(),
                    message.content,
                    message.is_anonymous,
                ],
            )?;
            Ok(())
        })
    }

    /// The most recent `limit` messages, oldest first.
    pub fn list_chat_messages(&self, room_id: Uuid, limit: u32) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| query_chat_messages(conn, room_id, limit))
    }

    // -- Matching --

    /// Insert or replace the user's single preference row.
    pub fn save_preferences(&self, id: Uuid, user_id: Uuid, tags: &[String]) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO match_preferences (id, user_id, preferences) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET preferences = excluded.preferences",
                params![id.to_string(), user_id.to_string(), encode_tags(tags)],
            )?;
            Ok(())
        })
    }

    pub fn get_preferences(&self, user_id: Uuid) -> Result<Option<MatchPreferenceRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT m.id, m.user_id, u.username, m.preferences, m.created_at
                 FROM match_preferences m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.user_id = ?1",
                [user_id.to_string()],
                map_preference,
            )
            .optional()
        })
    }

    /// Every other user's preference row.
    pub fn list_other_preferences(&self, user_id: Uuid) -> Result<Vec<MatchPreferenceRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.user_id, u.username, m.preferences, m.created_at
                 FROM match_preferences m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.user_id != ?1
                 ORDER BY m.created_at, m.rowid",
            )?;
            let rows = stmt
                .query_map([user_id.to_string()], map_preference)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Sessions --

    pub fn create_session(&self, id: Uuid, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, expires_at) VALUES (?1, ?2, ?3)",
                params![id.to_string(), user_id.to_string(), format_timestamp(expires_at)],
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, id: Uuid) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?1",
                [id.to_string()],
                |row| {
                    Ok(SessionRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        created_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Returns true if a row was removed.
    pub fn delete_session(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id.to_string()])?;
            Ok(removed > 0)
        })
    }

    pub fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                [format_timestamp(now)],
            )?;
            Ok(removed)
        })
    }

    pub fn count_rows(&self, table: Table) -> Result<i64> {
        self.with_conn(|conn| count_rows(conn, table))
    }
}

// -- Connection-level helpers, shared with the seed transaction --

pub(crate) fn insert_user(conn: &Connection, user: &NewUser<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, full_name)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.password_hash,
            user.full_name,
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_mood_entry(conn: &Connection, entry: &NewMoodEntry<'_>) -> Result<()> {
    let triggers = (!entry.triggers.is_empty()).then(|| encode_tags(entry.triggers));
    conn.execute(
        "INSERT INTO mood_entries
            (id, user_id, mood_emoji, mood_label, intensity, triggers, journal_text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                 COALESCE(?8, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')))",
        params![
            entry.id.to_string(),
            entry.user_id.to_string(),
            entry.emoji,
            entry.label,
            entry.intensity,
            triggers,
            entry.journal_text,
            entry.created_at.map(format_timestamp),
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_post(conn: &Connection, post: &NewPost<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO community_posts (id, user_id, content, emotion_tag, is_anonymous, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')))",
        params![
            post.id.to_string(),
            post.user_id.to_string(),
            post.content,
            post.emotion_tag,
            post.is_anonymous,
            post.created_at.map(format_timestamp),
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_achievement(
    conn: &Connection,
    id: Uuid,
    title: &str,
    description: &str,
    icon: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO achievements (id, title, description, icon) VALUES (?1, ?2, ?3, ?4)",
        params![id.to_string(), title, description, icon],
    )?;
    Ok(())
}

pub(crate) fn insert_support_group(
    conn: &Connection,
    id: Uuid,
    name: &str,
    description: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO support_groups (id, name, description) VALUES (?1, ?2, ?3)",
        params![id.to_string(), name, description],
    )?;
    Ok(())
}

pub(crate) fn count_rows(conn: &Connection, table: Table) -> Result<i64> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.name()),
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        full_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub(crate) fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    conn.query_row(
        "SELECT id, username, email, password_hash, full_name, created_at
         FROM users WHERE email = ?1",
        [email],
        map_user,
    )
    .optional()
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    conn.query_row(
        "SELECT id, username, email, password_hash, full_name, created_at
         FROM users WHERE username = ?1",
        [username],
        map_user,
    )
    .optional()
}

fn query_user_by_id(conn: &Connection, id: Uuid) -> Result<Option<UserRow>> {
    conn.query_row(
        "SELECT id, username, email, password_hash, full_name, created_at
         FROM users WHERE id = ?1",
        [id.to_string()],
        map_user,
    )
    .optional()
}

pub(crate) fn query_users(conn: &Connection) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, full_name, created_at
         FROM users ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_mood_entries(conn: &Connection, user_id: Uuid, limit: u32) -> Result<Vec<MoodEntryRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, mood_emoji, mood_label, intensity, triggers, journal_text, created_at
         FROM mood_entries
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(params![user_id.to_string(), limit], |row| {
            Ok(MoodEntryRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                mood_emoji: row.get(2)?,
                mood_label: row.get(3)?,
                intensity: row.get(4)?,
                triggers: row.get(5)?,
                journal_text: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_mood_stats(conn: &Connection, user_id: Uuid, today: NaiveDate) -> Result<MoodStats> {
    let uid = user_id.to_string();
    let (total, average): (i64, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), AVG(intensity) FROM mood_entries WHERE user_id = ?1",
        [&uid],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT DISTINCT substr(created_at, 1, 10) AS day
         FROM mood_entries
         WHERE user_id = ?1
         ORDER BY day DESC",
    )?;
    let days = stmt
        .query_map([&uid], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|day| NaiveDate::parse_from_str(&day, "%Y-%m-%d").ok())
        .collect::<Vec<_>>();

    Ok(MoodStats {
        total_entries: u32::try_from(total).unwrap_or(u32::MAX),
        average_intensity: average,
        current_streak: current_streak(&days, today),
    })
}

/// Length of the run of consecutive days in `days_desc` (newest first, no
/// duplicates) that ends today, or yesterday if nothing is logged yet today.
pub fn current_streak(days_desc: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&latest) = days_desc.first() else {
        return 0;
    };
    if latest != today && latest != today - Duration::days(1) {
        return 0;
    }

    let mut streak = 0;
    let mut expected = latest;
    for &day in days_desc {
        if day != expected {
            break;
        }
        streak += 1;
        expected = day - Duration::days(1);
    }
    streak
}

fn query_posts(conn: &Connection, limit: u32) -> Result<Vec<PostRow>> {
    // JOIN users to fetch the author in a single query
    let mut stmt = conn.prepare(
        "SELECT p.id, p.user_id, u.username, p.content, p.emotion_tag, p.is_anonymous, p.created_at
         FROM community_posts p
         LEFT JOIN users u ON p.user_id = u.id
         ORDER BY p.created_at DESC, p.rowid DESC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(PostRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                author_username: row
                    .get::<_, Option<String>>(2)?
                    .unwrap_or_else(|| "unknown".to_string()),
                content: row.get(3)?,
                emotion_tag: row.get(4)?,
                is_anonymous: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_chat_messages(conn: &Connection, room_id: Uuid, limit: u32) -> Result<Vec<ChatMessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, room_id, sender_id, username, content, is_anonymous, created_at FROM (
             SELECT m.id, m.room_id, m.sender_id, u.username, m.content, m.is_anonymous,
                    m.created_at, m.rowid AS seq
             FROM chat_messages m
             LEFT JOIN users u ON m.sender_id = u.id
             WHERE m.room_id = ?1
             ORDER BY m.created_at DESC, m.rowid DESC
             LIMIT ?2
         )
         ORDER BY created_at ASC, seq ASC",
    )?;

    let rows = stmt
        .query_map(params![room_id.to_string(), limit], |row| {
            Ok(ChatMessageRow {
                id: row.get(0)?,
                room_id: row.get(1)?,
                sender_id: row.get(2)?,
                sender_username: row
                    .get::<_, Option<String>>(3)?
                    .unwrap_or_else(|| "unknown".to_string()),
                content: row.get(4)?,
                is_anonymous: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_room(row: &Row<'_>) -> rusqlite::Result<ChatRoomRow> {
    Ok(ChatRoomRow {
        id: row.get(0)?,
        room_name: row.get(1)?,
        is_group: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn map_preference(row: &Row<'_>) -> rusqlite::Result<MatchPreferenceRow> {
    Ok(MatchPreferenceRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        preferences: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
