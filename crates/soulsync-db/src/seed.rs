//! Development seed: wipes the store and inserts fixed sample rows.
//!
//! Everything happens in one transaction. If any insert fails nothing is
//! committed, including the table drops.

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use soulsync_types::models::{COMMUNITY_HELPER, FIRST_STEP, MINDFUL_MONTH, WEEK_WARRIOR};

use crate::models::{NewMoodEntry, NewPost, NewUser};
use crate::password::hash_password;
use crate::queries::{
    insert_achievement, insert_mood_entry, insert_post, insert_support_group, insert_user,
    query_user_by_email, query_users,
};
use crate::{Database, DbError, Result, migrations};

pub const SAMPLE_PASSWORD: &str = "password123";

/// Days of mood history generated per user.
pub const MOOD_DAYS: usize = 7;

struct SampleUser {
    username: &'static str,
    email: &'static str,
    full_name: &'static str,
}

const USERS: &[SampleUser] = &[
    SampleUser {
        username: "testuser1",
        email: "test1@example.com",
        full_name: "John Doe",
    },
    SampleUser {
        username: "testuser2",
        email: "test2@example.com",
        full_name: "Jane Smith",
    },
];

// (emoji, label, intensity)
const MOODS: &[(&str, &str, u8)] = &[
    ("😊", "Happy", 4),
    ("😐", "Neutral", 3),
    ("😔", "Sad", 2),
    ("😢", "Very Sad", 1),
    ("😡", "Angry", 3),
    ("😴", "Tired", 2),
];

const TRIGGERS: &[&[&str]] = &[
    &["work", "stress"],
    &["relationships", "family"],
    &["health", "sleep"],
    &["studies", "pressure"],
    &["social", "friends"],
];

const JOURNAL: &[&str] = &[
    "Had a great day today! Everything went smoothly at work.",
    "Feeling a bit overwhelmed with all the tasks I need to complete.",
    "Spent quality time with family. It was really refreshing.",
    "Didn't sleep well last night. Feeling tired and low on energy.",
    "Stressed about upcoming deadlines but trying to stay positive.",
];

// (content, emotion tag)
const POSTS: &[(&str, &str)] = &[
    (
        "Just wanted to share that meditation really helped me today. 10 minutes of deep breathing made such a difference!",
        "calm",
    ),
    (
        "Having a tough day with anxiety. Any tips for managing racing thoughts?",
        "anxious",
    ),
    (
        "Completed my first week of mood tracking! Small steps but feeling proud of myself.",
        "happy",
    ),
    (
        "Remember: it's okay to have bad days. Tomorrow is a new opportunity. You're not alone in this journey. 💙",
        "hopeful",
    ),
    (
        "Does anyone else find journaling helpful? I've been writing for a week now and it's becoming therapeutic.",
        "general",
    ),
];

// (title, description, icon)
const ACHIEVEMENTS: &[(&str, &str, &str)] = &[
    (FIRST_STEP, "Logged your first mood", "🎯"),
    (WEEK_WARRIOR, "7-day mood tracking streak", "🔥"),
    (COMMUNITY_HELPER, "Helped 5 people in community", "🤝"),
    (MINDFUL_MONTH, "30-day streak", "🧘"),
];

const SUPPORT_GROUPS: &[(&str, &str)] = &[
    ("Anxiety Support", "Safe space for those dealing with anxiety"),
    ("Work Stress Relief", "Coping with workplace pressures"),
    ("Student Mental Health", "Support for academic stress and student life"),
    ("Depression Support", "Understanding and overcoming depression together"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCredential {
    pub email: String,
    pub password: String,
}

/// What a successful seed inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: Vec<String>,
    pub mood_entries: usize,
    pub posts: usize,
    pub achievements: usize,
    pub support_groups: usize,
    pub credentials: Vec<SampleCredential>,
}

/// Drop and recreate every table, then insert the sample rows.
pub fn run(db: &Database) -> Result<SeedReport> {
    run_at(db, Utc::now())
}

/// Same as [`run`] with an explicit clock, so backdated rows are reproducible.
pub fn run_at(db: &Database, now: DateTime<Utc>) -> Result<SeedReport> {
    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;

        info!("Resetting schema");
        migrations::drop_all(&tx)?;
        migrations::run(&tx)?;

        let mut users_created = Vec::new();
        for sample in USERS {
            if query_user_by_email(&tx, sample.email)?.is_some() {
                continue;
            }
            let password_hash = hash_password(SAMPLE_PASSWORD)?;
            insert_user(
                &tx,
                &NewUser {
                    id: Uuid::new_v4(),
                    username: sample.username,
                    email: sample.email,
                    full_name: sample.full_name,
                    password_hash: &password_hash,
                },
            )?;
            info!("Created user: {}", sample.full_name);
            users_created.push(sample.full_name.to_string());
        }

        let users = query_users(&tx)?;

        let mut mood_entries = 0;
        for (u, user) in users.iter().enumerate() {
            let user_id = parse_user_id(&user.id)?;
            for day in 0..MOOD_DAYS {
                let (emoji, label, intensity) = MOODS[(u + day) % MOODS.len()];
                let triggers: Vec<String> = TRIGGERS[(u * 2 + day) % TRIGGERS.len()]
                    .iter()
                    .map(|t| t.to_string())
                    .collect();
                insert_mood_entry(
                    &tx,
                    &NewMoodEntry {
                        id: Uuid::new_v4(),
                        user_id,
                        emoji,
                        label,
                        intensity,
                        triggers: &triggers,
                        journal_text: Some(JOURNAL[(u + day * 3) % JOURNAL.len()]),
                        created_at: Some(now - Duration::days(day as i64)),
                    },
                )?;
                mood_entries += 1;
            }
        }
        info!("Created {} sample mood entries", mood_entries);

        let mut posts = 0;
        if !users.is_empty() {
            for (i, &(content, tag)) in POSTS.iter().enumerate() {
                let owner = &users[i % users.len()];
                insert_post(
                    &tx,
                    &NewPost {
                        id: Uuid::new_v4(),
                        user_id: parse_user_id(&owner.id)?,
                        content,
                        emotion_tag: Some(tag),
                        is_anonymous: true,
                        created_at: Some(now - Duration::hours(1 + (i as i64 * 11) % 48)),
                    },
                )?;
                posts += 1;
            }
        }
        info!("Created {} sample community posts", posts);

        for &(title, description, icon) in ACHIEVEMENTS {
            insert_achievement(&tx, Uuid::new_v4(), title, description, Some(icon))?;
        }
        for &(name, description) in SUPPORT_GROUPS {
            insert_support_group(&tx, Uuid::new_v4(), name, description)?;
        }

        tx.commit()?;

        Ok(SeedReport {
            users_created,
            mood_entries,
            posts,
            achievements: ACHIEVEMENTS.len(),
            support_groups: SUPPORT_GROUPS.len(),
            credentials: USERS
                .iter()
                .map(|u| SampleCredential {
                    email: u.email.to_string(),
                    password: SAMPLE_PASSWORD.to_string(),
                })
                .collect(),
        })
    })
}

fn parse_user_id(raw: &str) -> Result<Uuid> {
    raw.parse()
        .map_err(|e| DbError::Corrupt(format!("user id '{raw}': {e}")))
}
