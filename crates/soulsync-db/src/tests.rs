use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use soulsync_types::models::{ChatMessage, CommunityPost, MatchPreference, MoodEntry, User};

use crate::models::{NewChatMessage, NewMoodEntry, NewPost, NewUser};
use crate::{Database, DbError, Table, seed};

fn db() -> Database {
    Database::open_in_memory().unwrap()
}

fn add_user(db: &Database, username: &str, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.create_user(&NewUser {
        id,
        username,
        email,
        full_name: "Test Person",
        password_hash: "$argon2id$placeholder",
    })
    .unwrap();
    id
}

fn mood(user_id: Uuid, intensity: u8) -> NewMoodEntry<'static> {
    NewMoodEntry {
        id: Uuid::new_v4(),
        user_id,
        emoji: "😊",
        label: "Happy",
        intensity,
        triggers: &[],
        journal_text: None,
        created_at: None,
    }
}

#[test]
fn duplicate_email_is_a_constraint_violation() {
    let db = db();
    add_user(&db, "alice", "alice@example.com");

    let err = db
        .create_user(&NewUser {
            id: Uuid::new_v4(),
            username: "alice2",
            email: "alice@example.com",
            full_name: "Other Alice",
            password_hash: "x",
        })
        .unwrap_err();

    assert!(matches!(err, DbError::ConstraintViolation(_)), "got {err:?}");
}

#[test]
fn duplicate_username_is_a_constraint_violation() {
    let db = db();
    add_user(&db, "alice", "alice@example.com");

    let err = db
        .create_user(&NewUser {
            id: Uuid::new_v4(),
            username: "alice",
            email: "other@example.com",
            full_name: "Other Alice",
            password_hash: "x",
        })
        .unwrap_err();

    assert!(err.is_constraint_violation());
}

#[test]
fn user_lookup_by_email_username_and_id() {
    let db = db();
    let id = add_user(&db, "bob", "bob@example.com");

    let by_email = db.get_user_by_email("bob@example.com").unwrap().unwrap();
    assert_eq!(by_email.username, "bob");
    assert!(db.get_user_by_username("bob").unwrap().is_some());

    let user: User = db.get_user_by_id(id).unwrap().unwrap().into();
    assert_eq!(user.id, id);
    assert_eq!(user.email, "bob@example.com");

    assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    assert!(db.get_user_by_username("bob@example.com").unwrap().is_none());
    assert!(db.get_user_by_id(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn update_password_replaces_hash() {
    let db = db();
    let id = add_user(&db, "carol", "carol@example.com");

    assert!(db.update_password(id, "new-hash").unwrap());
    let row = db.get_user_by_id(id).unwrap().unwrap();
    assert_eq!(row.password_hash, "new-hash");

    assert!(!db.update_password(Uuid::new_v4(), "ignored").unwrap());
}

#[test]
fn mood_entry_requires_existing_user() {
    let db = db();
    let err = db.insert_mood_entry(&mood(Uuid::new_v4(), 3)).unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn mood_intensity_is_bounded() {
    let db = db();
    let user = add_user(&db, "dan", "dan@example.com");

    assert!(db.insert_mood_entry(&mood(user, 0)).unwrap_err().is_constraint_violation());
    assert!(db.insert_mood_entry(&mood(user, 6)).unwrap_err().is_constraint_violation());
    db.insert_mood_entry(&mood(user, 5)).unwrap();
}

#[test]
fn mood_entries_are_listed_per_user_newest_first() {
    let db = db();
    let alice = add_user(&db, "alice", "alice@example.com");
    let bob = add_user(&db, "bob", "bob@example.com");

    let triggers = vec!["work".to_string(), "sleep".to_string()];
    let now = Utc::now();
    for days_ago in [2, 0, 1] {
        db.insert_mood_entry(&NewMoodEntry {
            triggers: &triggers,
            created_at: Some(now - Duration::days(days_ago)),
            ..mood(alice, 3)
        })
        .unwrap();
    }
    db.insert_mood_entry(&mood(bob, 1)).unwrap();

    let entries: Vec<MoodEntry> = db
        .list_mood_entries(alice, 10)
        .unwrap()
        .into_iter()
        .map(Into::into)
        .collect();

    assert_eq!(entries.len(), 3);
    assert!(entries.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert_eq!(entries[0].triggers, triggers);
    assert!(entries.iter().all(|e| e.user_id == alice));

    assert_eq!(db.list_mood_entries(alice, 2).unwrap().len(), 2);
}

#[test]
fn mood_stats_aggregate_entries() {
    let db = db();
    let user = add_user(&db, "erin", "erin@example.com");
    let now = Utc::now();

    for (days_ago, intensity) in [(0, 4), (1, 2), (1, 3), (3, 5)] {
        db.insert_mood_entry(&NewMoodEntry {
            created_at: Some(now - Duration::days(days_ago)),
            ..mood(user, intensity)
        })
        .unwrap();
    }

    let stats = db.mood_stats(user, now.date_naive()).unwrap();
    assert_eq!(stats.total_entries, 4);
    assert_eq!(stats.average_intensity, Some(3.5));
    assert_eq!(stats.current_streak, 2);

    let empty = db.mood_stats(Uuid::new_v4(), NaiveDate::default()).unwrap();
    assert_eq!(empty.total_entries, 0);
    assert_eq!(empty.average_intensity, None);
}

#[test]
fn posts_carry_author_and_anonymity() {
    let db = db();
    let user = add_user(&db, "frank", "frank@example.com");

    db.insert_post(&NewPost {
        id: Uuid::new_v4(),
        user_id: user,
        content: "Feeling calm today",
        emotion_tag: Some("calm"),
        is_anonymous: true,
        created_at: None,
    })
    .unwrap();

    let posts: Vec<CommunityPost> = db.list_posts(10).unwrap().into_iter().map(Into::into).collect();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author_username, "frank");
    assert_eq!(posts[0].display_author(), "Anonymous");
    assert_eq!(posts[0].emotion_tag.as_deref(), Some("calm"));
    assert_eq!(db.count_posts_by_user(user).unwrap(), 1);
    assert_eq!(db.count_posts_by_user(Uuid::new_v4()).unwrap(), 0);
}

#[test]
fn blank_post_content_is_rejected_by_the_schema() {
    let db = db();
    let user = add_user(&db, "gina", "gina@example.com");

    let err = db
        .insert_post(&NewPost {
            id: Uuid::new_v4(),
            user_id: user,
            content: "   ",
            emotion_tag: None,
            is_anonymous: false,
            created_at: None,
        })
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn chat_rooms_track_participants_and_messages() {
    let db = db();
    let alice = add_user(&db, "alice", "alice@example.com");
    let bob = add_user(&db, "bob", "bob@example.com");
    let carol = add_user(&db, "carol", "carol@example.com");

    let room = Uuid::new_v4();
    db.create_room(room, None, false, &[alice, bob]).unwrap();

    assert!(db.is_participant(room, alice).unwrap());
    assert!(!db.is_participant(room, carol).unwrap());
    assert_eq!(db.find_direct_room(bob, alice).unwrap(), Some(room.to_string()));
    assert_eq!(db.find_direct_room(alice, carol).unwrap(), None);
    assert_eq!(db.list_rooms_for_user(alice).unwrap().len(), 1);
    assert!(db.list_rooms_for_user(carol).unwrap().is_empty());
    assert_eq!(db.list_participants(room).unwrap().len(), 2);

    for (sender, content, is_anonymous) in [(alice, "hi", true), (bob, "hello", false), (alice, "how are you", true)] {
        db.insert_chat_message(&NewChatMessage {
            id: Uuid::new_v4(),
            room_id: room,
            sender_id: sender,
            content,
            is_anonymous,
        })
        .unwrap();
    }

    let messages: Vec<ChatMessage> = db
        .list_chat_messages(room, 2)
        .unwrap()
        .into_iter()
        .map(Into::into)
        .collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "hello");
    assert_eq!(messages[0].display_sender(), "bob");
    assert_eq!(messages[1].content, "how are you");
    assert_eq!(messages[1].display_sender(), "Anonymous");
}

#[test]
fn room_creation_rolls_back_on_unknown_participant() {
    let db = db();
    let alice = add_user(&db, "alice", "alice@example.com");

    let room = Uuid::new_v4();
    let err = db.create_room(room, Some("ghost"), false, &[alice, Uuid::new_v4()]).unwrap_err();
    assert!(err.is_constraint_violation());
    assert!(db.get_room(room).unwrap().is_none());
    assert!(db.list_rooms_for_user(alice).unwrap().is_empty());
}

#[test]
fn preferences_are_one_per_user() {
    let db = db();
    let alice = add_user(&db, "alice", "alice@example.com");
    let bob = add_user(&db, "bob", "bob@example.com");

    db.save_preferences(Uuid::new_v4(), alice, &["anxiety".into()]).unwrap();
    db.save_preferences(Uuid::new_v4(), alice, &["sleep".into(), "work".into()]).unwrap();
    db.save_preferences(Uuid::new_v4(), bob, &["work".into()]).unwrap();

    let mine: MatchPreference = db.get_preferences(alice).unwrap().unwrap().into();
    assert_eq!(mine.tags, vec!["sleep", "work"]);
    assert_eq!(db.count_rows(Table::MatchPreferences).unwrap(), 2);

    let others = db.list_other_preferences(alice).unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].username, "bob");
}

#[test]
fn sessions_can_be_created_deleted_and_expired() {
    let db = db();
    let user = add_user(&db, "hank", "hank@example.com");
    let now = Utc::now();

    let live = Uuid::new_v4();
    let stale = Uuid::new_v4();
    db.create_session(live, user, now + Duration::days(1)).unwrap();
    db.create_session(stale, user, now - Duration::minutes(1)).unwrap();

    let row = db.get_session(live).unwrap().unwrap();
    assert!(!row.is_expired(now));
    assert!(db.get_session(stale).unwrap().unwrap().is_expired(now));

    assert_eq!(db.delete_expired_sessions(now).unwrap(), 1);
    assert!(db.get_session(stale).unwrap().is_none());

    assert!(db.delete_session(live).unwrap());
    assert!(!db.delete_session(live).unwrap());
}

#[test]
fn seed_populates_sample_rows() {
    let db = db();
    let report = seed::run(&db).unwrap();

    assert_eq!(report.users_created, vec!["John Doe", "Jane Smith"]);
    assert_eq!(db.count_rows(Table::Users).unwrap(), 2);
    assert_eq!(db.count_rows(Table::MoodEntries).unwrap(), 14);
    assert_eq!(db.count_rows(Table::CommunityPosts).unwrap(), 5);
    assert_eq!(db.count_rows(Table::Achievements).unwrap(), 4);
    assert_eq!(db.count_rows(Table::SupportGroups).unwrap(), 4);

    let users = db.list_users().unwrap();
    assert_eq!(users[0].email, "test1@example.com");
    assert_eq!(users[1].email, "test2@example.com");
    for user in &users {
        let id = user.id.parse().unwrap();
        assert_eq!(db.list_mood_entries(id, 100).unwrap().len(), seed::MOOD_DAYS);
        assert!(crate::password::verify_password(seed::SAMPLE_PASSWORD, &user.password_hash));
    }

    // Owners cycle through the users by post index.
    let posts = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT user_id FROM community_posts ORDER BY rowid")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    })
    .unwrap();
    for (i, owner) in posts.iter().enumerate() {
        assert_eq!(owner, &users[i % users.len()].id);
    }
}

#[test]
fn reseeding_resets_instead_of_duplicating() {
    let db = db();
    seed::run(&db).unwrap();

    // Rows added between runs must disappear too.
    let extra = add_user(&db, "extra", "extra@example.com");
    db.insert_mood_entry(&mood(extra, 2)).unwrap();

    seed::run(&db).unwrap();

    assert_eq!(db.count_rows(Table::Users).unwrap(), 2);
    assert_eq!(db.count_rows(Table::MoodEntries).unwrap(), 14);
    assert_eq!(db.count_rows(Table::CommunityPosts).unwrap(), 5);
    assert!(db.get_user_by_email("extra@example.com").unwrap().is_none());
}

#[test]
fn failed_reseed_rolls_back_to_previous_state() {
    let db = db();
    seed::run(&db).unwrap();
    let before: Vec<String> = db.list_users().unwrap().into_iter().map(|u| u.id).collect();

    // A table outside the schema still referencing users makes the drop fail.
    db.with_conn(|conn| {
        conn.execute_batch(
            "CREATE TABLE blocker (user_id TEXT NOT NULL REFERENCES users(id));
             INSERT INTO blocker (user_id) SELECT id FROM users LIMIT 1;",
        )?;
        Ok(())
    })
    .unwrap();

    let err = seed::run(&db).unwrap_err();
    assert!(err.is_constraint_violation(), "{err:?}");

    assert_eq!(db.count_rows(Table::Users).unwrap(), 2);
    assert_eq!(db.count_rows(Table::MoodEntries).unwrap(), 14);
    assert_eq!(db.count_rows(Table::CommunityPosts).unwrap(), 5);
    let after: Vec<String> = db.list_users().unwrap().into_iter().map(|u| u.id).collect();
    assert_eq!(before, after);
}

#[test]
fn every_table_is_countable_after_migration() {
    let db = db();
    for table in Table::ALL {
        assert_eq!(db.count_rows(table).unwrap(), 0, "{}", table.name());
    }
}

#[test]
fn file_backed_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("soulsync.db");

    {
        let db = Database::open(&path).unwrap();
        add_user(&db, "ivy", "ivy@example.com");
    }

    let url = format!("sqlite://{}", path.display());
    let db = Database::connect(&url).unwrap();
    assert!(db.get_user_by_email("ivy@example.com").unwrap().is_some());
}
