//! Server-rendered pages. Plain strings; interpolated text goes through
//! `html_escape::encode_text`, attribute values through
//! `encode_double_quoted_attribute`.

use std::fmt::Write;

use axum::response::Html;
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use soulsync_types::models::{
    Achievement, ChatMessage, ChatParticipant, ChatRoom, CommunityPost, Match, MoodEntry,
    MoodStats, SupportGroup, User,
};

fn when(ts: DateTime<Utc>) -> String {
    ts.format("%b %-d, %H:%M UTC").to_string()
}

fn flash(error: Option<&str>) -> String {
    error
        .map(|msg| format!(r#"<p class="flash flash-error">{}</p>"#, encode_text(msg)))
        .unwrap_or_default()
}

fn layout(title: &str, user: Option<&User>, body: &str) -> Html<String> {
    let nav = match user {
        Some(user) => format!(
            r#"<a href="/dashboard">Dashboard</a> <a href="/moods">Moods</a> <a href="/community">Community</a> <a href="/chats">Chats</a> <a href="/matches">Matches</a> <a href="/groups">Groups</a> <a href="/achievements">Achievements</a> <span class="who">{}</span> <a href="/logout">Log out</a>"#,
            encode_text(&user.username)
        ),
        None => r#"<a href="/login">Log in</a> <a href="/register">Sign up</a>"#.to_string(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{} · SoulSync</title></head>
<body>
<nav><a href="/">SoulSync</a> {}</nav>
<main>
{}
</main>
</body>
</html>"#,
        encode_text(title),
        nav,
        body
    ))
}

pub fn landing(user: Option<&User>) -> Html<String> {
    let cta = match user {
        Some(_) => r#"<a href="/dashboard">Go to your dashboard</a>"#,
        None => r#"<a href="/register">Create an account</a> or <a href="/login">log in</a>"#,
    };
    layout(
        "Welcome",
        user,
        &format!(
            "<h1>SoulSync</h1><p>Track your mood, share anonymously, and find people who understand.</p><p>{cta}</p>"
        ),
    )
}

pub fn login(error: Option<&str>, email: &str) -> Html<String> {
    layout(
        "Log in",
        None,
        &format!(
            r#"<h1>Log in</h1>{}
<form method="post" action="/login">
<label>Email <input type="email" name="email" value="{}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
<p>New here? <a href="/register">Create an account</a></p>"#,
            flash(error),
            encode_double_quoted_attribute(email)
        ),
    )
}

pub fn register(error: Option<&str>, username: &str, email: &str, full_name: &str) -> Html<String> {
    layout(
        "Sign up",
        None,
        &format!(
            r#"<h1>Create your account</h1>{}
<form method="post" action="/register">
<label>Username <input name="username" value="{}" required></label>
<label>Email <input type="email" name="email" value="{}" required></label>
<label>Full name <input name="full_name" value="{}" required></label>
<label>Password <input type="password" name="password" required></label>
<label>Confirm password <input type="password" name="confirm_password" required></label>
<button type="submit">Sign up</button>
</form>"#,
            flash(error),
            encode_double_quoted_attribute(username),
            encode_double_quoted_attribute(email),
            encode_double_quoted_attribute(full_name)
        ),
    )
}

pub fn dashboard(
    user: &User,
    stats: &MoodStats,
    recent_moods: &[MoodEntry],
    recent_posts: &[CommunityPost],
    error: Option<&str>,
) -> Html<String> {
    let mut body = format!(
        "<h1>Welcome back, {}</h1>{}",
        encode_text(&user.full_name),
        flash(error)
    );

    let average = stats
        .average_intensity
        .map(|avg| format!("{avg:.1}"))
        .unwrap_or_else(|| "–".to_string());
    let _ = write!(
        body,
        r#"<section class="metrics"><p>Entries: {}</p><p>Average intensity: {}</p><p>Current streak: {} day(s)</p></section>"#,
        stats.total_entries, average, stats.current_streak
    );

    body.push_str("<h2>Recent moods</h2>");
    body.push_str(&mood_list(recent_moods));
    body.push_str("<h2>From the community</h2>");
    body.push_str(&post_list(recent_posts));

    body.push_str(
        r#"<h2>Change password</h2>
<form method="post" action="/account/password">
<label>Current password <input type="password" name="current_password" required></label>
<label>New password <input type="password" name="new_password" required></label>
<button type="submit">Update</button>
</form>"#,
    );

    layout("Dashboard", Some(user), &body)
}

fn mood_list(entries: &[MoodEntry]) -> String {
    if entries.is_empty() {
        return "<p>No moods logged yet.</p>".to_string();
    }
    let mut out = String::from(r#"<ul class="moods">"#);
    for entry in entries {
        let _ = write!(
            out,
            "<li>{} {} ({}/5) <small>{}</small>",
            encode_text(&entry.emoji),
            encode_text(&entry.label),
            entry.intensity,
            when(entry.created_at)
        );
        if !entry.triggers.is_empty() {
            let _ = write!(out, " <em>{}</em>", encode_text(&entry.triggers.join(", ")));
        }
        if let Some(journal) = &entry.journal_text {
            let _ = write!(out, "<p>{}</p>", encode_text(journal));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn post_list(posts: &[CommunityPost]) -> String {
    if posts.is_empty() {
        return "<p>Nothing shared yet.</p>".to_string();
    }
    let mut out = String::from(r#"<ul class="posts">"#);
    for post in posts {
        let tag = post
            .emotion_tag
            .as_deref()
            .map(|t| format!(r#" <span class="tag">#{}</span>"#, encode_text(t)))
            .unwrap_or_default();
        let _ = write!(
            out,
            "<li><p>{}</p><small>{} · {}</small>{}</li>",
            encode_text(&post.content),
            encode_text(post.display_author()),
            when(post.created_at),
            tag
        );
    }
    out.push_str("</ul>");
    out
}

pub fn moods(user: &User, entries: &[MoodEntry], error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>Mood journal</h1>{}
<form method="post" action="/moods">
<label>Emoji <input name="emoji" maxlength="10" required></label>
<label>Mood <input name="label" maxlength="50" required></label>
<label>Intensity (1-5) <input type="number" name="intensity" min="1" max="5" value="3" required></label>
<label>Triggers <input name="triggers" placeholder="work, sleep"></label>
<label>Journal <textarea name="journal_text"></textarea></label>
<button type="submit">Save entry</button>
</form>
<h2>History</h2>{}"#,
        flash(error),
        mood_list(entries)
    );
    layout("Moods", Some(user), &body)
}

pub fn community(user: &User, posts: &[CommunityPost], error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>Community</h1>{}
<form method="post" action="/community">
<label>Share something <textarea name="content" required></textarea></label>
<label>Feeling
<select name="emotion_tag">
<option value="general">general</option><option value="calm">calm</option><option value="anxious">anxious</option>
<option value="happy">happy</option><option value="sad">sad</option><option value="hopeful">hopeful</option>
</select></label>
<label><input type="checkbox" name="anonymous" checked> Post anonymously</label>
<button type="submit">Share</button>
</form>{}"#,
        flash(error),
        post_list(posts)
    );
    layout("Community", Some(user), &body)
}

pub fn achievements(user: &User, achievements: &[(Achievement, bool)]) -> Html<String> {
    let mut body = String::from("<h1>Achievements</h1><ul class=\"achievements\">");
    for (a, earned) in achievements {
        let (class, status) = if *earned { ("earned", "Earned") } else { ("locked", "Locked") };
        let _ = write!(
            body,
            r#"<li class="{}">{} <strong>{}</strong> {} <em>{}</em></li>"#,
            class,
            encode_text(a.icon.as_deref().unwrap_or("")),
            encode_text(&a.title),
            encode_text(&a.description),
            status
        );
    }
    body.push_str("</ul>");
    layout("Achievements", Some(user), &body)
}

pub fn groups(user: &User, groups: &[SupportGroup]) -> Html<String> {
    let mut body = String::from("<h1>Support groups</h1><ul>");
    for g in groups {
        let _ = write!(
            body,
            "<li><strong>{}</strong> {}</li>",
            encode_text(&g.name),
            encode_text(&g.description)
        );
    }
    body.push_str("</ul>");
    layout("Support groups", Some(user), &body)
}

/// A room as listed for one viewer.
pub struct RoomSummary {
    pub room: ChatRoom,
    pub participants: Vec<ChatParticipant>,
}

fn room_title(room: &ChatRoom, participants: &[ChatParticipant], viewer: &User) -> String {
    if let Some(name) = &room.name {
        return name.clone();
    }
    let others: Vec<&str> = participants
        .iter()
        .filter(|p| p.user_id != viewer.id)
        .map(|p| {
            if p.is_identity_revealed {
                p.username.as_str()
            } else {
                "Anonymous"
            }
        })
        .collect();
    if others.is_empty() {
        "Just you".to_string()
    } else {
        format!("Chat with {}", others.join(", "))
    }
}

pub fn chats(user: &User, rooms: &[RoomSummary], error: Option<&str>) -> Html<String> {
    let mut body = format!(
        r#"<h1>Chats</h1>{}
<form method="post" action="/chats">
<label>Username <input name="username" required></label>
<label>Room name <input name="name" placeholder="optional"></label>
<button type="submit">Start chat</button>
</form><ul>"#,
        flash(error)
    );
    for summary in rooms {
        let _ = write!(
            body,
            r#"<li><a href="/chats/{}">{}</a></li>"#,
            summary.room.id,
            encode_text(&room_title(&summary.room, &summary.participants, user))
        );
    }
    body.push_str("</ul>");
    layout("Chats", Some(user), &body)
}

pub fn chat_room(
    user: &User,
    room: &ChatRoom,
    participants: &[ChatParticipant],
    messages: &[ChatMessage],
    error: Option<&str>,
) -> Html<String> {
    let title = room_title(room, participants, user);
    let mut body = format!("<h1>{}</h1>{}<ol class=\"messages\">", encode_text(&title), flash(error));
    for message in messages {
        let sender = if message.sender_id == user.id {
            "You"
        } else {
            message.display_sender()
        };
        let _ = write!(
            body,
            "<li><strong>{}</strong>: {} <small>{}</small></li>",
            encode_text(sender),
            encode_text(&message.content),
            when(message.created_at)
        );
    }
    let _ = write!(
        body,
        r#"</ol>
<form method="post" action="/chats/{}/messages">
<label>Message <input name="content" required></label>
<label><input type="checkbox" name="anonymous" checked> Stay anonymous</label>
<button type="submit">Send</button>
</form>"#,
        room.id
    );
    layout(&title, Some(user), &body)
}

pub fn matches(user: &User, my_tags: &[String], matches: &[Match], error: Option<&str>) -> Html<String> {
    let mut body = format!(
        r#"<h1>Find support</h1>{}
<form method="post" action="/matches">
<label>What would you like support with? <input name="tags" value="{}" placeholder="anxiety, work, sleep"></label>
<button type="submit">Save preferences</button>
</form>"#,
        flash(error),
        encode_double_quoted_attribute(&my_tags.join(", "))
    );

    if my_tags.is_empty() {
        body.push_str("<p>Save at least one preference to see matches.</p>");
    } else if matches.is_empty() {
        body.push_str("<p>No matches yet. Check back later.</p>");
    } else {
        body.push_str("<ul class=\"matches\">");
        for m in matches {
            let _ = write!(
                body,
                r#"<li><strong>{}</strong> {}% match <em>{}</em>
<form method="post" action="/chats"><input type="hidden" name="username" value="{}"><button type="submit">Start chat</button></form></li>"#,
                encode_text(&m.username),
                m.score,
                encode_text(&m.common_tags.join(", ")),
                encode_double_quoted_attribute(&m.username)
            );
        }
        body.push_str("</ul>");
    }
    layout("Matches", Some(user), &body)
}

pub fn not_found() -> Html<String> {
    layout("Not found", None, "<h1>Not found</h1><p><a href=\"/\">Back home</a></p>")
}

pub fn error_page(message: &str) -> Html<String> {
    layout(
        "Error",
        None,
        &format!("<h1>Sorry</h1><p>{}</p><p><a href=\"/\">Back home</a></p>", encode_text(message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralises_markup() {
        let Html(page) = error_page(r#"<script>alert("x&y")</script>"#);
        assert!(page.contains(r#"&lt;script&gt;alert("x&amp;y")&lt;/script&gt;"#));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn attribute_values_cannot_break_out() {
        let Html(page) = login(None, r#""><script>x</script>"#);
        assert!(page.contains(r#"value="&quot;&gt;&lt;script&gt;x&lt;/script&gt;""#));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn login_page_shows_flash_and_keeps_email() {
        let Html(page) = login(Some("Invalid credentials"), "a@example.com");
        assert!(page.contains("Invalid credentials"));
        assert!(page.contains(r#"value="a@example.com""#));
    }
}
