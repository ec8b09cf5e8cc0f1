use axum::{
    Extension, Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use soulsync_db::models::NewMoodEntry;
use soulsync_types::api::MoodForm;
use soulsync_types::models::{MoodEntry, User};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};
use crate::views;

const HISTORY_LIMIT: u32 = 30;
const MAX_EMOJI_CHARS: usize = 10;
const MAX_LABEL_CHARS: usize = 50;

/// A mood form that passed validation.
#[derive(Debug, PartialEq)]
pub struct ValidMood {
    pub emoji: String,
    pub label: String,
    pub intensity: u8,
    pub triggers: Vec<String>,
    pub journal_text: Option<String>,
}

pub fn validate(form: &MoodForm) -> Result<ValidMood, AppError> {
    let emoji = form.emoji.trim();
    let label = form.label.trim();

    if emoji.is_empty() || label.is_empty() {
        return Err(AppError::Validation("Please select a mood first.".into()));
    }
    if emoji.chars().count() > MAX_EMOJI_CHARS || label.chars().count() > MAX_LABEL_CHARS {
        return Err(AppError::Validation("Mood is too long.".into()));
    }

    let intensity = form
        .intensity
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|i| (1..=5).contains(i))
        .ok_or_else(|| AppError::Validation("Intensity must be a whole number from 1 to 5.".into()))?;

    let journal = form.journal_text.trim();

    Ok(ValidMood {
        emoji: emoji.to_string(),
        label: label.to_string(),
        intensity,
        triggers: form.trigger_list(),
        journal_text: (!journal.is_empty()).then(|| journal.to_string()),
    })
}

/// GET /moods
pub async fn list_moods(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render(&state, &user, None).await
}

/// POST /moods
pub async fn create_mood(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<MoodForm>,
) -> Result<Response, AppError> {
    let mood = match validate(&form) {
        Ok(mood) => mood,
        Err(e) => {
            let msg = e.to_string();
            return Ok(render(&state, &user, Some(&msg)).await?.into_response());
        }
    };

    let user_id = user.id;
    run_blocking(&state, move |s| {
        s.db.insert_mood_entry(&NewMoodEntry {
            id: Uuid::new_v4(),
            user_id,
            emoji: &mood.emoji,
            label: &mood.label,
            intensity: mood.intensity,
            triggers: &mood.triggers,
            journal_text: mood.journal_text.as_deref(),
            created_at: None,
        })?;
        Ok(())
    })
    .await?;

    Ok(Redirect::to("/moods").into_response())
}

async fn render(state: &AppState, user: &User, error: Option<&str>) -> Result<Html<String>, AppError> {
    let user_id = user.id;
    let entries: Vec<MoodEntry> = run_blocking(state, move |s| {
        Ok(s.db
            .list_mood_entries(user_id, HISTORY_LIMIT)?
            .into_iter()
            .map(Into::into)
            .collect())
    })
    .await?;

    Ok(views::moods(user, &entries, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(emoji: &str, label: &str, intensity: &str) -> MoodForm {
        MoodForm {
            emoji: emoji.into(),
            label: label.into(),
            intensity: intensity.into(),
            triggers: "Work, stress".into(),
            journal_text: "  ".into(),
        }
    }

    #[test]
    fn valid_form_is_normalised() {
        let mood = validate(&form("😊", " Happy ", "4")).unwrap();
        assert_eq!(
            mood,
            ValidMood {
                emoji: "😊".into(),
                label: "Happy".into(),
                intensity: 4,
                triggers: vec!["work".into(), "stress".into()],
                journal_text: None,
            }
        );
    }

    #[test]
    fn intensity_must_be_in_range() {
        for bad in ["0", "6", "-1", "three", "", "2.5"] {
            assert!(
                matches!(validate(&form("😊", "Happy", bad)), Err(AppError::Validation(_))),
                "accepted intensity {bad:?}"
            );
        }
    }

    #[test]
    fn mood_is_required() {
        assert!(matches!(validate(&form("", "Happy", "3")), Err(AppError::Validation(_))));
        assert!(matches!(validate(&form("😊", " ", "3")), Err(AppError::Validation(_))));
    }
}
