//! Preference-based peer matching.

use std::cmp::Reverse;

use axum::{
    Extension, Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use soulsync_types::api::PreferenceForm;
use soulsync_types::models::{Match, MatchPreference, User};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};
use crate::views;

/// Fallback rule: when nobody shares a tag, suggest users whose tags mention this.
pub const FALLBACK_TAG: &str = "anxiety";
pub const MAX_TAGS: usize = 10;

/// Rank `others` against `mine`.
///
/// Primary rule: shared tags, scored as |shared| / |union| in percent, best
/// first. Only if nobody shares a tag does [`FALLBACK_TAG`] apply, with score 0.
/// An empty `mine` yields no matches.
pub fn rank_matches(mine: &[String], others: &[MatchPreference]) -> Vec<Match> {
    if mine.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<Match> = others
        .iter()
        .filter_map(|other| {
            let common: Vec<String> = mine
                .iter()
                .filter(|tag| other.tags.contains(tag))
                .cloned()
                .collect();
            if common.is_empty() {
                return None;
            }
            let union = mine.len() + other.tags.iter().filter(|t| !mine.contains(t)).count();
            let score = (common.len() * 100 / union) as u8;
            Some(Match {
                user_id: other.user_id,
                username: other.username.clone(),
                common_tags: common,
                score,
            })
        })
        .collect();

    if ranked.is_empty() {
        return fallback_matches(others);
    }

    ranked.sort_by(|a, b| {
        (Reverse(a.score), Reverse(a.common_tags.len()), &a.username)
            .cmp(&(Reverse(b.score), Reverse(b.common_tags.len()), &b.username))
    });
    ranked
}

fn fallback_matches(others: &[MatchPreference]) -> Vec<Match> {
    others
        .iter()
        .filter_map(|other| {
            let hits: Vec<String> = other
                .tags
                .iter()
                .filter(|t| t.contains(FALLBACK_TAG))
                .cloned()
                .collect();
            (!hits.is_empty()).then(|| Match {
                user_id: other.user_id,
                username: other.username.clone(),
                common_tags: hits,
                score: 0,
            })
        })
        .collect()
}

/// GET /matches
pub async fn show_matches(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render(&state, &user, None).await
}

/// POST /matches. Saves (or replaces) the user's preference tags.
pub async fn save_preferences(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<PreferenceForm>,
) -> Result<Response, AppError> {
    let tags = form.tag_list();
    if tags.is_empty() {
        return Ok(render(&state, &user, Some("Please select at least one area where you need support!"))
            .await?
            .into_response());
    }
    if tags.len() > MAX_TAGS {
        let msg = format!("Please choose at most {MAX_TAGS} areas.");
        return Ok(render(&state, &user, Some(&msg)).await?.into_response());
    }

    let user_id = user.id;
    run_blocking(&state, move |s| {
        s.db.save_preferences(Uuid::new_v4(), user_id, &tags)?;
        Ok(())
    })
    .await?;

    Ok(Redirect::to("/matches").into_response())
}

async fn render(state: &AppState, user: &User, error: Option<&str>) -> Result<Html<String>, AppError> {
    let user_id = user.id;
    let (mine, found) = run_blocking(state, move |s| {
        let Some(mine) = s.db.get_preferences(user_id)?.map(MatchPreference::from) else {
            return Ok((Vec::new(), Vec::new()));
        };
        let others: Vec<MatchPreference> = s
            .db
            .list_other_preferences(user_id)?
            .into_iter()
            .map(Into::into)
            .collect();
        let found = rank_matches(&mine.tags, &others);
        Ok((mine.tags, found))
    })
    .await?;

    Ok(views::matches(user, &mine, &found, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pref(username: &str, tags: &[&str]) -> MatchPreference {
        MatchPreference {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: username.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn tags(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn ranks_by_overlap() {
        let others = [
            pref("one-shared", &["work", "family", "health"]),
            pref("both-shared", &["work", "sleep"]),
            pref("nothing", &["studies"]),
        ];

        let found = rank_matches(&tags(&["work", "sleep"]), &others);
        let names: Vec<&str> = found.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["both-shared", "one-shared"]);
        assert_eq!(found[0].score, 100);
        assert_eq!(found[0].common_tags, vec!["work", "sleep"]);
        // 1 shared out of {work, sleep, family, health}
        assert_eq!(found[1].score, 25);
    }

    #[test]
    fn falls_back_to_named_tag_when_nothing_overlaps() {
        let others = [
            pref("anxious", &["social-anxiety"]),
            pref("unrelated", &["studies"]),
        ];

        let found = rank_matches(&tags(&["sleep"]), &others);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "anxious");
        assert_eq!(found[0].score, 0);
    }

    #[test]
    fn overlap_takes_priority_over_fallback() {
        let others = [pref("anxious", &["anxiety"]), pref("sleeper", &["sleep"])];

        let found = rank_matches(&tags(&["sleep"]), &others);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "sleeper");
    }

    #[test]
    fn no_preferences_means_no_matches() {
        let others = [pref("anxious", &["anxiety"])];
        assert!(rank_matches(&[], &others).is_empty());
    }
}
