//! Catalogs: achievements (with the viewer's earned state) and support groups.

use axum::{Extension, extract::State, response::Html};
use chrono::Utc;

use soulsync_types::models::{
    Achievement, COMMUNITY_HELPER, FIRST_STEP, MINDFUL_MONTH, MoodStats, SupportGroup,
    WEEK_WARRIOR,
};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};
use crate::views;

const WEEK_STREAK: u32 = 7;
const MONTH_STREAK: u32 = 30;
const HELPER_POSTS: u32 = 5;

/// What a user has done so far.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub stats: MoodStats,
    pub posts: u32,
}

/// Unknown titles are never earned.
pub fn is_earned(title: &str, progress: &Progress) -> bool {
    match title {
        FIRST_STEP => progress.stats.total_entries >= 1,
        WEEK_WARRIOR => progress.stats.current_streak >= WEEK_STREAK,
        COMMUNITY_HELPER => progress.posts >= HELPER_POSTS,
        MINDFUL_MONTH => progress.stats.current_streak >= MONTH_STREAK,
        _ => false,
    }
}

/// GET /achievements
pub async fn achievements(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let user_id = user.id;
    let list: Vec<(Achievement, bool)> = run_blocking(&state, move |s| {
        let progress = Progress {
            stats: s.db.mood_stats(user_id, Utc::now().date_naive())?,
            posts: s.db.count_posts_by_user(user_id)?,
        };
        Ok(s.db
            .list_achievements()?
            .into_iter()
            .map(|row| {
                let achievement = Achievement::from(row);
                let earned = is_earned(&achievement.title, &progress);
                (achievement, earned)
            })
            .collect())
    })
    .await?;

    Ok(views::achievements(&user, &list))
}

/// GET /groups
pub async fn groups(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let list: Vec<SupportGroup> = run_blocking(&state, |s| {
        Ok(s.db.list_support_groups()?.into_iter().map(Into::into).collect())
    })
    .await?;

    Ok(views::groups(&user, &list))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(total_entries: u32, current_streak: u32, posts: u32) -> Progress {
        Progress {
            stats: MoodStats {
                total_entries,
                average_intensity: None,
                current_streak,
            },
            posts,
        }
    }

    #[test]
    fn nothing_is_earned_before_any_activity() {
        let fresh = Progress::default();
        for title in [FIRST_STEP, WEEK_WARRIOR, COMMUNITY_HELPER, MINDFUL_MONTH] {
            assert!(!is_earned(title, &fresh), "{title}");
        }
    }

    #[test]
    fn streak_thresholds() {
        let week = progress(7, 7, 0);
        assert!(is_earned(FIRST_STEP, &week));
        assert!(is_earned(WEEK_WARRIOR, &week));
        assert!(!is_earned(MINDFUL_MONTH, &week));

        assert!(is_earned(MINDFUL_MONTH, &progress(30, 30, 0)));
        assert!(!is_earned(WEEK_WARRIOR, &progress(20, 6, 0)));
    }

    #[test]
    fn helper_counts_posts() {
        assert!(!is_earned(COMMUNITY_HELPER, &progress(0, 0, 4)));
        assert!(is_earned(COMMUNITY_HELPER, &progress(0, 0, 5)));
        assert!(!is_earned("Unknown", &progress(100, 100, 100)));
    }
}
