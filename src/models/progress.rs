// src/models/progress.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::CHAPTER_SLUG;

/// Chapter learning state.
///
/// Variants are declared in ascending order, so `Ord` is the anti-regression
/// order and merging two statuses is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Tested,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Tested => "tested",
            ProgressStatus::Completed => "completed",
        }
    }

    /// Never moves backwards.
    pub fn merge(self, proposed: ProgressStatus) -> ProgressStatus {
        self.max(proposed)
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown progress status '{0}'")]
pub struct UnknownStatus(pub String);

impl TryFrom<String> for ProgressStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "not_started" => Ok(ProgressStatus::NotStarted),
            "in_progress" => Ok(ProgressStatus::InProgress),
            "tested" => Ok(ProgressStatus::Tested),
            "completed" => Ok(ProgressStatus::Completed),
            _ => Err(UnknownStatus(value)),
        }
    }
}

/// Represents the 'learning_progress' table: one row per (user, topic, chapter).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LearningProgress {
    pub user_id: i64,
    pub topic: String,
    pub chapter: String,
    #[sqlx(try_from = "String")]
    pub status: ProgressStatus,
    /// Cumulative seconds spent reading.
    pub read_duration: i64,
    /// Deepest scroll position seen, 0-100.
    pub scroll_progress: i32,
    pub last_position: String,
    /// Latest quiz score; `None` until a quiz has been taken.
    pub quiz_score: Option<i32>,
    pub quiz_passed: bool,
    pub first_visit_at: DateTime<Utc>,
    pub last_visit_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LearningProgress {
    pub fn first_visit(user_id: i64, topic: &str, chapter: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            topic: topic.to_string(),
            chapter: chapter.to_string(),
            status: ProgressStatus::NotStarted,
            read_duration: 0,
            scroll_progress: 0,
            last_position: String::new(),
            quiz_score: None,
            quiz_passed: false,
            first_visit_at: now,
            last_visit_at: now,
            completed_at: None,
        }
    }
}

/// DTO for recording a reading visit or a quiz outcome.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProgressRequest {
    #[serde(default)]
    pub user_id: i64,

    #[validate(length(min = 1, max = 64))]
    pub topic: String,

    #[validate(regex(path = *CHAPTER_SLUG, message = "chapter must be a lowercase slug"))]
    pub chapter: String,

    /// Seconds read since the previous update.
    #[serde(default)]
    pub read_duration: i64,

    #[serde(default)]
    pub scroll_progress: i32,

    #[serde(default)]
    #[validate(length(max = 256))]
    pub last_position: String,

    #[serde(default)]
    pub quiz_score: Option<i32>,

    #[serde(default)]
    pub quiz_passed: bool,

    /// Client-side duration estimate; non-positive means "use the server estimate".
    #[serde(default)]
    pub estimated_seconds: i64,
}

/// Chapter state after a write, plus the recomputed summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub status: ProgressStatus,
    pub read_duration: i64,
    pub scroll_progress: i32,
    pub last_position: String,
    pub overall: OverallProgress,
    pub topic: TopicProgress,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallProgress {
    /// Weighted completion percentage across all topics.
    pub progress: i32,
    pub completed_chapters: usize,
    pub total_chapters: usize,
    pub study_days: usize,
    /// Sum of all read durations, in seconds.
    pub total_study_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub id: String,
    pub name: String,
    pub weight: i32,
    pub progress: i32,
    pub completed_chapters: usize,
    pub visited_chapters: usize,
    pub total_chapters: usize,
    pub last_visit_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextChapter {
    pub topic: String,
    pub chapter: String,
    pub status: ProgressStatus,
    pub progress: i32,
}

/// Platform summary plus one entry per configured topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub overall: OverallProgress,
    pub topics: Vec<TopicProgress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicDetail {
    pub summary: TopicProgress,
    pub chapters: Vec<LearningProgress>,
}

/// A chapter record with a display percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterProgressView {
    #[serde(flatten)]
    pub record: LearningProgress,
    pub percent: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_max_under_status_order() {
        use ProgressStatus::*;
        let all = [NotStarted, InProgress, Tested, Completed];
        for a in all {
            for b in all {
                let merged = a.merge(b);
                assert!(merged >= a && merged >= b);
                assert_eq!(merged, b.merge(a));
            }
        }
        assert_eq!(Completed.merge(InProgress), Completed);
        assert_eq!(Tested.merge(Completed), Completed);
    }

    #[test]
    fn status_round_trips_through_storage_text() {
        for status in [
            ProgressStatus::NotStarted,
            ProgressStatus::InProgress,
            ProgressStatus::Tested,
            ProgressStatus::Completed,
        ] {
            assert_eq!(
                ProgressStatus::try_from(status.as_str().to_string()).unwrap(),
                status
            );
        }
        assert!(ProgressStatus::try_from("done".to_string()).is_err());
        assert!(ProgressStatus::try_from("paused".to_string()).is_err());
    }
}
