// src/services/progress/calculator.rs

//! Pure progress rules: chapter status from accumulated metrics, and the
//! weighted roll-up of chapter records into topic and platform summaries.

use std::{collections::HashSet, sync::Arc};

use crate::{
    catalog::Catalog,
    config::ProgressSettings,
    models::progress::{LearningProgress, OverallProgress, ProgressStatus, TopicProgress},
};

#[derive(Debug, Clone)]
pub struct ProgressCalculator {
    catalog: Arc<Catalog>,
    settings: ProgressSettings,
}

impl ProgressCalculator {
    pub fn new(catalog: Arc<Catalog>, settings: ProgressSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Expected reading time of a chapter in seconds.
    ///
    /// Configured estimates win; otherwise the chapter identifier length is
    /// scaled by the topic difficulty and clamped to the configured bounds.
    pub fn estimated_seconds(&self, topic: &str, chapter: &str) -> i64 {
        let key = format!("{topic}/{chapter}");
        if let Some(&known) = self.settings.estimated_seconds.get(&key) {
            if known > 0 {
                return known;
            }
        }

        let difficulty = self.settings.difficulty.get(topic).copied().unwrap_or(1.0);
        let chars_per_sec = if self.settings.chars_per_sec > 0.0 {
            self.settings.chars_per_sec
        } else {
            1.0
        };
        let raw = (chapter.chars().count() as f64 / chars_per_sec * difficulty) as i64;
        raw.max(self.settings.min_seconds).min(self.settings.max_seconds)
    }

    /// A caller-supplied estimate wins when positive.
    pub fn resolve_estimate(&self, topic: &str, chapter: &str, requested: i64) -> i64 {
        if requested > 0 {
            requested
        } else {
            self.estimated_seconds(topic, chapter)
        }
    }

    /// Proposes a status from the record's metrics alone. Callers merge the
    /// proposal with the stored status so it never moves backwards.
    pub fn calculate_chapter_status(&self, record: &LearningProgress, estimated: i64) -> ProgressStatus {
        let estimated = self.resolve_estimate(&record.topic, &record.chapter, estimated);
        let engaged = record.scroll_progress >= self.settings.completion_scroll
            || record.read_duration >= estimated;

        if record.quiz_passed && engaged {
            ProgressStatus::Completed
        } else if record.quiz_score.is_some() || record.quiz_passed {
            ProgressStatus::Tested
        } else if record.read_duration > 0
            || record.scroll_progress > 0
            || !record.last_position.trim().is_empty()
        {
            ProgressStatus::InProgress
        } else {
            ProgressStatus::NotStarted
        }
    }

    /// Display percentage: the larger of scroll depth and read time over the estimate.
    pub fn chapter_percent(&self, record: &LearningProgress) -> i32 {
        let estimated = self.estimated_seconds(&record.topic, &record.chapter).max(1);
        let from_read = (record.read_duration.saturating_mul(100) / estimated).clamp(0, 100) as i32;
        record.scroll_progress.max(from_read).clamp(0, 100)
    }

    /// Rolls chapter records up into one summary per configured topic and a
    /// platform summary. Only `completed` chapters add weight.
    pub fn calculate_overall_progress(
        &self,
        records: &[LearningProgress],
    ) -> (OverallProgress, Vec<TopicProgress>) {
        let mut topics = Vec::new();
        let mut weighted_sum = 0i64;
        let mut weight_total = 0i64;
        let mut completed_chapters = 0;

        for topic in self.catalog.ordered_topics() {
            let items: Vec<&LearningProgress> =
                records.iter().filter(|r| r.topic == topic.id).collect();

            let mut completed_weight = 0;
            let mut completed = 0;
            let mut visited = HashSet::new();
            for item in &items {
                visited.insert(item.chapter.as_str());
                if item.status != ProgressStatus::Completed {
                    continue;
                }
                if let Some(weight) = topic.chapter_weight(&item.chapter) {
                    completed_weight += weight;
                    completed += 1;
                }
            }

            let total_weight = topic.total_weight();
            let progress = if total_weight > 0 {
                percent(completed_weight as f64, total_weight as f64)
            } else {
                0
            };

            weighted_sum += progress as i64 * topic.weight as i64;
            weight_total += topic.weight as i64;
            completed_chapters += completed;

            topics.push(TopicProgress {
                id: topic.id.clone(),
                name: topic.name.clone(),
                weight: topic.weight,
                progress,
                completed_chapters: completed,
                visited_chapters: visited.len(),
                total_chapters: topic.chapters.len(),
                last_visit_at: items.iter().map(|i| i.last_visit_at).max(),
            });
        }

        let study_days: HashSet<_> = records
            .iter()
            .map(|r| r.last_visit_at.date_naive())
            .collect();

        let overall = OverallProgress {
            progress: if weight_total > 0 {
                (weighted_sum as f64 / weight_total as f64).round() as i32
            } else {
                0
            },
            completed_chapters,
            total_chapters: self.catalog.total_chapters(),
            study_days: study_days.len(),
            total_study_time: records.iter().map(|r| r.read_duration).sum(),
        };

        (overall, topics)
    }
}

fn percent(part: f64, whole: f64) -> i32 {
    ((part / whole) * 100.0).round().clamp(0.0, 100.0) as i32
}
