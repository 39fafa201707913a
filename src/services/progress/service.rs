// src/services/progress/service.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, Result},
    models::progress::{
        ChapterProgressView, LearningProgress, NextChapter, ProgressStatus, ProgressSummary,
        ProgressUpdate, TopicDetail, TopicProgress, UpdateProgressRequest,
    },
    repository::ProgressRepository,
    services::progress::calculator::ProgressCalculator,
    utils::locks::KeyedLocks,
};

type ChapterKey = (i64, String, String);

/// Reads and writes chapter progress; never lets a chapter regress.
pub struct ProgressService {
    repo: Arc<dyn ProgressRepository>,
    calculator: ProgressCalculator,
    locks: KeyedLocks<ChapterKey>,
}

impl ProgressService {
    pub fn new(repo: Arc<dyn ProgressRepository>, calculator: ProgressCalculator) -> Self {
        Self {
            repo,
            calculator,
            locks: KeyedLocks::new(),
        }
    }

    fn validate_user(user_id: i64) -> Result<()> {
        if user_id <= 0 {
            return Err(AppError::invalid("user id must be positive"));
        }
        Ok(())
    }

    fn validate_topic(&self, topic: &str) -> Result<()> {
        if !self.calculator.catalog().is_supported_topic(topic) {
            return Err(AppError::invalid(format!("unsupported topic '{topic}'")));
        }
        Ok(())
    }

    fn validate_request(&self, req: &UpdateProgressRequest) -> Result<()> {
        Self::validate_user(req.user_id)?;
        self.validate_topic(req.topic.trim())?;
        if req.chapter.trim().is_empty() {
            return Err(AppError::invalid("chapter is required"));
        }
        if req.read_duration < 0 {
            return Err(AppError::invalid("read duration cannot be negative"));
        }
        if req.scroll_progress < 0 {
            return Err(AppError::invalid("scroll progress cannot be negative"));
        }
        if req.quiz_score.is_some_and(|s| !(0..=100).contains(&s)) {
            return Err(AppError::invalid("quiz score must be between 0 and 100"));
        }
        Ok(())
    }

    /// Records a visit or quiz outcome and returns the chapter state with fresh summaries.
    ///
    /// Read time accumulates, scroll depth keeps its maximum, and the status
    /// is merged with the stored one so it can only move forward.
    pub async fn create_or_update_progress(&self, req: UpdateProgressRequest) -> Result<ProgressUpdate> {
        self.validate_request(&req)?;
        let topic = req.topic.trim();
        let chapter = req.chapter.trim();

        let guard = self
            .locks
            .lock((req.user_id, topic.to_string(), chapter.to_string()))
            .await;

        let now = Utc::now();
        let mut record = self
            .repo
            .get(req.user_id, topic, chapter)
            .await?
            .unwrap_or_else(|| LearningProgress::first_visit(req.user_id, topic, chapter, now));

        record.read_duration = record.read_duration.saturating_add(req.read_duration);
        record.scroll_progress = record.scroll_progress.max(req.scroll_progress.min(100));
        if !req.last_position.trim().is_empty() {
            record.last_position = req.last_position.clone();
        }
        if req.quiz_score.is_some() {
            record.quiz_score = req.quiz_score;
        }
        record.quiz_passed |= req.quiz_passed;
        record.last_visit_at = now;

        let proposed = self
            .calculator
            .calculate_chapter_status(&record, req.estimated_seconds);
        record.status = record.status.merge(proposed);
        if record.status == ProgressStatus::Completed
            && record.quiz_passed
            && record.completed_at.is_none()
        {
            record.completed_at = Some(now);
        }

        self.repo.create_or_update(&record).await?;
        drop(guard);

        tracing::info!(
            user_id = req.user_id,
            topic,
            chapter,
            status = %record.status,
            read_duration = record.read_duration,
            scroll = record.scroll_progress,
            "Progress recorded"
        );

        let summary = self.get_overall_progress(req.user_id).await?;
        let topic_summary = find_topic(summary.topics, topic)?;

        Ok(ProgressUpdate {
            status: record.status,
            read_duration: record.read_duration,
            scroll_progress: record.scroll_progress,
            last_position: record.last_position,
            overall: summary.overall,
            topic: topic_summary,
        })
    }

    /// Feeds a graded quiz into the chapter record without adding read time.
    pub async fn record_quiz_result(
        &self,
        user_id: i64,
        topic: &str,
        chapter: &str,
        score: i32,
        passed: bool,
    ) -> Result<ProgressUpdate> {
        self.create_or_update_progress(UpdateProgressRequest {
            user_id,
            topic: topic.to_string(),
            chapter: chapter.to_string(),
            quiz_score: Some(score),
            quiz_passed: passed,
            ..UpdateProgressRequest::default()
        })
        .await
    }

    pub async fn get_overall_progress(&self, user_id: i64) -> Result<ProgressSummary> {
        Self::validate_user(user_id)?;
        let records = self.repo.get_by_user(user_id).await?;
        let (overall, topics) = self.calculator.calculate_overall_progress(&records);
        Ok(ProgressSummary { overall, topics })
    }

    /// First chapter that is not completed, walking topics by weight and
    /// chapters in course order. `None` once everything is completed.
    pub async fn get_next_unfinished_chapter(&self, user_id: i64) -> Result<Option<NextChapter>> {
        Self::validate_user(user_id)?;
        let records = self.repo.get_by_user(user_id).await?;

        for topic in self.calculator.catalog().ordered_topics() {
            for chapter in &topic.chapters {
                let record = records
                    .iter()
                    .find(|r| r.topic == topic.id && r.chapter == chapter.id);

                match record {
                    Some(r) if r.status == ProgressStatus::Completed => continue,
                    Some(r) => {
                        return Ok(Some(NextChapter {
                            topic: topic.id.clone(),
                            chapter: chapter.id.clone(),
                            status: r.status,
                            progress: self.calculator.chapter_percent(r),
                        }));
                    }
                    None => {
                        return Ok(Some(NextChapter {
                            topic: topic.id.clone(),
                            chapter: chapter.id.clone(),
                            status: ProgressStatus::NotStarted,
                            progress: 0,
                        }));
                    }
                }
            }
        }

        Ok(None)
    }

    pub async fn get_topic_progress(&self, user_id: i64, topic: &str) -> Result<TopicDetail> {
        Self::validate_user(user_id)?;
        let topic = topic.trim();
        self.validate_topic(topic)?;

        let chapters = self.repo.get_by_topic(user_id, topic).await?;
        let (_, topics) = self.calculator.calculate_overall_progress(&chapters);
        let summary = find_topic(topics, topic)?;

        Ok(TopicDetail { summary, chapters })
    }

    /// Every chapter record of the user with its display percentage.
    pub async fn list_chapters(&self, user_id: i64) -> Result<Vec<ChapterProgressView>> {
        Self::validate_user(user_id)?;
        let records = self.repo.get_by_user(user_id).await?;

        Ok(records
            .into_iter()
            .map(|record| ChapterProgressView {
                percent: self.calculator.chapter_percent(&record),
                record,
            })
            .collect())
    }
}

fn find_topic(topics: Vec<TopicProgress>, topic: &str) -> Result<TopicProgress> {
    topics
        .into_iter()
        .find(|t| t.id == topic)
        .ok_or_else(|| AppError::Internal(format!("no summary for topic '{topic}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Catalog, config::ProgressSettings, repository::MemoryProgressRepository};

    fn service() -> ProgressService {
        let mut settings = ProgressSettings::default();
        settings
            .estimated_seconds
            .insert("variables/storage".to_string(), 600);
        let calculator = ProgressCalculator::new(Arc::new(Catalog::default()), settings);
        ProgressService::new(Arc::new(MemoryProgressRepository::new()), calculator)
    }

    fn visit(chapter: &str, read: i64, scroll: i32) -> UpdateProgressRequest {
        UpdateProgressRequest {
            user_id: 3,
            topic: "variables".to_string(),
            chapter: chapter.to_string(),
            read_duration: read,
            scroll_progress: scroll,
            ..UpdateProgressRequest::default()
        }
    }

    #[tokio::test]
    async fn metrics_accumulate_and_scroll_keeps_maximum() {
        let service = service();
        service.create_or_update_progress(visit("storage", 30, 40)).await.unwrap();
        service.create_or_update_progress(visit("storage", 45, 20)).await.unwrap();
        let update = service.create_or_update_progress(visit("storage", 5, 150)).await.unwrap();

        assert_eq!(update.read_duration, 80);
        assert_eq!(update.scroll_progress, 100);
        assert_eq!(update.status, ProgressStatus::InProgress);
        assert_eq!(update.topic.id, "variables");
        assert_eq!(update.topic.visited_chapters, 1);
    }

    #[tokio::test]
    async fn completed_chapter_never_regresses() {
        let service = service();
        service.create_or_update_progress(visit("storage", 0, 95)).await.unwrap();
        let done = service
            .record_quiz_result(3, "variables", "storage", 80, true)
            .await
            .unwrap();
        assert_eq!(done.status, ProgressStatus::Completed);

        let later = service
            .record_quiz_result(3, "variables", "storage", 20, false)
            .await
            .unwrap();
        assert_eq!(later.status, ProgressStatus::Completed);

        let detail = service.get_topic_progress(3, "variables").await.unwrap();
        let record = &detail.chapters[0];
        assert!(record.quiz_passed);
        assert_eq!(record.quiz_score, Some(20));
        assert!(record.completed_at.is_some());
        assert_eq!(detail.summary.completed_chapters, 1);
        assert_eq!(detail.summary.progress, 25);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let service = service();
        let mut bad_user = visit("storage", 1, 1);
        bad_user.user_id = 0;
        let mut bad_topic = visit("storage", 1, 1);
        bad_topic.topic = "generics".to_string();
        let negative = visit("storage", -5, 1);
        let mut bad_score = visit("storage", 0, 0);
        bad_score.quiz_score = Some(101);

        for req in [bad_user, bad_topic, negative, visit(" ", 1, 1), bad_score] {
            assert!(matches!(
                service.create_or_update_progress(req).await,
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn next_chapter_follows_course_order() {
        let service = service();
        let first = service.get_next_unfinished_chapter(3).await.unwrap().unwrap();
        assert_eq!(first.topic, "lexical_elements");
        assert_eq!(first.chapter, "comments");
        assert_eq!(first.status, ProgressStatus::NotStarted);

        let mut req = visit("comments", 0, 100);
        req.topic = "lexical_elements".to_string();
        req.quiz_passed = true;
        req.quiz_score = Some(90);
        service.create_or_update_progress(req).await.unwrap();

        let mut partial = visit("tokens", 0, 30);
        partial.topic = "lexical_elements".to_string();
        service.create_or_update_progress(partial).await.unwrap();

        let next = service.get_next_unfinished_chapter(3).await.unwrap().unwrap();
        assert_eq!(next.chapter, "tokens");
        assert_eq!(next.status, ProgressStatus::InProgress);
        assert_eq!(next.progress, 30);
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let service = Arc::new(service());
        let mut tasks = Vec::new();
        for i in 0..10 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                service
                    .create_or_update_progress(visit("static", 10, i * 10))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let chapters = service.list_chapters(3).await.unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].record.read_duration, 100);
        assert_eq!(chapters[0].record.scroll_progress, 90);
        assert_eq!(chapters[0].percent, 100);
    }
}
