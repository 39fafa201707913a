// src/services/quiz/service.rs

use std::{collections::HashMap, ops::RangeInclusive, sync::Arc};

use chrono::Utc;
use rand::{Rng, seq::SliceRandom};
use sqlx::types::Json;

use crate::{
    catalog::Catalog,
    error::{AppError, Result},
    models::{
        question::{QuestionKind, QuestionView, QuizQuestion},
        quiz_session::{
            AnswerSubmission, QuizAttempt, QuizReview, QuizSession, QuizSessionPayload, QuizStats,
            ReviewItem,
        },
    },
    repository::QuizRepository,
    services::quiz::{
        normalizer::normalize_choices,
        question_manager::{label_index, parse_answers, parse_options, prepare},
        scoring::{ScoringResult, evaluate_with_total},
    },
    utils::locks::InFlight,
};

/// Questions of each of the single and multiple kinds drawn per session.
const KIND_QUOTA: RangeInclusive<usize> = 3..=5;

/// Issues chapter quizzes and grades each session exactly once.
pub struct QuizService {
    repo: Arc<dyn QuizRepository>,
    catalog: Arc<Catalog>,
    history_default_limit: i64,
    in_flight: InFlight,
}

impl QuizService {
    pub fn new(repo: Arc<dyn QuizRepository>, catalog: Arc<Catalog>, history_default_limit: i64) -> Self {
        Self {
            repo,
            catalog,
            history_default_limit,
            in_flight: InFlight::new(),
        }
    }

    fn validate_target(&self, user_id: i64, topic: &str, chapter: &str) -> Result<()> {
        if user_id <= 0 {
            return Err(AppError::invalid("user id must be positive"));
        }
        if !self.catalog.is_supported_topic(topic) {
            return Err(AppError::invalid(format!("unsupported topic '{topic}'")));
        }
        if chapter.is_empty() {
            return Err(AppError::invalid("chapter is required"));
        }
        Ok(())
    }

    /// Creates a session for the chapter and returns its questions without answers.
    pub async fn get_quiz_questions(
        &self,
        user_id: i64,
        topic: &str,
        chapter: &str,
    ) -> Result<QuizSessionPayload> {
        let (topic, chapter) = (topic.trim(), chapter.trim());
        self.validate_target(user_id, topic, chapter)?;

        let records = self.repo.get_questions_by_chapter(topic, chapter).await?;
        let (_, pool) = prepare(&records)?;

        let questions = {
            let mut rng = rand::thread_rng();
            let mut questions = select_questions(pool, &mut rng);
            for question in &mut questions {
                question.options.shuffle(&mut rng);
            }
            questions
        };

        let session = QuizSession::new(user_id, topic, chapter, questions.len() as i32);
        let session_id = self.repo.create_session(session).await?;

        tracing::info!(
            user_id,
            session_id = %session_id,
            topic,
            chapter,
            questions = questions.len(),
            pool = records.len(),
            "Quiz issued"
        );

        Ok(QuizSessionPayload {
            session_id,
            topic: topic.to_string(),
            chapter: chapter.to_string(),
            questions,
        })
    }

    /// Grades a session. Succeeds at most once per session id.
    pub async fn submit_quiz(
        &self,
        user_id: i64,
        session_id: &str,
        topic: &str,
        chapter: &str,
        answers: &[AnswerSubmission],
    ) -> Result<ScoringResult> {
        let (session_id, topic, chapter) = (session_id.trim(), topic.trim(), chapter.trim());
        self.validate_target(user_id, topic, chapter)?;
        if session_id.is_empty() {
            return Err(AppError::invalid("session id is required"));
        }
        if answers.is_empty() {
            return Err(AppError::invalid("no answers submitted"));
        }

        let Some(_claim) = self.in_flight.try_claim(session_id) else {
            tracing::warn!(user_id, session_id, "Submission already in flight");
            return Err(AppError::DuplicateSubmit);
        };

        let session = self
            .repo
            .get_session(session_id)
            .await?
            .ok_or_else(|| AppError::invalid("unknown quiz session"))?;

        if session.is_completed() {
            tracing::warn!(user_id, session_id, "Session already submitted");
            return Err(AppError::DuplicateSubmit);
        }
        if session.user_id != user_id || session.topic != topic || session.chapter != chapter {
            tracing::warn!(user_id, session_id, topic, chapter, "Session does not match request");
            return Err(AppError::invalid("session does not belong to this quiz"));
        }
        if session.total_questions <= 0 {
            return Err(AppError::invalid("session has no questions"));
        }
        if answers.len() > session.total_questions as usize {
            return Err(AppError::invalid("more answers than questions"));
        }

        let submitted: HashMap<i64, Vec<String>> = answers
            .iter()
            .map(|a| (a.question_id, normalize_choices(&a.user_answers)))
            .collect();

        // Question content always comes from storage, never from the client.
        let records: Vec<QuizQuestion> = self
            .repo
            .get_questions_by_chapter(topic, chapter)
            .await?
            .into_iter()
            .filter(|q| submitted.contains_key(&q.id))
            .collect();
        if records.is_empty() {
            return Err(AppError::invalid("answers do not match any question of this chapter"));
        }

        let (prepared, _) = prepare(&records)?;
        let result = evaluate_with_total(&prepared, &submitted, session.total_questions);

        let now = Utc::now();
        let attempts: Vec<QuizAttempt> = result
            .details
            .iter()
            .map(|detail| QuizAttempt {
                session_id: session_id.to_string(),
                user_id,
                topic: topic.to_string(),
                chapter: chapter.to_string(),
                question_id: detail.question_id,
                user_answers: Json(submitted.get(&detail.question_id).cloned().unwrap_or_default()),
                is_correct: detail.is_correct,
                attempted_at: now,
            })
            .collect();
        self.repo.save_attempts(&attempts).await?;

        let updated = self
            .repo
            .update_session_result(session_id, result.correct_answers, result.score, result.passed)
            .await?;
        if !updated {
            tracing::warn!(user_id, session_id, "Session completed concurrently");
            return Err(AppError::DuplicateSubmit);
        }

        tracing::info!(
            user_id,
            session_id,
            topic,
            chapter,
            score = result.score,
            passed = result.passed,
            "Quiz submitted"
        );

        Ok(result)
    }

    /// Completed sessions, newest first.
    pub async fn get_quiz_history(
        &self,
        user_id: i64,
        topic: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<QuizSession>> {
        if user_id <= 0 {
            return Err(AppError::invalid("user id must be positive"));
        }
        let topic = topic.map(str::trim).unwrap_or_default();
        if !topic.is_empty() && !self.catalog.is_supported_topic(topic) {
            return Err(AppError::invalid(format!("unsupported topic '{topic}'")));
        }
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.history_default_limit);

        self.repo.get_history(user_id, topic, limit).await
    }

    /// Answers of a graded session next to the correct ones, as option text.
    pub async fn get_quiz_review(&self, user_id: i64, session_id: &str) -> Result<QuizReview> {
        let session_id = session_id.trim();
        if user_id <= 0 {
            return Err(AppError::invalid("user id must be positive"));
        }

        let session = self
            .repo
            .get_session(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("quiz session".to_string()))?;
        if !session.is_completed() {
            return Err(AppError::invalid("session has not been submitted yet"));
        }

        let questions: HashMap<i64, QuizQuestion> = self
            .repo
            .get_questions_by_chapter(&session.topic, &session.chapter)
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();
        let attempts = self.repo.get_attempts_by_session(session_id).await?;

        let mut items = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            let Some(question) = questions.get(&attempt.question_id) else {
                continue;
            };
            let options: Vec<String> = parse_options(&question.options)?
                .into_iter()
                .map(|o| o.label)
                .collect();
            let correct = parse_answers(&question.correct_answers)?;

            items.push(ReviewItem {
                question_id: question.id,
                question: question.question.clone(),
                user_choice: render_choice(&options, &attempt.user_answers.0),
                correct_choice: render_choice(&options, &correct),
                options,
                is_correct: attempt.is_correct,
                explanation: question.explanation.clone(),
            });
        }

        Ok(QuizReview {
            session_id: session.session_id,
            topic: session.topic,
            chapter: session.chapter,
            score: session.score,
            passed: session.passed,
            completed_at: session.completed_at,
            items,
        })
    }

    /// Question counts for a chapter, by type and by difficulty.
    pub async fn get_stats(&self, topic: &str, chapter: &str) -> Result<QuizStats> {
        let (topic, chapter) = (topic.trim(), chapter.trim());
        if !self.catalog.is_supported_topic(topic) {
            return Err(AppError::invalid(format!("unsupported topic '{topic}'")));
        }
        if chapter.is_empty() {
            return Err(AppError::invalid("chapter is required"));
        }

        let records = self.repo.get_questions_by_chapter(topic, chapter).await?;
        let mut stats = QuizStats {
            total: records.len(),
            ..QuizStats::default()
        };
        for record in &records {
            *stats.by_type.entry(record.question_type.clone()).or_default() += 1;
            *stats.by_difficulty.entry(record.difficulty.clone()).or_default() += 1;
        }
        Ok(stats)
    }
}

/// Draws a session from the chapter pool.
///
/// A random lead question comes first, followed by up to [`KIND_QUOTA`] single and
/// multiple questions each (the lead counts towards its kind) in random order.
/// Other kinds only appear as the lead.
fn select_questions<R: Rng>(mut pool: Vec<QuestionView>, rng: &mut R) -> Vec<QuestionView> {
    if pool.is_empty() {
        return pool;
    }
    let lead = pool.swap_remove(rng.gen_range(0..pool.len()));
    let lead_kind = QuestionKind::parse(&lead.question_type);

    let (mut singles, mut multiples): (Vec<_>, Vec<_>) = pool
        .into_iter()
        .filter(|q| {
            matches!(
                QuestionKind::parse(&q.question_type),
                QuestionKind::Single | QuestionKind::Multiple
            )
        })
        .partition(|q| QuestionKind::parse(&q.question_type) == QuestionKind::Single);

    let single_count = rng.gen_range(KIND_QUOTA) - usize::from(lead_kind == QuestionKind::Single);
    let multiple_count = rng.gen_range(KIND_QUOTA) - usize::from(lead_kind == QuestionKind::Multiple);
    singles.shuffle(rng);
    multiples.shuffle(rng);
    singles.truncate(single_count);
    multiples.truncate(multiple_count);

    let mut rest: Vec<QuestionView> = singles.into_iter().chain(multiples).collect();
    rest.shuffle(rng);

    let mut selected = Vec::with_capacity(rest.len() + 1);
    selected.push(lead);
    selected.extend(rest);
    selected
}

/// Maps labels to option text; labels without a matching option are kept as-is.
fn render_choice(options: &[String], labels: &[String]) -> String {
    labels
        .iter()
        .map(|label| {
            label_index(label)
                .and_then(|idx| options.get(idx))
                .cloned()
                .unwrap_or_else(|| label.clone())
        })
        .collect::<Vec<_>>()
        .join(", ")
}
