// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    catalog::Catalog,
    config::Config,
    repository::{ProgressRepository, QuizRepository},
    services::{
        progress::{ProgressCalculator, ProgressService},
        quiz::QuizService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub quiz: Arc<QuizService>,
    pub progress: Arc<ProgressService>,
}

impl AppState {
    /// Wires both services on top of the given repositories.
    pub fn new(
        config: Config,
        quiz_repo: Arc<dyn QuizRepository>,
        progress_repo: Arc<dyn ProgressRepository>,
    ) -> Self {
        let catalog = Arc::new(Catalog::default().with_topic_weights(&config.topic_weights));

        let quiz = QuizService::new(quiz_repo, catalog.clone(), config.history_default_limit);
        let calculator = ProgressCalculator::new(catalog, config.progress.clone());
        let progress = ProgressService::new(progress_repo, calculator);

        Self {
            config,
            quiz: Arc::new(quiz),
            progress: Arc::new(progress),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<QuizService> {
    fn from_ref(state: &AppState) -> Self {
        state.quiz.clone()
    }
}

impl FromRef<AppState> for Arc<ProgressService> {
    fn from_ref(state: &AppState) -> Self {
        state.progress.clone()
    }
}
