// src/services/quiz/mod.rs

pub mod normalizer;
pub mod question_manager;
pub mod scoring;
pub mod service;

pub use service::QuizService;
