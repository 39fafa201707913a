// src/services/progress/mod.rs

pub mod calculator;
pub mod service;

pub use calculator::ProgressCalculator;
pub use service::ProgressService;
