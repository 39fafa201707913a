// src/config.rs

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

/// Tunables for chapter status and duration estimates.
#[derive(Debug, Clone)]
pub struct ProgressSettings {
    /// Scroll depth (percent) that counts as having read the chapter.
    pub completion_scroll: i32,
    pub chars_per_sec: f64,
    pub min_seconds: i64,
    pub max_seconds: i64,
    /// Per-topic reading difficulty multiplier.
    pub difficulty: HashMap<String, f64>,
    /// Known estimates keyed by `topic/chapter`.
    pub estimated_seconds: HashMap<String, i64>,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        let difficulty = [
            ("lexical_elements", 1.0),
            ("constants", 1.1),
            ("variables", 1.0),
            ("types", 1.2),
        ]
        .into_iter()
        .map(|(topic, factor)| (topic.to_string(), factor))
        .collect();

        Self {
            completion_scroll: 90,
            chars_per_sec: 5.0,
            min_seconds: 60,
            max_seconds: 3600,
            difficulty,
            estimated_seconds: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub server_addr: String,
    pub history_default_limit: i64,
    pub topic_weights: HashMap<String, i32>,
    pub progress: ProgressSettings,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let server_addr = env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let defaults = ProgressSettings::default();
        let progress = ProgressSettings {
            completion_scroll: env_or("PROGRESS_COMPLETION_SCROLL", defaults.completion_scroll),
            chars_per_sec: env_or("PROGRESS_CHARS_PER_SEC", defaults.chars_per_sec),
            min_seconds: env_or("PROGRESS_MIN_SECONDS", defaults.min_seconds),
            max_seconds: env_or("PROGRESS_MAX_SECONDS", defaults.max_seconds),
            ..defaults
        };

        Self {
            database_url,
            jwt_secret,
            rust_log,
            server_addr,
            history_default_limit: env_or("HISTORY_DEFAULT_LIMIT", 20),
            topic_weights: env::var("TOPIC_WEIGHTS")
                .map(|raw| parse_topic_weights(&raw))
                .unwrap_or_default(),
            progress,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", name, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Parses `topic=weight,topic=weight`. Malformed pairs are skipped.
pub fn parse_topic_weights(raw: &str) -> HashMap<String, i32> {
    raw.split(',')
        .filter_map(|pair| {
            let (topic, weight) = pair.split_once('=')?;
            let weight = weight.trim().parse::<i32>().ok()?;
            Some((topic.trim().to_string(), weight))
        })
        .filter(|(topic, _)| !topic.is_empty())
        .collect()
}
