// src/models/mod.rs

use std::sync::LazyLock;

use regex::Regex;

pub mod progress;
pub mod question;
pub mod quiz_session;

/// Chapter identifiers are lowercase snake_case slugs.
pub static CHAPTER_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,63}$").expect("valid chapter slug pattern"));
