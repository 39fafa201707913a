// src/catalog.rs

//! Fixed course layout: topics, their chapters and the weights used when
//! rolling chapter progress up into topic and platform percentages.

use std::collections::HashMap;

pub const DEFAULT_TOPIC_WEIGHT: i32 = 25;
pub const DEFAULT_CHAPTER_WEIGHT: i32 = 1;

#[derive(Debug, Clone)]
pub struct ChapterSpec {
    pub id: String,
    pub weight: i32,
}

#[derive(Debug, Clone)]
pub struct TopicSpec {
    pub id: String,
    pub name: String,
    pub weight: i32,
    pub chapters: Vec<ChapterSpec>,
}

impl TopicSpec {
    pub fn total_weight(&self) -> i32 {
        self.chapters.iter().map(|c| c.weight).sum()
    }

    pub fn chapter_weight(&self, chapter: &str) -> Option<i32> {
        self.chapters
            .iter()
            .find(|c| c.id == chapter)
            .map(|c| c.weight)
    }
}

/// Topics in their canonical order.
#[derive(Debug, Clone)]
pub struct Catalog {
    topics: Vec<TopicSpec>,
}

const COURSE: &[(&str, &str, &[&str])] = &[
    (
        "lexical_elements",
        "Lexical Elements",
        &[
            "comments",
            "tokens",
            "semicolons",
            "identifiers",
            "keywords",
            "operators",
            "integers",
            "floats",
            "imaginary",
            "runes",
            "strings",
        ],
    ),
    (
        "constants",
        "Constants",
        &[
            "boolean",
            "rune",
            "integer",
            "floating_point",
            "complex",
            "string",
            "expressions",
            "typed_untyped",
            "conversions",
            "builtin_functions",
            "iota",
            "implementation_restrictions",
        ],
    ),
    ("variables", "Variables", &["storage", "static", "dynamic", "zero"]),
    (
        "types",
        "Types",
        &[
            "boolean",
            "numeric",
            "string",
            "array",
            "slice",
            "struct",
            "pointer",
            "function",
            "interface_basic",
            "interface_embedded",
            "interface_general",
            "interface_impl",
            "map",
            "channel",
        ],
    ),
];

impl Default for Catalog {
    fn default() -> Self {
        let topics = COURSE
            .iter()
            .map(|(id, name, chapters)| TopicSpec {
                id: id.to_string(),
                name: name.to_string(),
                weight: DEFAULT_TOPIC_WEIGHT,
                chapters: chapters
                    .iter()
                    .map(|c| ChapterSpec {
                        id: c.to_string(),
                        weight: DEFAULT_CHAPTER_WEIGHT,
                    })
                    .collect(),
            })
            .collect();
        Self { topics }
    }
}

impl Catalog {
    /// Applies weight overrides; unknown topics and non-positive weights are ignored.
    pub fn with_topic_weights(mut self, weights: &HashMap<String, i32>) -> Self {
        for topic in &mut self.topics {
            if let Some(&w) = weights.get(&topic.id) {
                if w > 0 {
                    topic.weight = w;
                }
            }
        }
        self
    }

    pub fn is_supported_topic(&self, topic: &str) -> bool {
        self.topic(topic).is_some()
    }

    pub fn topic(&self, topic: &str) -> Option<&TopicSpec> {
        self.topics.iter().find(|t| t.id == topic)
    }

    pub fn total_chapters(&self) -> usize {
        self.topics.iter().map(|t| t.chapters.len()).sum()
    }

    /// Topics by weight descending, ties kept in canonical order.
    pub fn ordered_topics(&self) -> Vec<&TopicSpec> {
        let mut ordered: Vec<&TopicSpec> = self.topics.iter().collect();
        // sort_by is stable, so equal weights keep their declaration order
        ordered.sort_by(|a, b| b.weight.cmp(&a.weight));
        ordered
    }
}
