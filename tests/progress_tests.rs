// tests/progress_tests.rs

use std::{collections::HashMap, sync::Arc};

use study_backend::{
    catalog::Catalog,
    config::ProgressSettings,
    models::progress::{ProgressStatus, UpdateProgressRequest},
    repository::MemoryProgressRepository,
    services::progress::{ProgressCalculator, ProgressService},
};

fn service_with(weights: &HashMap<String, i32>) -> ProgressService {
    let catalog = Arc::new(Catalog::default().with_topic_weights(weights));
    ProgressService::new(
        Arc::new(MemoryProgressRepository::new()),
        ProgressCalculator::new(catalog, ProgressSettings::default()),
    )
}

fn update(topic: &str, chapter: &str) -> UpdateProgressRequest {
    UpdateProgressRequest {
        user_id: 9,
        topic: topic.to_string(),
        chapter: chapter.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn status_sequence_is_non_decreasing() {
    let service = service_with(&HashMap::new());

    let steps: Vec<UpdateProgressRequest> = vec![
        UpdateProgressRequest { read_duration: 20, ..update("constants", "iota") },
        UpdateProgressRequest { quiz_score: Some(30), ..update("constants", "iota") },
        UpdateProgressRequest { scroll_progress: 10, ..update("constants", "iota") },
        UpdateProgressRequest { quiz_score: Some(90), quiz_passed: true, scroll_progress: 100, ..update("constants", "iota") },
        UpdateProgressRequest { read_duration: 5, ..update("constants", "iota") },
        UpdateProgressRequest { quiz_score: Some(10), ..update("constants", "iota") },
    ];

    let mut seen = Vec::new();
    let mut expected_read = 0;
    let mut expected_scroll = 0;
    for step in steps {
        expected_read += step.read_duration;
        expected_scroll = expected_scroll.max(step.scroll_progress);
        let result = service.create_or_update_progress(step).await.unwrap();
        assert_eq!(result.read_duration, expected_read);
        assert_eq!(result.scroll_progress, expected_scroll);
        seen.push(result.status);
    }

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
    assert_eq!(seen.first(), Some(&ProgressStatus::InProgress));
    assert_eq!(seen.last(), Some(&ProgressStatus::Completed));
}

#[tokio::test]
async fn heavier_topics_come_first() {
    let mut weights = HashMap::new();
    weights.insert("variables".to_string(), 40);
    let service = service_with(&weights);

    let next = service.get_next_unfinished_chapter(9).await.unwrap().unwrap();
    assert_eq!(next.topic, "variables");
    assert_eq!(next.chapter, "storage");

    let summary = service.get_overall_progress(9).await.unwrap();
    let ids: Vec<&str> = summary.topics.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["variables", "lexical_elements", "constants", "types"]);
}

#[tokio::test]
async fn finishing_every_chapter_leaves_nothing_next() {
    let service = service_with(&HashMap::new());
    let catalog = Catalog::default();

    for topic in catalog.ordered_topics() {
        for chapter in &topic.chapters {
            service
                .create_or_update_progress(UpdateProgressRequest {
                    scroll_progress: 100,
                    quiz_score: Some(100),
                    quiz_passed: true,
                    ..update(&topic.id, &chapter.id)
                })
                .await
                .unwrap();
        }
    }

    assert!(service.get_next_unfinished_chapter(9).await.unwrap().is_none());
    let summary = service.get_overall_progress(9).await.unwrap();
    assert_eq!(summary.overall.progress, 100);
    assert_eq!(summary.overall.completed_chapters, 41);
}
