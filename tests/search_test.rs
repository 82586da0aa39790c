mod helpers;

use helpers::{spike, test_engine, FailingExpander, FakeExpander, FakeProvider};
use mnemo::event::SourceType;

/// Provider for the fusion tests: four documents on distinct axes, two query
/// phrasings each sitting close to a different document.
fn fusion_provider() -> FakeProvider {
    let mut p1 = vec![0.0f32; helpers::TEST_DIM];
    p1[0] = 0.9;
    let mut p2 = vec![0.0f32; helpers::TEST_DIM];
    p2[1] = 0.8;

    FakeProvider::new()
        .with("doc a", &spike(0))
        .with("doc b", &spike(1))
        .with("doc c", &spike(2))
        .with("doc d", &spike(3))
        .with("phrasing one", &p1)
        .with("phrasing two", &p2)
}

fn seed_docs(engine: &mnemo::engine::Engine) {
    for (ts, text) in [(1, "doc a"), (2, "doc b"), (3, "doc c"), (4, "doc d")] {
        engine
            .store_and_maybe_vectorize(ts, &SourceType::Ocr, Some(text), None, true)
            .unwrap();
    }
}

#[test]
fn ranks_semantically_close_events_first() {
    let mut nn = vec![0.0f32; helpers::TEST_DIM];
    nn[0] = 0.8;
    nn[1] = 0.6;
    let mut query = vec![0.0f32; helpers::TEST_DIM];
    query[0] = 0.9;
    query[1] = 0.1;

    let provider = FakeProvider::new()
        .with("machine learning project", &spike(0))
        .with("vacation photos", &spike(3))
        .with("neural network training", &nn)
        .with("AI research", &query);
    let (engine, _tmp) = test_engine(provider);

    for (ts, text) in [
        (1, "machine learning project"),
        (2, "vacation photos"),
        (3, "neural network training"),
    ] {
        engine
            .store_and_maybe_vectorize(ts, &SourceType::Ocr, Some(text), None, true)
            .unwrap();
    }

    let results = engine.search("AI research", 2, None).unwrap();
    assert_eq!(results.len(), 2);

    let contents: Vec<&str> = results
        .iter()
        .map(|r| r.event.content.as_deref().unwrap())
        .collect();
    assert!(contents.contains(&"machine learning project"));
    assert!(contents.contains(&"neural network training"));
    assert!(!contents.contains(&"vacation photos"));
    assert!(results[0].distance <= results[1].distance);
}

#[test]
fn fusion_returns_union_scored_by_best_distance() {
    let (engine, _tmp) = test_engine(fusion_provider());
    seed_docs(&engine);

    // Each phrasing alone retrieves a different best match.
    let solo_one = engine.search("phrasing one", 1, None).unwrap();
    assert_eq!(solo_one[0].event.content.as_deref(), Some("doc a"));
    let solo_two = engine.search("phrasing two", 1, None).unwrap();
    assert_eq!(solo_two[0].event.content.as_deref(), Some("doc b"));

    // Fused, the result set is the union of the single-query results, each
    // scored by its best distance across the two phrasings.
    let expander = FakeExpander(vec!["phrasing two".to_string()]);
    let fused = engine.search("phrasing one", 2, Some(&expander)).unwrap();

    assert_eq!(fused.len(), 2);
    assert_eq!(fused[0].event.content.as_deref(), Some("doc a"));
    assert_eq!(fused[1].event.content.as_deref(), Some("doc b"));
    assert_eq!(fused[0].distance, solo_one[0].distance);
    assert_eq!(fused[1].distance, solo_two[0].distance);
}

#[test]
fn fusion_truncates_to_top_k() {
    let (engine, _tmp) = test_engine(fusion_provider());
    seed_docs(&engine);

    let expander = FakeExpander(vec!["phrasing two".to_string()]);
    let fused = engine.search("phrasing one", 1, Some(&expander)).unwrap();

    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].event.content.as_deref(), Some("doc a"));
}

#[test]
fn expansion_failure_falls_back_to_plain_search() {
    let (engine, _tmp) = test_engine(fusion_provider());
    seed_docs(&engine);

    let fused = engine.search("phrasing one", 1, Some(&FailingExpander)).unwrap();
    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].event.content.as_deref(), Some("doc a"));
}

#[test]
fn duplicate_paraphrases_do_not_change_results() {
    let (engine, _tmp) = test_engine(fusion_provider());
    seed_docs(&engine);

    let expander = FakeExpander(vec![
        "phrasing one".to_string(),
        "phrasing one".to_string(),
    ]);
    let results = engine.search("phrasing one", 2, Some(&expander)).unwrap();
    assert_eq!(results[0].event.content.as_deref(), Some("doc a"));
}

#[test]
fn empty_index_yields_empty_results() {
    let (engine, _tmp) = test_engine(fusion_provider());
    let results = engine.search("phrasing one", 5, None).unwrap();
    assert!(results.is_empty());
}

#[test]
fn blank_query_yields_empty_results() {
    let (engine, _tmp) = test_engine(fusion_provider());
    seed_docs(&engine);
    assert!(engine.search("", 5, None).unwrap().is_empty());
    assert!(engine.search("   \t", 5, None).unwrap().is_empty());
}

#[test]
fn results_are_sorted_ascending_by_distance() {
    let (engine, _tmp) = test_engine(fusion_provider());
    seed_docs(&engine);

    let results = engine.search("phrasing one", 4, None).unwrap();
    assert_eq!(results.len(), 4);
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}
