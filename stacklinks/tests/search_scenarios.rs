//! End-to-end ranking and debounce behavior through the public API.

use chrono::Utc;
use stacklinks::ranking::{rank_working_set, relevance_score, Query};
use stacklinks::{
    Collection, Link, SearchConfig, SearchController, SearchPhase, Visibility, WorkingSet,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn link(id: &str, title: &str, tags: &[&str]) -> Link {
    Link {
        id: id.into(),
        collection_id: "c1".into(),
        owner_id: "u1".into(),
        url: format!("https://example.com/{id}"),
        title: title.into(),
        description: None,
        image_url: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        visibility: Visibility::Public,
        created_at: Utc::now(),
        updated_at: None,
        pinned: false,
    }
}

fn collection(id: &str, name: &str, description: Option<&str>) -> Collection {
    Collection {
        id: id.into(),
        owner_id: "u1".into(),
        name: name.into(),
        description: description.map(str::to_string),
        image_url: None,
        tags: Vec::new(),
        visibility: Visibility::Public,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn titles(links: &[Link]) -> Vec<&str> {
    links.iter().map(|l| l.title.as_str()).collect()
}

// ============================================================
// Ranking
// ============================================================

#[test]
fn word_boundary_title_and_exact_tag_both_contribute() {
    let record = link("l1", "React Tutorial", &["react", "js"]);
    let score = relevance_score(&record, "react");
    // Boundary match on the title plus an exact tag
    assert!(score > 80.0 + 90.0, "score was {score}");
}

#[test]
fn unrelated_collection_is_excluded() {
    let collections = vec![collection("c1", "Recipes", Some(""))];
    assert_eq!(relevance_score(&collections[0], "xyz123"), 0.0);

    let results = rank_working_set(&[], &collections, &Query::parse("xyz123"), &SearchConfig::default());
    assert!(results.collections.is_empty());
}

#[test]
fn empty_query_scores_zero() {
    assert_eq!(relevance_score(&link("l1", "React", &["react"]), ""), 0.0);
    assert_eq!(relevance_score(&link("l1", "React", &["react"]), "   "), 0.0);
}

#[test]
fn exact_title_outranks_partial_title() {
    let links = vec![link("l1", "aardvark facts", &[]), link("l2", "Aardvark", &[])];
    let results = rank_working_set(&links, &[], &Query::parse("aardvark"), &SearchConfig::default());
    assert_eq!(titles(&results.links), vec!["Aardvark", "aardvark facts"]);
}

#[test]
fn multi_term_query_prefers_records_matching_every_term() {
    let links = vec![
        link("l1", "Rust Book", &[]),
        link("l2", "Async Rust", &["rust", "async"]),
        link("l3", "Async JavaScript", &["javascript"]),
    ];
    let results = rank_working_set(&links, &[], &Query::parse("rust async"), &SearchConfig::default());
    assert_eq!(results.links[0].title, "Async Rust");
    assert_eq!(results.links.len(), 3);
}

#[test]
fn typo_still_finds_the_record() {
    let links = vec![link("l1", "JavaScript Event Loop", &[]), link("l2", "Rust Book", &[])];
    let results = rank_working_set(&links, &[], &Query::parse("jvscrpt"), &SearchConfig::default());
    assert_eq!(titles(&results.links), vec!["JavaScript Event Loop"]);
}

#[test]
fn ranking_is_repeatable() {
    let links: Vec<Link> = (0..40)
        .map(|i| link(&format!("l{i}"), &format!("react note {}", i % 4), &["react"]))
        .collect();
    let query = Query::parse("react note");
    let config = SearchConfig::default();

    let first = rank_working_set(&links, &[], &query, &config);
    let second = rank_working_set(&links, &[], &query, &config);
    assert_eq!(first, second);
    assert_eq!(first.links.len(), 40);
}

#[test]
fn max_results_caps_each_list() {
    let links: Vec<Link> = (0..10).map(|i| link(&format!("l{i}"), "react", &[])).collect();
    let config = SearchConfig { max_results: Some(3), ..SearchConfig::default() };
    let results = rank_working_set(&links, &[], &Query::parse("react"), &config);
    let ids: Vec<&str> = results.links.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["l0", "l1", "l2"]);
}

// ============================================================
// Debounced controller
// ============================================================

fn controller() -> SearchController {
    let ws = Arc::new(WorkingSet::new());
    ws.replace(
        "u1",
        vec![
            link("l1", "React Tutorial", &["react", "js"]),
            link("l2", "Rust Book", &["rust"]),
            link("l3", "Reading List", &[]),
        ],
        vec![collection("c1", "Recipes", None)],
    );
    SearchController::new(ws, SearchConfig::default())
}

#[tokio::test(start_paused = true)]
async fn rapid_typing_settles_once_on_final_query() {
    let c = controller();

    for q in ["r", "re", "rea"] {
        c.on_query_change(q);
        sleep(Duration::from_millis(50)).await;
    }

    let snapshot = c.settled().await;
    assert_eq!(c.ranking_passes(), 1);
    assert_eq!(snapshot.query, "rea");
    assert_eq!(snapshot.phase, SearchPhase::Settled);
    assert!(titles(&snapshot.results.links).contains(&"React Tutorial"));
}

#[tokio::test(start_paused = true)]
async fn whitespace_query_goes_idle_without_ranking() {
    let c = controller();
    c.on_query_change("  ");
    assert!(c.is_searching());

    sleep(Duration::from_millis(350)).await;
    let s = c.snapshot();
    assert_eq!(s.phase, SearchPhase::Idle);
    assert!(!s.searching);
    assert!(s.results.is_empty());
    assert_eq!(c.ranking_passes(), 0);
}

#[tokio::test(start_paused = true)]
async fn clearing_the_query_drops_results() {
    let c = controller();
    c.on_query_change("rust");
    assert_eq!(titles(&c.settled().await.results.links), vec!["Rust Book"]);

    c.on_query_change("");
    let s = c.settled().await;
    assert_eq!(s.phase, SearchPhase::Idle);
    assert!(s.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn deleted_record_disappears_on_next_pass() {
    let c = controller();
    c.on_query_change("rust");
    c.settled().await;

    c.working_set().remove_link("l2");
    sleep(Duration::from_millis(10)).await;
    let s = c.settled().await;
    assert!(s.results.links.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_controller_cancels_the_timer() {
    let ws = Arc::new(WorkingSet::new());
    ws.replace("u1", vec![link("l1", "React", &[])], Vec::new());

    let c = SearchController::new(Arc::clone(&ws), SearchConfig::default());
    let rx = c.subscribe();
    c.on_query_change("react");
    drop(c);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(rx.borrow().phase, SearchPhase::Debouncing);
}
