mod common;

use common::*;
use source_optimizer::discovery::CuratedList;
use source_optimizer::{CandidateDiscovery, LiveSourceSpec, OptimizationPolicy, OptimizerConfig};
use tempfile::TempDir;

fn policy_with(candidates: &[&str]) -> OptimizationPolicy {
    let specs = candidates
        .iter()
        .map(|name| LiveSourceSpec::new(*name, endpoint(name)))
        .collect();
    OptimizationPolicy::new(CandidateDiscovery::with_providers(vec![Box::new(
        CuratedList::new(specs),
    )]))
}

#[tokio::test]
async fn eviction_needs_both_scores_below_threshold() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    let mut manager = manager_in(dir.path(), fetcher.clone());
    add_live(&mut manager, &fetcher, &["keeper", "loser", "clicked"]).await;

    // keeper: engagement 0.2, relevance 0.6
    manager.update_metrics("keeper", 10, 2, 0.6);
    // loser: engagement 0.2, relevance 0.4
    manager.update_metrics("loser", 10, 2, 0.4);
    // clicked: engagement 0.9, relevance 0.1
    manager.update_metrics("clicked", 10, 9, 0.1);

    let summary = policy_with(&[]).run_cycle(&mut manager).await;
    assert_eq!(summary.evicted, vec!["loser".to_string()]);
    assert!(summary.persisted);
    assert!(manager.registry().contains("keeper"));
    assert!(manager.registry().contains("clicked"));
    assert!(!manager.registry().contains("loser"));
    assert_keys_match(&manager);
}

#[tokio::test]
async fn admission_stops_at_the_ceiling() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    let config = OptimizerConfig {
        max_sources: 4,
        ..config_in(dir.path())
    };
    let mut manager = source_optimizer::SourceManager::new(config, fetcher.clone());
    add_live(&mut manager, &fetcher, &["one", "two"]).await;
    manager.update_metrics("one", 10, 9, 0.9);
    manager.update_metrics("two", 10, 9, 0.9);

    let candidates = ["c1", "c2", "c3", "c4", "c5"];
    for name in candidates {
        fetcher.serve(&endpoint(name), items(2));
    }
    let policy = policy_with(&candidates);

    for _ in 0..5 {
        policy.run_cycle(&mut manager).await;
        assert!(manager.registry().len() <= 4);
        assert_keys_match(&manager);
    }
}

#[tokio::test]
async fn cycle_reports_admissions_and_rejections() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    let mut manager = manager_in(dir.path(), fetcher.clone());
    add_live(&mut manager, &fetcher, &["anchor"]).await;
    manager.update_metrics("anchor", 4, 4, 1.0);

    fetcher.serve(&endpoint("live"), items(1));
    fetcher.serve(&endpoint("empty"), Vec::new());
    fetcher.take_down(&endpoint("down"));

    let summary = policy_with(&["anchor", "live", "empty", "down"])
        .run_cycle(&mut manager)
        .await;

    assert!(summary.evicted.is_empty());
    assert_eq!(summary.admitted, vec!["live".to_string()]);
    assert_eq!(summary.rejected, vec!["empty".to_string(), "down".to_string()]);
    assert!(summary.persisted);
    assert!(manager.config().metrics_path.exists());
    assert_keys_match(&manager);
}

#[tokio::test]
async fn unscored_admissions_are_evicted_next_cycle() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    let mut manager = manager_in(dir.path(), fetcher.clone());
    fetcher.serve(&endpoint("newbie"), items(1));

    let policy = policy_with(&["newbie"]);
    let first = policy.run_cycle(&mut manager).await;
    assert_eq!(first.admitted, vec!["newbie".to_string()]);

    // No fetch cycle in between, so both scores are still zero.
    let second = policy.run_cycle(&mut manager).await;
    assert_eq!(second.evicted, vec!["newbie".to_string()]);
    // Discovery then picks it straight back up.
    assert_eq!(second.admitted, vec!["newbie".to_string()]);
}

#[tokio::test]
async fn full_registry_skips_discovery() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    let config = OptimizerConfig {
        max_sources: 1,
        ..config_in(dir.path())
    };
    let mut manager = source_optimizer::SourceManager::new(config, fetcher.clone());
    add_live(&mut manager, &fetcher, &["solo"]).await;
    manager.update_metrics("solo", 2, 2, 1.0);
    fetcher.serve(&endpoint("extra"), items(1));

    let probes = fetcher.calls();
    let summary = policy_with(&["extra"]).run_cycle(&mut manager).await;
    assert!(summary.admitted.is_empty());
    assert!(summary.rejected.is_empty());
    assert_eq!(fetcher.calls(), probes);
}
