//! Strategy-level tests: metric properties, exact ground truth,
//! quantized tolerance, approximate behavior + deadlock detection.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strata_core::config::{QuantizedConfig, StrategyConfig, StrategyKind};
use strata_core::types::{Metadata, MetadataFilter, VectorRecord};
use strata_index::math::cosine_distance;
use strata_index::{Collection, CosineDistance, IndexStrategy, SimilarityMetric};

fn random_vec(dim: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn record(id: &str, vector: Vec<f32>, category: &str) -> VectorRecord {
    let mut metadata = Metadata::new();
    metadata.insert("category".into(), category.into());
    VectorRecord::new(id, "doc", vector, format!("content for {id}"), metadata).unwrap()
}

fn build(kind: StrategyKind, dim: usize) -> (Collection, IndexStrategy) {
    let config = StrategyConfig::new(kind.as_str(), kind, dim);
    let collection = Collection::new(kind.as_str(), dim, Arc::new(CosineDistance));
    let strategy = IndexStrategy::from_config(&config).unwrap();
    (collection, strategy)
}

fn insert(collection: &Collection, strategy: &IndexStrategy, record: VectorRecord) {
    let outcome = collection.upsert(record.clone()).unwrap();
    strategy.insert(&outcome, &record).unwrap();
}

// ============================================================================
// Metric properties
// ============================================================================

#[test]
fn metric_is_commutative_for_random_pairs() {
    for _ in 0..100 {
        let a = random_vec(8);
        let b = random_vec(8);
        assert_eq!(
            CosineDistance.distance(&a, &b).unwrap(),
            CosineDistance.distance(&b, &a).unwrap()
        );
    }
}

#[test]
fn metric_range_is_zero_to_two() {
    for _ in 0..100 {
        let d = CosineDistance
            .distance(&random_vec(16), &random_vec(16))
            .unwrap();
        assert!((0.0..=2.0).contains(&d), "distance out of range: {d}");
    }
}

#[test]
fn degenerate_zero_vector_is_not_an_error() {
    let zero = vec![0.0; 4];
    let v = vec![1.0, 2.0, 3.0, 4.0];
    assert_eq!(CosineDistance.distance(&zero, &v).unwrap(), 0.0);
}

// ============================================================================
// Exact strategy: ground truth by construction
// ============================================================================

#[test]
fn exact_matches_full_sort_reference() {
    let dim = 16;
    let k = 10;
    let (collection, strategy) = build(StrategyKind::Exact, dim);

    let mut vectors = Vec::new();
    for i in 0..200 {
        let v = random_vec(dim);
        vectors.push((format!("r{i:03}"), v.clone()));
        insert(&collection, &strategy, record(&format!("r{i:03}"), v, "A"));
    }

    let query = random_vec(dim);
    let results = strategy.query(&collection, &query, k, None).unwrap().results;

    // Reference: score everything, full sort, truncate. Ties by id.
    let mut reference: Vec<(f64, String)> = vectors
        .iter()
        .map(|(id, v)| (cosine_distance(&query, v), id.clone()))
        .collect();
    reference.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    reference.truncate(k);

    let got: Vec<&str> = results.iter().map(|r| r.record_id.as_str()).collect();
    let expected: Vec<&str> = reference.iter().map(|(_, id)| id.as_str()).collect();
    assert_eq!(got, expected);
}

#[test]
fn exact_handles_adversarial_duplicate_vectors() {
    let dim = 8;
    let (collection, strategy) = build(StrategyKind::Exact, dim);
    let shared = random_vec(dim);
    for i in 0..20 {
        insert(
            &collection,
            &strategy,
            record(&format!("dup{i:02}"), shared.clone(), "A"),
        );
    }

    let results = strategy.query(&collection, &shared, 5, None).unwrap().results;
    // All scores tie; the id tie-break picks the lexicographically first.
    let ids: Vec<&str> = results.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, vec!["dup00", "dup01", "dup02", "dup03", "dup04"]);
}

#[test]
fn repeated_queries_are_byte_identical() {
    let (collection, strategy) = build(StrategyKind::Exact, 8);
    for i in 0..50 {
        insert(&collection, &strategy, record(&format!("r{i}"), random_vec(8), "A"));
    }
    let query = random_vec(8);
    let first = strategy.query(&collection, &query, 10, None).unwrap().results;
    let second = strategy.query(&collection, &query, 10, None).unwrap().results;
    assert_eq!(first, second);
}

#[test]
fn dimension_mismatch_never_stores_a_record() {
    let (collection, strategy) = build(StrategyKind::Exact, 4);
    let outcome = collection.upsert(record("bad", vec![1.0, 2.0], "A"));
    assert!(outcome.is_err());
    assert_eq!(collection.len(), 0);

    insert(&collection, &strategy, record("ok", vec![1.0, 0.0, 0.0, 0.0], "A"));
    let err = strategy
        .query(&collection, &[1.0, 0.0], 1, None)
        .unwrap_err();
    assert_eq!(err.code(), "DIMENSION_MISMATCH");
}

#[test]
fn metadata_filter_restricts_the_scan() {
    let (collection, strategy) = build(StrategyKind::Exact, 4);
    insert(&collection, &strategy, record("a", vec![1.0, 0.0, 0.0, 0.0], "billing"));
    insert(&collection, &strategy, record("b", vec![0.9, 0.1, 0.0, 0.0], "technical"));
    insert(&collection, &strategy, record("c", vec![0.8, 0.2, 0.0, 0.0], "billing"));

    let filter = MetadataFilter::new("category", "billing").unwrap();
    let results = strategy
        .query(&collection, &[1.0, 0.0, 0.0, 0.0], 10, Some(&filter))
        .unwrap()
        .results;
    let ids: Vec<&str> = results.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

// ============================================================================
// Quantized strategy
// ============================================================================

#[test]
fn quantized_top_score_is_close_to_exact() {
    let dim = 32;
    let mut rng = StdRng::seed_from_u64(11);
    let mut seeded = |dim: usize| -> Vec<f32> {
        (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
    };
    let (collection, exact) = build(StrategyKind::Exact, dim);
    let quantized = IndexStrategy::from_config(&StrategyConfig::new(
        "sq8",
        StrategyKind::Quantized,
        dim,
    ))
    .unwrap();

    for i in 0..100 {
        let r = record(&format!("r{i}"), seeded(dim), "A");
        let outcome = collection.upsert(r.clone()).unwrap();
        exact.insert(&outcome, &r).unwrap();
        quantized.insert(&outcome, &r).unwrap();
    }

    let query = seeded(dim);
    let exact_top = &exact.query(&collection, &query, 1, None).unwrap().results[0];
    let quantized_top = &quantized.query(&collection, &query, 1, None).unwrap().results[0];
    assert!((exact_top.score - quantized_top.score).abs() <= 0.05);
}

#[test]
fn quantized_rerank_recovers_exact_ranking() {
    let dim = 32;
    let k = 5;
    let (collection, exact) = build(StrategyKind::Exact, dim);
    let mut config = StrategyConfig::new("sq8", StrategyKind::Quantized, dim);
    config.quantized = QuantizedConfig {
        rerank_enabled: true,
        rerank_multiplier: 4,
        cost_factor: 0.25,
    };
    let reranked = IndexStrategy::from_config(&config).unwrap();

    let mut rng = StdRng::seed_from_u64(12);
    let mut seeded = |dim: usize| -> Vec<f32> {
        (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
    };
    for i in 0..100 {
        let r = record(&format!("r{i}"), seeded(dim), "A");
        let outcome = collection.upsert(r.clone()).unwrap();
        exact.insert(&outcome, &r).unwrap();
        reranked.insert(&outcome, &r).unwrap();
    }

    let query = seeded(dim);
    let exact_ids: Vec<String> = exact
        .query(&collection, &query, k, None)
        .unwrap()
        .results
        .into_iter()
        .map(|r| r.record_id)
        .collect();
    let reranked_results = reranked.query(&collection, &query, k, None).unwrap().results;

    // The exact winner survives the quantized window and reranks to the top
    // with its full-precision score.
    assert_eq!(reranked_results[0].record_id, exact_ids[0]);
    let overlap = reranked_results
        .iter()
        .filter(|r| exact_ids.contains(&r.record_id))
        .count();
    assert!(overlap >= 4, "rerank overlap too low: {overlap}/5");
}

#[test]
fn quantized_scan_is_cheaper_than_exact() {
    let dim = 16;
    let (collection, exact) = build(StrategyKind::Exact, dim);
    let quantized = IndexStrategy::from_config(&StrategyConfig::new(
        "sq8",
        StrategyKind::Quantized,
        dim,
    ))
    .unwrap();
    for i in 0..50 {
        let r = record(&format!("r{i}"), random_vec(dim), "A");
        let outcome = collection.upsert(r.clone()).unwrap();
        exact.insert(&outcome, &r).unwrap();
        quantized.insert(&outcome, &r).unwrap();
    }
    let query = random_vec(dim);
    let exact_cost = exact.query(&collection, &query, 5, None).unwrap().unit_cost;
    let quantized_cost = quantized.query(&collection, &query, 5, None).unwrap().unit_cost;
    assert!(quantized_cost < exact_cost);
}

// ============================================================================
// Approximate strategy
// ============================================================================

#[test]
fn approximate_is_deterministic_for_a_fixed_seed() {
    let dim = 16;
    let run = || {
        let (collection, strategy) = build(StrategyKind::Approximate, dim);
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..60 {
            let v: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
            insert(&collection, &strategy, record(&format!("r{i}"), v, "A"));
        }
        strategy
            .query(&collection, &[0.5; 16], 5, None)
            .unwrap()
            .results
    };
    assert_eq!(run(), run());
}

#[test]
fn approximate_empty_filter_result_is_not_an_error() {
    let (collection, strategy) = build(StrategyKind::Approximate, 4);
    insert(&collection, &strategy, record("a", vec![1.0, 0.0, 0.0, 0.0], "A"));
    let filter = MetadataFilter::new("category", "B").unwrap();
    let results = strategy
        .query(&collection, &[1.0, 0.0, 0.0, 0.0], 3, Some(&filter))
        .unwrap()
        .results;
    assert!(results.is_empty());
}

// ============================================================================
// Deadlock detection
// ============================================================================

#[test]
fn concurrent_inserts_and_queries_complete() {
    let dim = 16;
    let (collection, strategy) = build(StrategyKind::Quantized, dim);
    let collection = Arc::new(collection);
    let strategy = Arc::new(strategy);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let collection = Arc::clone(&collection);
            let strategy = Arc::clone(&strategy);
            thread::spawn(move || {
                for i in 0..50 {
                    if i % 2 == 0 {
                        let r = record(&format!("t{t}-r{i}"), random_vec(dim), "A");
                        if let Ok(outcome) = collection.upsert(r.clone()) {
                            let _ = strategy.insert(&outcome, &r);
                        }
                    } else {
                        let _ = strategy.query(&collection, &random_vec(dim), 5, None);
                    }
                }
            })
        })
        .collect();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for h in handles {
            let _ = h.join();
        }
        let _ = tx.send(());
    });
    assert!(
        rx.recv_timeout(Duration::from_secs(10)).is_ok(),
        "deadlock: threads did not complete within 10s"
    );
}
