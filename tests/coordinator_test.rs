//! Refresh coordinator behaviour through the engine facade.
//!
//! Tests cover:
//! - At most one scoring batch in flight; concurrent callers join it
//! - A caller that stops waiting does not cancel the batch
//! - Readers see the previous snapshot until the next commit
//! - Cold start: `loading` status, or the persisted snapshot
//! - Failed batches keep the previous snapshot
//! - Universe assembly from configuration and watchlist

mod common;

use common::*;
use signalcast::domain::error::EngineError;
use signalcast::domain::macro_context::MarketStatus;
use signalcast::domain::price::DataQuality;
use signalcast::domain::sentiment::SentimentReading;
use signalcast::domain::signal::Recommendation;
use signalcast::engine::{Collaborators, Engine};
use signalcast::refresh::CacheStatus;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn flat_source() -> MockPriceSource {
    MockPriceSource::new()
        .with_closes("VOO", &[100.0; 60])
        .with_closes("QQQ", &[250.0; 60])
}

fn engine_with(prices: Arc<MockPriceSource>, symbols: &[&str]) -> Engine {
    Engine::new(&settings(symbols), Collaborators::with_prices(prices))
}

mod single_flight {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refreshes_run_one_batch() {
        let prices = Arc::new(flat_source());
        prices.set_delay(Duration::from_millis(100));
        let engine = engine_with(Arc::clone(&prices), &["VOO", "QQQ"]);

        let (a, b) = tokio::join!(engine.refresh_now(), engine.refresh_now());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(engine.coordinator().batches_run(), 1);
        assert_eq!(a.generation, 1);
        assert_eq!(b.generation, 1);
        assert_eq!(a.count, 2);
        assert_eq!(b.count, 2);
        assert!(a.joined ^ b.joined);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sequential_refreshes_each_run() {
        let prices = Arc::new(flat_source());
        let engine = engine_with(prices, &["VOO", "QQQ"]);

        let first = engine.refresh_now().await.unwrap();
        let second = engine.refresh_now().await.unwrap();

        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
        assert!(!second.joined);
        assert_eq!(engine.coordinator().batches_run(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn joiners_of_a_failed_batch_see_the_failure() {
        let prices = Arc::new(flat_source());
        prices.set_fail_all(true);
        prices.set_delay(Duration::from_millis(100));
        let engine = engine_with(prices, &["VOO", "QQQ"]);

        let (a, b) = tokio::join!(engine.refresh_now(), engine.refresh_now());

        assert!(matches!(a, Err(EngineError::AllSymbolsFailed { attempted: 2 })));
        assert!(matches!(b, Err(EngineError::AllSymbolsFailed { attempted: 2 })));
        assert_eq!(engine.coordinator().batches_run(), 1);
    }

    async fn wait_for_generation(engine: &Engine, generation: u64) -> bool {
        for _ in 0..60 {
            if engine.get_cached_results().await.generation >= generation {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn timed_out_caller_leaves_batch_to_commit() {
        let prices = Arc::new(flat_source());
        prices.set_delay(Duration::from_millis(200));
        let engine = engine_with(Arc::clone(&prices), &["VOO", "QQQ"]);

        let waited = tokio::time::timeout(Duration::from_millis(50), engine.refresh_now()).await;
        assert!(waited.is_err());

        assert!(wait_for_generation(&engine, 1).await);
        let cached = engine.get_cached_results().await;
        assert_eq!(cached.status, CacheStatus::Ready);
        assert_eq!(cached.generation, 1);
        assert_eq!(cached.results.len(), 2);
        assert_eq!(engine.coordinator().batches_run(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn later_caller_joins_an_abandoned_batch() {
        let prices = Arc::new(flat_source());
        prices.set_delay(Duration::from_millis(200));
        let engine = engine_with(Arc::clone(&prices), &["VOO", "QQQ"]);

        let waited = tokio::time::timeout(Duration::from_millis(50), engine.refresh_now()).await;
        assert!(waited.is_err());

        let joined = engine.refresh_now().await.unwrap();
        assert!(joined.joined);
        assert_eq!(joined.generation, 1);
        assert_eq!(joined.count, 2);
        assert_eq!(engine.coordinator().batches_run(), 1);
    }
}

mod stale_reads {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn read_during_refresh_returns_previous_snapshot() {
        let prices = Arc::new(flat_source());
        let engine = Arc::new(engine_with(Arc::clone(&prices), &["VOO", "QQQ"]));
        engine.refresh_now().await.unwrap();
        let before = engine.get_cached_results().await;

        prices.set_delay(Duration::from_millis(200));
        let background = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.refresh_now().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let during = engine.get_cached_results().await;
        assert_eq!(during, before);
        assert_eq!(during.status, CacheStatus::Ready);
        assert_eq!(during.results.len(), 2);

        let outcome = background.await.unwrap().unwrap();
        assert_eq!(outcome.generation, 2);
        let after = engine.get_cached_results().await;
        assert_eq!(after.generation, 2);
        assert_eq!(after.results.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failed_batch_keeps_previous_snapshot() {
        let prices = Arc::new(flat_source());
        let engine = engine_with(Arc::clone(&prices), &["VOO", "QQQ"]);
        engine.refresh_now().await.unwrap();

        prices.set_fail_all(true);
        let err = engine.refresh_now().await.unwrap_err();
        assert!(matches!(err, EngineError::AllSymbolsFailed { attempted: 2 }));

        let cached = engine.get_cached_results().await;
        assert_eq!(cached.generation, 1);
        assert_eq!(cached.results.len(), 2);
    }
}

mod cold_start {
    use super::*;

    #[tokio::test]
    async fn empty_cache_reports_loading() {
        let engine = engine_with(Arc::new(flat_source()), &["VOO"]);
        let cached = engine.get_cached_results().await;
        assert_eq!(cached.status, CacheStatus::Loading);
        assert!(cached.results.is_empty());
        assert_eq!(engine.coordinator().batches_run(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn committed_snapshot_is_persisted_and_restored() {
        let store = Arc::new(MemorySnapshotStore::default());
        let prices = Arc::new(flat_source());

        let first = Engine::new(
            &settings(&["VOO", "QQQ"]),
            Collaborators {
                store: Some(store.clone()),
                ..Collaborators::with_prices(prices.clone())
            },
        );
        first.refresh_now().await.unwrap();
        let committed = first.get_cached_results().await;
        assert_eq!(store.current().unwrap().generation, 1);

        let restarted = Engine::new(
            &settings(&["VOO", "QQQ"]),
            Collaborators {
                store: Some(store.clone()),
                ..Collaborators::with_prices(prices)
            },
        );
        let restored = restarted.get_cached_results().await;
        assert_eq!(restored, committed);
        assert_eq!(restarted.coordinator().batches_run(), 0);

        let next = restarted.refresh_now().await.unwrap();
        assert_eq!(next.generation, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn json_file_store_round_trips_through_restart() {
        use signalcast::adapters::json_snapshot_adapter::JsonSnapshotStore;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("signals.json");
        let prices = Arc::new(flat_source());

        let first = Engine::new(
            &settings(&["VOO"]),
            Collaborators {
                store: Some(Arc::new(JsonSnapshotStore::new(&path))),
                ..Collaborators::with_prices(prices.clone())
            },
        );
        first.refresh_now().await.unwrap();
        assert!(path.exists());

        let second = Engine::new(
            &settings(&["VOO"]),
            Collaborators {
                store: Some(Arc::new(JsonSnapshotStore::new(&path))),
                ..Collaborators::with_prices(prices)
            },
        );
        let restored = second.get_cached_results().await;
        assert_eq!(restored.status, CacheStatus::Ready);
        assert_eq!(restored.results[0].symbol, "VOO");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn broken_store_does_not_fail_refresh() {
        let engine = Engine::new(
            &settings(&["VOO"]),
            Collaborators {
                store: Some(Arc::new(BrokenSnapshotStore)),
                ..Collaborators::with_prices(Arc::new(flat_source()))
            },
        );
        assert_eq!(engine.get_cached_results().await.status, CacheStatus::Loading);

        let outcome = engine.refresh_now().await.unwrap();
        assert_eq!(outcome.count, 1);
        assert_eq!(engine.get_cached_results().await.status, CacheStatus::Ready);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn scheduler_first_tick_runs_immediately() {
        let engine = engine_with(Arc::new(flat_source()), &["VOO"]);
        let handle = engine.coordinator().start();

        let mut ready = false;
        for _ in 0..200 {
            if engine.get_cached_results().await.status == CacheStatus::Ready {
                ready = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(ready);
        assert_eq!(engine.coordinator().batches_run(), 1);
    }
}

mod universe {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn watchlisted_symbols_are_opportunities() {
        let prices = Arc::new(
            flat_source().with_closes("NVDA", &[120.0; 60]),
        );
        let engine = Engine::new(
            &settings(&["VOO", "QQQ"]),
            Collaborators {
                watchlist: Arc::new(StaticWatchlist::of(&["nvda", "VOO"])),
                ..Collaborators::with_prices(prices)
            },
        );

        let outcome = engine.refresh_now().await.unwrap();
        assert_eq!(outcome.count, 3);

        let cached = engine.get_cached_results().await;
        let by_symbol: HashMap<_, _> = cached
            .results
            .iter()
            .map(|r| (r.symbol.as_str(), r))
            .collect();

        let nvda = by_symbol["NVDA"];
        assert_eq!(nvda.recommendation, Recommendation::Hold);
        assert!(nvda.watchlisted);
        assert!(nvda.is_opportunity);
        assert!(by_symbol["VOO"].is_opportunity);
        assert!(!by_symbol["QQQ"].is_opportunity);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failing_watchlist_counts_as_empty() {
        let engine = Engine::new(
            &settings(&["VOO", "QQQ"]),
            Collaborators {
                watchlist: Arc::new(FailingWatchlist),
                ..Collaborators::with_prices(Arc::new(flat_source()))
            },
        );
        let outcome = engine.refresh_now().await.unwrap();
        assert_eq!(outcome.count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn bad_symbol_is_skipped_not_fatal() {
        let prices = Arc::new(flat_source().with_error("BAD", "delisted"));
        let engine = engine_with(prices, &["VOO", "BAD"]);

        let outcome = engine.refresh_now().await.unwrap();
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.skipped, 1);

        let cached = engine.get_cached_results().await;
        assert_eq!(cached.skipped.len(), 1);
        assert_eq!(cached.skipped[0].symbol, "BAD");
        assert!(cached.skipped[0].reason.contains("delisted"));
    }

    #[tokio::test]
    async fn empty_universe_fails_without_commit() {
        let engine = engine_with(Arc::new(flat_source()), &[]);
        let err = engine.refresh_now().await.unwrap_err();
        assert!(matches!(err, EngineError::AllSymbolsFailed { attempted: 0 }));
        assert_eq!(engine.get_cached_results().await.status, CacheStatus::Loading);
    }
}

mod context {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn missing_macro_data_is_marked_fallback() {
        let engine = engine_with(Arc::new(flat_source()), &["VOO"]);
        engine.refresh_now().await.unwrap();

        let macro_context = engine.get_cached_results().await.macro_context.unwrap();
        assert_eq!(macro_context.status, MarketStatus::Neutral);
        assert_eq!(macro_context.quality, DataQuality::Fallback);
        assert_eq!(macro_context.vix, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fear_regime_is_shared_by_the_batch() {
        let prices = Arc::new(
            flat_source()
                .with_closes("^VIX", &[25.0; 10])
                .with_closes("^TNX", &[4.2; 10]),
        );
        let engine = engine_with(prices, &["VOO", "QQQ"]);
        engine.refresh_now().await.unwrap();

        let cached = engine.get_cached_results().await;
        let macro_context = cached.macro_context.unwrap();
        assert_eq!(macro_context.status, MarketStatus::Fear);
        assert_eq!(macro_context.quality, DataQuality::Real);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn price_quality_is_carried_to_results() {
        let prices = Arc::new(
            MockPriceSource::new()
                .with_closes("VOO", &[100.0; 60])
                .with_fallback_closes("SYN", &[50.0; 60]),
        );
        let engine = engine_with(prices, &["VOO", "SYN"]);
        engine.refresh_now().await.unwrap();

        let cached = engine.get_cached_results().await;
        let quality: HashMap<_, _> = cached
            .results
            .iter()
            .map(|r| (r.symbol.clone(), r.quality))
            .collect();
        assert_eq!(quality["VOO"], DataQuality::Real);
        assert_eq!(quality["SYN"], DataQuality::Fallback);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sentiment_feeds_the_score() {
        let mut readings = HashMap::new();
        readings.insert("VOO".to_string(), SentimentReading::from_polarities(&[0.6, 0.4]));
        let engine = Engine::new(
            &settings(&["VOO", "QQQ"]),
            Collaborators {
                sentiment: Arc::new(FixedSentiment(readings)),
                ..Collaborators::with_prices(Arc::new(flat_source()))
            },
        );
        engine.refresh_now().await.unwrap();

        let cached = engine.get_cached_results().await;
        let voo = cached.results.iter().find(|r| r.symbol == "VOO").unwrap();
        let qqq = cached.results.iter().find(|r| r.symbol == "QQQ").unwrap();
        assert!(voo.reasons.contains(&"positive news".to_string()));
        assert!(voo.score > qqq.score);
        assert!(voo.forecast.is_some());
    }
}
