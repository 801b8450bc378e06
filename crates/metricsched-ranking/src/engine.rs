//! Ranking engine — concurrent metric collection and best-node selection.
//!
//! A ranking pass:
//! 1. Returns the cached best node if it was computed for the same node set
//! 2. Otherwise queries every candidate concurrently and waits for all of them
//! 3. Sorts the measured nodes and picks one end according to the mode
//! 4. Caches the winner against the candidate set
//!
//! Passes are serialized per engine; the lock covers the whole cycle from
//! cache check to cache write.

use std::sync::Arc;

use metricsched_telemetry::MetricSource;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::cache::NodeCache;
use crate::error::{RankingError, RankingResult};
use crate::node::{Node, NodeList, short_host};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingOptions {
    /// Pick the minimum metric instead of the maximum.
    pub lower_is_better: bool,
    /// Cap on telemetry queries in flight at once.
    pub max_concurrency: usize,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            lower_is_better: false,
            max_concurrency: 32,
        }
    }
}

/// Everything one uncached pass produced.
#[derive(Debug, Clone, Default)]
pub struct RankingPass {
    /// Measured nodes, metric ascending.
    pub ranked: NodeList,
    /// Nodes whose query failed, in submission order.
    pub failed: Vec<Node>,
}

impl RankingPass {
    pub fn best(&self, lower_is_better: bool) -> Option<&Node> {
        self.ranked.best(lower_is_better)
    }
}

pub struct RankingEngine<S: MetricSource> {
    source: Arc<S>,
    cache: Arc<NodeCache>,
    options: RankingOptions,
    limiter: Arc<Semaphore>,
    pass_lock: Mutex<()>,
}

impl<S: MetricSource> RankingEngine<S> {
    pub fn new(source: Arc<S>, cache: Arc<NodeCache>, options: RankingOptions) -> Self {
        let permits = options.max_concurrency.max(1);
        Self {
            source,
            cache,
            options,
            limiter: Arc::new(Semaphore::new(permits)),
            pass_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<NodeCache> {
        &self.cache
    }

    pub fn options(&self) -> &RankingOptions {
        &self.options
    }

    /// Select the best node among `nodes`, using the cache when the node
    /// set matches the one the cached winner was computed from.
    pub async fn best_node<N: AsRef<str>>(&self, nodes: &[N]) -> RankingResult<Node> {
        if nodes.is_empty() {
            return Err(RankingError::EmptyNodeList);
        }

        let _pass = self.pass_lock.lock().await;

        if let Some(best) = self.cache.best_for(nodes).await {
            debug!(node = %best.name, "using cached best node");
            return Ok(best);
        }

        let pass = self.collect(nodes).await;
        let best = pass
            .best(self.options.lower_is_better)
            .filter(|node| node.rankable_metric().is_some())
            .cloned()
            .ok_or(RankingError::NoNodeFound)?;

        info!(
            node = %best.name,
            metric = ?best.metric,
            candidates = nodes.len(),
            failed = pass.failed.len(),
            lower_is_better = self.options.lower_is_better,
            "best node selected"
        );

        self.cache.set_best(nodes, best.clone()).await;
        Ok(best)
    }

    /// Run a fresh pass without reading or writing the best-node cache.
    pub async fn rank<N: AsRef<str>>(&self, nodes: &[N]) -> RankingResult<RankingPass> {
        if nodes.is_empty() {
            return Err(RankingError::EmptyNodeList);
        }

        let _pass = self.pass_lock.lock().await;
        Ok(self.collect(nodes).await)
    }

    /// Query every node concurrently and wait for all of them.
    async fn collect<N: AsRef<str>>(&self, nodes: &[N]) -> RankingPass {
        let mut handles = Vec::with_capacity(nodes.len());

        for name in nodes {
            let name = name.as_ref().to_string();
            let host = short_host(&name).to_string();
            let source = Arc::clone(&self.source);
            let limiter = Arc::clone(&self.limiter);

            let handle = tokio::spawn(async move {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = limiter.acquire_owned().await;
                source.fetch(&host).await
            });
            handles.push((name, handle));
        }

        let mut measured = Vec::with_capacity(handles.len());
        let mut failed = Vec::new();

        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(value)) if value.is_nan() => {
                    warn!(node = %name, "telemetry returned NaN, skipping node");
                    failed.push(Node::failed(name, "metric is NaN"));
                }
                Ok(Ok(value)) => measured.push(Node::measured(name, value)),
                Ok(Err(e)) => {
                    warn!(node = %name, host = short_host(&name), error = %e, "error retrieving node metric");
                    failed.push(Node::failed(name, e.to_string()));
                }
                Err(e) => {
                    warn!(node = %name, error = %e, "metric task did not complete");
                    failed.push(Node::failed(name, e.to_string()));
                }
            }
        }

        RankingPass {
            ranked: NodeList::from_nodes(measured),
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use metricsched_telemetry::FetchError;

    /// Canned per-host answers with call and concurrency accounting.
    #[derive(Default)]
    struct FakeSource {
        values: HashMap<String, Result<f64, FetchError>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl FakeSource {
        fn with(values: &[(&str, Result<f64, FetchError>)]) -> Self {
            Self {
                values: values
                    .iter()
                    .map(|(host, v)| (host.to_string(), v.clone()))
                    .collect(),
                ..Self::default()
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn peak(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }
    }

    impl MetricSource for FakeSource {
        fn fetch(&self, host: &str) -> impl Future<Output = Result<f64, FetchError>> + Send {
            let host = host.to_string();
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }

                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                self.values
                    .get(&host)
                    .cloned()
                    .unwrap_or(Err(FetchError::NoDataFound))
            }
        }
    }

    fn build_engine(source: FakeSource, lower_is_better: bool) -> (RankingEngine<FakeSource>, Arc<FakeSource>) {
        let source = Arc::new(source);
        let engine = RankingEngine::new(
            Arc::clone(&source),
            Arc::new(NodeCache::new()),
            RankingOptions {
                lower_is_better,
                ..RankingOptions::default()
            },
        );
        (engine, source)
    }

    fn backend_500() -> FetchError {
        FetchError::Backend("metric data response: 500 Internal Server Error".to_string())
    }

    #[tokio::test]
    async fn higher_is_better_picks_maximum() {
        let (engine, _) = build_engine(
            FakeSource::with(&[("n1", Ok(10.0)), ("n2", Ok(20.0))]),
            false,
        );
        let best = engine.best_node(&["n1.example", "n2.example"]).await.unwrap();
        assert_eq!(best.name, "n2.example");
        assert_eq!(best.metric, Some(20.0));
    }

    #[tokio::test]
    async fn lower_is_better_picks_minimum() {
        let (engine, _) = build_engine(
            FakeSource::with(&[("n1", Ok(10.0)), ("n2", Ok(20.0))]),
            true,
        );
        let best = engine.best_node(&["n1.example", "n2.example"]).await.unwrap();
        assert_eq!(best.name, "n1.example");
    }

    #[tokio::test]
    async fn failing_node_is_skipped_not_raised() {
        let (engine, source) = build_engine(
            FakeSource::with(&[("n3", Err(backend_500())), ("n4", Ok(5.0))]),
            false,
        );
        let best = engine.best_node(&["n3.example", "n4.example"]).await.unwrap();
        assert_eq!(best.name, "n4.example");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn empty_list_issues_no_queries() {
        let (engine, source) = build_engine(FakeSource::default(), false);
        let nodes: [&str; 0] = [];

        assert_eq!(engine.best_node(&nodes).await, Err(RankingError::EmptyNodeList));
        assert!(matches!(engine.rank(&nodes).await, Err(RankingError::EmptyNodeList)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn all_failures_is_no_node_found() {
        let (engine, source) = build_engine(
            FakeSource::with(&[("a", Err(backend_500())), ("b", Err(FetchError::NoDataFound))]),
            false,
        );
        assert_eq!(engine.best_node(&["a", "b"]).await, Err(RankingError::NoNodeFound));
        assert_eq!(source.calls(), 2);
        // Nothing is cached after a failed pass.
        assert!(engine.cache().best_for(&["a", "b"]).await.is_none());
    }

    #[tokio::test]
    async fn nan_metric_is_treated_as_failure() {
        let (engine, _) = build_engine(FakeSource::with(&[("a", Ok(f64::NAN))]), false);
        assert_eq!(engine.best_node(&["a"]).await, Err(RankingError::NoNodeFound));
    }

    #[tokio::test]
    async fn repeated_set_is_served_from_cache() {
        let (engine, source) = build_engine(
            FakeSource::with(&[("nodeA", Ok(1.0)), ("nodeB", Ok(2.0))]),
            false,
        );

        let first = engine.best_node(&["nodeA", "nodeB"]).await.unwrap();
        assert_eq!(source.calls(), 2);

        let second = engine.best_node(&["nodeA", "nodeB"]).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(first, second);

        // Same members in another order still hit.
        engine.best_node(&["nodeB", "nodeA"]).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn changed_set_queries_again() {
        let (engine, source) = build_engine(
            FakeSource::with(&[("nodeA", Ok(1.0)), ("nodeB", Ok(2.0)), ("nodeC", Ok(3.0))]),
            false,
        );

        engine.best_node(&["nodeA", "nodeB"]).await.unwrap();
        assert_eq!(source.calls(), 2);

        let best = engine.best_node(&["nodeA", "nodeB", "nodeC"]).await.unwrap();
        assert_eq!(source.calls(), 5);
        assert_eq!(best.name, "nodeC");
    }

    #[tokio::test]
    async fn result_is_always_an_input_node_at_the_right_extreme() {
        let metrics = [3.5, -1.0, 0.0, 12.25, 7.0, 12.0];
        let names: Vec<String> = (0..metrics.len()).map(|i| format!("w{i}.cluster.local")).collect();
        let values: Vec<(String, Result<f64, FetchError>)> = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("w{i}"), Ok(*m)))
            .collect();

        for lower_is_better in [true, false] {
            let source = FakeSource {
                values: values.iter().cloned().collect(),
                ..FakeSource::default()
            };
            let (engine, _) = build_engine(source, lower_is_better);

            // Every prefix of the candidate list.
            for len in 1..=names.len() {
                engine.cache().invalidate().await;
                let candidates = &names[..len];
                let best = engine.best_node(candidates).await.unwrap();

                assert!(candidates.contains(&best.name));
                let best_metric = best.metric.unwrap();
                for m in &metrics[..len] {
                    if lower_is_better {
                        assert!(best_metric <= *m);
                    } else {
                        assert!(best_metric >= *m);
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn rank_returns_sorted_list_and_failures_without_caching() {
        let (engine, source) = build_engine(
            FakeSource::with(&[("a", Ok(3.0)), ("b", Err(backend_500())), ("c", Ok(1.0))]),
            false,
        );

        let pass = engine.rank(&["a", "b", "c"]).await.unwrap();
        let ranked: Vec<&str> = pass.ranked.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(ranked, vec!["c", "a"]);
        assert_eq!(pass.failed.len(), 1);
        assert_eq!(pass.failed[0].name, "b");
        assert!(pass.failed[0].error.as_deref().unwrap().contains("500"));

        assert!(engine.cache().best_for(&["a", "b", "c"]).await.is_none());
        engine.rank(&["a", "b", "c"]).await.unwrap();
        assert_eq!(source.calls(), 6);
    }

    #[tokio::test]
    async fn waits_for_every_query_before_returning() {
        let source = FakeSource::with(&[("fast", Ok(1.0)), ("slow", Err(backend_500()))])
            .delayed(Duration::from_millis(30));
        let (engine, source) = build_engine(source, false);

        engine.best_node(&["fast", "slow"]).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn in_flight_queries_are_capped() {
        let values: Vec<(String, Result<f64, FetchError>)> =
            (0..8).map(|i| (format!("n{i}"), Ok(i as f64))).collect();
        let source = Arc::new(
            FakeSource {
                values: values.into_iter().collect(),
                ..FakeSource::default()
            }
            .delayed(Duration::from_millis(10)),
        );
        let engine = RankingEngine::new(
            Arc::clone(&source),
            Arc::new(NodeCache::new()),
            RankingOptions {
                lower_is_better: false,
                max_concurrency: 2,
            },
        );

        let names: Vec<String> = (0..8).map(|i| format!("n{i}")).collect();
        let best = engine.best_node(names.as_slice()).await.unwrap();

        assert_eq!(best.name, "n7");
        assert_eq!(source.calls(), 8);
        assert!(source.peak() <= 2, "peak in flight was {}", source.peak());
    }

    #[tokio::test]
    async fn concurrent_passes_are_serialized() {
        let source = FakeSource::with(&[
            ("a", Ok(1.0)),
            ("b", Ok(2.0)),
            ("c", Ok(3.0)),
            ("x", Ok(4.0)),
            ("y", Ok(5.0)),
            ("z", Ok(6.0)),
        ])
        .delayed(Duration::from_millis(20));
        let (engine, source) = build_engine(source, false);

        let (left, right) = tokio::join!(
            engine.best_node(&["a", "b", "c"]),
            engine.best_node(&["x", "y", "z"]),
        );

        assert_eq!(left.unwrap().name, "c");
        assert_eq!(right.unwrap().name, "z");
        assert_eq!(source.calls(), 6);
        // Never more than one pass worth of queries in flight.
        assert!(source.peak() <= 3, "peak in flight was {}", source.peak());
    }

    #[tokio::test]
    async fn queued_caller_reuses_cache_from_in_flight_pass() {
        let source = FakeSource::with(&[("a", Ok(1.0)), ("b", Ok(2.0))])
            .delayed(Duration::from_millis(20));
        let (engine, source) = build_engine(source, false);

        let (first, second) = tokio::join!(
            engine.best_node(&["a", "b"]),
            engine.best_node(&["a", "b"]),
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(source.calls(), 2);
    }
}
