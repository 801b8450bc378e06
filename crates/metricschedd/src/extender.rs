//! Extender — lists ready nodes, ranks them, and binds pending pods.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metricsched_core::{ConfigError, HttpClient, SchedConfig};
use metricsched_kube::{Binder, KubeClient, KubeError, NodeSource, PodRef, PodSource, ReadyNodeLister};
use metricsched_ranking::{NodeCache, RankingEngine, RankingError, RankingOptions};
use metricsched_telemetry::{MetricSource, TelemetryClient};
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Loop timing and pod selection for the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtenderSettings {
    pub scheduler_name: String,
    pub poll_interval: Duration,
    pub node_refresh_interval: Duration,
}

impl ExtenderSettings {
    pub fn from_config(config: &SchedConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            scheduler_name: config.scheduler_name.clone(),
            poll_interval: config.poll_interval()?,
            node_refresh_interval: config.node_refresh_interval()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Bound { pod: String, node: String },
    /// The API answered the binding with a non-2xx status.
    Rejected {
        pod: String,
        node: String,
        status: u16,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Ranking(#[from] RankingError),

    #[error("binding failed: {0}")]
    Binding(#[from] KubeError),
}

pub struct Extender<M, K>
where
    M: MetricSource,
    K: NodeSource + Binder + PodSource,
{
    engine: RankingEngine<M>,
    lister: ReadyNodeLister<K>,
    kube: Arc<K>,
    settings: ExtenderSettings,
    last_refresh: Mutex<Instant>,
}

impl<M, K> Extender<M, K>
where
    M: MetricSource,
    K: NodeSource + Binder + PodSource,
{
    pub fn new(
        metrics: Arc<M>,
        kube: Arc<K>,
        options: RankingOptions,
        settings: ExtenderSettings,
    ) -> Self {
        let cache = Arc::new(NodeCache::new());
        Self {
            engine: RankingEngine::new(metrics, Arc::clone(&cache), options),
            lister: ReadyNodeLister::new(Arc::clone(&kube), cache),
            kube,
            settings,
            last_refresh: Mutex::new(Instant::now()),
        }
    }

    pub fn engine(&self) -> &RankingEngine<M> {
        &self.engine
    }

    pub fn lister(&self) -> &ReadyNodeLister<K> {
        &self.lister
    }

    pub fn settings(&self) -> &ExtenderSettings {
        &self.settings
    }

    /// Place one pod: ready nodes → best node → binding.
    pub async fn schedule_pod(&self, pod: &PodRef) -> Result<ScheduleOutcome, ScheduleError> {
        let nodes = self.lister.ready_nodes().await;
        let best = self.engine.best_node(nodes.as_slice()).await?;

        let resp = self
            .kube
            .bind(&pod.name, &best.name, &pod.namespace)
            .await?;

        if resp.is_success() {
            info!(pod = %pod.name, namespace = %pod.namespace, node = %best.name, "pod bound");
            Ok(ScheduleOutcome::Bound {
                pod: pod.name.clone(),
                node: best.name,
            })
        } else {
            let body = String::from_utf8_lossy(&resp.body).into_owned();
            warn!(
                pod = %pod.name,
                namespace = %pod.namespace,
                node = %best.name,
                status = %resp.status,
                %body,
                "binding rejected"
            );
            Ok(ScheduleOutcome::Rejected {
                pod: pod.name.clone(),
                node: best.name,
                status: resp.status.as_u16(),
                body,
            })
        }
    }

    /// One polling round. Returns how many pods were bound.
    pub async fn tick(&self) -> usize {
        self.refresh_if_due().await;

        let pods = match self.kube.pending_pods(&self.settings.scheduler_name).await {
            Ok(pods) => pods,
            Err(e) => {
                warn!(error = %e, "failed to list pending pods");
                return 0;
            }
        };
        if pods.is_empty() {
            return 0;
        }
        debug!(count = pods.len(), "pending pods found");

        let mut bound = 0;
        for pod in &pods {
            match self.schedule_pod(pod).await {
                Ok(ScheduleOutcome::Bound { .. }) => bound += 1,
                Ok(ScheduleOutcome::Rejected { .. }) => {}
                Err(e) => {
                    warn!(pod = %pod.name, namespace = %pod.namespace, error = %e, "failed to schedule pod");
                }
            }
        }
        bound
    }

    /// Poll until the shutdown channel flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            scheduler = %self.settings.scheduler_name,
            interval = ?self.settings.poll_interval,
            "extender loop starting"
        );

        loop {
            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = shutdown.changed() => {
                    debug!("extender loop shutting down");
                    break;
                }
            }
        }
    }

    /// Drop both cache slots once the refresh interval has passed, so node
    /// membership and metrics are re-read.
    async fn refresh_if_due(&self) {
        let mut last = self.last_refresh.lock().await;
        if last.elapsed() >= self.settings.node_refresh_interval {
            self.engine.cache().invalidate().await;
            *last = Instant::now();
            debug!("node cache refreshed");
        }
    }
}

/// Wire an extender against the real backends described by `config`.
pub fn build_extender(
    config: &SchedConfig,
) -> Result<Extender<TelemetryClient, KubeClient>, ConfigError> {
    config.validate()?;
    let http = HttpClient::new(config.request_timeout()?);

    let telemetry = TelemetryClient::new(http.clone(), &config.telemetry_url, config.metrics.clone());
    let kube = KubeClient::new(http, &config.kube_url);

    Ok(Extender::new(
        Arc::new(telemetry),
        Arc::new(kube),
        RankingOptions {
            lower_is_better: config.lower_is_better,
            max_concurrency: config.max_concurrency,
        },
        ExtenderSettings::from_config(config)?,
    ))
}
