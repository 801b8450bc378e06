//! Orchestration API client.

use std::future::Future;

use metricsched_core::{HttpClient, HttpResponse};
use tracing::debug;

use crate::error::KubeError;
use crate::types::{Binding, KubeNode, NodeListResponse, PodListResponse, PodRef};

/// Lists cluster nodes.
pub trait NodeSource: Send + Sync + 'static {
    fn list_nodes(&self) -> impl Future<Output = Result<Vec<KubeNode>, KubeError>> + Send;
}

/// Commits a pod-to-node assignment.
///
/// The response is returned as-is; a rejected binding is a successful call
/// with a non-2xx status.
pub trait Binder: Send + Sync + 'static {
    fn bind(
        &self,
        pod: &str,
        node: &str,
        namespace: &str,
    ) -> impl Future<Output = Result<HttpResponse, KubeError>> + Send;
}

/// Finds pods waiting for this scheduler.
pub trait PodSource: Send + Sync + 'static {
    fn pending_pods(
        &self,
        scheduler_name: &str,
    ) -> impl Future<Output = Result<Vec<PodRef>, KubeError>> + Send;
}

#[derive(Clone)]
pub struct KubeClient {
    http: HttpClient,
    base_url: String,
}

impl KubeClient {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `/api/v1/nodes`.
    pub async fn get_nodes(&self) -> Result<Vec<KubeNode>, KubeError> {
        let url = self.url("/api/v1/nodes");
        let resp = self.http.get(&url).await?;
        if !resp.is_success() {
            return Err(status_error(url, &resp));
        }
        let list: NodeListResponse = resp.json()?;
        debug!(count = list.items.len(), "nodes listed");
        Ok(list.items)
    }

    /// Pending pods assigned to `scheduler_name` that have no node yet.
    pub async fn get_pending_pods(&self, scheduler_name: &str) -> Result<Vec<PodRef>, KubeError> {
        let url = self.url(&format!(
            "/api/v1/pods?fieldSelector=spec.schedulerName={scheduler_name},spec.nodeName="
        ));
        let resp = self.http.get(&url).await?;
        if !resp.is_success() {
            return Err(status_error(url, &resp));
        }
        let list: PodListResponse = resp.json()?;
        // Not every API server honours the field selector.
        Ok(list
            .items
            .iter()
            .filter(|pod| pod.awaits_scheduler(scheduler_name))
            .map(PodRef::from)
            .collect())
    }

    /// POST a binding for `pod` onto `node`.
    pub async fn create_binding(
        &self,
        pod: &str,
        node: &str,
        namespace: &str,
    ) -> Result<HttpResponse, KubeError> {
        let binding = Binding::new(pod, node, namespace);
        let url = self.url(&format!(
            "/api/v1/namespaces/{}/bindings",
            binding.namespace()
        ));
        let resp = self.http.post_json(&url, &binding).await?;
        debug!(%pod, %node, namespace = binding.namespace(), status = %resp.status, "binding posted");
        Ok(resp)
    }
}

fn status_error(url: String, resp: &HttpResponse) -> KubeError {
    KubeError::Status {
        url,
        status: resp.status.as_u16(),
        body: String::from_utf8_lossy(&resp.body).into_owned(),
    }
}

impl NodeSource for KubeClient {
    fn list_nodes(&self) -> impl Future<Output = Result<Vec<KubeNode>, KubeError>> + Send {
        self.get_nodes()
    }
}

impl Binder for KubeClient {
    fn bind(
        &self,
        pod: &str,
        node: &str,
        namespace: &str,
    ) -> impl Future<Output = Result<HttpResponse, KubeError>> + Send {
        self.create_binding(pod, node, namespace)
    }
}

impl PodSource for KubeClient {
    fn pending_pods(
        &self,
        scheduler_name: &str,
    ) -> impl Future<Output = Result<Vec<PodRef>, KubeError>> + Send {
        self.get_pending_pods(scheduler_name)
    }
}
