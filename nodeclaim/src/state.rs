//! Read-only cluster state consulted by the validator.

use std::future::Future;

use k8s_openapi::api::core::v1::Node;
use kube::{api::ListParams, Api, Client, ResourceExt};

use crate::api::{DriverConfig, LabelMap};

/// Read-only view of the cluster objects the validator consults.
///
/// The validator only needs two capabilities: a complete list of
/// DriverConfig instances, and label-matched node lookup. Keeping them
/// behind a trait lets tests substitute an in-memory cluster and keeps the
/// conflict loop independent of how the objects are fetched.
pub trait ClusterView {
    /// List every DriverConfig instance visible cluster-wide.
    fn driver_configs(&self) -> impl Future<Output = Result<Vec<DriverConfig>, kube::Error>> + Send;

    /// Names of the nodes whose labels contain every `selector` pair.
    ///
    /// Equality-based selection only; an empty selector matches all nodes.
    fn nodes_matching(
        &self,
        selector: &LabelMap,
    ) -> impl Future<Output = Result<Vec<String>, kube::Error>> + Send;
}

/// [`ClusterView`] backed by the apiserver.
///
/// Lists are issued fresh on every call. There is no cache and no retry;
/// cancellation and timeouts ride on the underlying [`Client`].
#[derive(Clone)]
pub struct ApiClusterView {
    configs: Api<DriverConfig>,
    nodes: Api<Node>,
}

impl ApiClusterView {
    /// Construct a view over cluster-scoped Apis for the given client.
    pub fn new(client: Client) -> Self {
        Self {
            configs: Api::all(client.clone()),
            nodes: Api::all(client),
        }
    }
}

impl ClusterView for ApiClusterView {
    async fn driver_configs(&self) -> Result<Vec<DriverConfig>, kube::Error> {
        Ok(self.configs.list(&ListParams::default()).await?.items)
    }

    async fn nodes_matching(&self, selector: &LabelMap) -> Result<Vec<String>, kube::Error> {
        let mut lp = ListParams::default();
        if !selector.is_empty() {
            lp = lp.labels(&selector_string(selector));
        }
        let nodes = self.nodes.list(&lp).await?;
        Ok(nodes.items.into_iter().map(|n| n.name_any()).collect())
    }
}

/// Render an equality selector map as the apiserver's `labelSelector`
/// string, e.g. `os=linux,gpu=true`.
fn selector_string(selector: &LabelMap) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}
