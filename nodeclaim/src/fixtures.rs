//! In-memory cluster contents for unit tests.

use crate::{
    api::{DriverConfig, DriverConfigSpec, LabelMap},
    state::ClusterView,
};

/// A [`ClusterView`] served from fixed in-memory contents.
#[derive(Clone, Default)]
pub(crate) struct StaticCluster {
    configs: Vec<DriverConfig>,
    nodes: Vec<(String, LabelMap)>,
    fail_reads: bool,
}

impl StaticCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_config(mut self, name: &str, selector: Option<&[(&str, &str)]>) -> Self {
        self.configs.push(driver_config(name, selector));
        self
    }

    pub(crate) fn with_node(mut self, name: &str, labels: &[(&str, &str)]) -> Self {
        self.nodes.push((name.to_owned(), label_map(labels)));
        self
    }

    /// Make every list call fail, for error propagation tests.
    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }
}

impl ClusterView for StaticCluster {
    async fn driver_configs(&self) -> Result<Vec<DriverConfig>, kube::Error> {
        if self.fail_reads {
            return Err(unavailable());
        }
        Ok(self.configs.clone())
    }

    async fn nodes_matching(&self, selector: &LabelMap) -> Result<Vec<String>, kube::Error> {
        if self.fail_reads {
            return Err(unavailable());
        }
        Ok(self
            .nodes
            .iter()
            .filter(|(_, labels)| selector.iter().all(|(k, v)| labels.get(k) == Some(v)))
            .map(|(name, _)| name.clone())
            .collect())
    }
}

pub(crate) fn label_map(pairs: &[(&str, &str)]) -> LabelMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub(crate) fn driver_config(name: &str, selector: Option<&[(&str, &str)]>) -> DriverConfig {
    DriverConfig::new(name, DriverConfigSpec {
        node_selector: selector.map(label_map),
    })
}

fn unavailable() -> kube::Error {
    kube::Error::Service("fixture cluster is refusing reads".into())
}
