//! The cluster-scoped [`DriverConfig`] custom resource.

use std::{borrow::Cow, collections::BTreeMap};

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label reported on nodes that expose a GPU device.
pub const GPU_PRESENT_LABEL: &str = "nvidia.com/gpu.present";

/// An unordered label key/value mapping used for node selection.
pub type LabelMap = BTreeMap<String, String>;

/// Spec for the cluster-scoped DriverConfig resource.
///
/// Each instance requests a driver rollout on the nodes matched by its
/// `nodeSelector`. Instances must select pairwise disjoint node sets; the
/// [`NodeSelectorValidator`](crate::NodeSelectorValidator) enforces this at
/// admission time.
#[derive(CustomResource, Serialize, Deserialize, Default, Clone, Debug, JsonSchema)]
#[kube(
    group = "nvidia.com",
    version = "v1alpha1",
    kind = "DriverConfig",
    derive = "Default",
    shortname = "dc"
)]
#[serde(rename_all = "camelCase")]
pub struct DriverConfigSpec {
    /// Equality-based label selector choosing the nodes this instance
    /// manages.
    ///
    /// Leaving the selector unset targets every GPU-bearing node via
    /// [`default_selector`]. An explicitly empty map is different: it
    /// resolves literally and therefore selects all nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<LabelMap>,
}

/// The selector substituted when an instance does not set one.
///
/// Encodes the convention that an un-configured instance targets any node
/// presenting a GPU.
pub fn default_selector() -> LabelMap {
    [(GPU_PRESENT_LABEL.to_owned(), "true".to_owned())].into()
}

impl DriverConfig {
    /// Whether this instance has no effective selector configured.
    ///
    /// Both an unset and an explicitly empty map count: either way the
    /// instance claims the implicit default role under
    /// [`ConflictPolicy::ReservedDefault`](crate::ConflictPolicy::ReservedDefault).
    pub fn has_empty_selector(&self) -> bool {
        self.spec.node_selector.as_ref().map_or(true, |s| s.is_empty())
    }

    /// The selector used for node resolution, with [`default_selector`]
    /// substituted when unset.
    ///
    /// Returns a resolved copy and never mutates the instance.
    pub fn effective_selector(&self) -> Cow<'_, LabelMap> {
        match &self.spec.node_selector {
            Some(selector) => Cow::Borrowed(selector),
            None => Cow::Owned(default_selector()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{default_selector, DriverConfig, DriverConfigSpec, GPU_PRESENT_LABEL};
    use kube::core::CustomResourceExt;

    #[test]
    fn driverconfig_is_cluster_scoped() {
        let crd = DriverConfig::crd();
        assert_eq!(crd.spec.scope, "Cluster");
        assert_eq!(crd.spec.names.plural, "driverconfigs");
    }

    #[test]
    fn unset_selector_resolves_to_default() {
        let dc = DriverConfig::new("default-rollout", DriverConfigSpec::default());
        assert!(dc.has_empty_selector());
        let resolved = dc.effective_selector();
        assert_eq!(resolved.get(GPU_PRESENT_LABEL).map(String::as_str), Some("true"));
        // resolution must not write the substitution back
        assert!(dc.spec.node_selector.is_none());
    }

    #[test]
    fn explicit_empty_selector_resolves_literally() {
        let dc = DriverConfig::new("match-all", DriverConfigSpec {
            node_selector: Some(Default::default()),
        });
        assert!(dc.has_empty_selector());
        assert!(dc.effective_selector().is_empty());
    }

    #[test]
    fn set_selector_is_borrowed_verbatim() {
        let selector = [("os-version".to_owned(), "ubuntu20.04".to_owned())].into();
        let dc = DriverConfig::new("ubuntu", DriverConfigSpec {
            node_selector: Some(selector),
        });
        assert!(!dc.has_empty_selector());
        assert_eq!(
            dc.effective_selector().get("os-version").map(String::as_str),
            Some("ubuntu20.04")
        );
    }

    #[test]
    fn default_selector_is_the_gpu_label() {
        assert_eq!(default_selector().len(), 1);
        assert_eq!(
            default_selector().get(GPU_PRESENT_LABEL).map(String::as_str),
            Some("true")
        );
    }
}
