//! Conflict validation of DriverConfig node selectors.

use std::{collections::HashMap, str::FromStr};

use kube::ResourceExt;
use thiserror::Error;
use tracing::debug;

use crate::{
    api::DriverConfig,
    error::{Conflict, Error},
    state::ClusterView,
};

/// Policy deciding how instances without a selector participate in
/// conflict checking.
///
/// The two policies are not equivalent. An instance with an unset selector
/// that coexists with an explicitly-selected instance is accepted under
/// [`ReservedDefault`](ConflictPolicy::ReservedDefault) but may be rejected
/// under [`Uniform`](ConflictPolicy::Uniform) once the substituted GPU
/// selector resolves to an already-claimed node. Pick one policy per
/// cluster and keep it; mixing them across webhook replicas produces
/// admission decisions that depend on which replica answers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// An instance without a selector claims a reserved "default" role
    /// targeting all GPU nodes. Only one instance may hold the role at a
    /// time, and its node set is exempt from overlap checks against
    /// explicitly-selected instances.
    #[default]
    ReservedDefault,

    /// Every instance is resolved the same way, substituting the default
    /// GPU selector when unset, and all resulting node sets must be
    /// pairwise disjoint.
    Uniform,
}

/// Unrecognized [`ConflictPolicy`] name.
#[derive(Error, Debug)]
#[error("unknown conflict policy {0:?}, expected \"reserved-default\" or \"uniform\"")]
pub struct ParsePolicyError(String);

impl FromStr for ConflictPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved-default" => Ok(ConflictPolicy::ReservedDefault),
            "uniform" => Ok(ConflictPolicy::Uniform),
            other => Err(ParsePolicyError(other.to_owned())),
        }
    }
}

/// Validates that DriverConfig instances claim pairwise disjoint node sets.
///
/// `validate` is a single-shot, read-only decision over live cluster state:
/// no caching, no retries, no internal parallelism. It is also advisory in
/// the presence of concurrency: two candidates validated in parallel can
/// both pass before either is persisted. The apiserver's serialized
/// admission path closes that window for webhook callers; anything else
/// must serialize validation itself.
#[derive(Clone)]
pub struct NodeSelectorValidator<V> {
    view: V,
    policy: ConflictPolicy,
}

impl<V: ClusterView> NodeSelectorValidator<V> {
    /// Validator over `view` with the default
    /// [`ReservedDefault`](ConflictPolicy::ReservedDefault) policy.
    pub fn new(view: V) -> Self {
        Self::with_policy(view, ConflictPolicy::default())
    }

    /// Validator over `view` with an explicit policy.
    pub fn with_policy(view: V, policy: ConflictPolicy) -> Self {
        Self { view, policy }
    }

    /// Check `candidate` against current cluster state.
    ///
    /// Returns [`Error::Conflict`] when admitting the candidate would leave
    /// a node claimed by two instances, and passes upstream list failures
    /// through unchanged as [`Error::Kube`]. Cluster state is never
    /// mutated.
    pub async fn validate(&self, candidate: &DriverConfig) -> Result<(), Error> {
        let verdict = match self.policy {
            ConflictPolicy::ReservedDefault => self.validate_reserved_default(candidate).await,
            ConflictPolicy::Uniform => self.validate_uniform(candidate).await,
        };
        match &verdict {
            Ok(()) => debug!(name = %candidate.name_any(), "node selector admitted"),
            Err(err) if err.is_conflict() => {
                debug!(name = %candidate.name_any(), %err, "node selector rejected")
            }
            Err(_) => {}
        }
        verdict
    }

    async fn validate_reserved_default(&self, candidate: &DriverConfig) -> Result<(), Error> {
        let name = candidate.name_any();
        let instances = self.view.driver_configs().await?;
        let others = instances.iter().filter(|o| o.name_any() != name);

        if candidate.has_empty_selector() {
            // The default role is exclusive, but its node set may overlap
            // with explicitly-selected nodes.
            for other in others {
                if other.has_empty_selector() {
                    return Err(Conflict::DuplicateDefault {
                        name: name.clone(),
                        owner: other.name_any(),
                    }
                    .into());
                }
            }
            return Ok(());
        }

        let mut claimed: HashMap<String, String> = HashMap::new();
        for node in self.view.nodes_matching(&candidate.effective_selector()).await? {
            claimed.insert(node, name.clone());
        }
        for other in others {
            for node in self.view.nodes_matching(&other.effective_selector()).await? {
                if let Some(owner) = claimed.insert(node.clone(), other.name_any()) {
                    return Err(Conflict::NodeOverlap {
                        name: other.name_any(),
                        selector: other.effective_selector().into_owned(),
                        node,
                        owner,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    async fn validate_uniform(&self, candidate: &DriverConfig) -> Result<(), Error> {
        let name = candidate.name_any();
        let mut instances = self.view.driver_configs().await?;
        // On updates the list still carries the candidate's old spec, so any
        // persisted copy is replaced with the candidate itself.
        instances.retain(|o| o.name_any() != name);
        instances.push(candidate.clone());

        let mut claimed: HashMap<String, String> = HashMap::new();
        for instance in &instances {
            for node in self.view.nodes_matching(&instance.effective_selector()).await? {
                if let Some(owner) = claimed.insert(node.clone(), instance.name_any()) {
                    return Err(Conflict::NodeOverlap {
                        name: instance.name_any(),
                        selector: instance.effective_selector().into_owned(),
                        node,
                        owner,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
