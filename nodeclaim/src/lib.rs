//! Nodeclaim validates that [`DriverConfig`] custom resources claim pairwise
//! disjoint sets of cluster nodes.
//!
//! Each `DriverConfig` targets nodes through an equality-based label
//! selector, and every node must be managed by at most one instance. The
//! crate provides:
//!
//! - [`api`] with the cluster-scoped [`DriverConfig`] resource and its
//!   selector resolution rules
//! - [`state`] with the read-only [`ClusterView`] the validator consults,
//!   backed by the apiserver via [`ApiClusterView`]
//! - [`validator`] with the [`NodeSelectorValidator`] and its two
//!   [`ConflictPolicy`] variants
//! - [`webhook`] mapping validator verdicts onto admission review responses
//!
//! # Example
//!
//! Re-check every persisted instance against current cluster state:
//!
//! ```no_run
//! use kube::{Api, Client, ResourceExt};
//! use nodeclaim::{ApiClusterView, DriverConfig, NodeSelectorValidator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::try_default().await?;
//!     let validator = NodeSelectorValidator::new(ApiClusterView::new(client.clone()));
//!
//!     let configs: Api<DriverConfig> = Api::all(client);
//!     for dc in configs.list(&Default::default()).await? {
//!         match validator.validate(&dc).await {
//!             Ok(()) => println!("{} ok", dc.name_any()),
//!             Err(err) => println!("{} rejected: {err}", dc.name_any()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The check is a read-then-decide advisory: two instances validated
//! concurrently can both pass and then both be persisted. Callers that need
//! the disjointness invariant enforced atomically must serialize admission
//! themselves; see [`NodeSelectorValidator`] for details.

pub mod api;
pub mod error;
pub mod state;
pub mod validator;
pub mod webhook;

pub use api::{default_selector, DriverConfig, DriverConfigSpec, LabelMap};
pub use error::{Conflict, Error};
pub use state::{ApiClusterView, ClusterView};
pub use validator::{ConflictPolicy, NodeSelectorValidator};

#[cfg(test)] pub(crate) mod fixtures;
