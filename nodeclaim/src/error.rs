//! Error handling in [`nodeclaim`][crate].

use thiserror::Error;

use crate::api::LabelMap;

/// Possible errors from validating [`DriverConfig`](crate::DriverConfig)
/// node selectors.
#[derive(Error, Debug)]
pub enum Error {
    /// A list call against the apiserver failed.
    ///
    /// Propagated unchanged; retry policy belongs to the caller.
    #[error("ApiError: {0}")]
    Kube(#[from] kube::Error),

    /// The candidate violates the one-driver-per-node invariant.
    #[error("conflicting node selection: {0}")]
    Conflict(#[source] Conflict),
}

/// A detected conflict between two DriverConfig instances.
#[derive(Error, Debug)]
pub enum Conflict {
    /// Two instances resolved to overlapping node sets.
    #[error(
        "DriverConfig {name:?} with nodeSelector {selector:?} selects node {node:?} already claimed by {owner:?}"
    )]
    NodeOverlap {
        /// Instance whose resolution hit an already-claimed node.
        name: String,
        /// That instance's resolved selector.
        selector: LabelMap,
        /// The doubly-claimed node.
        node: String,
        /// Instance that claimed the node first.
        owner: String,
    },

    /// Two instances both left their selector empty, but only one may hold
    /// the implicit default role.
    #[error(
        "DriverConfig {name:?} cannot have an empty nodeSelector: {owner:?} already targets all GPU nodes"
    )]
    DuplicateDefault {
        /// The candidate claiming the default role.
        name: String,
        /// The instance already holding it.
        owner: String,
    },
}

impl From<Conflict> for Error {
    fn from(conflict: Conflict) -> Self {
        Error::Conflict(conflict)
    }
}

impl Error {
    /// Whether this is a conflict verdict rather than an upstream read
    /// failure.
    ///
    /// Admission callers deny in both cases, but only a conflict is a
    /// definitive rejection of the object itself.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
