//! Admission-review handling for DriverConfig validation.
//!
//! Maps [`NodeSelectorValidator`] verdicts onto [`AdmissionResponse`]
//! allow/deny so the validator can sit behind a `ValidatingWebhookConfiguration`.

use kube::{
    api::DynamicObject,
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview},
    ResourceExt,
};
use tracing::{info, warn};

use crate::{api::DriverConfig, state::ClusterView, validator::NodeSelectorValidator};

/// Review one admission request, denying it on selector conflict.
///
/// Malformed reviews produce an `invalid` response. Reviews without an
/// object (DELETE) are allowed without consulting cluster state; removing
/// an instance can only shrink claimed node sets. Upstream read failures
/// also deny, with the underlying error as the message, leaving the retry
/// to the apiserver.
pub async fn review<V: ClusterView>(
    validator: &NodeSelectorValidator<V>,
    body: AdmissionReview<DriverConfig>,
) -> AdmissionReview<DynamicObject> {
    let req: AdmissionRequest<DriverConfig> = match body.try_into() {
        Ok(req) => req,
        Err(err) => {
            warn!(%err, "invalid admission review");
            return AdmissionResponse::invalid(err.to_string()).into_review();
        }
    };

    let mut res = AdmissionResponse::from(&req);
    if let Some(obj) = &req.object {
        info!(uid = %req.uid, operation = ?req.operation, name = %obj.name_any(), "reviewing driver config");
        if let Err(err) = validator.validate(obj).await {
            if !err.is_conflict() {
                warn!(%err, "cluster state read failed during review");
            }
            res = res.deny(err.to_string());
        }
    }
    res.into_review()
}
