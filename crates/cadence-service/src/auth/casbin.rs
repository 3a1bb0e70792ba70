use std::sync::Arc;

use casbin::{CoreApi, MgmtApi};

use crate::error::ServiceResult;

/// ## Summary
/// Initializes a Casbin enforcer from the embedded model and role policy.
///
/// ## Errors
/// Returns an error if the model or policy cannot be loaded.
#[tracing::instrument]
pub async fn init_casbin() -> ServiceResult<casbin::Enforcer> {
    tracing::debug!("Initializing Casbin enforcer");

    let model = casbin::DefaultModel::from_str(include_str!("casbin_model.conf")).await?;
    tracing::debug!("Casbin model loaded");

    let adapter = string_adapter::StringAdapter::new(include_str!("casbin_policy.csv"));

    let enforcer = casbin::Enforcer::new(model, adapter).await?;

    let policy_count = enforcer.get_policy().len();
    let grouping_count = enforcer.get_grouping_policy().len();
    tracing::info!(
        policy_count = policy_count,
        grouping_count = grouping_count,
        "Casbin enforcer initialized successfully"
    );
    Ok(enforcer)
}

/// ## Summary
/// Initializes the enforcer and wraps it for sharing across requests.
///
/// ## Errors
/// Returns an error if the enforcer cannot be initialized.
pub async fn shared_enforcer() -> ServiceResult<Arc<casbin::Enforcer>> {
    Ok(Arc::new(init_casbin().await?))
}
