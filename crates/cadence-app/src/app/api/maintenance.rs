use chrono::Utc;
use salvo::writing::Json;
use salvo::{Depot, Request, Router, handler};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MAINTENANCE_ROUTE_COMPONENT, json_body};
use crate::authorizer_handler::get_authorizer_from_depot;
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use crate::middleware::caller::get_caller_from_depot;
use cadence_service::maintenance::cleanup_expired_instances;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanupRequest {
    organization_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupResponse {
    deleted_instances: usize,
}

/// POST /api/maintenance/cleanup - drop an organization's expired instances.
#[handler]
async fn cleanup(req: &mut Request, depot: &mut Depot) -> AppResult<Json<CleanupResponse>> {
    let body: CleanupRequest = json_body(req).await?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let deleted_instances = cleanup_expired_instances(
        &mut conn,
        &authorizer,
        &settings.materialization,
        caller,
        body.organization_id,
        Utc::now(),
    )
    .await?;

    Ok(Json(CleanupResponse { deleted_instances }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(MAINTENANCE_ROUTE_COMPONENT).push(Router::with_path("cleanup").post(cleanup))
}
