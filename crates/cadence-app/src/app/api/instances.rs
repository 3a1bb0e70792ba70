use salvo::writing::Json;
use salvo::{Depot, Request, Router, handler};

use super::{INSTANCE_ROUTE_COMPONENT, json_body, path_id};
use crate::authorizer_handler::get_authorizer_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use crate::middleware::caller::get_caller_from_depot;
use cadence_db::model::recurrence::RecurringEventInstance;
use cadence_service::series::{
    InstanceUpdate, ResolvedInstance, SeriesUpdate, cancel_single_instance, get_instance,
    update_entire_series, update_single_instance,
};

/// GET /api/instances/{id}
#[handler]
async fn show(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ResolvedInstance>> {
    let instance_id = path_id(req)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(get_instance(&mut conn, instance_id).await?))
}

/// PATCH /api/instances/{id} with timing and/or detail overrides
#[handler]
async fn update(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ResolvedInstance>> {
    let instance_id = path_id(req)?;
    let changes: InstanceUpdate = json_body(req).await?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        update_single_instance(&mut conn, &authorizer, caller, instance_id, changes).await?,
    ))
}

/// PATCH /api/instances/{id}/series with `{"name"?, "description"?}`
#[handler]
async fn update_series(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ResolvedInstance>> {
    let instance_id = path_id(req)?;
    let changes: SeriesUpdate = json_body(req).await?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        update_entire_series(&mut conn, &authorizer, caller, instance_id, changes).await?,
    ))
}

/// POST /api/instances/{id}/cancel
#[handler]
async fn cancel(req: &mut Request, depot: &mut Depot) -> AppResult<Json<RecurringEventInstance>> {
    let instance_id = path_id(req)?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        cancel_single_instance(&mut conn, &authorizer, caller, instance_id).await?,
    ))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(INSTANCE_ROUTE_COMPONENT).push(
        Router::with_path("{id}")
            .get(show)
            .patch(update)
            .push(Router::with_path("series").patch(update_series))
            .push(Router::with_path("cancel").post(cancel)),
    )
}
