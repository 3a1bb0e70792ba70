mod app_specific;
mod attendance;
mod instances;
mod maintenance;
mod series;

use salvo::Router;
use salvo::Request;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::caller::CallerMiddleware;

// Re-export route constants from core
pub use cadence_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, ATTENDANCE_ROUTE_COMPONENT, ATTENDANCE_ROUTE_PREFIX,
    INSTANCE_ROUTE_COMPONENT, INSTANCE_ROUTE_PREFIX, MAINTENANCE_ROUTE_COMPONENT,
    MAINTENANCE_ROUTE_PREFIX, SERIES_ROUTE_COMPONENT, SERIES_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the API router. Everything except the healthcheck requires an
/// identified caller.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .push(app_specific::routes())
        .push(
            Router::new()
                .hoop(CallerMiddleware)
                .push(series::routes())
                .push(instances::routes())
                .push(attendance::routes())
                .push(maintenance::routes()),
        )
}

/// The `{id}` path parameter.
fn path_id(req: &Request) -> AppResult<Uuid> {
    req.param::<Uuid>("id")
        .ok_or_else(|| AppError::BadRequest("Path parameter id must be a UUID".to_string()))
}

async fn json_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_json::<T>()
        .await
        .map_err(|err| AppError::BadRequest(format!("Invalid request body: {err}")))
}

fn query_params<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_queries::<T>()
        .map_err(|err| AppError::BadRequest(format!("Invalid query parameters: {err}")))
}
