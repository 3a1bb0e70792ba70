use chrono::{DateTime, Utc};
use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;

use super::{SERIES_ROUTE_COMPONENT, json_body, path_id, query_params};
use crate::authorizer_handler::get_authorizer_from_depot;
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use crate::middleware::caller::get_caller_from_depot;
use cadence_db::model::recurrence::RecurringEventInstance;
use cadence_service::series::{
    CreatedSeries, DeletedTemplate, ExtensionOutcome, RecurrenceFields, TemplateFields,
    create_recurring_template, delete_entire_series, extend_series, list_instances,
};

#[derive(Debug, Deserialize)]
struct CreateSeriesRequest {
    template: TemplateFields,
    recurrence: RecurrenceFields,
}

#[derive(Debug, Deserialize)]
struct ExtendQuery {
    until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    #[serde(default)]
    include_cancelled: bool,
}

/// ## Summary
/// POST /api/series - create a recurring template and its first instances.
///
/// ## Errors
/// 400 on invalid fields, 404 for an unknown organization, 403 for
/// non-administrators.
#[handler]
async fn create(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<CreatedSeries>> {
    let body: CreateSeriesRequest = json_body(req).await?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let created = create_recurring_template(
        &mut conn,
        &authorizer,
        &settings.materialization,
        caller,
        body.template,
        body.recurrence,
    )
    .await?;

    res.status_code(StatusCode::CREATED);
    Ok(Json(created))
}

/// ## Summary
/// DELETE /api/series/{id} - delete a template, its rule and all instances.
#[handler]
async fn delete(req: &mut Request, depot: &mut Depot) -> AppResult<Json<DeletedTemplate>> {
    let template_id = path_id(req)?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        delete_entire_series(&mut conn, &authorizer, caller, template_id).await?,
    ))
}

/// ## Summary
/// POST /api/series/{id}/extend?until= - advance the materialization horizon.
#[handler]
async fn extend(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ExtensionOutcome>> {
    let template_id = path_id(req)?;
    let query: ExtendQuery = query_params(req)?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        extend_series(
            &mut conn,
            &authorizer,
            &settings.materialization,
            caller,
            template_id,
            query.until,
        )
        .await?,
    ))
}

/// ## Summary
/// GET /api/series/{id}/instances?rangeStart=&rangeEnd=&includeCancelled=
#[handler]
async fn instances(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Json<Vec<RecurringEventInstance>>> {
    let template_id = path_id(req)?;
    let query: RangeQuery = query_params(req)?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        list_instances(
            &mut conn,
            &settings.materialization,
            template_id,
            query.range_start,
            query.range_end,
            query.include_cancelled,
        )
        .await?,
    ))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(SERIES_ROUTE_COMPONENT)
        .post(create)
        .push(
            Router::with_path("{id}")
                .delete(delete)
                .push(Router::with_path("extend").post(extend))
                .push(Router::with_path("instances").get(instances)),
        )
}
