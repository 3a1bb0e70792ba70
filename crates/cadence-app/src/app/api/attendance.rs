//! Attendance endpoints. Every request names its target with exactly one of
//! `eventId` / `recurringEventInstanceId`.

use salvo::writing::Json;
use salvo::{Depot, Request, Router, handler};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ATTENDANCE_ROUTE_COMPONENT, json_body, query_params};
use crate::authorizer_handler::get_authorizer_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use crate::middleware::caller::get_caller_from_depot;
use cadence_db::model::attendee::EventAttendee;
use cadence_service::attendance::{self, AttendanceTarget};
use cadence_service::auth::Caller;
use cadence_service::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttendanceInput {
    #[serde(default)]
    event_id: Option<Uuid>,
    #[serde(default)]
    recurring_event_instance_id: Option<Uuid>,
    #[serde(default)]
    user_id: Option<Uuid>,
}

impl AttendanceInput {
    fn target(self) -> ServiceResult<AttendanceTarget> {
        AttendanceTarget::from_ids(self.event_id, self.recurring_event_instance_id)
    }

    /// The named user, or the caller when none is given.
    fn user_or_caller(self, caller: Caller) -> Uuid {
        self.user_id.unwrap_or(caller.user_id)
    }

    fn required_user(self) -> ServiceResult<Uuid> {
        self.user_id.ok_or_else(|| {
            ServiceError::invalid_arguments(&["input", "userId"], "userId is required")
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackStatus {
    feedback_submitted: bool,
}

#[handler]
async fn invite(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventAttendee>> {
    let input: AttendanceInput = json_body(req).await?;
    let target = input.target()?;
    let user_id = input.required_user()?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        attendance::invite_attendee(&mut conn, &authorizer, caller, target, user_id).await?,
    ))
}

#[handler]
async fn register(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventAttendee>> {
    let input: AttendanceInput = json_body(req).await?;
    let target = input.target()?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        attendance::register_for_event(
            &mut conn,
            &authorizer,
            caller,
            target,
            input.user_or_caller(caller),
        )
        .await?,
    ))
}

#[handler]
async fn check_in(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventAttendee>> {
    let input: AttendanceInput = json_body(req).await?;
    let target = input.target()?;
    let user_id = input.required_user()?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        attendance::check_in(&mut conn, &authorizer, caller, target, user_id).await?,
    ))
}

#[handler]
async fn check_out(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventAttendee>> {
    let input: AttendanceInput = json_body(req).await?;
    let target = input.target()?;
    let user_id = input.required_user()?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        attendance::check_out(&mut conn, &authorizer, caller, target, user_id).await?,
    ))
}

#[handler]
async fn submit_feedback(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventAttendee>> {
    let input: AttendanceInput = json_body(req).await?;
    let target = input.target()?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        attendance::submit_feedback(
            &mut conn,
            &authorizer,
            caller,
            target,
            input.user_or_caller(caller),
        )
        .await?,
    ))
}

#[handler]
async fn remove(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventAttendee>> {
    let input: AttendanceInput = json_body(req).await?;
    let target = input.target()?;
    let user_id = input.required_user()?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        attendance::remove_attendee(&mut conn, &authorizer, caller, target, user_id).await?,
    ))
}

/// GET /api/attendance/attendee?eventId|recurringEventInstanceId&userId
#[handler]
async fn attendee(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventAttendee>> {
    let input: AttendanceInput = query_params(req)?;
    let target = input.target()?;
    let caller = get_caller_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        attendance::resolve_attendee(&mut conn, target, input.user_or_caller(caller)).await?,
    ))
}

/// GET /api/attendance/feedback?eventId|recurringEventInstanceId&userId
#[handler]
async fn feedback_status(req: &mut Request, depot: &mut Depot) -> AppResult<Json<FeedbackStatus>> {
    let input: AttendanceInput = query_params(req)?;
    let target = input.target()?;
    let caller = get_caller_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let feedback_submitted =
        attendance::has_submitted_feedback(&mut conn, target, input.user_or_caller(caller))
            .await?;
    Ok(Json(FeedbackStatus { feedback_submitted }))
}

/// GET /api/attendance/list?eventId|recurringEventInstanceId
#[handler]
async fn list(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<EventAttendee>>> {
    let input: AttendanceInput = query_params(req)?;
    let target = input.target()?;
    let caller = get_caller_from_depot(depot)?;
    let authorizer = get_authorizer_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        attendance::list_attendees(&mut conn, &authorizer, caller, target).await?,
    ))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(ATTENDANCE_ROUTE_COMPONENT)
        .push(Router::with_path("invite").post(invite))
        .push(Router::with_path("register").post(register))
        .push(Router::with_path("check-in").post(check_in))
        .push(Router::with_path("check-out").post(check_out))
        .push(Router::with_path("feedback").post(submit_feedback).get(feedback_status))
        .push(Router::with_path("remove").post(remove))
        .push(Router::with_path("attendee").get(attendee))
        .push(Router::with_path("list").get(list))
}
