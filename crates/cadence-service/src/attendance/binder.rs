//! Persisting attendee transitions.
//!
//! Every write follows the same shape: resolve and authorize outside the
//! transaction, then lock the attendee row, compute the transition and write
//! it inside one. A failed transition leaves the row untouched.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{attendee, user};
use cadence_db::model::attendee::{EventAttendee, NewEventAttendee};
use cadence_db::model::user::User;

use super::state::{ALREADY_INVITED, ALREADY_REGISTERED, AttendeeState, Transition};
use super::target::{AttendanceTarget, ResolvedTarget, resolve_target};
use crate::auth::{Action, Authorizer, Caller};
use crate::error::{ServiceError, ServiceResult};

const USER_PATH: &[&str] = &["input", "userId"];
const ATTENDEE_NOT_FOUND: &str = "Attendee not found for this event";
const NOT_REGISTERABLE: &str = "Event is not open for registration";
const INVITE_REQUIRED: &str = "Event is invite-only and the user has not been invited";

async fn ensure_user_exists(conn: &mut DbConnection<'_>, user_id: Uuid) -> ServiceResult<()> {
    user::by_id(user_id)
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?
        .map(|_user| ())
        .ok_or_else(|| ServiceError::not_found(USER_PATH, "User not found."))
}

/// Inserts a fresh attendee row, reporting a lost insert race as the
/// duplicate it is.
async fn insert_attendee(
    conn: &mut DbConnection<'_>,
    row: &NewEventAttendee,
    duplicate_message: &str,
) -> ServiceResult<EventAttendee> {
    match attendee::insert(conn, row).await {
        Ok(inserted) => Ok(inserted),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            Err(ServiceError::state_conflict(USER_PATH, duplicate_message))
        }
        Err(err) => Err(err.into()),
    }
}

fn new_row(target: AttendanceTarget, user_id: Uuid) -> NewEventAttendee {
    NewEventAttendee {
        id: Uuid::now_v7(),
        user_id,
        event_id: target.event_id(),
        recurring_event_instance_id: target.instance_id(),
        is_invited: false,
        is_registered: false,
    }
}

/// ## Summary
/// Locks the user's record on the target and applies `transition`.
///
/// ## Errors
/// - `NotFound` if the user has no record on the target.
/// - `StateConflict` if the transition is not allowed.
async fn transition_existing(
    conn: &mut DbConnection<'_>,
    target: AttendanceTarget,
    user_id: Uuid,
    transition: Transition,
) -> ServiceResult<EventAttendee> {
    conn.transaction::<_, ServiceError, _>(move |tx| {
        async move {
            let current = target
                .lock_attendee(tx, user_id)
                .await?
                .ok_or_else(|| ServiceError::not_found(USER_PATH, ATTENDEE_NOT_FOUND))?;
            let from = AttendeeState::of(&current);
            let changes = transition.apply(&current)?;
            let updated = attendee::apply(tx, current.id, &changes).await?;
            tracing::debug!(
                attendee_id = %updated.id,
                ?transition,
                ?from,
                to = ?AttendeeState::of(&updated),
                "Attendee transition applied"
            );
            Ok(updated)
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Resolves the target and the caller's right to perform `action` on it.
///
/// ## Errors
/// `NotFound` for a missing target, `Unauthorized` for a missing right.
async fn authorize_on_target(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    target: AttendanceTarget,
    acting_for: Option<Uuid>,
    action: Action,
) -> ServiceResult<ResolvedTarget> {
    let resolved = resolve_target(conn, target).await?;
    authorizer
        .require(
            conn,
            caller,
            resolved.organization_id,
            acting_for,
            action,
            target.argument_path(),
        )
        .await?;
    Ok(resolved)
}

/// ## Summary
/// Returns the user's attendee record on the target.
///
/// ## Errors
/// `NotFound` if the target or the record does not exist.
#[tracing::instrument(skip(conn))]
pub async fn resolve_attendee(
    conn: &mut DbConnection<'_>,
    target: AttendanceTarget,
    user_id: Uuid,
) -> ServiceResult<EventAttendee> {
    resolve_target(conn, target).await?;
    target
        .attendee_query(user_id)
        .select(EventAttendee::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::not_found(USER_PATH, ATTENDEE_NOT_FOUND))
}

/// ## Summary
/// Invites a user to the target, creating their attendee record.
///
/// ## Side Effects
/// Inserts an invited `event_attendee` row, or marks an existing one invited.
///
/// ## Errors
/// - `NotFound` if the target or user does not exist.
/// - `Unauthorized` unless the caller administers the target's organization.
/// - `StateConflict` if the user is already invited or registered, or the
///   target is cancelled.
#[tracing::instrument(skip(conn, authorizer), fields(caller = %caller.user_id))]
pub async fn invite_attendee(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    target: AttendanceTarget,
    user_id: Uuid,
) -> ServiceResult<EventAttendee> {
    let resolved = authorize_on_target(
        conn,
        authorizer,
        caller,
        target,
        None,
        Action::InviteAttendee,
    )
    .await?;
    ensure_user_exists(conn, user_id).await?;
    resolved.ensure_open()?;

    let invited = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                if let Some(current) = target.lock_attendee(tx, user_id).await? {
                    let changes = Transition::Invite.apply(&current)?;
                    return Ok(attendee::apply(tx, current.id, &changes).await?);
                }

                let row = NewEventAttendee {
                    is_invited: true,
                    ..new_row(target, user_id)
                };
                insert_attendee(tx, &row, ALREADY_INVITED).await
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(attendee_id = %invited.id, "Attendee invited");
    Ok(invited)
}

/// ## Summary
/// Registers a user for the target. Callers may register themselves;
/// registering someone else requires administrator rights.
///
/// An existing invitation is upgraded in place.
///
/// ## Errors
/// - `NotFound` if the target or user does not exist.
/// - `Unauthorized` if the caller may not register this user.
/// - `StateConflict` if the target is cancelled, not registerable,
///   invite-only without an invitation, or the user is already registered.
#[tracing::instrument(skip(conn, authorizer), fields(caller = %caller.user_id))]
pub async fn register_for_event(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    target: AttendanceTarget,
    user_id: Uuid,
) -> ServiceResult<EventAttendee> {
    let registering_self = caller.user_id == user_id;
    let action = if registering_self {
        Action::RegisterAttendee
    } else {
        Action::RegisterOther
    };
    let resolved =
        authorize_on_target(conn, authorizer, caller, target, Some(user_id), action).await?;
    ensure_user_exists(conn, user_id).await?;
    resolved.ensure_open()?;

    if !resolved.is_registerable {
        return Err(ServiceError::state_conflict(
            target.argument_path(),
            NOT_REGISTERABLE,
        ));
    }
    let invitation_required = resolved.is_invite_only && registering_self;

    let registered = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                if let Some(current) = target.lock_attendee(tx, user_id).await? {
                    let changes = Transition::Register.apply(&current)?;
                    return Ok(attendee::apply(tx, current.id, &changes).await?);
                }

                if invitation_required {
                    return Err(ServiceError::state_conflict(USER_PATH, INVITE_REQUIRED));
                }

                let row = NewEventAttendee {
                    is_registered: true,
                    ..new_row(target, user_id)
                };
                insert_attendee(tx, &row, ALREADY_REGISTERED).await
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(attendee_id = %registered.id, "Attendee registered");
    Ok(registered)
}

/// ## Summary
/// Checks an invited or registered user in, stamping `checkin_time`.
///
/// ## Errors
/// - `NotFound` if the target or attendee record does not exist.
/// - `Unauthorized` unless the caller administers the target's organization.
/// - `StateConflict` if the attendee is already checked in.
#[tracing::instrument(skip(conn, authorizer), fields(caller = %caller.user_id))]
pub async fn check_in(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    target: AttendanceTarget,
    user_id: Uuid,
) -> ServiceResult<EventAttendee> {
    authorize_on_target(conn, authorizer, caller, target, None, Action::CheckIn).await?;

    let row = transition_existing(conn, target, user_id, Transition::CheckIn { at: Utc::now() })
        .await?;
    tracing::info!(attendee_id = %row.id, "Attendee checked in");
    Ok(row)
}

/// ## Summary
/// Checks a checked-in user out, stamping `checkout_time`.
///
/// ## Errors
/// - `NotFound` if the target or attendee record does not exist.
/// - `Unauthorized` unless the caller administers the target's organization.
/// - `StateConflict` if the attendee is not checked in or already checked out.
#[tracing::instrument(skip(conn, authorizer), fields(caller = %caller.user_id))]
pub async fn check_out(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    target: AttendanceTarget,
    user_id: Uuid,
) -> ServiceResult<EventAttendee> {
    authorize_on_target(conn, authorizer, caller, target, None, Action::CheckOut).await?;

    let row = transition_existing(conn, target, user_id, Transition::CheckOut { at: Utc::now() })
        .await?;
    tracing::info!(attendee_id = %row.id, "Attendee checked out");
    Ok(row)
}

/// ## Summary
/// Returns whether a checked-in user has submitted feedback.
///
/// ## Errors
/// `NotFound` if the target does not exist, or the user has no record or
/// never checked in.
#[tracing::instrument(skip(conn))]
pub async fn has_submitted_feedback(
    conn: &mut DbConnection<'_>,
    target: AttendanceTarget,
    user_id: Uuid,
) -> ServiceResult<bool> {
    let record = resolve_attendee(conn, target, user_id).await?;
    if !record.is_checked_in {
        return Err(ServiceError::not_found(
            USER_PATH,
            "User has not checked in to this event",
        ));
    }
    Ok(record.feedback_submitted)
}

/// ## Summary
/// Records that a checked-in user submitted feedback.
///
/// ## Errors
/// - `NotFound` if the target or attendee record does not exist.
/// - `Unauthorized` unless the caller is the attendee or an administrator.
/// - `StateConflict` if the attendee is not checked in or already submitted.
#[tracing::instrument(skip(conn, authorizer), fields(caller = %caller.user_id))]
pub async fn submit_feedback(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    target: AttendanceTarget,
    user_id: Uuid,
) -> ServiceResult<EventAttendee> {
    authorize_on_target(
        conn,
        authorizer,
        caller,
        target,
        Some(user_id),
        Action::SubmitFeedback,
    )
    .await?;

    let row = transition_existing(conn, target, user_id, Transition::SubmitFeedback).await?;
    tracing::info!(attendee_id = %row.id, "Attendee feedback recorded");
    Ok(row)
}

/// ## Summary
/// Removes a user's attendee record from the target and returns it.
///
/// ## Errors
/// - `NotFound` if the target or attendee record does not exist.
/// - `Unauthorized` unless the caller administers the target's organization.
/// - `Unexpected` if the locked row could not be deleted.
#[tracing::instrument(skip(conn, authorizer), fields(caller = %caller.user_id))]
pub async fn remove_attendee(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    target: AttendanceTarget,
    user_id: Uuid,
) -> ServiceResult<EventAttendee> {
    authorize_on_target(
        conn,
        authorizer,
        caller,
        target,
        None,
        Action::RemoveAttendee,
    )
    .await?;

    let removed = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let current = target
                    .lock_attendee(tx, user_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(USER_PATH, ATTENDEE_NOT_FOUND))?;
                if attendee::delete_by_id(tx, current.id).await? == 0 {
                    return Err(ServiceError::Unexpected(format!(
                        "failed to delete attendee {}",
                        current.id
                    )));
                }
                Ok(current)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(attendee_id = %removed.id, "Attendee removed");
    Ok(removed)
}

/// ## Summary
/// Lists every attendee record on the target in creation order.
///
/// ## Errors
/// - `NotFound` if the target does not exist.
/// - `Unauthorized` unless the caller belongs to the target's organization.
#[tracing::instrument(skip(conn, authorizer), fields(caller = %caller.user_id))]
pub async fn list_attendees(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    target: AttendanceTarget,
) -> ServiceResult<Vec<EventAttendee>> {
    authorize_on_target(
        conn,
        authorizer,
        caller,
        target,
        None,
        Action::ViewAttendees,
    )
    .await?;

    Ok(target
        .attendees_query()
        .select(EventAttendee::as_select())
        .load(conn)
        .await?)
}
