#![allow(clippy::expect_used, clippy::unwrap_used, clippy::too_many_lines)]
//! Attendance state machine tests against standalone events and
//! materialized instances.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use cadence_test::db::db::query::event;
use cadence_test::db::db::schema::event_attendee;
use cadence_test::db::model::event::NewEvent;
use cadence_test::service::attendance::{
    AttendanceTarget, check_in, check_out, has_submitted_feedback, invite_attendee,
    list_attendees, register_for_event, remove_attendee, resolve_attendee, submit_feedback,
};
use cadence_test::service::error::ServiceError;
use cadence_test::service::series::{InstanceUpdate, cancel_single_instance, update_single_instance};

use super::helpers::*;
use super::series::{create_daily_series, small_policy};

async fn attendee_rows(db: &TestDb) -> i64 {
    let mut conn = db.conn().await;
    event_attendee::table
        .count()
        .get_result(&mut conn)
        .await
        .expect("Count should succeed")
}

fn conflict_message<T: std::fmt::Debug>(result: Result<T, ServiceError>) -> String {
    match result {
        Err(ServiceError::StateConflict { message, .. }) => message,
        other => panic!("Expected StateConflict, got {other:?}"),
    }
}

/// ## Summary
/// Invite, check in and check out; a second check-out is rejected and the
/// recorded checkout time does not move.
#[test_log::test(tokio::test)]
async fn invited_attendee_checks_in_and_out_once() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;
    let standalone = seed_event(&mut conn, org.organization_id, false).await;
    let target = AttendanceTarget::Event(standalone.id);
    let user = org.member.user_id;

    let invited = invite_attendee(&mut conn, &authorizer, org.admin, target, user)
        .await
        .expect("Invite should succeed");
    assert!(invited.is_invited);
    assert!(!invited.is_registered);
    assert_eq!(invited.event_id, Some(standalone.id));
    assert_eq!(invited.recurring_event_instance_id, None);

    let checked_in = check_in(&mut conn, &authorizer, org.admin, target, user)
        .await
        .expect("Check-in should succeed");
    assert!(checked_in.is_checked_in);
    assert!(checked_in.checkin_time.is_some());

    let feedback = has_submitted_feedback(&mut conn, target, user)
        .await
        .expect("Feedback status should resolve");
    assert!(!feedback);

    let checked_out = check_out(&mut conn, &authorizer, org.admin, target, user)
        .await
        .expect("Check-out should succeed");
    assert!(checked_out.is_checked_out);
    let checkout_time = checked_out.checkout_time.expect("Checkout time is stamped");
    assert!(checkout_time >= checked_in.checkin_time.unwrap());

    let again = check_out(&mut conn, &authorizer, org.admin, target, user).await;
    assert_eq!(
        conflict_message(again),
        "User is already checked out from this event"
    );

    let stored = resolve_attendee(&mut conn, target, user)
        .await
        .expect("Record still exists");
    assert_eq!(stored.checkout_time, Some(checkout_time));
    assert_eq!(stored.id, invited.id);

    let submitted = submit_feedback(&mut conn, &authorizer, org.member, target, user)
        .await
        .expect("Attendee submits their own feedback");
    assert!(submitted.feedback_submitted);
    assert!(
        has_submitted_feedback(&mut conn, target, user)
            .await
            .expect("Feedback status should resolve")
    );

    let twice = submit_feedback(&mut conn, &authorizer, org.member, target, user).await;
    assert!(matches!(twice, Err(ServiceError::StateConflict { .. })));
}

/// ## Summary
/// Exactly one of `eventId` and `recurringEventInstanceId` names the target.
#[test_log::test(tokio::test)]
async fn target_requires_exactly_one_id() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let standalone = seed_event(&mut conn, org.organization_id, false).await;
    let instance_id = uuid::Uuid::now_v7();

    for (event_id, instance) in [(Some(standalone.id), Some(instance_id)), (None, None)] {
        let Err(err) = AttendanceTarget::from_ids(event_id, instance) else {
            panic!("Ambiguous target must be rejected");
        };
        assert!(matches!(err, ServiceError::InvalidArguments { .. }));
        assert_eq!(err.issues().len(), 2);
    }

    assert_eq!(attendee_rows(&db).await, 0);
}

/// ## Summary
/// Check-out and feedback require a prior check-in.
#[test_log::test(tokio::test)]
async fn check_out_and_feedback_require_check_in() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;
    let standalone = seed_event(&mut conn, org.organization_id, false).await;
    let target = AttendanceTarget::Event(standalone.id);
    let user = org.member.user_id;

    invite_attendee(&mut conn, &authorizer, org.admin, target, user)
        .await
        .expect("Invite should succeed");

    let early = check_out(&mut conn, &authorizer, org.admin, target, user).await;
    assert_eq!(conflict_message(early), "User is not checked in to this event");

    let stored = resolve_attendee(&mut conn, target, user)
        .await
        .expect("Record exists");
    assert!(!stored.is_checked_out);
    assert_eq!(stored.checkout_time, None);

    let status = has_submitted_feedback(&mut conn, target, user).await;
    assert!(matches!(status, Err(ServiceError::NotFound { .. })));

    let feedback = submit_feedback(&mut conn, &authorizer, org.member, target, user).await;
    assert!(matches!(feedback, Err(ServiceError::StateConflict { .. })));
}

/// ## Summary
/// Check-in needs an existing attendee record.
#[test_log::test(tokio::test)]
async fn check_in_without_record_is_not_found() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;
    let standalone = seed_event(&mut conn, org.organization_id, false).await;
    let target = AttendanceTarget::Event(standalone.id);

    let result = check_in(&mut conn, &authorizer, org.admin, target, org.member.user_id).await;
    assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    assert_eq!(attendee_rows(&db).await, 0);
}

/// ## Summary
/// Inviting twice is a conflict, and only administrators may invite.
#[test_log::test(tokio::test)]
async fn invitations_are_unique_and_admin_only() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;
    let standalone = seed_event(&mut conn, org.organization_id, false).await;
    let target = AttendanceTarget::Event(standalone.id);

    invite_attendee(&mut conn, &authorizer, org.admin, target, org.outsider.user_id)
        .await
        .expect("Invite should succeed");

    let again = invite_attendee(&mut conn, &authorizer, org.admin, target, org.outsider.user_id).await;
    assert_eq!(conflict_message(again), "User is already invited to this event");

    let by_member =
        invite_attendee(&mut conn, &authorizer, org.member, target, org.outsider.user_id).await;
    assert!(matches!(by_member, Err(ServiceError::Unauthorized { .. })));

    let unknown_user =
        invite_attendee(&mut conn, &authorizer, org.admin, target, uuid::Uuid::now_v7()).await;
    assert!(matches!(unknown_user, Err(ServiceError::NotFound { .. })));

    let unknown_event = invite_attendee(
        &mut conn,
        &authorizer,
        org.admin,
        AttendanceTarget::Event(uuid::Uuid::now_v7()),
        org.member.user_id,
    )
    .await;
    assert!(matches!(unknown_event, Err(ServiceError::NotFound { .. })));

    assert_eq!(attendee_rows(&db).await, 1);
}

/// ## Summary
/// Users register themselves on open events; invite-only events need an
/// invitation first, which registration then upgrades in place.
#[test_log::test(tokio::test)]
async fn registration_follows_event_access_rules() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;

    let open = AttendanceTarget::Event(seed_event(&mut conn, org.organization_id, false).await.id);
    let registered = register_for_event(
        &mut conn,
        &authorizer,
        org.outsider,
        open,
        org.outsider.user_id,
    )
    .await
    .expect("Self-registration on an open event should succeed");
    assert!(registered.is_registered);
    assert!(!registered.is_invited);

    let twice = register_for_event(
        &mut conn,
        &authorizer,
        org.outsider,
        open,
        org.outsider.user_id,
    )
    .await;
    assert_eq!(
        conflict_message(twice),
        "User is already registered for this event"
    );

    let on_behalf =
        register_for_event(&mut conn, &authorizer, org.member, open, org.admin.user_id).await;
    assert!(matches!(on_behalf, Err(ServiceError::Unauthorized { .. })));

    let private =
        AttendanceTarget::Event(seed_event(&mut conn, org.organization_id, true).await.id);
    let uninvited =
        register_for_event(&mut conn, &authorizer, org.member, private, org.member.user_id).await;
    assert!(matches!(uninvited, Err(ServiceError::StateConflict { .. })));

    invite_attendee(&mut conn, &authorizer, org.admin, private, org.member.user_id)
        .await
        .expect("Invite should succeed");
    let upgraded =
        register_for_event(&mut conn, &authorizer, org.member, private, org.member.user_id)
            .await
            .expect("Invited user may register");
    assert!(upgraded.is_invited);
    assert!(upgraded.is_registered);

    let by_admin = register_for_event(
        &mut conn,
        &authorizer,
        org.admin,
        private,
        org.outsider.user_id,
    )
    .await
    .expect("Administrators register others without an invitation");
    assert!(by_admin.is_registered);

    let closed = event::insert(
        &mut conn,
        &NewEvent::new(
            org.organization_id,
            "Board meeting",
            at(2024, 7, 1, 9),
            at(2024, 7, 1, 10),
        ),
    )
    .await
    .expect("Failed to insert event");
    let not_open = register_for_event(
        &mut conn,
        &authorizer,
        org.member,
        AttendanceTarget::Event(closed.id),
        org.member.user_id,
    )
    .await;
    assert_eq!(
        conflict_message(not_open),
        "Event is not open for registration"
    );
}

/// ## Summary
/// Instances are attended individually; the template itself is not, and a
/// cancelled instance accepts no new attendees.
#[test_log::test(tokio::test)]
async fn instances_carry_their_own_attendance() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;
    let series = create_daily_series(&db, &small_policy(), org.admin, org.organization_id).await;

    let instances: Vec<_> = cadence_test::db::db::query::recurring_instance::by_base_event(
        series.template.id,
    )
    .select(cadence_test::db::model::recurrence::RecurringEventInstance::as_select())
    .load(&mut conn)
    .await
    .expect("Failed to load instances");
    let first = AttendanceTarget::Instance(instances[0].id);
    let second = AttendanceTarget::Instance(instances[1].id);

    let invited = invite_attendee(&mut conn, &authorizer, org.admin, first, org.member.user_id)
        .await
        .expect("Invite should succeed");
    assert_eq!(invited.recurring_event_instance_id, Some(instances[0].id));
    assert_eq!(invited.event_id, None);

    let elsewhere = resolve_attendee(&mut conn, second, org.member.user_id).await;
    assert!(matches!(elsewhere, Err(ServiceError::NotFound { .. })));

    let listed = list_attendees(&mut conn, &authorizer, org.member, first)
        .await
        .expect("Members may view attendees");
    assert_eq!(listed.len(), 1);
    let hidden = list_attendees(&mut conn, &authorizer, org.outsider, first).await;
    assert!(matches!(hidden, Err(ServiceError::Unauthorized { .. })));

    let on_template = invite_attendee(
        &mut conn,
        &authorizer,
        org.admin,
        AttendanceTarget::Event(series.template.id),
        org.member.user_id,
    )
    .await;
    assert!(matches!(on_template, Err(ServiceError::StateConflict { .. })));

    cancel_single_instance(&mut conn, &authorizer, org.admin, instances[1].id)
        .await
        .expect("Cancel should succeed");
    let on_cancelled =
        invite_attendee(&mut conn, &authorizer, org.admin, second, org.member.user_id).await;
    assert!(matches!(on_cancelled, Err(ServiceError::StateConflict { .. })));

    let removed = remove_attendee(&mut conn, &authorizer, org.admin, first, org.member.user_id)
        .await
        .expect("Removal should succeed");
    assert_eq!(removed.id, invited.id);
    let gone = resolve_attendee(&mut conn, first, org.member.user_id).await;
    assert!(matches!(gone, Err(ServiceError::NotFound { .. })));

    assert_eq!(attendee_rows(&db).await, 0);
}

/// ## Summary
/// Registration on an instance follows its overrides, not just the template.
#[test_log::test(tokio::test)]
async fn instance_overrides_govern_registration() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;
    let series = create_daily_series(&db, &small_policy(), org.admin, org.organization_id).await;

    let instances: Vec<_> = cadence_test::db::db::query::recurring_instance::by_base_event(
        series.template.id,
    )
    .select(cadence_test::db::model::recurrence::RecurringEventInstance::as_select())
    .load(&mut conn)
    .await
    .expect("Failed to load instances");

    update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        instances[0].id,
        InstanceUpdate {
            is_registerable: Some(false),
            ..InstanceUpdate::default()
        },
    )
    .await
    .expect("Override should succeed");

    let closed = register_for_event(
        &mut conn,
        &authorizer,
        org.member,
        AttendanceTarget::Instance(instances[0].id),
        org.member.user_id,
    )
    .await;
    assert_eq!(
        conflict_message(closed),
        "Event is not open for registration"
    );

    let open = register_for_event(
        &mut conn,
        &authorizer,
        org.member,
        AttendanceTarget::Instance(instances[1].id),
        org.member.user_id,
    )
    .await
    .expect("Other instances keep the template's registration");
    assert!(open.is_registered);
}
