#![allow(clippy::expect_used, clippy::unwrap_used, clippy::too_many_lines)]
//! Series lifecycle tests: creation, horizon extension, reads, per-instance
//! and series-wide edits, and whole-series deletion.

use chrono::TimeDelta;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use cadence_test::config::MaterializationConfig;
use cadence_test::db::db::query::{event, recurrence_rule, recurring_instance};
use cadence_test::db::db::schema::{self, recurring_event_instance};
use cadence_test::db::model::event::Event;
use cadence_test::db::model::recurrence::{RecurrenceRule, RecurringEventInstance};
use cadence_test::service::auth::Caller;
use cadence_test::service::error::ServiceError;
use cadence_test::service::series::{
    CreatedSeries, ExtensionOutcome, InstanceUpdate, RecurrenceFields, SeriesUpdate,
    TemplateFields, cancel_single_instance, create_recurring_template, delete_entire_series,
    extend_horizon, extend_series, extend_until, get_instance, list_instances,
    update_entire_series, update_single_instance,
};
use cadence_test::types::Frequency;

use super::helpers::*;

pub(crate) fn meetup_template(organization_id: Uuid) -> TemplateFields {
    TemplateFields {
        organization_id,
        name: "Morning run".to_string(),
        description: Some("Bring water".to_string()),
        location: None,
        start_at: at(2024, 1, 15, 10),
        end_at: at(2024, 1, 15, 11),
        all_day: false,
        is_public: true,
        is_registerable: true,
        is_invite_only: false,
    }
}

pub(crate) fn daily_from_2030(organization_id: Uuid) -> (TemplateFields, RecurrenceFields) {
    let template = TemplateFields {
        start_at: at(2030, 1, 1, 10),
        end_at: at(2030, 1, 1, 11),
        ..meetup_template(organization_id)
    };
    let recurrence = RecurrenceFields {
        frequency: Frequency::Daily,
        interval: 1,
        start_date: None,
        end_date: at(2030, 12, 31, 23),
    };
    (template, recurrence)
}

/// Ten instances per pass, so extension behavior is visible on short series.
pub(crate) fn small_policy() -> MaterializationConfig {
    MaterializationConfig {
        initial_instance_count: 10,
        ..MaterializationConfig::default()
    }
}

pub(crate) async fn create_daily_series(
    db: &TestDb,
    policy: &MaterializationConfig,
    caller: Caller,
    organization_id: Uuid,
) -> CreatedSeries {
    let mut conn = db.conn().await;
    let authorizer = authorizer().await;
    let (template, recurrence) = daily_from_2030(organization_id);
    create_recurring_template(&mut conn, &authorizer, policy, caller, template, recurrence)
        .await
        .expect("Failed to create daily series")
}

async fn instances_of(db: &TestDb, template_id: Uuid) -> Vec<RecurringEventInstance> {
    let mut conn = db.conn().await;
    recurring_instance::by_base_event(template_id)
        .select(RecurringEventInstance::as_select())
        .load(&mut conn)
        .await
        .expect("Failed to load instances")
}

async fn rule_of(db: &TestDb, template_id: Uuid) -> Option<RecurrenceRule> {
    let mut conn = db.conn().await;
    recurrence_rule::by_base_event(template_id)
        .select(RecurrenceRule::as_select())
        .first(&mut conn)
        .await
        .optional()
        .expect("Failed to load rule")
}

/// ## Summary
/// A monthly series from Jan 15 to Mar 15 materializes three instances on the
/// 15th, and deleting it removes template, rule and instances together.
#[test_log::test(tokio::test)]
async fn monthly_series_is_created_and_deleted_as_a_unit() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;

    let created = create_recurring_template(
        &mut conn,
        &authorizer,
        &policy(),
        org.admin,
        meetup_template(org.organization_id),
        RecurrenceFields {
            frequency: Frequency::Monthly,
            interval: 1,
            start_date: Some(at(2024, 1, 15, 0)),
            end_date: at(2024, 3, 15, 23),
        },
    )
    .await
    .expect("Series creation should succeed");

    assert!(created.template.is_recurring_event_template);
    assert_eq!(created.instances_created, 3);
    assert_eq!(created.rule.total_count, 3);
    assert_eq!(created.rule.latest_instance_date, at(2024, 3, 15, 10));
    assert_eq!(created.rule.original_series_id, Some(created.rule.id));
    assert!(
        created
            .rule
            .recurrence_rule_string
            .contains("RRULE:FREQ=MONTHLY;INTERVAL=1")
    );

    let instances = instances_of(&db, created.template.id).await;
    let starts: Vec<_> = instances.iter().map(|i| i.actual_start_time).collect();
    assert_eq!(
        starts,
        vec![at(2024, 1, 15, 10), at(2024, 2, 15, 10), at(2024, 3, 15, 10)]
    );
    for (instance, expected_seq) in instances.iter().zip(1..) {
        assert_eq!(instance.sequence_number, expected_seq);
        assert_eq!(instance.total_count, 3);
        assert_eq!(instance.original_instance_start_time, instance.actual_start_time);
        assert_eq!(
            instance.actual_end_time - instance.actual_start_time,
            TimeDelta::hours(1)
        );
        assert_eq!(instance.original_series_id, created.rule.id);
        assert!(!instance.is_cancelled);
    }

    let deleted = delete_entire_series(&mut conn, &authorizer, org.admin, created.template.id)
        .await
        .expect("Deletion should succeed");
    assert_eq!(deleted.id, created.template.id);
    assert_eq!(deleted.name, "Morning run");
    assert_eq!(deleted.instances_deleted, 3);
    assert!(deleted.attachments.is_empty());

    assert!(instances_of(&db, created.template.id).await.is_empty());
    assert!(rule_of(&db, created.template.id).await.is_none());
    let template = event::by_id(created.template.id)
        .select(Event::as_select())
        .first(&mut conn)
        .await
        .optional()
        .expect("Query should succeed");
    assert!(template.is_none());

    let again = delete_entire_series(&mut conn, &authorizer, org.admin, created.template.id).await;
    assert!(matches!(again, Err(ServiceError::NotFound { .. })));
}

/// ## Summary
/// Extension resumes strictly after the horizon, keeps sequence numbers
/// contiguous, and a pass with nothing left to reach writes nothing.
#[test_log::test(tokio::test)]
async fn repeated_extension_is_idempotent() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let policy = small_policy();

    let created = create_daily_series(&db, &policy, org.admin, org.organization_id).await;
    assert_eq!(created.instances_created, 10);
    assert_eq!(created.rule.total_count, 365);
    assert_eq!(created.rule.latest_instance_date, at(2030, 1, 10, 10));

    let outcome = extend_horizon(&mut conn, &policy, created.template.id, None)
        .await
        .expect("Extension should succeed");
    assert_eq!(
        outcome,
        ExtensionOutcome::Advanced {
            inserted: 10,
            latest_instance_date: at(2030, 1, 20, 10),
        }
    );

    let settled = extend_horizon(
        &mut conn,
        &policy,
        created.template.id,
        Some(at(2030, 1, 20, 10)),
    )
    .await
    .expect("Extension should succeed");
    assert_eq!(settled, ExtensionOutcome::UpToDate);

    let inserted = extend_until(&mut conn, &policy, created.template.id, at(2030, 1, 5, 0))
        .await
        .expect("Extension should succeed");
    assert_eq!(inserted, 0);

    let instances = instances_of(&db, created.template.id).await;
    let sequence: Vec<i32> = instances.iter().map(|i| i.sequence_number).collect();
    assert_eq!(sequence, (1..=20).collect::<Vec<_>>());

    let rule = rule_of(&db, created.template.id).await.expect("Rule exists");
    assert_eq!(rule.latest_instance_date, at(2030, 1, 20, 10));
    assert_eq!(rule.version, created.rule.version + 1);
}

/// ## Summary
/// Extending until a target runs as many passes as needed to reach it.
#[test_log::test(tokio::test)]
async fn extend_series_until_target_runs_several_passes() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let policy = small_policy();
    let authorizer = authorizer().await;

    let created = create_daily_series(&db, &policy, org.admin, org.organization_id).await;

    let outcome = extend_series(
        &mut conn,
        &authorizer,
        &policy,
        org.admin,
        created.template.id,
        Some(at(2030, 2, 15, 10)),
    )
    .await
    .expect("Extension should succeed");
    assert_eq!(
        outcome,
        ExtensionOutcome::Advanced {
            inserted: 36,
            latest_instance_date: at(2030, 2, 15, 10),
        }
    );
    assert_eq!(instances_of(&db, created.template.id).await.len(), 46);

    let denied = extend_series(
        &mut conn,
        &authorizer,
        &policy,
        org.member,
        created.template.id,
        None,
    )
    .await;
    assert!(matches!(denied, Err(ServiceError::Unauthorized { .. })));
}

/// ## Summary
/// Reading a range past the horizon materializes the missing instances first.
#[test_log::test(tokio::test)]
async fn listing_beyond_the_horizon_extends_it() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let policy = small_policy();

    let created = create_daily_series(&db, &policy, org.admin, org.organization_id).await;

    let listed = list_instances(
        &mut conn,
        &policy,
        created.template.id,
        at(2030, 2, 1, 0),
        at(2030, 2, 8, 0),
        false,
    )
    .await
    .expect("Listing should succeed");

    let starts: Vec<_> = listed.iter().map(|i| i.actual_start_time).collect();
    assert_eq!(starts.len(), 7);
    assert_eq!(starts.as_slice().first(), Some(&at(2030, 2, 1, 10)));
    assert_eq!(starts.as_slice().last(), Some(&at(2030, 2, 7, 10)));

    // Range end plus the 30-day threshold is 2030-03-10 00:00; the last
    // occurrence at or before it is the 10:00 slot of the day before.
    let rule = rule_of(&db, created.template.id).await.expect("Rule exists");
    assert_eq!(rule.latest_instance_date, at(2030, 3, 9, 10));

    let all = instances_of(&db, created.template.id).await;
    for (instance, expected_seq) in all.iter().zip(1..) {
        assert_eq!(instance.sequence_number, expected_seq);
    }

    let inverted = list_instances(
        &mut conn,
        &policy,
        created.template.id,
        at(2030, 2, 8, 0),
        at(2030, 2, 1, 0),
        false,
    )
    .await;
    assert!(matches!(
        inverted,
        Err(ServiceError::InvalidArguments { .. })
    ));
}

/// ## Summary
/// Rescheduling moves the actual window, keeps the identity key, and later
/// extension does not bring the original slot back.
#[test_log::test(tokio::test)]
async fn rescheduled_instance_keeps_its_identity() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let policy = small_policy();
    let authorizer = authorizer().await;

    let created = create_daily_series(&db, &policy, org.admin, org.organization_id).await;
    let third = instances_of(&db, created.template.id)
        .await
        .into_iter()
        .find(|i| i.sequence_number == 3)
        .expect("Third instance exists");

    let moved = update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        third.id,
        InstanceUpdate {
            start_at: Some(at(2030, 1, 3, 14)),
            ..InstanceUpdate::default()
        },
    )
    .await
    .expect("Reschedule should succeed")
    .instance;
    assert_eq!(moved.id, third.id);
    assert_eq!(moved.original_instance_start_time, at(2030, 1, 3, 10));
    assert_eq!(moved.actual_start_time, at(2030, 1, 3, 14));
    assert_eq!(moved.actual_end_time, at(2030, 1, 3, 15));

    extend_until(&mut conn, &policy, created.template.id, at(2030, 1, 25, 10))
        .await
        .expect("Extension should succeed");

    let on_the_third = list_instances(
        &mut conn,
        &policy,
        created.template.id,
        at(2030, 1, 3, 0),
        at(2030, 1, 4, 0),
        true,
    )
    .await
    .expect("Listing should succeed");
    assert_eq!(on_the_third.len(), 1);
    assert_eq!(on_the_third[0].id, third.id);

    let resolved = get_instance(&mut conn, third.id)
        .await
        .expect("Instance resolves");
    assert_eq!(resolved.template.id, created.template.id);

    let empty = update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        third.id,
        InstanceUpdate::default(),
    )
    .await;
    assert!(matches!(empty, Err(ServiceError::InvalidArguments { .. })));

    let inverted = update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        third.id,
        InstanceUpdate {
            end_at: Some(at(2030, 1, 3, 13)),
            ..InstanceUpdate::default()
        },
    )
    .await;
    assert!(matches!(
        inverted,
        Err(ServiceError::InvalidArguments { .. })
    ));

    let by_member = update_single_instance(
        &mut conn,
        &authorizer,
        org.member,
        third.id,
        InstanceUpdate {
            start_at: Some(at(2030, 1, 3, 16)),
            ..InstanceUpdate::default()
        },
    )
    .await;
    assert!(matches!(by_member, Err(ServiceError::Unauthorized { .. })));
}

/// ## Summary
/// Cancelled instances drop out of default listings, cannot be cancelled or
/// edited again, and stay visible when explicitly requested.
#[test_log::test(tokio::test)]
async fn cancelled_instance_is_hidden_and_frozen() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let policy = small_policy();
    let authorizer = authorizer().await;

    let created = create_daily_series(&db, &policy, org.admin, org.organization_id).await;
    let second = instances_of(&db, created.template.id).await[1].clone();

    let cancelled = cancel_single_instance(&mut conn, &authorizer, org.admin, second.id)
        .await
        .expect("Cancel should succeed");
    assert!(cancelled.is_cancelled);

    let twice = cancel_single_instance(&mut conn, &authorizer, org.admin, second.id).await;
    assert!(matches!(twice, Err(ServiceError::StateConflict { .. })));

    let edit = update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        second.id,
        InstanceUpdate {
            start_at: Some(at(2030, 1, 2, 12)),
            ..InstanceUpdate::default()
        },
    )
    .await;
    assert!(matches!(edit, Err(ServiceError::StateConflict { .. })));

    let range = (at(2030, 1, 1, 0), at(2030, 1, 4, 0));
    let visible = list_instances(&mut conn, &policy, created.template.id, range.0, range.1, false)
        .await
        .expect("Listing should succeed");
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|i| i.id != second.id));

    let everything = list_instances(&mut conn, &policy, created.template.id, range.0, range.1, true)
        .await
        .expect("Listing should succeed");
    assert_eq!(everything.len(), 3);
}

/// ## Summary
/// Only organization administrators (or system administrators) create series.
#[test_log::test(tokio::test)]
async fn only_administrators_create_series() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;

    for caller in [org.member, org.outsider] {
        let (template, recurrence) = daily_from_2030(org.organization_id);
        let result = create_recurring_template(
            &mut conn,
            &authorizer,
            &policy(),
            caller,
            template,
            recurrence,
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Unauthorized { .. })));
    }

    let (template, recurrence) = daily_from_2030(org.organization_id);
    let by_root = create_recurring_template(
        &mut conn,
        &authorizer,
        &policy(),
        org.system_admin,
        template,
        recurrence,
    )
    .await;
    assert!(by_root.is_ok());

    let (template, recurrence) = daily_from_2030(Uuid::now_v7());
    let unknown_org = create_recurring_template(
        &mut conn,
        &authorizer,
        &policy(),
        org.admin,
        template,
        recurrence,
    )
    .await;
    assert!(matches!(unknown_org, Err(ServiceError::NotFound { .. })));
}

/// ## Summary
/// A zero interval is rejected before anything is written.
#[test_log::test(tokio::test)]
async fn zero_interval_writes_nothing() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;

    let (template, recurrence) = daily_from_2030(org.organization_id);
    let result = create_recurring_template(
        &mut conn,
        &authorizer,
        &policy(),
        org.admin,
        template,
        RecurrenceFields {
            interval: 0,
            ..recurrence
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::InvalidArguments { .. })));

    let events: i64 = schema::event::table
        .count()
        .get_result(&mut conn)
        .await
        .expect("Count should succeed");
    assert_eq!(events, 0);
}

/// ## Summary
/// Standalone events are not series: deleting or extending one is `NotFound`.
#[test_log::test(tokio::test)]
async fn standalone_event_is_not_a_series() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;
    let standalone = seed_event(&mut conn, org.organization_id, false).await;

    let delete = delete_entire_series(&mut conn, &authorizer, org.admin, standalone.id).await;
    let Err(ServiceError::NotFound { message, .. }) = delete else {
        panic!("Expected NotFound, got {delete:?}");
    };
    assert!(message.contains("Use deleteEvent for standalone events"));

    let extend = extend_horizon(&mut conn, &policy(), standalone.id, None).await;
    assert!(matches!(extend, Err(ServiceError::NotFound { .. })));
}

/// ## Summary
/// A rule that lost its series identity is reported as invalid input and
/// nothing is materialized for it.
#[test_log::test(tokio::test)]
async fn rule_without_series_id_is_rejected() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let policy = small_policy();

    let created = create_daily_series(&db, &policy, org.admin, org.organization_id).await;
    diesel::update(schema::recurrence_rule::table.find(created.rule.id))
        .set(schema::recurrence_rule::original_series_id.eq(None::<Uuid>))
        .execute(&mut conn)
        .await
        .expect("Update should succeed");

    let result = extend_horizon(&mut conn, &policy, created.template.id, None).await;
    let Err(err @ ServiceError::InvalidArguments { .. }) = result else {
        panic!("Expected InvalidArguments, got {result:?}");
    };
    assert_eq!(err.code(), "invalid_arguments");

    let count: i64 = recurring_event_instance::table
        .filter(recurring_event_instance::base_recurring_event_id.eq(created.template.id))
        .count()
        .get_result(&mut conn)
        .await
        .expect("Count should succeed");
    assert_eq!(count, 10);
}

async fn load_event(db: &TestDb, event_id: Uuid) -> Event {
    let mut conn = db.conn().await;
    event::by_id(event_id)
        .select(Event::as_select())
        .first(&mut conn)
        .await
        .expect("Failed to load event")
}

/// ## Summary
/// Detail overrides apply to one instance only, merge across edits, and
/// cannot leave it both public and invite-only.
#[test_log::test(tokio::test)]
async fn instance_overrides_layer_over_the_template() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;

    let created = create_daily_series(&db, &small_policy(), org.admin, org.organization_id).await;
    let instances = instances_of(&db, created.template.id).await;
    let (first, second) = (instances[0].id, instances[1].id);

    let renamed = update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        first,
        InstanceUpdate {
            name: Some("Morning run (short loop)".to_string()),
            is_registerable: Some(false),
            ..InstanceUpdate::default()
        },
    )
    .await
    .expect("Override should succeed");
    assert!(renamed.has_exceptions);
    assert_eq!(renamed.details.name, "Morning run (short loop)");
    assert!(!renamed.details.is_registerable);
    assert_eq!(renamed.instance.actual_start_time, instances[0].actual_start_time);

    update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        first,
        InstanceUpdate {
            location: Some("North gate".to_string()),
            ..InstanceUpdate::default()
        },
    )
    .await
    .expect("Second override should succeed");

    let merged = get_instance(&mut conn, first).await.expect("Instance resolves");
    assert_eq!(merged.details.name, "Morning run (short loop)");
    assert_eq!(merged.details.location.as_deref(), Some("North gate"));
    assert_eq!(merged.details.description.as_deref(), Some("Bring water"));
    assert_eq!(merged.template.name, "Morning run");

    let untouched = get_instance(&mut conn, second).await.expect("Instance resolves");
    assert!(!untouched.has_exceptions);
    assert_eq!(untouched.details.name, "Morning run");
    assert!(untouched.details.is_registerable);

    let both = update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        second,
        InstanceUpdate {
            is_invite_only: Some(true),
            ..InstanceUpdate::default()
        },
    )
    .await;
    let Err(err @ ServiceError::InvalidArguments { .. }) = both else {
        panic!("Expected InvalidArguments, got {both:?}");
    };
    assert_eq!(err.issues()[0].argument_path, ["input"]);
    let still_plain = get_instance(&mut conn, second).await.expect("Instance resolves");
    assert!(!still_plain.has_exceptions);

    let private = update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        second,
        InstanceUpdate {
            is_public: Some(false),
            is_invite_only: Some(true),
            ..InstanceUpdate::default()
        },
    )
    .await
    .expect("Private invite-only override should succeed");
    assert!(private.details.is_invite_only);
    assert!(!private.details.is_public);
}

/// ## Summary
/// Renaming a series through one instance renames every template sharing
/// its series id, bumps the instances, and keeps per-instance overrides.
#[test_log::test(tokio::test)]
async fn series_update_reaches_every_template_of_the_series() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;
    let policy = small_policy();

    let first = create_daily_series(&db, &policy, org.admin, org.organization_id).await;
    let split = create_daily_series(&db, &policy, org.admin, org.organization_id).await;
    let series_id = first.rule.original_series_id.expect("Series id is set");
    diesel::update(schema::recurrence_rule::table.find(split.rule.id))
        .set(schema::recurrence_rule::original_series_id.eq(Some(series_id)))
        .execute(&mut conn)
        .await
        .expect("Update should succeed");
    diesel::update(
        recurring_event_instance::table
            .filter(recurring_event_instance::base_recurring_event_id.eq(split.template.id)),
    )
    .set(recurring_event_instance::original_series_id.eq(series_id))
    .execute(&mut conn)
    .await
    .expect("Update should succeed");

    let instances = instances_of(&db, first.template.id).await;
    let split_before = instances_of(&db, split.template.id).await;
    update_single_instance(
        &mut conn,
        &authorizer,
        org.admin,
        instances[2].id,
        InstanceUpdate {
            name: Some("Hill repeats".to_string()),
            ..InstanceUpdate::default()
        },
    )
    .await
    .expect("Override should succeed");

    let updated = update_entire_series(
        &mut conn,
        &authorizer,
        org.admin,
        instances[0].id,
        SeriesUpdate {
            name: Some("Evening run".to_string()),
            description: None,
        },
    )
    .await
    .expect("Series update should succeed");
    assert_eq!(updated.details.name, "Evening run");
    assert_eq!(updated.template.name, "Evening run");
    assert_eq!(updated.template.description.as_deref(), Some("Bring water"));

    assert_eq!(load_event(&db, split.template.id).await.name, "Evening run");
    let split_after = instances_of(&db, split.template.id).await;
    assert!(split_after[0].last_updated_at > split_before[0].last_updated_at);

    let overridden = get_instance(&mut conn, instances[2].id)
        .await
        .expect("Instance resolves");
    assert_eq!(overridden.details.name, "Hill repeats");
    assert_eq!(overridden.template.name, "Evening run");

    let empty = update_entire_series(
        &mut conn,
        &authorizer,
        org.admin,
        instances[0].id,
        SeriesUpdate::default(),
    )
    .await;
    assert!(matches!(empty, Err(ServiceError::InvalidArguments { .. })));

    let missing = update_entire_series(
        &mut conn,
        &authorizer,
        org.admin,
        Uuid::new_v4(),
        SeriesUpdate {
            description: Some("Lights required".to_string()),
            ..SeriesUpdate::default()
        },
    )
    .await;
    let Err(err @ ServiceError::NotFound { .. }) = missing else {
        panic!("Expected NotFound, got {missing:?}");
    };
    assert_eq!(err.issues()[0].argument_path, ["input", "id"]);

    cancel_single_instance(&mut conn, &authorizer, org.admin, instances[1].id)
        .await
        .expect("Cancel should succeed");
    let via_cancelled = update_entire_series(
        &mut conn,
        &authorizer,
        org.admin,
        instances[1].id,
        SeriesUpdate {
            description: Some("Lights required".to_string()),
            ..SeriesUpdate::default()
        },
    )
    .await;
    assert!(matches!(via_cancelled, Err(ServiceError::StateConflict { .. })));
}

/// ## Summary
/// The member who created a template may edit its series and instances,
/// other members may not, and deletion stays with administrators.
#[test_log::test(tokio::test)]
async fn series_creator_may_edit_but_not_delete() {
    let db = test_db_or_skip!();
    let mut conn = db.conn().await;
    let org = seed_organization(&mut conn).await;
    let authorizer = authorizer().await;

    let created = create_daily_series(&db, &small_policy(), org.admin, org.organization_id).await;
    let instance_id = instances_of(&db, created.template.id).await[0].id;
    let rename = || SeriesUpdate {
        name: Some("Members' run".to_string()),
        description: None,
    };

    let not_yet = update_entire_series(&mut conn, &authorizer, org.member, instance_id, rename()).await;
    assert!(matches!(not_yet, Err(ServiceError::Unauthorized { .. })));

    diesel::update(schema::event::table.find(created.template.id))
        .set(schema::event::creator_id.eq(Some(org.member.user_id)))
        .execute(&mut conn)
        .await
        .expect("Update should succeed");

    let renamed = update_entire_series(&mut conn, &authorizer, org.member, instance_id, rename())
        .await
        .expect("Creator may update the series");
    assert_eq!(renamed.template.name, "Members' run");

    let moved = update_single_instance(
        &mut conn,
        &authorizer,
        org.member,
        instance_id,
        InstanceUpdate {
            start_at: Some(at(2030, 1, 1, 7)),
            ..InstanceUpdate::default()
        },
    )
    .await
    .expect("Creator may edit an instance");
    assert_eq!(moved.instance.actual_start_time, at(2030, 1, 1, 7));

    let by_outsider =
        update_entire_series(&mut conn, &authorizer, org.outsider, instance_id, rename()).await;
    assert!(matches!(by_outsider, Err(ServiceError::Unauthorized { .. })));

    let delete = delete_entire_series(&mut conn, &authorizer, org.member, created.template.id).await;
    assert!(matches!(delete, Err(ServiceError::Unauthorized { .. })));
}
