use crate::{
    db::{enums::RecurrenceFrequency, schema},
    model,
};
use diesel::{pg::Pg, prelude::*};

/// Recurrence rule owned by exactly one template event.
///
/// `latest_instance_date` is the materialization high-water mark and `version`
/// is bumped on every horizon advance so concurrent extenders can detect a
/// lost race.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Queryable,
    Selectable,
    Identifiable,
    Associations,
    serde::Serialize,
)]
#[diesel(table_name = schema::recurrence_rule)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::event::Event, foreign_key = base_recurring_event_id))]
pub struct RecurrenceRule {
    pub id: uuid::Uuid,
    pub base_recurring_event_id: uuid::Uuid,
    pub original_series_id: Option<uuid::Uuid>,
    pub organization_id: uuid::Uuid,
    pub creator_id: Option<uuid::Uuid>,
    pub frequency: RecurrenceFrequency,
    pub recurrence_interval: i32,
    pub recurrence_start_date: chrono::DateTime<chrono::Utc>,
    pub recurrence_end_date: chrono::DateTime<chrono::Utc>,
    pub recurrence_rule_string: String,
    pub latest_instance_date: chrono::DateTime<chrono::Utc>,
    pub total_count: i32,
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::recurrence_rule)]
pub struct NewRecurrenceRule<'a> {
    pub id: uuid::Uuid,
    pub base_recurring_event_id: uuid::Uuid,
    pub original_series_id: Option<uuid::Uuid>,
    pub organization_id: uuid::Uuid,
    pub creator_id: Option<uuid::Uuid>,
    pub frequency: RecurrenceFrequency,
    pub recurrence_interval: i32,
    pub recurrence_start_date: chrono::DateTime<chrono::Utc>,
    pub recurrence_end_date: chrono::DateTime<chrono::Utc>,
    pub recurrence_rule_string: &'a str,
    pub latest_instance_date: chrono::DateTime<chrono::Utc>,
    pub total_count: i32,
}

/// One materialized occurrence of a recurring template.
///
/// `original_instance_start_time` is the identity key produced by the rule and
/// never changes; `actual_*` carry the (possibly rescheduled) schedule.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Queryable,
    Selectable,
    Identifiable,
    Associations,
    serde::Serialize,
)]
#[diesel(table_name = schema::recurring_event_instance)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::event::Event, foreign_key = base_recurring_event_id))]
#[diesel(belongs_to(RecurrenceRule, foreign_key = recurrence_rule_id))]
pub struct RecurringEventInstance {
    pub id: uuid::Uuid,
    pub base_recurring_event_id: uuid::Uuid,
    pub recurrence_rule_id: uuid::Uuid,
    pub original_series_id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub original_instance_start_time: chrono::DateTime<chrono::Utc>,
    pub actual_start_time: chrono::DateTime<chrono::Utc>,
    pub actual_end_time: chrono::DateTime<chrono::Utc>,
    pub is_cancelled: bool,
    pub sequence_number: i32,
    pub total_count: i32,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub last_updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::recurring_event_instance)]
pub struct NewRecurringEventInstance {
    pub id: uuid::Uuid,
    pub base_recurring_event_id: uuid::Uuid,
    pub recurrence_rule_id: uuid::Uuid,
    pub original_series_id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub original_instance_start_time: chrono::DateTime<chrono::Utc>,
    pub actual_start_time: chrono::DateTime<chrono::Utc>,
    pub actual_end_time: chrono::DateTime<chrono::Utc>,
    pub sequence_number: i32,
    pub total_count: i32,
}
