use chrono::{DateTime, NaiveTime, Timelike, Utc};

use cadence_core::types::Frequency;
use cadence_core::util::time::truncate_to_seconds;
use cadence_db::model::recurrence::RecurrenceRule;

use crate::error::{ServiceError, ServiceResult};

/// `YYYYMMDDTHHMMSSZ`, the RFC 5545 UTC date-time form.
pub const ICAL_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// A validated, bounded recurrence: the generator's only input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceSpec {
    pub frequency: Frequency,
    pub interval: u16,
    /// First occurrence (DTSTART), at whole-second precision.
    pub start: DateTime<Utc>,
    /// Inclusive upper bound for occurrence starts.
    pub end: DateTime<Utc>,
}

impl RecurrenceSpec {
    /// ## Summary
    /// Validates structured recurrence fields.
    ///
    /// ## Errors
    /// Returns `InvalidArguments` if `interval` is not a positive 16-bit value or
    /// `end` precedes `start`.
    pub fn new(
        frequency: Frequency,
        interval: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Self> {
        let interval = u16::try_from(interval)
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                ServiceError::invalid_arguments(
                    &["input", "recurrence", "interval"],
                    "Recurrence interval must be a positive integer",
                )
            })?;

        let start = truncate_to_seconds(start);
        if end < start {
            return Err(ServiceError::invalid_arguments(
                &["input", "recurrence", "endDate"],
                "Recurrence end date must not be before the recurrence start date",
            ));
        }

        Ok(Self {
            frequency,
            interval,
            start,
            end,
        })
    }

    /// ## Summary
    /// Builds the recurrence for a new template: the series starts on
    /// `recurrence_start`'s date (default: the template's own start) at the
    /// template's time of day.
    ///
    /// ## Errors
    /// Same as [`RecurrenceSpec::new`].
    pub fn for_template(
        frequency: Frequency,
        interval: i32,
        template_start: DateTime<Utc>,
        recurrence_start: Option<DateTime<Utc>>,
        recurrence_end: DateTime<Utc>,
    ) -> ServiceResult<Self> {
        let start = match recurrence_start {
            Some(date) => anchor_time_of_day(date, template_start),
            None => template_start,
        };
        Self::new(frequency, interval, start, recurrence_end)
    }

    /// ## Summary
    /// Rebuilds the recurrence from a stored rule's structured columns.
    ///
    /// The stored rule string is never re-parsed.
    ///
    /// ## Errors
    /// Returns `InvalidArguments` if the stored columns no longer validate.
    pub fn from_rule(rule: &RecurrenceRule) -> ServiceResult<Self> {
        Self::new(
            rule.frequency.into(),
            rule.recurrence_interval,
            rule.recurrence_start_date,
            rule.recurrence_end_date,
        )
    }

    /// `FREQ=..;INTERVAL=..;UNTIL=..` bounded at `until`.
    #[must_use]
    pub fn rrule_body(&self, until: DateTime<Utc>) -> String {
        format!(
            "FREQ={};INTERVAL={};UNTIL={}",
            self.frequency,
            self.interval,
            until.format(ICAL_UTC_FORMAT)
        )
    }

    /// Canonical text form stored alongside the rule for display and audit.
    #[must_use]
    pub fn rule_string(&self) -> String {
        format!(
            "DTSTART:{}\nRRULE:{}",
            self.start.format(ICAL_UTC_FORMAT),
            self.rrule_body(self.end)
        )
    }
}

fn anchor_time_of_day(date: DateTime<Utc>, template_start: DateTime<Utc>) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(
        template_start.hour(),
        template_start.minute(),
        template_start.second(),
    )
    .unwrap_or(NaiveTime::MIN);
    date.date_naive().and_time(time).and_utc()
}
