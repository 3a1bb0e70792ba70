use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: Uuid,
}

impl Caller {
    #[must_use]
    pub const fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// A role the caller holds relative to one organization and target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    SystemAdministrator,
    OrganizationAdministrator,
    OrganizationMember,
    /// The caller is acting on their own attendance record.
    SelfAttendee,
    /// The caller created the recurring template being changed.
    SeriesCreator,
}

impl Subject {
    /// Returns the Casbin subject string for this role.
    #[must_use]
    pub const fn casbin_subject(self) -> &'static str {
        match self {
            Self::SystemAdministrator => "role:system_administrator",
            Self::OrganizationAdministrator => "role:organization_administrator",
            Self::OrganizationMember => "role:organization_member",
            Self::SelfAttendee => "role:self",
            Self::SeriesCreator => "role:creator",
        }
    }
}

/// Operations gated by the authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateSeries,
    DeleteSeries,
    ExtendSeries,
    UpdateSeries,
    UpdateInstance,
    CancelInstance,
    InviteAttendee,
    RegisterAttendee,
    RegisterOther,
    CheckIn,
    CheckOut,
    RemoveAttendee,
    ViewAttendees,
    SubmitFeedback,
    CleanupHistory,
}

impl Action {
    /// Returns the Casbin action string for this operation.
    #[must_use]
    pub const fn as_casbin_action(self) -> &'static str {
        match self {
            Self::CreateSeries => "create_series",
            Self::DeleteSeries => "delete_series",
            Self::ExtendSeries => "extend_series",
            Self::UpdateSeries => "update_series",
            Self::UpdateInstance => "update_instance",
            Self::CancelInstance => "cancel_instance",
            Self::InviteAttendee => "invite_attendee",
            Self::RegisterAttendee => "register_attendee",
            Self::RegisterOther => "register_other",
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
            Self::RemoveAttendee => "remove_attendee",
            Self::ViewAttendees => "view_attendees",
            Self::SubmitFeedback => "submit_feedback",
            Self::CleanupHistory => "cleanup_history",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_casbin_action())
    }
}
