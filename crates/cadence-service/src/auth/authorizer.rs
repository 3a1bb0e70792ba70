use std::sync::Arc;

use casbin::CoreApi;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use cadence_db::db::connection::DbConnection;
use cadence_db::db::enums::{MembershipRole, UserRole};
use cadence_db::db::query::{organization, user};
use cadence_db::model::organization::Membership;
use cadence_db::model::user::User;

use super::{Action, Caller, Subject};
use crate::error::{ServiceError, ServiceResult};

/// Decides whether a caller may perform an action within one organization.
#[derive(Clone)]
pub struct Authorizer {
    enforcer: Arc<casbin::Enforcer>,
}

impl Authorizer {
    /// Create a new authorizer with the given Casbin enforcer.
    #[must_use]
    pub fn new(enforcer: Arc<casbin::Enforcer>) -> Self {
        Self { enforcer }
    }

    /// ## Summary
    /// Resolves the roles a caller holds for an organization and, optionally,
    /// a target user.
    ///
    /// An unknown caller holds no roles.
    ///
    /// ## Errors
    /// Returns an error if the role lookups fail.
    #[tracing::instrument(skip(conn), fields(caller = %caller.user_id))]
    pub async fn subjects_for(
        conn: &mut DbConnection<'_>,
        caller: Caller,
        organization_id: Uuid,
        acting_for: Option<Uuid>,
    ) -> ServiceResult<Vec<Subject>> {
        let Some(caller_user) = user::by_id(caller.user_id)
            .select(User::as_select())
            .first(conn)
            .await
            .optional()?
        else {
            tracing::debug!("Caller does not exist, no roles granted");
            return Ok(Vec::new());
        };

        let mut subjects = Vec::new();
        if caller_user.role == UserRole::Administrator {
            subjects.push(Subject::SystemAdministrator);
        }

        let membership = organization::membership(organization_id, caller.user_id)
            .select(Membership::as_select())
            .first(conn)
            .await
            .optional()?;
        match membership.map(|m| m.role) {
            Some(MembershipRole::Administrator) => {
                subjects.push(Subject::OrganizationAdministrator);
            }
            Some(MembershipRole::Regular) => subjects.push(Subject::OrganizationMember),
            None => {}
        }

        if acting_for == Some(caller.user_id) {
            subjects.push(Subject::SelfAttendee);
        }

        tracing::trace!(?subjects, "Resolved caller subjects");
        Ok(subjects)
    }

    /// ## Summary
    /// Returns whether any of the subjects is granted the action.
    ///
    /// ## Errors
    /// Returns `CasbinError` if Casbin evaluation fails.
    pub fn check(&self, subjects: &[Subject], action: Action) -> ServiceResult<bool> {
        for subject in subjects {
            let allowed = self
                .enforcer
                .enforce((subject.casbin_subject(), action.as_casbin_action()))
                .map_err(ServiceError::CasbinError)?;

            tracing::trace!(subject = subject.casbin_subject(), %action, allowed, "Subject check result");

            if allowed {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// ## Summary
    /// Resolves the caller's roles and requires that one of them grants `action`.
    ///
    /// `argument_path` names the input whose associated resource the caller
    /// lacks rights on; pass an empty slice when the denial is not tied to an input.
    ///
    /// ## Errors
    /// - Returns `Unauthorized` if no role grants the action.
    /// - Returns `CasbinError` or a database error if evaluation fails.
    #[tracing::instrument(skip(self, conn), fields(caller = %caller.user_id, %action))]
    pub async fn require(
        &self,
        conn: &mut DbConnection<'_>,
        caller: Caller,
        organization_id: Uuid,
        acting_for: Option<Uuid>,
        action: Action,
        argument_path: &[&str],
    ) -> ServiceResult<()> {
        let subjects = Self::subjects_for(conn, caller, organization_id, acting_for).await?;
        self.decide(&subjects, action, argument_path)
    }

    /// ## Summary
    /// Like [`Self::require`] for changes to a recurring template, where the
    /// template's creator holds rights of their own.
    ///
    /// ## Errors
    /// Same as [`Self::require`].
    #[tracing::instrument(skip(self, conn), fields(caller = %caller.user_id, %action))]
    pub async fn require_on_series(
        &self,
        conn: &mut DbConnection<'_>,
        caller: Caller,
        organization_id: Uuid,
        creator_id: Option<Uuid>,
        action: Action,
        argument_path: &[&str],
    ) -> ServiceResult<()> {
        let mut subjects = Self::subjects_for(conn, caller, organization_id, None).await?;
        if creator_id == Some(caller.user_id) {
            subjects.push(Subject::SeriesCreator);
        }
        self.decide(&subjects, action, argument_path)
    }

    fn decide(
        &self,
        subjects: &[Subject],
        action: Action,
        argument_path: &[&str],
    ) -> ServiceResult<()> {
        if self.check(subjects, action)? {
            tracing::debug!("Authorization granted");
            return Ok(());
        }

        tracing::debug!("Authorization denied for all subjects");
        Err(ServiceError::unauthorized(
            argument_path,
            format!("caller is not permitted to {action} in this organization"),
        ))
    }
}
