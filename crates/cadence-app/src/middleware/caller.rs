use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use salvo::Depot;
use salvo::writing::Writer;
use uuid::Uuid;

use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};
use cadence_core::constants::REMOTE_USER_HEADER;
use cadence_db::db::query::user;
use cadence_db::model::user::User;
use cadence_service::auth::Caller;

/// ## Summary
/// Identifies the caller from the `X-Remote-User` header set by the fronting
/// proxy and stores a [`Caller`] in the depot.
///
/// ## Errors
/// Responds 401 when the header is absent, is not a UUID, or names no user.
pub struct CallerMiddleware;

/// ## Summary
/// Parses the raw header value into a user id.
fn parse_remote_user(value: Option<&str>) -> AppResult<Uuid> {
    value
        .map(str::trim)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or(AppError::Unauthenticated)
}

async fn identify(req: &salvo::Request, depot: &Depot) -> AppResult<Caller> {
    let user_id = parse_remote_user(req.header::<String>(REMOTE_USER_HEADER).as_deref())?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;
    let known = user::by_id(user_id)
        .select(User::as_select())
        .first(&mut conn)
        .await
        .optional()
        .map_err(cadence_db::error::DbError::from)?;

    known
        .map(|found| Caller::new(found.id))
        .ok_or(AppError::Unauthenticated)
}

#[salvo::async_trait]
impl salvo::Handler for CallerMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        match identify(req, depot).await {
            Ok(caller) => {
                tracing::debug!(caller = %caller.user_id, "Caller identified");
                depot.inject(caller);
            }
            Err(err) => {
                err.write(req, depot, res).await;
                ctrl.skip_rest();
            }
        }
    }
}

/// ## Summary
/// Retrieves the caller stored by [`CallerMiddleware`].
///
/// ## Errors
/// Returns `Unauthenticated` if no caller was identified for this request.
pub fn get_caller_from_depot(depot: &Depot) -> AppResult<Caller> {
    depot
        .obtain::<Caller>()
        .copied()
        .map_err(|_err| AppError::Unauthenticated)
}
