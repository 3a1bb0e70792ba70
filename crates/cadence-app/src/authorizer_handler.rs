use salvo::async_trait;

use crate::error::AppResult;
use cadence_core::error::CoreError;
use cadence_service::auth::Authorizer;

pub struct AuthorizerHandler {
    pub authorizer: Authorizer,
}

#[async_trait]
impl salvo::Handler for AuthorizerHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.authorizer.clone());
    }
}

/// ## Summary
/// Retrieves the authorizer from the depot.
///
/// ## Errors
/// Returns an error if the authorizer is not found in the depot.
pub fn get_authorizer_from_depot(depot: &salvo::Depot) -> AppResult<Authorizer> {
    depot
        .obtain::<Authorizer>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Authorizer not found in depot").into())
}
