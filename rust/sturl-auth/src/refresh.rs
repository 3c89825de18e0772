//! Transparent refresh of a stale discharge.
//!
//! Discharges expire or get revoked long before their root does. The store
//! signals this with a challenge header on an otherwise authorized request;
//! on seeing it, the coordinator asks the SSO for a replacement discharge
//! (the root is not involved), persists the updated credential, and tells
//! the caller to rebind and retry the original request exactly once. A
//! second challenge on the retried request is an error, never a loop.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credential::Credential;
use crate::environment::Endpoints;
use crate::error::AuthorizationError;
use crate::store::CredentialStore;

/// Challenge value the store sends when the discharge must be refreshed.
pub const NEEDS_REFRESH_CHALLENGE: &str = "Macaroon needs_refresh=1";

/// Returns whether a response carries the stale-discharge challenge.
pub fn needs_refresh(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(reqwest::header::WWW_AUTHENTICATE)
        .and_then(|value| value.to_str().ok())
        == Some(NEEDS_REFRESH_CHALLENGE)
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    discharge_macaroon: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    discharge_macaroon: Option<String>,
}

/// Re-discharges stale credentials against one environment's SSO.
pub struct RefreshCoordinator {
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl RefreshCoordinator {
    /// Creates a coordinator for the given environment.
    pub fn new(endpoints: Endpoints) -> Self {
        RefreshCoordinator {
            endpoints,
            client: reqwest::Client::new(),
        }
    }

    /// Refreshes and persists `credential` when `response` carries the
    /// stale-discharge challenge.
    ///
    /// Returns the credential to use going forward and whether a refresh
    /// happened; when it did, the caller must rebind the authorization
    /// header and retry the original request once.
    pub async fn maybe_refresh(
        &self,
        response: &reqwest::Response,
        credential: &Credential,
        name: &str,
        store: &CredentialStore,
    ) -> Result<(Credential, bool), AuthorizationError> {
        if !needs_refresh(response) {
            return Ok((credential.clone(), false));
        }

        let refreshed = self.refresh_discharge(credential).await?;
        store.save(name, &refreshed).await?;
        Ok((refreshed, true))
    }

    /// Obtains a replacement discharge from the SSO.
    ///
    /// Root and environment are carried over unchanged. Any failure is
    /// [`AuthorizationError::RefreshFailed`] and is not retried.
    pub async fn refresh_discharge(
        &self,
        credential: &Credential,
    ) -> Result<Credential, AuthorizationError> {
        let url = format!("{}/api/v2/tokens/refresh", self.endpoints.sso_base_url);
        debug!(%url, "refreshing stale discharge");

        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest {
                discharge_macaroon: &credential.discharge,
            })
            .send()
            .await
            .map_err(|e| AuthorizationError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthorizationError::RefreshFailed(format!(
                "refresh endpoint returned status {status}"
            )));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthorizationError::RefreshFailed(format!("unreadable response: {e}")))?;
        let discharge = body.discharge_macaroon.ok_or_else(|| {
            AuthorizationError::RefreshFailed(
                "refresh response is missing the `discharge_macaroon` field".to_string(),
            )
        })?;

        Ok(credential.with_discharge(discharge))
    }
}
