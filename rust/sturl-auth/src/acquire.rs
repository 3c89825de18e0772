//! Acquisition of a fresh root/discharge token pair.
//!
//! The exchange has two legs. First the SCA mints a capability-restricted
//! root token; embedded in it is a third-party caveat addressed to the SSO.
//! Second, the SSO authenticates the user and discharges that caveat,
//! possibly after demanding a second factor. The resulting pair is returned
//! to the caller unbound and unpersisted; storage is the caller's concern.
//!
//! # Example
//!
//! ```ignore
//! use sturl_auth::{Acquirer, CapabilityRequest, Endpoints, TerminalPrompter};
//!
//! let acquirer = Acquirer::new(Endpoints::staging(), TerminalPrompter);
//! let request = CapabilityRequest::new(vec![], vec![]);
//! let (root, discharge) = acquirer.acquire("foo@bar.com", &request).await?;
//! ```

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::CapabilityRequest;
use crate::environment::Endpoints;
use crate::error::AuthorizationError;
use crate::prompt::Prompter;
use crate::token::{self, ThirdPartyCaveat};

/// Error code the SSO returns when a second factor is required.
const TWOFACTOR_REQUIRED: &str = "TWOFACTOR_REQUIRED";

#[derive(Debug, Deserialize)]
struct IssuedRoot {
    macaroon: Option<String>,
}

#[derive(Debug, Serialize)]
struct DischargeRequest<'a> {
    email: &'a str,
    password: &'a str,
    otp: String,
    caveat_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DischargeResponse {
    discharge_macaroon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SsoFailure {
    code: Option<String>,
}

/// Drives the two-leg authorization exchange against one environment.
pub struct Acquirer<P> {
    endpoints: Endpoints,
    prompter: P,
    client: reqwest::Client,
}

impl<P: Prompter> Acquirer<P> {
    /// Creates an acquirer for the given environment.
    pub fn new(endpoints: Endpoints, prompter: P) -> Self {
        Acquirer {
            endpoints,
            prompter,
            client: reqwest::Client::new(),
        }
    }

    /// Acquires a fresh `(root, discharge)` pair for `email`.
    ///
    /// Performs two network round trips, or three when the SSO demands a
    /// second factor. Nothing is persisted.
    pub async fn acquire(
        &self,
        email: &str,
        request: &CapabilityRequest,
    ) -> Result<(String, String), AuthorizationError> {
        let root = self.issue_root(request).await?;
        let caveat = self.select_sso_caveat(&root)?;
        let discharge = self.discharge(email, &caveat).await?;
        Ok((root, discharge))
    }

    /// Asks the SCA for a capability-restricted root token.
    async fn issue_root(&self, request: &CapabilityRequest) -> Result<String, AuthorizationError> {
        let url = format!("{}/dev/api/acl/", self.endpoints.sca_base_url);
        debug!(%url, "requesting root token");

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthorizationError::Protocol(format!(
                "root token request failed with status {status}"
            )));
        }

        let issued: IssuedRoot = response.json().await.map_err(|e| {
            AuthorizationError::Protocol(format!("unreadable root token response: {e}"))
        })?;
        issued.macaroon.ok_or_else(|| {
            AuthorizationError::Protocol(
                "root token response is missing the `macaroon` field".to_string(),
            )
        })
    }

    /// Selects the single third-party caveat addressed to this
    /// environment's SSO.
    ///
    /// Zero matches or more than one match means the root token does not
    /// follow the expected shape; neither case is guessed around.
    fn select_sso_caveat(&self, root: &str) -> Result<ThirdPartyCaveat, AuthorizationError> {
        let token = token::deserialize(root)?;
        let location = &self.endpoints.sso_location;
        let mut matches: Vec<ThirdPartyCaveat> = token::third_party_caveats(&token)
            .into_iter()
            .filter(|caveat| &caveat.location == location)
            .collect();

        match matches.len() {
            1 => Ok(matches.remove(0)),
            count => Err(AuthorizationError::CaveatSelection {
                location: location.clone(),
                count,
            }),
        }
    }

    /// Discharges the caveat at the SSO, resubmitting once with an OTP
    /// when the SSO asks for a second factor.
    async fn discharge(
        &self,
        email: &str,
        caveat: &ThirdPartyCaveat,
    ) -> Result<String, AuthorizationError> {
        let password = self.prompter.secret(&format!("Password for {email}: "))?;
        let url = format!("{}/api/v2/tokens/discharge", self.endpoints.sso_base_url);
        let mut request = DischargeRequest {
            email,
            password: &password,
            otp: String::new(),
            caveat_id: &caveat.caveat_id,
        };

        debug!(%url, "requesting discharge");
        let response = self.client.post(&url).json(&request).send().await?;
        if response.status().is_success() {
            return Self::extract_discharge(response).await;
        }

        if response.status() == StatusCode::UNAUTHORIZED {
            let failure: SsoFailure = response.json().await.unwrap_or_default();
            if failure.code.as_deref() == Some(TWOFACTOR_REQUIRED) {
                debug!("second factor required, resubmitting discharge once");
                request.otp = self.prompter.line("Second-factor auth: ")?;
                let retry = self.client.post(&url).json(&request).send().await?;
                if retry.status().is_success() {
                    return Self::extract_discharge(retry).await;
                }
                return Err(AuthorizationError::Authentication(format!(
                    "discharge failed with status {}",
                    retry.status()
                )));
            }
            return Err(AuthorizationError::Authentication(
                "invalid credentials".to_string(),
            ));
        }

        Err(AuthorizationError::Authentication(format!(
            "discharge failed with status {}",
            response.status()
        )))
    }

    async fn extract_discharge(
        response: reqwest::Response,
    ) -> Result<String, AuthorizationError> {
        let body: DischargeResponse = response.json().await.map_err(|e| {
            AuthorizationError::Protocol(format!("unreadable discharge response: {e}"))
        })?;
        body.discharge_macaroon.ok_or_else(|| {
            AuthorizationError::Protocol(
                "discharge response is missing the `discharge_macaroon` field".to_string(),
            )
        })
    }
}
