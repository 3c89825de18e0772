//! Store environments and their endpoint triples.
//!
//! Each logical environment maps to the pair of services involved in the
//! authorization exchange: the SCA (which issues capability-restricted root
//! tokens and hosts the store API) and the SSO (which authenticates users
//! and discharges the caveat embedded in a root token). The `local`
//! environment exists for testing against stub services and can be
//! overridden by the caller; `staging` and `production` are fixed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthorizationError;

/// A logical store environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentName {
    Staging,
    Production,
    Local,
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnvironmentName::Staging => "staging",
            EnvironmentName::Production => "production",
            EnvironmentName::Local => "local",
        };
        write!(f, "{name}")
    }
}

impl FromStr for EnvironmentName {
    type Err = AuthorizationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "staging" => Ok(EnvironmentName::Staging),
            "production" => Ok(EnvironmentName::Production),
            "local" => Ok(EnvironmentName::Local),
            other => Err(AuthorizationError::Input(format!(
                "unknown store environment {other:?}; expected staging, production or local"
            ))),
        }
    }
}

/// The endpoint triple of one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Caveat location the SSO uses when countersigning root tokens
    pub sso_location: String,
    /// Base URL of the SSO (discharge and refresh endpoints)
    pub sso_base_url: String,
    /// Base URL of the SCA (token issuance and store API)
    pub sca_base_url: String,
}

impl Endpoints {
    /// Endpoints of the staging environment.
    pub fn staging() -> Self {
        Endpoints {
            sso_location: "login.staging.ubuntu.com".to_string(),
            sso_base_url: "https://login.staging.ubuntu.com".to_string(),
            sca_base_url: "https://myapps.developer.staging.ubuntu.com".to_string(),
        }
    }

    /// Endpoints of the production environment.
    pub fn production() -> Self {
        Endpoints {
            sso_location: "login.ubuntu.com".to_string(),
            sso_base_url: "https://login.ubuntu.com".to_string(),
            sca_base_url: "https://myapps.developer.ubuntu.com".to_string(),
        }
    }

    /// Default endpoints of the local testing environment.
    ///
    /// These point at loopback services and are expected to be overridden
    /// through [`EnvironmentRegistry::with_local`] when the stubs listen
    /// elsewhere.
    pub fn local_defaults() -> Self {
        Endpoints {
            sso_location: "localhost".to_string(),
            sso_base_url: "http://127.0.0.1:8000".to_string(),
            sca_base_url: "http://127.0.0.1:8010".to_string(),
        }
    }
}

/// Lookup table from [`EnvironmentName`] to [`Endpoints`].
///
/// Constructed once at startup and passed to the components that need it;
/// the table itself holds no state beyond the configured triples.
#[derive(Debug, Clone)]
pub struct EnvironmentRegistry {
    staging: Endpoints,
    production: Endpoints,
    local: Endpoints,
}

impl Default for EnvironmentRegistry {
    fn default() -> Self {
        EnvironmentRegistry {
            staging: Endpoints::staging(),
            production: Endpoints::production(),
            local: Endpoints::local_defaults(),
        }
    }
}

impl EnvironmentRegistry {
    /// Creates a registry with the built-in endpoint triples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with an overridden `local` environment.
    pub fn with_local(local: Endpoints) -> Self {
        EnvironmentRegistry {
            local,
            ..Self::default()
        }
    }

    /// Returns the endpoints of the named environment.
    pub fn endpoints(&self, name: EnvironmentName) -> &Endpoints {
        match name {
            EnvironmentName::Staging => &self.staging,
            EnvironmentName::Production => &self.production,
            EnvironmentName::Local => &self.local,
        }
    }
}
