//! Process configuration, read once at startup.
//!
//! Everything configurable from the environment lands in [`Config`] and is
//! passed to the components that need it; nothing below this module reads
//! environment variables.

use std::env;
use std::path::PathBuf;

use sturl_auth::{AuthorizationError, Endpoints, EnvironmentName, EnvironmentRegistry};

/// Default email address for authorization.
pub const EMAIL_VAR: &str = "STORE_EMAIL";
/// Default store environment.
pub const ENVIRONMENT_VAR: &str = "STORE_ENV";
/// Directory credentials are stored in.
pub const AUTH_DIR_VAR: &str = "STURL_AUTH_DIR";

const LOCAL_SSO_LOCATION_VAR: &str = "STORE_LOCAL_SSO_LOCATION";
const LOCAL_SSO_BASE_URL_VAR: &str = "STORE_LOCAL_SSO_BASE_URL";
const LOCAL_SCA_BASE_URL_VAR: &str = "STORE_LOCAL_SCA_BASE_URL";

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the credential store lives in
    pub auth_dir: PathBuf,
    /// Email to authorize as when none is passed on the command line
    pub default_email: Option<String>,
    /// Environment used when none is passed on the command line
    pub default_environment: EnvironmentName,
    /// Endpoint registry, with `local` overrides applied
    pub registry: EnvironmentRegistry,
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, AuthorizationError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AuthorizationError> {
        let default_environment = match lookup(ENVIRONMENT_VAR) {
            Some(value) => value.parse()?,
            None => EnvironmentName::Staging,
        };

        let auth_dir = lookup(AUTH_DIR_VAR)
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join("sturl")))
            .unwrap_or_else(|| PathBuf::from(".sturl"));

        let mut local = Endpoints::local_defaults();
        if let Some(location) = lookup(LOCAL_SSO_LOCATION_VAR) {
            local.sso_location = location;
        }
        if let Some(url) = lookup(LOCAL_SSO_BASE_URL_VAR) {
            local.sso_base_url = url;
        }
        if let Some(url) = lookup(LOCAL_SCA_BASE_URL_VAR) {
            local.sca_base_url = url;
        }

        Ok(Config {
            auth_dir,
            default_email: lookup(EMAIL_VAR),
            default_environment,
            registry: EnvironmentRegistry::with_local(local),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn it_defaults_to_staging_and_no_email() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.default_environment, EnvironmentName::Staging);
        assert_eq!(config.default_email, None);
    }

    #[test]
    fn it_reads_email_environment_and_auth_dir() {
        let config = Config::from_vars(vars(&[
            ("STORE_EMAIL", "foo@bar.com"),
            ("STORE_ENV", "production"),
            ("STURL_AUTH_DIR", "/tmp/auth"),
        ]))
        .unwrap();

        assert_eq!(config.default_email.as_deref(), Some("foo@bar.com"));
        assert_eq!(config.default_environment, EnvironmentName::Production);
        assert_eq!(config.auth_dir, PathBuf::from("/tmp/auth"));
    }

    #[test]
    fn it_rejects_an_unknown_default_environment() {
        let result = Config::from_vars(vars(&[("STORE_ENV", "prod")]));
        assert!(matches!(result, Err(AuthorizationError::Input(_))));
    }

    #[test]
    fn it_overrides_the_local_environment() {
        let config = Config::from_vars(vars(&[
            ("STORE_LOCAL_SSO_LOCATION", "sso.test"),
            ("STORE_LOCAL_SSO_BASE_URL", "http://sso.test:8000"),
            ("STORE_LOCAL_SCA_BASE_URL", "http://sca.test:8010"),
        ]))
        .unwrap();

        let local = config.registry.endpoints(EnvironmentName::Local);
        assert_eq!(local.sso_location, "sso.test");
        assert_eq!(local.sso_base_url, "http://sso.test:8000");
        assert_eq!(local.sca_base_url, "http://sca.test:8010");

        // Fixed environments are untouched by the overrides.
        assert_eq!(
            config.registry.endpoints(EnvironmentName::Production),
            &Endpoints::production()
        );
    }
}
