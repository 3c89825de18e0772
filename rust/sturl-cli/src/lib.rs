//! Command line client around the store authorization lifecycle.
//!
//! The binary wires the pieces of `sturl-auth` into one sequential flow:
//! load or acquire a credential, bind it into an authorization header,
//! forward one request to the store (or the default ACL verification
//! call), and transparently refresh-and-retry once when the store reports
//! a stale discharge.

pub mod cli;
pub mod config;

use anyhow::bail;
use reqwest::header;
use tracing::{debug, info};

use sturl_auth::{
    Acquirer, AuthorizationError, CapabilityRequest, Channel, Credential, CredentialStore,
    Endpoints, EnvironmentName, Permission, RefreshCoordinator, TerminalPrompter,
    authorization_header,
};

use crate::cli::SturlCli;
use crate::config::Config;

/// Accept header sent with every store request.
pub const ACCEPT_JSON: &str = "application/json, application/hal+json";

/// Splits an ad-hoc `"Name: value"` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String), AuthorizationError> {
    let (name, value) = raw.split_once(':').ok_or_else(|| {
        AuthorizationError::Input(format!("malformed header {raw:?}; expected \"Name: value\""))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthorizationError::Input(format!(
            "malformed header {raw:?}; the name is empty"
        )));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parses the `-X` method argument.
pub fn parse_method(raw: &str) -> Result<reqwest::Method, AuthorizationError> {
    match raw.to_ascii_uppercase().as_str() {
        "GET" => Ok(reqwest::Method::GET),
        "POST" => Ok(reqwest::Method::POST),
        "PUT" => Ok(reqwest::Method::PUT),
        "DELETE" => Ok(reqwest::Method::DELETE),
        other => Err(AuthorizationError::Input(format!(
            "unsupported method {other:?}; expected GET, POST, PUT or DELETE"
        ))),
    }
}

/// Reads the `-d` argument: literal JSON, or `@path` to a JSON file.
pub async fn read_data(raw: &str) -> Result<serde_json::Value, AuthorizationError> {
    let text = match raw.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text)
        .map_err(|e| AuthorizationError::Input(format!("request data is not valid JSON: {e}")))
}

/// One outbound store request, rebuilt per attempt so a refreshed
/// authorization lands in both the header and the verify body.
struct Outbound {
    method: reqwest::Method,
    url: String,
    data: Option<serde_json::Value>,
    headers: Vec<(String, String)>,
    /// The default ACL verification call carries the authorization inside
    /// the request body rather than as a header.
    inline_auth: bool,
}

async fn dispatch(
    client: &reqwest::Client,
    outbound: &Outbound,
    authorization: &str,
) -> Result<reqwest::Response, AuthorizationError> {
    let mut request = client
        .request(outbound.method.clone(), &outbound.url)
        .header(header::ACCEPT, ACCEPT_JSON)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CACHE_CONTROL, "no-cache");

    let body = if outbound.inline_auth {
        Some(serde_json::json!({ "auth_data": { "authorization": authorization } }))
    } else {
        request = request.header(header::AUTHORIZATION, authorization);
        outbound.data.clone()
    };
    if let Some(body) = body {
        request = request.json(&body);
    }
    for (name, value) in &outbound.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    debug!(method = %outbound.method, url = %outbound.url, "dispatching store request");
    Ok(request.send().await?)
}

/// Loads the named credential, or acquires (and possibly persists) a
/// fresh one.
async fn obtain_credential(
    args: &SturlCli,
    config: &Config,
    store: &CredentialStore,
    environment: EnvironmentName,
    endpoints: &Endpoints,
) -> Result<Credential, AuthorizationError> {
    if let (Some(name), false) = (&args.auth, args.force) {
        match store.load(name).await {
            Ok(credential) => {
                debug!(name = %name, "using stored credential");
                return Ok(credential);
            }
            Err(AuthorizationError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }

    let email = args
        .email
        .clone()
        .or_else(|| config.default_email.clone())
        .ok_or_else(|| {
            AuthorizationError::Input(
                "an email is required to authorize; pass --email or set $STORE_EMAIL".to_string(),
            )
        })?;

    let permissions = args
        .permissions
        .iter()
        .map(|raw| raw.parse::<Permission>())
        .collect::<Result<Vec<_>, _>>()?;
    let channels = args
        .channels
        .iter()
        .map(|raw| raw.parse::<Channel>())
        .collect::<Result<Vec<_>, _>>()?;

    info!(environment = %environment, "acquiring fresh authorization");
    let request = CapabilityRequest::new(permissions, channels);
    let acquirer = Acquirer::new(endpoints.clone(), TerminalPrompter);
    let (root, discharge) = acquirer.acquire(&email, &request).await?;
    let credential = Credential::new(root, discharge, environment);

    if let Some(name) = &args.auth {
        store.save(name, &credential).await?;
        info!(name = %name, "stored credential");
    }
    Ok(credential)
}

/// Runs one invocation of the client.
pub async fn run(args: SturlCli, config: Config) -> anyhow::Result<()> {
    let store = CredentialStore::new(config.auth_dir.clone());

    if args.list_auth {
        for (name, environment) in store.list().await? {
            println!("{name} ({environment})");
        }
        return Ok(());
    }

    // Validate everything caller-supplied before any network traffic.
    let method = parse_method(&args.method)?;
    let extra_headers = args
        .headers
        .iter()
        .map(|raw| parse_header(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let data = match &args.data {
        Some(raw) => Some(read_data(raw).await?),
        None => None,
    };

    let requested = match &args.store_env {
        Some(value) => value.parse()?,
        None => config.default_environment,
    };

    let credential = obtain_credential(
        &args,
        &config,
        &store,
        requested,
        config.registry.endpoints(requested),
    )
    .await?;

    // A stored credential dictates its own environment from here on.
    let endpoints = config.registry.endpoints(credential.environment).clone();
    let mut authorization = authorization_header(&credential.root, &credential.discharge)?;

    let outbound = match &args.url {
        Some(url) => Outbound {
            // A request body always travels by POST.
            method: if data.is_some() {
                reqwest::Method::POST
            } else {
                method
            },
            url: url.clone(),
            data,
            headers: extra_headers,
            inline_auth: false,
        },
        None => Outbound {
            method: reqwest::Method::POST,
            url: format!("{}/dev/api/acl/verify/", endpoints.sca_base_url),
            data: None,
            headers: extra_headers,
            inline_auth: true,
        },
    };

    let client = reqwest::Client::new();
    let mut response = dispatch(&client, &outbound, &authorization).await?;

    if sturl_auth::needs_refresh(&response) {
        info!("store signalled a stale discharge; refreshing");
        let coordinator = RefreshCoordinator::new(endpoints);
        let refreshed = match &args.auth {
            Some(name) => {
                coordinator
                    .maybe_refresh(&response, &credential, name, &store)
                    .await?
                    .0
            }
            None => coordinator.refresh_discharge(&credential).await?,
        };
        authorization = authorization_header(&refreshed.root, &refreshed.discharge)?;
        response = dispatch(&client, &outbound, &authorization).await?;
        if sturl_auth::needs_refresh(&response) {
            bail!("discharge is still reported stale after a refresh");
        }
    }

    if args.print_headers {
        println!("{:?} {}", response.version(), response.status());
        for (name, value) in response.headers() {
            println!("{name}: {}", value.to_str().unwrap_or("<binary>"));
        }
    }
    let body = response.text().await?;
    println!("{body}");

    Ok(())
}
