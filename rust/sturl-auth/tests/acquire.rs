//! Acquisition scenarios against stub SCA and SSO services.

use std::sync::{Arc, Mutex};

use macaroon::{Format, Macaroon, MacaroonKey};
use mockito::{Matcher, Server};
use serde_json::json;

use sturl_auth::{
    Acquirer, AuthorizationError, CapabilityRequest, Credential, CredentialStore, Endpoints,
    EnvironmentName, Prompter,
};

const SSO_LOCATION: &str = "login.local.test";

/// Prompter answering with canned values, recording what was asked.
///
/// The transcript is shared so tests can keep a handle after the
/// prompter moves into the acquirer.
#[derive(Default, Clone)]
struct StubPrompter {
    password: String,
    otp: Option<String>,
    secret_labels: Arc<Mutex<Vec<String>>>,
    otp_prompts: Arc<Mutex<usize>>,
}

impl StubPrompter {
    fn with_password(password: &str) -> Self {
        StubPrompter {
            password: password.to_string(),
            ..Default::default()
        }
    }

    fn with_password_and_otp(password: &str, otp: &str) -> Self {
        StubPrompter {
            password: password.to_string(),
            otp: Some(otp.to_string()),
            ..Default::default()
        }
    }
}

impl Prompter for StubPrompter {
    fn secret(&self, label: &str) -> Result<String, AuthorizationError> {
        self.secret_labels.lock().unwrap().push(label.to_string());
        Ok(self.password.clone())
    }

    fn line(&self, _label: &str) -> Result<String, AuthorizationError> {
        *self.otp_prompts.lock().unwrap() += 1;
        match &self.otp {
            Some(otp) => Ok(otp.clone()),
            None => panic!("unexpected second-factor prompt"),
        }
    }
}

/// Mints a serialized root token carrying third-party caveats at the
/// given locations, all sharing the caveat id `discharge-me`.
fn mint_root(caveat_locations: &[&str]) -> String {
    macaroon::initialize().unwrap();
    let root_key: MacaroonKey = MacaroonKey::generate(b"root key");
    let caveat_key: MacaroonKey = MacaroonKey::generate(b"caveat key");

    let mut root = Macaroon::create(Some("sca".to_string()), &root_key, "root-id".into()).unwrap();
    for location in caveat_locations {
        root.add_third_party_caveat(location, &caveat_key, "discharge-me".into());
    }
    root.serialize(Format::V1).unwrap()
}

fn endpoints(server: &Server) -> Endpoints {
    Endpoints {
        sso_location: SSO_LOCATION.to_string(),
        sso_base_url: server.url(),
        sca_base_url: server.url(),
    }
}

#[tokio::test]
async fn acquires_a_token_pair_and_persists_it() {
    let mut server = Server::new_async().await;
    let root = mint_root(&[SSO_LOCATION]);

    let sca = server
        .mock("POST", "/dev/api/acl/")
        .match_body(Matcher::PartialJson(json!({
            "permissions": ["package_access"],
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "macaroon": root }).to_string())
        .expect(1)
        .create_async()
        .await;

    let sso = server
        .mock("POST", "/api/v2/tokens/discharge")
        .match_body(Matcher::Json(json!({
            "email": "foo@bar.com",
            "password": "secret",
            "otp": "",
            "caveat_id": "discharge-me",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "discharge_macaroon": "fresh-discharge" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let prompter = StubPrompter::with_password("secret");
    let prompts = prompter.clone();
    let acquirer = Acquirer::new(endpoints(&server), prompter);
    let request = CapabilityRequest::new(vec![], vec![]);

    let (acquired_root, discharge) = acquirer.acquire("foo@bar.com", &request).await.unwrap();

    sca.assert_async().await;
    sso.assert_async().await;
    assert_eq!(acquired_root, root);
    assert_eq!(discharge, "fresh-discharge");
    assert_eq!(
        *prompts.secret_labels.lock().unwrap(),
        vec!["Password for foo@bar.com: ".to_string()]
    );
    assert_eq!(*prompts.otp_prompts.lock().unwrap(), 0);

    // Persisting the pair yields the documented file shape.
    let dir = tempfile::TempDir::new().unwrap();
    let store = CredentialStore::new(dir.path());
    let credential = Credential::new(&acquired_root, &discharge, EnvironmentName::Local);
    store.save("test", &credential).await.unwrap();

    let raw = std::fs::read_to_string(store.path_for("test")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        json!({ "root": root, "discharge": "fresh-discharge", "store": "local" })
    );
}

#[tokio::test]
async fn resubmits_once_with_an_otp_when_the_sso_demands_a_second_factor() {
    let mut server = Server::new_async().await;
    let root = mint_root(&[SSO_LOCATION]);

    server
        .mock("POST", "/dev/api/acl/")
        .with_status(200)
        .with_body(json!({ "macaroon": root }).to_string())
        .expect(1)
        .create_async()
        .await;

    let first_leg = server
        .mock("POST", "/api/v2/tokens/discharge")
        .match_body(Matcher::PartialJson(json!({ "otp": "" })))
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({ "code": "TWOFACTOR_REQUIRED" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let second_leg = server
        .mock("POST", "/api/v2/tokens/discharge")
        .match_body(Matcher::PartialJson(json!({ "otp": "123456" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "discharge_macaroon": "otp-discharge" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let prompter = StubPrompter::with_password_and_otp("secret", "123456");
    let prompts = prompter.clone();
    let acquirer = Acquirer::new(endpoints(&server), prompter);
    let request = CapabilityRequest::new(vec![], vec![]);

    let (_, discharge) = acquirer.acquire("foo@bar.com", &request).await.unwrap();

    first_leg.assert_async().await;
    second_leg.assert_async().await;
    assert_eq!(discharge, "otp-discharge");
    assert_eq!(*prompts.otp_prompts.lock().unwrap(), 1);
}

#[tokio::test]
async fn reports_a_missing_macaroon_field_and_stops() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/dev/api/acl/")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;
    let sso = server
        .mock("POST", "/api/v2/tokens/discharge")
        .expect(0)
        .create_async()
        .await;

    let acquirer = Acquirer::new(endpoints(&server), StubPrompter::with_password("pw"));
    let request = CapabilityRequest::new(vec![], vec![]);

    let result = acquirer.acquire("foo@bar.com", &request).await;
    assert!(matches!(result, Err(AuthorizationError::Protocol(_))));
    sso.assert_async().await;
}

#[tokio::test]
async fn rejects_a_root_with_no_matching_caveat() {
    let mut server = Server::new_async().await;
    let root = mint_root(&["login.elsewhere.test"]);

    server
        .mock("POST", "/dev/api/acl/")
        .with_status(200)
        .with_body(json!({ "macaroon": root }).to_string())
        .create_async()
        .await;
    let sso = server
        .mock("POST", "/api/v2/tokens/discharge")
        .expect(0)
        .create_async()
        .await;

    let acquirer = Acquirer::new(endpoints(&server), StubPrompter::with_password("pw"));
    let result = acquirer
        .acquire("foo@bar.com", &CapabilityRequest::new(vec![], vec![]))
        .await;

    assert!(matches!(
        result,
        Err(AuthorizationError::CaveatSelection { count: 0, .. })
    ));
    sso.assert_async().await;
}

#[tokio::test]
async fn rejects_a_root_with_multiple_matching_caveats() {
    let mut server = Server::new_async().await;
    let root = mint_root(&[SSO_LOCATION, SSO_LOCATION]);

    server
        .mock("POST", "/dev/api/acl/")
        .with_status(200)
        .with_body(json!({ "macaroon": root }).to_string())
        .create_async()
        .await;
    let sso = server
        .mock("POST", "/api/v2/tokens/discharge")
        .expect(0)
        .create_async()
        .await;

    let acquirer = Acquirer::new(endpoints(&server), StubPrompter::with_password("pw"));
    let result = acquirer
        .acquire("foo@bar.com", &CapabilityRequest::new(vec![], vec![]))
        .await;

    assert!(matches!(
        result,
        Err(AuthorizationError::CaveatSelection { count: 2, .. })
    ));
    sso.assert_async().await;
}

#[tokio::test]
async fn reports_bad_credentials_without_retrying() {
    let mut server = Server::new_async().await;
    let root = mint_root(&[SSO_LOCATION]);

    server
        .mock("POST", "/dev/api/acl/")
        .with_status(200)
        .with_body(json!({ "macaroon": root }).to_string())
        .create_async()
        .await;
    let sso = server
        .mock("POST", "/api/v2/tokens/discharge")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({ "code": "INVALID_CREDENTIALS" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let prompter = StubPrompter::with_password("wrong");
    let acquirer = Acquirer::new(endpoints(&server), prompter);
    let result = acquirer
        .acquire("foo@bar.com", &CapabilityRequest::new(vec![], vec![]))
        .await;

    assert!(matches!(result, Err(AuthorizationError::Authentication(_))));
    sso.assert_async().await;
}

#[tokio::test]
async fn reports_a_missing_discharge_field() {
    let mut server = Server::new_async().await;
    let root = mint_root(&[SSO_LOCATION]);

    server
        .mock("POST", "/dev/api/acl/")
        .with_status(200)
        .with_body(json!({ "macaroon": root }).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/api/v2/tokens/discharge")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let acquirer = Acquirer::new(endpoints(&server), StubPrompter::with_password("pw"));
    let result = acquirer
        .acquire("foo@bar.com", &CapabilityRequest::new(vec![], vec![]))
        .await;

    assert!(matches!(result, Err(AuthorizationError::Protocol(_))));
}
