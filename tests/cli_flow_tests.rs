#![cfg(feature = "cli")]

mod auth_support;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use saml_to::assume::{
    AwsSdkOptions, BrowserLauncher, ExportShell, SamlExchange, StsCredentials, AWS_SAML_RECIPIENT,
};
use saml_to::auth::{Token, TokenStore};
use saml_to::cli::prompt::Selector;
use saml_to::cli::roles::{handle_assume, handle_login, NEW_IDENTITY_CHOICE};
use saml_to::cli::setup::handle_init;
use saml_to::cli::{AssumeArgs, CliContext, InitArgs, LoginArgs};
use saml_to::config::SamlToConfig;
use saml_to::error::{Result, SamlToError};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{FakeClock, RecordingStatus, SequenceResponder};

struct Scripted {
    picks: Mutex<Vec<usize>>,
    prompts: Mutex<Vec<Vec<String>>>,
}

impl Scripted {
    fn new(picks: Vec<usize>) -> Self {
        Self {
            picks: Mutex::new(picks),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<Vec<String>> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Selector for Scripted {
    fn select(&self, _message: &str, choices: &[String]) -> Result<usize> {
        self.prompts.lock().unwrap().push(choices.to_vec());
        let mut picks = self.picks.lock().unwrap();
        if picks.is_empty() {
            return Err(SamlToError::InvalidArgument("No selection was made".to_string()));
        }
        Ok(picks.remove(0))
    }
}

#[derive(Default)]
struct FakeSts {
    calls: Mutex<Vec<(AwsSdkOptions, String)>>,
}

#[async_trait]
impl SamlExchange for FakeSts {
    async fn assume_with_saml(&self, options: &AwsSdkOptions, assertion: &str) -> Result<StsCredentials> {
        self.calls
            .lock()
            .unwrap()
            .push((options.clone(), assertion.to_string()));
        Ok(StsCredentials {
            access_key_id: Some("ASIAEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            session_token: Some("session".to_string()),
            expiration: None,
        })
    }
}

#[derive(Default)]
struct FakeBrowser {
    opened: Mutex<Vec<String>>,
}

impl BrowserLauncher for FakeBrowser {
    fn open(&self, uri: &str) -> Result<()> {
        self.opened.lock().unwrap().push(uri.to_string());
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    config: SamlToConfig,
    clock: Arc<FakeClock>,
    status: Arc<RecordingStatus>,
    sts: Arc<FakeSts>,
    browser: Arc<FakeBrowser>,
}

impl Harness {
    fn new(server: &MockServer) -> Self {
        let dir = TempDir::new().unwrap();
        let config = SamlToConfig {
            api_url: format!("{}/github", server.uri()),
            auth_url: format!("{}/auth", server.uri()),
            github_url: server.uri(),
            github_api_url: server.uri(),
            ..SamlToConfig::default()
        }
        .with_config_dir(dir.path());
        Self {
            _dir: dir,
            config,
            clock: Arc::new(FakeClock::new()),
            status: Arc::new(RecordingStatus::default()),
            sts: Arc::new(FakeSts::default()),
            browser: Arc::new(FakeBrowser::default()),
        }
    }

    fn logged_in(self, access_token: &str) -> Self {
        self.config
            .token_store()
            .save(&Token::new(access_token))
            .unwrap();
        self
    }

    fn context(&self) -> CliContext {
        CliContext::new(self.config.clone(), self.status.clone())
            .with_clock(self.clock.clone())
            .with_sts(self.sts.clone())
            .with_browser(self.browser.clone())
    }

    fn stored_token(&self) -> Option<String> {
        self.config
            .token_store()
            .load()
            .unwrap()
            .map(|token| token.access_token)
    }
}

fn aws_response(role: &str) -> Value {
    json!({
        "provider": "aws",
        "role": role,
        "recipient": AWS_SAML_RECIPIENT,
        "browserUri": "https://signin.aws.amazon.com/saml?relay=1",
        "samlResponse": "PHNhbWxwOlJlc3BvbnNlPg==",
        "sdkOptions": {
            "RoleArn": format!("arn:aws:iam::123456789012:role/{role}"),
            "PrincipalArn": "arn:aws:iam::123456789012:saml-provider/saml.to"
        }
    })
}

async fn mount_device_flow(server: &MockServer, clock: &Arc<FakeClock>, access_token: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/api/v1/github/oauth-detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "clientId": "Iv1.client" }
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "device-123",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://github.com/login/device",
            "expires_in": 900,
            "interval": 5
        })))
        .expect(1)
        .mount(server)
        .await;
    let (responder, _) = SequenceResponder::new(
        clock.clone(),
        vec![
            json!({ "error": "authorization_pending" }),
            json!({ "access_token": access_token, "token_type": "bearer", "scope": "user:email" }),
        ],
    );
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(body_string_contains("device_code=device-123"))
        .respond_with(responder)
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_with_new_identity_reprompts_with_its_providers() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).logged_in("gho_old");
    Mock::given(method("GET"))
        .and(path("/github/api/v1/idp/logins"))
        .and(header("authorization", "Bearer gho_old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "org": "acme", "provider": "aws" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/github/api/v1/idp/logins"))
        .and(header("authorization", "Bearer gho_new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "org": "acme", "provider": "aws" },
                { "org": "beta", "provider": "gcp" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_device_flow(&server, &harness.clock, "gho_new").await;
    Mock::given(method("POST"))
        .and(path("/github/api/v1/idp/logins/gcp/login"))
        .and(query_param("org", "beta"))
        .and(header("authorization", "Bearer gho_new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "provider": "gcp",
            "recipient": "https://www.google.com/a/beta/acs",
            "browserUri": "https://sso.saml.to/github/login/gcp?org=beta"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let selector = Scripted::new(vec![1, 1]);
    let args = LoginArgs {
        provider: None,
        org: None,
    };

    handle_login(&harness.context(), &args, &selector).await.expect("login");

    let prompts = selector.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], vec!["aws (acme)".to_string(), NEW_IDENTITY_CHOICE.to_string()]);
    assert_eq!(prompts[1][1], "gcp (beta)");
    assert_eq!(harness.stored_token().as_deref(), Some("gho_new"));
    assert_eq!(harness.status.codes().len(), 1);
    assert_eq!(
        *harness.browser.opened.lock().unwrap(),
        vec!["https://sso.saml.to/github/login/gcp?org=beta".to_string()]
    );
}

#[tokio::test]
async fn assume_uses_org_and_provider_of_the_picked_role() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).logged_in("gho_seed");
    Mock::given(method("GET"))
        .and(path("/github/api/v1/idp/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "org": "acme", "provider": "aws", "role": "admin" },
                { "org": "beta", "provider": "aws", "role": "readonly" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/github/api/v1/idp/roles/readonly/assume"))
        .and(query_param("org", "beta"))
        .and(query_param("provider", "aws"))
        .and(header("authorization", "Bearer gho_seed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aws_response("readonly")))
        .expect(1)
        .mount(&server)
        .await;
    let selector = Scripted::new(vec![1]);
    let args = AssumeArgs {
        role: None,
        headless: true,
        org: None,
        provider: None,
    };
    let mut out = Vec::new();

    handle_assume(&harness.context(), &args, ExportShell::Posix, &selector, &mut out)
        .await
        .expect("assume");

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "export AWS_ACCESS_KEY_ID=\"ASIAEXAMPLE\"\n\
         export AWS_SECRET_ACCESS_KEY=\"secret\"\n\
         export AWS_SESSION_TOKEN=\"session\"\n"
    );
    let calls = harness.sts.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.role_arn, "arn:aws:iam::123456789012:role/readonly");
    assert!(harness.browser.opened.lock().unwrap().is_empty());
}

#[tokio::test]
async fn headless_assume_without_role_fails_before_any_request() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).logged_in("gho_seed");
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aws_response("admin")))
        .expect(0)
        .mount(&server)
        .await;
    let selector = Scripted::new(vec![]);
    let args = AssumeArgs {
        role: None,
        headless: true,
        org: None,
        provider: None,
    };
    let mut out = Vec::new();

    let err = handle_assume(&harness.context(), &args, ExportShell::Posix, &selector, &mut out)
        .await
        .unwrap_err();

    assert!(
        matches!(err, SamlToError::InvalidArgument(ref msg) if msg == "Please specify a role to assume"),
        "{err:?}"
    );
    assert!(selector.prompts().is_empty());
    assert!(out.is_empty());
}

async fn mount_github_access(server: &MockServer, repo_status: u16) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer gho_repo"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-oauth-scopes", "repo, user:email")
                .set_body_json(json!({ "login": "octocat" })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/members/octocat"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/saml-to-config"))
        .respond_with(ResponseTemplate::new(repo_status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn init_checks_github_access_then_registers_and_validates() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).logged_in("gho_repo");
    mount_github_access(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/github/api/v1/idp/orgs/acme/repos/saml-to-config"))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "org": "acme" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/github/api/v1/idp/orgs/acme/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadataXml": "<EntityDescriptor/>"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/github/api/v1/idp/orgs/acme/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "20211212" })))
        .expect(1)
        .mount(&server)
        .await;
    let args = InitArgs {
        repo_url: "git@github.com:acme/saml-to-config.git".to_string(),
        force: true,
    };
    let mut out = Vec::new();

    handle_init(&harness.context(), &args, &mut out).await.expect("init");

    assert_eq!(String::from_utf8(out).unwrap(), "Configuration is valid!\n");
    let order: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| format!("{} {}", request.method, request.url.path()))
        .collect();
    assert_eq!(
        order,
        vec![
            "GET /user",
            "GET /user",
            "GET /orgs/acme/members/octocat",
            "GET /repos/acme/saml-to-config",
            "POST /github/api/v1/idp/orgs/acme/repos/saml-to-config",
            "GET /github/api/v1/idp/orgs/acme/metadata",
            "GET /github/api/v1/idp/orgs/acme/config",
        ]
    );
    assert!(harness
        .status
        .messages()
        .contains(&"Checking access to acme/saml-to-config...".to_string()));
}

#[tokio::test]
async fn init_stops_before_registration_when_repository_is_missing() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).logged_in("gho_repo");
    mount_github_access(&server, 404).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    let args = InitArgs {
        repo_url: "https://github.com/acme/saml-to-config".to_string(),
        force: false,
    };
    let mut out = Vec::new();

    let err = handle_init(&harness.context(), &args, &mut out).await.unwrap_err();

    assert!(matches!(err, SamlToError::RepositoryNotFound { .. }), "{err:?}");
    assert!(out.is_empty());
}
