//! Shared fixtures: RSA key pair, fake token/sheets endpoints, counting exchanger.

pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::routing::post;
use axum::{Form, Json};
use http::{HeaderMap, StatusCode};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::auth::{Assertion, TokenExchanger, TokenGrant};
use crate::config::credentials::ServiceAccountCredential;
use crate::config::ServiceConfig;
use crate::error::{Result, SyncError};
use crate::utils::constants::JWT_BEARER_GRANT_TYPE;

pub const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/service_account_key.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/service_account_key.pub.pem");

pub const ACCOUNT_ID: &str = "sync@notes-project.iam.gserviceaccount.com";
pub const SPREADSHEET_ID: &str = "sheet-123";
pub const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn test_credential(token_uri: &str) -> ServiceAccountCredential {
    ServiceAccountCredential::new(ACCOUNT_ID, PRIVATE_KEY_PEM, token_uri, SCOPE)
}

/// Config pointing both endpoints at `base_url`.
pub fn service_config(base_url: &str) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.settings.http_timeout_ms = Some(2_000);
    config.credentials.account_id = ACCOUNT_ID.to_owned();
    config.credentials.private_key = PRIVATE_KEY_PEM.to_owned();
    config.credentials.token_uri = format!("{}/token", base_url);
    config.sheets.api_root = format!("{}/v4/spreadsheets", base_url);
    config.sheets.spreadsheet_id = SPREADSHEET_ID.to_owned();
    config
}

/// Verifies an assertion against the fixture public key.
pub fn verify_assertion(jwt: &str, audience: &str) -> std::result::Result<Assertion, String> {
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM.as_bytes()).map_err(|e| e.to_string())?;
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience]);
    decode::<Assertion>(jwt, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| e.to_string())
}

/// In-process exchanger that counts calls and mints `token-<n>`.
pub struct CountingExchanger {
    calls: AtomicUsize,
    delay: Duration,
    expires_in_secs: i64,
    fail_with: Option<SyncError>,
}

impl CountingExchanger {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            expires_in_secs: 3600,
            fail_with: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, error: SyncError) -> Self {
        self.fail_with = Some(error);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenExchanger for CountingExchanger {
    async fn exchange(&self, _signed_assertion: &str) -> Result<TokenGrant> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(TokenGrant {
                access_token: format!("token-{}", call),
                expires_in_secs: self.expires_in_secs,
            }),
        }
    }
}

/// Canned behaviour of the fake remote.
#[derive(Clone)]
pub struct RemoteBehavior {
    pub token_status: StatusCode,
    pub token_body: Value,
    pub append_status: StatusCode,
    pub append_error: Value,
}

impl Default for RemoteBehavior {
    fn default() -> Self {
        Self {
            token_status: StatusCode::OK,
            token_body: json!({
                "access_token": "ya29.remote-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            }),
            append_status: StatusCode::OK,
            append_error: Value::Null,
        }
    }
}

/// One append as seen by the fake sheets API.
#[derive(Debug, Clone)]
pub struct ReceivedAppend {
    pub spreadsheet_id: String,
    pub range: String,
    pub value_input_option: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

/// Token endpoint and sheets API on one ephemeral port.
pub struct RemoteMock {
    pub base_url: String,
    pub token_calls: Arc<AtomicUsize>,
    pub appends: Arc<Mutex<Vec<ReceivedAppend>>>,
    handle: JoinHandle<()>,
}

impl RemoteMock {
    pub async fn start(behavior: RemoteBehavior) -> Self {
        let token_calls = Arc::new(AtomicUsize::new(0));
        let appends: Arc<Mutex<Vec<ReceivedAppend>>> = Arc::new(Mutex::new(Vec::new()));

        // base url is only known after bind, the audience check reads it from here
        let audience: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));

        let token_route = {
            let token_calls = token_calls.clone();
            let behavior = behavior.clone();
            let audience = audience.clone();
            post(move |Form(form): Form<HashMap<String, String>>| {
                let token_calls = token_calls.clone();
                let behavior = behavior.clone();
                let audience = audience.lock().unwrap().clone();
                async move {
                    token_calls.fetch_add(1, Ordering::SeqCst);
                    if form.get("grant_type").map(String::as_str) != Some(JWT_BEARER_GRANT_TYPE) {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({"error": "unsupported_grant_type"})),
                        );
                    }
                    let assertion = form.get("assertion").cloned().unwrap_or_default();
                    if let Err(reason) = verify_assertion(&assertion, &audience) {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({"error": "invalid_grant", "error_description": reason})),
                        );
                    }
                    (behavior.token_status, Json(behavior.token_body))
                }
            })
        };

        let append_route = {
            let appends = appends.clone();
            let behavior = behavior.clone();
            post(
                move |Path((spreadsheet_id, range)): Path<(String, String)>,
                      Query(query): Query<HashMap<String, String>>,
                      headers: HeaderMap,
                      Json(body): Json<Value>| {
                    let appends = appends.clone();
                    let behavior = behavior.clone();
                    async move {
                        let header = |name: &str| {
                            headers
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_owned)
                        };
                        let row_count = body["values"].as_array().map(Vec::len).unwrap_or(0);
                        let sheet = range.split('!').next().unwrap_or_default().to_owned();

                        let mut received = appends.lock().unwrap();
                        received.push(ReceivedAppend {
                            spreadsheet_id: spreadsheet_id.clone(),
                            range: range.clone(),
                            value_input_option: query.get("valueInputOption").cloned(),
                            authorization: header("authorization"),
                            content_type: header("content-type"),
                            body,
                        });
                        let first_row = received.len() + 1;

                        if !behavior.append_status.is_success() {
                            return (behavior.append_status, Json(behavior.append_error));
                        }
                        let last_row = first_row + row_count - 1;
                        (
                            StatusCode::OK,
                            Json(json!({
                                "spreadsheetId": spreadsheet_id,
                                "tableRange": format!("{}!A1:C{}", sheet, first_row - 1),
                                "updates": {
                                    "spreadsheetId": spreadsheet_id,
                                    "updatedRange": format!("{}!A{}:C{}", sheet, first_row, last_row),
                                    "updatedRows": row_count,
                                    "updatedColumns": 3,
                                    "updatedCells": row_count * 3
                                }
                            })),
                        )
                    }
                },
            )
        };

        let router = Router::new()
            .route("/token", token_route)
            .route("/v4/spreadsheets/{spreadsheet_id}/values/{range}", append_route);
        let (handle, addr) = spawn_axum(router).await;
        let base_url = format!("http://{}", addr);
        *audience.lock().unwrap() = format!("{}/token", base_url);

        Self {
            base_url,
            token_calls,
            appends,
            handle,
        }
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> usize {
        self.appends.lock().unwrap().len()
    }

    pub fn received(&self) -> Vec<ReceivedAppend> {
        self.appends.lock().unwrap().clone()
    }
}

impl Drop for RemoteMock {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
