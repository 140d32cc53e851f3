//! Append Client: authenticated row appends against the remote sheet API.
//!
//! Every failure is caught here and turned into an [`AppendOutcome`]; the
//! caller's local write path is never interrupted by remote sync.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::auth::{HttpTokenExchanger, TokenExchanger};
use crate::cache::token_cache::TokenCache;
use crate::config::credentials::{CredentialStore, ServiceAccountCredential};
use crate::config::sheets::SheetsConfig;
use crate::config::ServiceConfig;
use crate::error::{Result, SyncError};
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::sinks::append::{AppendOutcome, AppendRequest, AppendResponse, Row};
use crate::utils::constants::{APPEND_ANCHOR_CELL, UNKNOWN_DESTINATION_LABEL};

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub struct AppendClient<E = HttpTokenExchanger> {
    client: Client,
    sheets: SheetsConfig,
    credentials: CredentialStore,
    cache: TokenCache<E>,
    // Held across token fetch and POST, appends leave in issue order.
    dispatch: Mutex<()>,
    // Set by the first configuration error, never cleared.
    disabled: OnceLock<String>,
}

impl AppendClient<HttpTokenExchanger> {
    /// Client, cache and exchanger wired from config, sharing one HTTP
    /// client bounded by `settings.http_timeout_ms`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.settings.http_timeout_ms()))
            .build()
            .map_err(|err| SyncError::Configuration(format!("http client: {err}")))?;

        let exchanger = HttpTokenExchanger::new(client.clone(), &config.credentials.token_uri);
        let cache = TokenCache::new(exchanger, config.settings.safety_margin_ms());
        let credentials = CredentialStore::from_config(&config.credentials, &config.sheets);

        Ok(Self::new(client, config.sheets.clone(), credentials, cache))
    }
}

impl<E> AppendClient<E>
where
    E: TokenExchanger + Send + Sync,
{
    pub fn new(
        client: Client,
        sheets: SheetsConfig,
        credentials: CredentialStore,
        cache: TokenCache<E>,
    ) -> Self {
        if let CredentialStore::Unconfigured { reason } = &credentials {
            warn!("remote sync disabled: {}", reason);
        }

        Self {
            client,
            sheets,
            credentials,
            cache,
            dispatch: Mutex::new(()),
            disabled: OnceLock::new(),
        }
    }

    pub fn token_cache(&self) -> &TokenCache<E> {
        &self.cache
    }

    /// False when unconfigured or after a configuration error.
    pub fn is_enabled(&self) -> bool {
        self.credentials.is_configured() && self.disabled.get().is_none()
    }

    pub async fn append(&self, destination: &str, rows: Vec<Row>) -> AppendOutcome {
        match AppendRequest::new(destination, rows) {
            Ok(request) => self.send(request).await,
            Err(err) => self.failed(destination, err).await,
        }
    }

    /// Metric label for `destination`: configured names only, anything else
    /// collapses into one series.
    fn metric_label<'a>(&'a self, destination: &'a str) -> &'a str {
        if self.sheets.sheet_name(destination).is_some() {
            destination
        } else {
            UNKNOWN_DESTINATION_LABEL
        }
    }

    pub async fn send(&self, request: AppendRequest) -> AppendOutcome {
        let destination = request.destination().to_owned();
        let metrics = get_metrics().await;
        metrics
            .append_requests
            .with_label_values(&[self.metric_label(&destination)])
            .inc();

        let Some(sheet) = self.sheets.sheet_name(&destination) else {
            return self
                .failed(&destination, SyncError::UnknownDestination(destination.clone()))
                .await;
        };

        let (credential, spreadsheet_id) = match &self.credentials {
            CredentialStore::Configured {
                credential,
                spreadsheet_id,
            } => (credential, spreadsheet_id),
            CredentialStore::Unconfigured { reason } => {
                return self.skipped(&destination, reason).await;
            }
        };
        if let Some(reason) = self.disabled.get() {
            return self.skipped(&destination, reason).await;
        }

        let start = get_instant();
        let result = self
            .try_append(&request, sheet, credential, spreadsheet_id)
            .await;
        metrics
            .append_duration
            .with_label_values(&[self.metric_label(&destination)])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(response) => {
                info!(
                    "appended {} row(s) to '{}', range {}",
                    request.rows().len(),
                    destination,
                    response.updated_range().unwrap_or("<unknown>")
                );
                AppendOutcome::Appended {
                    destination,
                    response,
                }
            }
            Err(SyncError::Configuration(reason)) => {
                if self.disabled.set(reason.clone()).is_ok() {
                    error!("remote sync disabled for this process: {}", reason);
                }
                self.failed(&destination, SyncError::Configuration(reason))
                    .await
            }
            Err(err) => self.failed(&destination, err).await,
        }
    }

    async fn try_append(
        &self,
        request: &AppendRequest,
        sheet: &str,
        credential: &ServiceAccountCredential,
        spreadsheet_id: &str,
    ) -> Result<AppendResponse> {
        let url = append_url(&self.sheets, spreadsheet_id, sheet)?;

        let _dispatch = self.dispatch.lock().await;
        let token = self.cache.get_valid_token(credential).await?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": request.rows() }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|err| SyncError::Network(format!("unexpected append response: {err}")))
    }

    async fn skipped(&self, destination: &str, reason: &str) -> AppendOutcome {
        warn!("remote sync skipped for '{}': {}", destination, reason);
        get_metrics()
            .await
            .append_skipped
            .with_label_values(&[self.metric_label(destination)])
            .inc();
        AppendOutcome::Skipped {
            destination: destination.to_owned(),
            reason: reason.to_owned(),
        }
    }

    async fn failed(&self, destination: &str, error: SyncError) -> AppendOutcome {
        error!("failed to append to '{}': {}", destination, error);
        get_metrics()
            .await
            .append_failures
            .with_label_values(&[self.metric_label(destination), error.reason()])
            .inc();
        AppendOutcome::Failed {
            destination: destination.to_owned(),
            error,
        }
    }
}

/// `<api-root>/<spreadsheet-id>/values/<sheet>!A1:append?valueInputOption=...`
pub fn append_url(sheets: &SheetsConfig, spreadsheet_id: &str, sheet: &str) -> Result<Url> {
    let mut url = Url::parse(&sheets.api_root).map_err(|err| {
        SyncError::Configuration(format!("api root '{}': {err}", sheets.api_root))
    })?;

    url.path_segments_mut()
        .map_err(|_| {
            SyncError::Configuration(format!("api root '{}' cannot be a base", sheets.api_root))
        })?
        .pop_if_empty()
        .push(spreadsheet_id)
        .push("values")
        .push(&format!("{sheet}!{APPEND_ANCHOR_CELL}:append"));
    url.query_pairs_mut()
        .append_pair("valueInputOption", &sheets.value_input_option);

    Ok(url)
}

/// `{error: {message, status}}` preserved verbatim; raw body otherwise.
fn parse_api_error(status: u16, body: &str) -> SyncError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => SyncError::RemoteApi {
            status,
            api_status: parsed.error.status,
            message: parsed.error.message,
        },
        Err(_) => SyncError::RemoteApi {
            status,
            api_status: String::new(),
            message: body.trim().to_string(),
        },
    }
}
