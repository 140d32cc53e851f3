//! OAuth2 JWT-bearer grant against the token endpoint.

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{Result, SyncError};
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::JWT_BEARER_GRANT_TYPE;

/// Bearer token as issued by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in_secs: i64,
}

pub trait TokenExchanger {
    /// Single attempt, no retry: the caller owns the retry policy.
    fn exchange(&self, signed_assertion: &str) -> impl Future<Output = Result<TokenGrant>> + Send;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpTokenExchanger {
    client: Client,
    token_uri: String,
}

impl HttpTokenExchanger {
    pub fn new(client: Client, token_uri: &str) -> Self {
        Self {
            client,
            token_uri: token_uri.to_owned(),
        }
    }

    async fn post_assertion(&self, signed_assertion: &str) -> Result<TokenGrant> {
        let response = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", signed_assertion),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(parse_error_body(status.as_u16(), &body));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|err| {
            SyncError::Network(format!("unexpected token endpoint response: {err}"))
        })?;
        if token.expires_in <= 0 {
            return Err(SyncError::Network(format!(
                "unexpected token endpoint response: expires_in {} is not positive",
                token.expires_in
            )));
        }

        Ok(TokenGrant {
            access_token: token.access_token,
            expires_in_secs: token.expires_in,
        })
    }
}

impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(&self, signed_assertion: &str) -> Result<TokenGrant> {
        let metrics = get_metrics().await;
        let start = get_instant();
        metrics.token_exchange_requests.inc();

        debug!("exchanging assertion at '{}'", self.token_uri);
        self.post_assertion(signed_assertion)
            .await
            .inspect(|grant| {
                metrics
                    .token_exchange_duration
                    .with_label_values(&["ok"])
                    .observe(start.elapsed().as_secs_f64());
                debug!("token endpoint granted token, expires_in {}s", grant.expires_in_secs);
            })
            .inspect_err(|err| {
                metrics
                    .token_exchange_duration
                    .with_label_values(&["error"])
                    .observe(start.elapsed().as_secs_f64());
                metrics
                    .token_exchange_failures
                    .with_label_values(&[err.reason()])
                    .inc();
                error!("token exchange failed: {}", err);
            })
    }
}

/// Upstream `{error, error_description}` kept verbatim; non-JSON bodies
/// fall back to the status reason and the raw text.
fn parse_error_body(status: u16, body: &str) -> SyncError {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(parsed) => SyncError::Auth {
            status,
            error: parsed.error,
            description: parsed.error_description.unwrap_or_default(),
        },
        Err(_) => SyncError::Auth {
            status,
            error: http::StatusCode::from_u16(status)
                .ok()
                .and_then(|code| code.canonical_reason())
                .unwrap_or("unknown_error")
                .to_string(),
            description: body.trim().to_string(),
        },
    }
}
