use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::auth::{signed_assertion, TokenExchanger};
use crate::cache::token::CachedToken;
use crate::config::credentials::ServiceAccountCredential;
use crate::error::Result;
use crate::helpers::time::now_millis;
use crate::observability::metrics::get_metrics;

/// Single-slot bearer token cache with single-flight refresh.
///
/// The slot is replaced as a whole record, readers never see a partial
/// token. Refreshes run one at a time behind `refresh_in_flight`; callers
/// that queue behind a running refresh re-check the slot before minting
/// their own, so one refresh window costs exactly one exchange. Because
/// refreshes are serialized the last exchange to complete owns the slot.
pub struct TokenCache<E> {
    exchanger: E,
    slot: RwLock<Option<CachedToken>>,
    refresh_in_flight: Mutex<()>,
    safety_margin_ms: i64,
}

impl<E> TokenCache<E>
where
    E: TokenExchanger + Send + Sync,
{
    pub fn new(exchanger: E, safety_margin_ms: i64) -> Self {
        Self {
            exchanger,
            slot: RwLock::new(None),
            refresh_in_flight: Mutex::new(()),
            safety_margin_ms,
        }
    }

    pub fn exchanger(&self) -> &E {
        &self.exchanger
    }

    /// Cached token if still fresh, otherwise a newly exchanged one.
    pub async fn get_valid_token(&self, credential: &ServiceAccountCredential) -> Result<String> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _in_flight = self.refresh_in_flight.lock().await;

        // refreshed by the caller this one queued behind
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        self.refresh(credential).await
    }

    /// Current slot content, fresh or not.
    pub async fn snapshot(&self) -> Option<CachedToken> {
        self.slot.read().await.clone()
    }

    /// Replace the slot with `token` as is, no exchange involved.
    pub async fn prime(&self, token: CachedToken) {
        *self.slot.write().await = Some(token);
    }

    pub async fn invalidate(&self) {
        let _in_flight = self.refresh_in_flight.lock().await;
        *self.slot.write().await = None;
        info!("bearer token invalidated");
    }

    async fn fresh_token(&self) -> Option<String> {
        let now = now_millis();
        let token = self
            .slot
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_fresh(now, self.safety_margin_ms))
            .map(|token| token.value.clone());

        if token.is_some() {
            debug!("serving cached bearer token");
            get_metrics().await.token_cache_hits.inc();
        }
        token
    }

    /// Nothing is written to the slot unless the exchange succeeded.
    async fn refresh(&self, credential: &ServiceAccountCredential) -> Result<String> {
        info!("refreshing bearer token for '{}'", credential.account_id);
        let issued_at_ms = now_millis();
        let assertion = signed_assertion(credential, issued_at_ms / 1000)?;
        let grant = self.exchanger.exchange(&assertion).await?;

        let token = CachedToken::from_grant(&grant, issued_at_ms);
        get_metrics()
            .await
            .token_expiry_unix
            .set(token.expires_at_ms / 1000);
        info!(
            "bearer token refreshed, valid for {}s",
            grant.expires_in_secs
        );

        *self.slot.write().await = Some(token);
        Ok(grant.access_token)
    }
}
