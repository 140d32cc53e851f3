//! JWT-bearer assertion: claim set construction and RS256 signing.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::credentials::{ServiceAccountCredential, SigningKey};
use crate::error::{Result, SyncError};
use crate::utils::constants::MAX_ASSERTION_LIFETIME_SECS;

/// Claim set sent to the token endpoint. Built per signing, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(rename = "iss")]
    pub issuer: String,
    pub scope: String,
    #[serde(rename = "aud")]
    pub audience: String,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "iat")]
    pub issued_at: i64,
}

impl Assertion {
    /// Claims for `credential` issued at `now_secs`. A lifetime outside
    /// `1..=3600` is rejected, never clamped.
    pub fn build(credential: &ServiceAccountCredential, now_secs: i64) -> Result<Self> {
        let lifetime = credential.assertion_lifetime_secs;
        if lifetime <= 0 || lifetime > MAX_ASSERTION_LIFETIME_SECS {
            return Err(SyncError::Configuration(format!(
                "assertion lifetime {}s is outside 1..={}s",
                lifetime, MAX_ASSERTION_LIFETIME_SECS
            )));
        }

        Ok(Self {
            issuer: credential.account_id.clone(),
            scope: credential.scope.clone(),
            audience: credential.token_audience.clone(),
            issued_at: now_secs,
            expires_at: now_secs + lifetime,
        })
    }

    /// Compact `header.claims.signature` string, header `{alg: RS256, typ: JWT}`.
    pub fn sign(&self, key: &SigningKey) -> Result<String> {
        let encoding_key = EncodingKey::from_rsa_pem(key.pem())
            .map_err(|err| SyncError::Configuration(format!("malformed private key: {err}")))?;

        let header = Header::new(Algorithm::RS256);
        encode(&header, self, &encoding_key)
            .map_err(|err| SyncError::Configuration(format!("assertion signing failed: {err}")))
    }
}

/// Build and sign in one step.
pub fn signed_assertion(credential: &ServiceAccountCredential, now_secs: i64) -> Result<String> {
    Assertion::build(credential, now_secs)?.sign(&credential.signing_key)
}
