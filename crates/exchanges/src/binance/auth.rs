//! Binance authentication and request signing
//!
//! - HMAC-SHA256 over the exact query string that goes on the wire
//! - Parameters keep their insertion order; the exchange verifies the
//!   signature against the string it receives, not a sorted form
//! - The secret stays inside [`SecretString`] and is never logged

use crate::errors::{ExchangeError, Result};
use crate::http::Method;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::trace;

type HmacSha256 = Hmac<Sha256>;

/// Binance API credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    /// Create new credentials
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Check if credentials are valid (non-empty)
    pub fn is_valid(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.expose_secret().is_empty()
    }
}

/// Join parameters as `key=value&...` in the given order, percent-encoding
/// values.
pub fn build_query_string<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), urlencoding::encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

/// HMAC-SHA256 of the canonical query string of `params`, as lowercase hex.
pub fn sign<K, V>(secret: &str, params: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    sign_payload(secret, &build_query_string(params))
}

fn sign_payload(secret: &str, payload: &str) -> Result<String> {
    if secret.is_empty() {
        return Err(ExchangeError::Signing("empty API secret".to_string()));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Signing(format!("HMAC setup failed: {e}")))?;
    mac.update(payload.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Request signer bound to one set of credentials
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
}

impl Signer {
    /// Create new signer with credentials
    pub fn new(credentials: Credentials) -> Result<Self> {
        if credentials.api_secret.expose_secret().is_empty() {
            return Err(ExchangeError::Signing("empty API secret".to_string()));
        }
        Ok(Self { credentials })
    }

    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// Append `timestamp`, sign everything including it, and return the
    /// request with `signature` as its final parameter.
    pub fn sign_request(
        &self,
        method: Method,
        endpoint: &str,
        params: Vec<(String, String)>,
        timestamp: u64,
    ) -> Result<SignedRequest> {
        let mut params = params;
        params.push(("timestamp".to_string(), timestamp.to_string()));

        let signature = sign(self.credentials.api_secret.expose_secret(), &params)?;
        trace!("🔐 Signed request: {} {}", method, endpoint);

        Ok(SignedRequest {
            method,
            endpoint: endpoint.to_string(),
            params,
            timestamp,
            signature,
        })
    }
}

/// Signed request with all necessary components
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub method: Method,
    pub endpoint: String,
    /// Caller parameters followed by `timestamp`
    pub params: Vec<(String, String)>,
    pub timestamp: u64,
    pub signature: String,
}

impl SignedRequest {
    /// Final wire query: the signed parameters, then `signature`.
    pub fn query_string(&self) -> String {
        let signed = build_query_string(&self.params);
        if signed.is_empty() {
            format!("signature={}", self.signature)
        } else {
            format!("{signed}&signature={}", self.signature)
        }
    }
}
