//! Shared helpers for the perpdesk integration tests

use async_trait::async_trait;
use mockall::mock;
use perpdesk_exchanges::http::{HttpRequest, HttpResponse};
use perpdesk_exchanges::{HttpTransport, Result};
use url::Url;

mock! {
    /// Scripted stand-in for the HTTPS transport
    pub Transport {}

    #[async_trait(?Send)]
    impl HttpTransport for Transport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
    }
}

/// Decoded value of query parameter `key`
pub fn query_param(request: &HttpRequest, key: &str) -> Option<String> {
    Url::parse(&request.url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Query parameter names in wire order
pub fn query_keys(request: &HttpRequest) -> Vec<String> {
    Url::parse(&request.url)
        .map(|url| url.query_pairs().map(|(k, _)| k.into_owned()).collect())
        .unwrap_or_default()
}
