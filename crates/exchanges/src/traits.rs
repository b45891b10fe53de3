//! Exchange traits defining common interfaces
//!
//! The REST client talks to the network only through [`HttpTransport`], so
//! the signing, error mapping and decoding above it can be exercised
//! against a scripted transport.

use crate::errors::Result;
use crate::http::{HttpRequest, HttpResponse};
use async_trait::async_trait;

/// One request in, one complete response out.
///
/// Implementations report connection, TLS and timeout failures as
/// [`ExchangeError::Network`](crate::errors::ExchangeError::Network). Any
/// HTTP status, including 4xx and 5xx, is a successful exchange at this
/// layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}
