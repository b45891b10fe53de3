//! Binance USDT-M futures REST client using monoio
//!
//! - Single-threaded async with monoio
//! - One `send` path for every endpoint: timestamp, sign, dispatch, map
//!   errors
//! - Parameters travel in the query string for every method, in the
//!   order they were signed
//! - Typed wrappers decode each endpoint into an explicit schema

use crate::binance::auth::{Credentials, Signer, build_query_string};
use crate::binance::types::{
    AccountInfo, ApiErrorBody, ExchangeInfo, LeverageResponse, MarkPrice, OrderResponse,
};
use crate::errors::{ExchangeError, Result};
use crate::http::{HttpRequest, Method, MonoioHttpsClient};
use crate::traits::HttpTransport;
use crate::types::{OrderType, QuantizedOrder};
use perpdesk_core::prelude::*;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use url::Url;

pub const MAINNET_URL: &str = "https://fapi.binance.com";
pub const TESTNET_URL: &str = "https://testnet.binancefuture.com";

pub const EXCHANGE_INFO: &str = "/fapi/v1/exchangeInfo";
pub const ACCOUNT: &str = "/fapi/v2/account";
pub const PREMIUM_INDEX: &str = "/fapi/v1/premiumIndex";
pub const ORDER: &str = "/fapi/v1/order";
pub const LEVERAGE: &str = "/fapi/v1/leverage";

const API_KEY_HEADER: &str = "X-MBX-APIKEY";
const UNKNOWN_ERROR: &str = "unknown error";

/// Binance futures connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuturesConfig {
    pub base_url: String,
    pub testnet: bool,
    pub timeout_ms: u64,
    pub enable_timing: bool,
}

impl Default for FuturesConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl FuturesConfig {
    pub fn mainnet() -> Self {
        Self {
            base_url: MAINNET_URL.to_string(),
            testnet: false,
            timeout_ms: 10_000,
            enable_timing: true,
        }
    }

    pub fn testnet() -> Self {
        Self {
            base_url: TESTNET_URL.to_string(),
            testnet: true,
            ..Self::mainnet()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_timing(mut self, enable: bool) -> Self {
        self.enable_timing = enable;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn network_name(&self) -> &'static str {
        if self.testnet { "testnet" } else { "mainnet" }
    }
}

/// Binance futures REST client
pub struct FuturesRestClient<T: HttpTransport = MonoioHttpsClient> {
    config: FuturesConfig,
    base_url: Url,
    credentials: Option<Credentials>,
    signer: Option<Signer>,
    transport: T,
}

impl FuturesRestClient<MonoioHttpsClient> {
    /// Create a client over the monoio HTTPS transport
    pub fn new(config: FuturesConfig, credentials: Option<Credentials>) -> Result<Self> {
        let transport = MonoioHttpsClient::new(config.timeout());
        Self::with_transport(config, credentials, transport)
    }
}

impl<T: HttpTransport> FuturesRestClient<T> {
    pub fn with_transport(
        config: FuturesConfig,
        credentials: Option<Credentials>,
        transport: T,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let signer = credentials.clone().map(Signer::new).transpose()?;

        info!("🔗 Binance futures client created ({})", config.network_name());
        debug!("   Base URL: {}", base_url);

        Ok(Self {
            config,
            base_url,
            credentials,
            signer,
            transport,
        })
    }

    pub fn config(&self) -> &FuturesConfig {
        &self.config
    }

    pub fn is_testnet(&self) -> bool {
        self.config.testnet
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    /// Send one request and return the decoded JSON body.
    ///
    /// Signed requests get `timestamp` appended before signing and
    /// `signature` appended after, so both are the last two parameters.
    pub async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: Vec<(String, String)>,
        signed: bool,
    ) -> Result<Value> {
        let mut timer = self
            .config
            .enable_timing
            .then(|| PerfTimer::start(format!("binance_{method}_{endpoint}")));

        let query = if signed {
            let signer = self.signer.as_ref().ok_or_else(|| {
                ExchangeError::Config(format!("{endpoint} requires API credentials"))
            })?;
            signer
                .sign_request(method, endpoint, params, timestamp_ms())?
                .query_string()
        } else {
            build_query_string(&params)
        };

        let mut url = self.base_url.clone();
        url.set_path(endpoint);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        trace!("📡 {} {}", method, url);

        let mut request = HttpRequest::new(method, url.as_str());
        if let Some(credentials) = &self.credentials {
            request = request.header(API_KEY_HEADER, credentials.api_key());
        }

        let response = self.transport.execute(request).await?;

        if let Some(timer) = timer.as_mut() {
            timer.log_elapsed();
        }

        if !response.is_success() {
            let body: ApiErrorBody = serde_json::from_str(&response.body).unwrap_or_default();
            let error = ExchangeError::Api {
                status: response.status,
                code: body.code,
                message: body.msg.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            };
            warn!("⚠️ {} {} failed: {}", method, endpoint, error);
            return Err(error);
        }

        serde_json::from_str(&response.body)
            .map_err(|e| ExchangeError::Decode(format!("{endpoint}: {e}")))
    }

    async fn send_typed<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: Vec<(String, String)>,
        signed: bool,
    ) -> Result<R> {
        let value = self.send(method, endpoint, params, signed).await?;
        serde_json::from_value(value).map_err(|e| ExchangeError::Decode(format!("{endpoint}: {e}")))
    }

    /// Get exchange information
    pub async fn exchange_info(&self) -> Result<ExchangeInfo> {
        self.send_typed(Method::Get, EXCHANGE_INFO, Vec::new(), false).await
    }

    /// Get futures account balances and positions
    pub async fn account(&self) -> Result<AccountInfo> {
        self.send_typed(Method::Get, ACCOUNT, Vec::new(), true).await
    }

    /// Get the current mark price of a symbol
    pub async fn mark_price(&self, symbol: &str) -> Result<Decimal> {
        let params = vec![("symbol".to_string(), symbol.to_string())];
        let mark: MarkPrice = self.send_typed(Method::Get, PREMIUM_INDEX, params, false).await?;
        Ok(mark.mark_price)
    }

    /// Place an already quantized order
    pub async fn new_order(&self, order: &QuantizedOrder) -> Result<OrderResponse> {
        let params = order_params(order)?;

        perpdesk_core::log_order!(
            "SUBMIT",
            order.symbol,
            order.side,
            order.quantity,
            order.price.map(|p| p.to_string()).unwrap_or_else(|| "MARKET".to_string())
        );

        self.send_typed(Method::Post, ORDER, params, true).await
    }

    /// Change initial leverage for a symbol
    pub async fn change_leverage(&self, symbol: &str, leverage: u32) -> Result<LeverageResponse> {
        let params = vec![
            ("symbol".to_string(), symbol.to_string()),
            ("leverage".to_string(), leverage.to_string()),
        ];
        self.send_typed(Method::Post, LEVERAGE, params, true).await
    }
}

/// Wire parameters of an order, in signing order
pub fn order_params(order: &QuantizedOrder) -> Result<Vec<(String, String)>> {
    let mut params = vec![
        ("symbol".to_string(), order.symbol.clone()),
        ("side".to_string(), order.side.to_string()),
        ("type".to_string(), order.order_type.to_string()),
        ("quantity".to_string(), order.quantity.normalize().to_string()),
        ("reduceOnly".to_string(), order.reduce_only.to_string()),
    ];

    if order.order_type == OrderType::Limit {
        let price = order
            .price
            .ok_or_else(|| ExchangeError::validation("limit order requires a price"))?;
        params.push(("price".to_string(), price.normalize().to_string()));
        if let Some(tif) = order.time_in_force() {
            params.push(("timeInForce".to_string(), tif.to_string()));
        }
    }

    Ok(params)
}
