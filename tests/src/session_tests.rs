//! Order session flows against a scripted transport
//!
//! Drives the public API end to end: rule loading, validation and
//! quantization, signing and response decoding, with every HTTP exchange
//! answered by a mock.

use mockall::Sequence;
use perpdesk_exchanges::binance::{
    AccountSummary, Credentials, FuturesConfig, FuturesRestClient, OrderStatus, PositionSide,
    RuleCacheStatus, TradingSession, roi_percent,
};
use perpdesk_exchanges::http::{HttpRequest, HttpResponse, Method};
use perpdesk_exchanges::prelude::*;
use perpdesk_tests::{MockTransport, query_keys, query_param};
use rstest::*;
use rust_decimal_macros::dec;

const EXCHANGE_INFO: &str = r#"{
    "timezone": "UTC",
    "symbols": [
        {"symbol": "BTCUSDT", "status": "TRADING", "filters": [
            {"filterType": "PRICE_FILTER", "minPrice": "0", "maxPrice": "0", "tickSize": "0.01"},
            {"filterType": "LOT_SIZE", "minQty": "0.001", "maxQty": "0", "stepSize": "0.001"},
            {"filterType": "MARKET_LOT_SIZE", "minQty": "0.001", "maxQty": "120", "stepSize": "0.001"},
            {"filterType": "MAX_NUM_ORDERS", "limit": 200},
            {"filterType": "MIN_NOTIONAL", "notional": "5"}
        ]},
        {"symbol": "XRPUSDT", "status": "TRADING", "filters": [
            {"filterType": "LOT_SIZE", "minQty": "0.1", "maxQty": "10000000", "stepSize": "0.1"},
            {"filterType": "PRICE_FILTER", "minPrice": "0.0143", "maxPrice": "100000", "tickSize": "0.0001"},
            {"filterType": "MIN_NOTIONAL", "notional": "5"},
            {"filterType": "PERCENT_PRICE", "multiplierUp": "1.0500", "multiplierDown": "0.9500", "multiplierDecimal": "4"}
        ]}
    ]
}"#;

fn is_get(request: &HttpRequest, endpoint: &str) -> bool {
    request.method == Method::Get && request.url.contains(endpoint)
}

fn client(transport: MockTransport) -> FuturesRestClient<MockTransport> {
    FuturesRestClient::with_transport(
        FuturesConfig::testnet(),
        Some(Credentials::new("integration-key", "integration-secret")),
        transport,
    )
    .unwrap()
}

#[fixture]
fn transport_with_rules() -> MockTransport {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .withf(|req| is_get(req, "/fapi/v1/exchangeInfo"))
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, EXCHANGE_INFO)));
    transport
}

// ============================================================================
// ORDER PLACEMENT
// ============================================================================

#[cfg(test)]
mod order_placement {
    use super::*;

    #[rstest]
    #[monoio::test]
    async fn test_btc_limit_order_end_to_end(mut transport_with_rules: MockTransport) {
        transport_with_rules
            .expect_execute()
            .withf(|req| is_get(req, "/fapi/v1/premiumIndex"))
            .returning(|_| Ok(HttpResponse::new(200, r#"{"symbol":"BTCUSDT","markPrice":"50000.00000000"}"#)));
        transport_with_rules
            .expect_execute()
            .withf(|req| {
                req.method == Method::Post
                    && req.url.contains("/fapi/v1/order")
                    && req.header_value("X-MBX-APIKEY") == Some("integration-key")
                    && query_param(req, "quantity").as_deref() == Some("0.001")
                    && query_param(req, "price").as_deref() == Some("50000.12")
                    && query_param(req, "timeInForce").as_deref() == Some("GTC")
                    && query_keys(req).ends_with(&["timestamp".to_string(), "signature".to_string()])
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"orderId":4056,"symbol":"BTCUSDT","status":"NEW","price":"50000.12","avgPrice":"0.00","origQty":"0.001"}"#,
                ))
            });

        let session = TradingSession::open(client(transport_with_rules)).await;
        assert_eq!(session.rules().status(), &RuleCacheStatus::Loaded);

        let request = OrderRequest::limit("BTCUSDT", OrderSide::Buy, dec!(0.00137), dec!(50000.123));
        let placed = session.place_order(&request).await.unwrap();

        assert_eq!(placed.order.quantity, dec!(0.001));
        assert_eq!(placed.order.price, Some(dec!(50000.12)));
        assert_eq!(placed.response.order_id, Some(4056));
        assert_eq!(placed.response.status, OrderStatus::New);
    }

    #[rstest]
    #[monoio::test]
    async fn test_band_rejection_never_reaches_order_endpoint(mut transport_with_rules: MockTransport) {
        transport_with_rules
            .expect_execute()
            .withf(|req| is_get(req, "/fapi/v1/premiumIndex"))
            .returning(|_| Ok(HttpResponse::new(200, r#"{"symbol":"XRPUSDT","markPrice":"0.5000"}"#)));

        let session = TradingSession::open(client(transport_with_rules)).await;
        let request = OrderRequest::limit("XRPUSDT", OrderSide::Sell, dec!(100), dec!(0.6));
        let err = session.place_order(&request).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!err.is_retryable());
    }

    #[monoio::test]
    async fn test_test_order_sets_leverage_first() {
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();

        transport
            .expect_execute()
            .withf(|req| req.method == Method::Post && req.url.contains("/fapi/v1/leverage"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert_eq!(query_param(&req, "leverage").as_deref(), Some("20"));
                Ok(HttpResponse::new(200, r#"{"symbol":"XRPUSDT","leverage":20,"maxNotionalValue":"1000000"}"#))
            });
        transport
            .expect_execute()
            .withf(|req| is_get(req, "/fapi/v1/premiumIndex"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"symbol":"XRPUSDT","markPrice":"0.6"}"#)));
        transport
            .expect_execute()
            .withf(|req| req.method == Method::Post && query_param(req, "type").as_deref() == Some("MARKET"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(HttpResponse::new(200, r#"{"symbol":"XRPUSDT","status":"FILLED","origQty":"10","avgPrice":"0.6002"}"#))
            });

        let session = TradingSession::with_rules(client(transport), RuleCache::degraded("not loaded"));
        let outcome = session
            .place_test_order("XRPUSDT", OrderSide::Buy, dec!(10), true)
            .await
            .unwrap();

        assert!(!outcome.fallback_used);
        assert_eq!(outcome.placed.response.status, OrderStatus::Filled);
    }
}

// ============================================================================
// RULE LOADING AND ERRORS
// ============================================================================

#[cfg(test)]
mod rules_and_errors {
    use super::*;

    #[monoio::test]
    async fn test_unreachable_exchange_degrades_session() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Err(ExchangeError::Network("request timed out after 10000ms".into())));

        let session = TradingSession::open(client(transport)).await;

        assert!(session.rules().is_degraded());
        assert_eq!(session.rules().tradable_symbols()[0], "BTCUSDT");
        assert_eq!(session.rules().symbol_info("BTCUSDT", dec!(1)).min_notional, dec!(5));
    }

    #[rstest]
    #[case(400, r#"{"code":-1121,"msg":"Invalid symbol."}"#, Some(-1121), "Invalid symbol.")]
    #[case(401, r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#, Some(-2015), "Invalid API-key, IP, or permissions for action.")]
    #[case(502, "<html>Bad Gateway</html>", None, "unknown error")]
    #[monoio::test]
    async fn test_api_errors_are_typed(
        #[case] status: u16,
        #[case] body: &'static str,
        #[case] code: Option<i64>,
        #[case] message: &str,
    ) {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .returning(move |_| Ok(HttpResponse::new(status, body)));

        let err = client(transport).mark_price("NOPEUSDT").await.unwrap_err();
        match err {
            ExchangeError::Api { status: got, code: got_code, message: got_message } => {
                assert_eq!(got, status);
                assert_eq!(got_code, code);
                assert_eq!(got_message, message);
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[monoio::test]
    async fn test_signed_call_without_credentials() {
        let client = FuturesRestClient::with_transport(FuturesConfig::testnet(), None, MockTransport::new())
            .unwrap();
        let err = client.account().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}

// ============================================================================
// ACCOUNT OVERVIEW
// ============================================================================

#[cfg(test)]
mod account_overview {
    use super::*;

    #[test]
    fn test_roi_example() {
        assert_eq!(roi_percent(dec!(5), dec!(0.5), dec!(100), 10), dec!(100));
    }

    #[monoio::test]
    async fn test_overview_with_missing_mark_price() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| is_get(req, "/fapi/v2/account"))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{
                        "totalWalletBalance": "1000.00",
                        "totalUnrealizedProfit": "5.00",
                        "positions": [
                            {"symbol": "ETHUSDT", "positionAmt": "0.5", "entryPrice": "100", "unrealizedProfit": "5", "leverage": "10"},
                            {"symbol": "BTCUSDT", "positionAmt": "0.000", "entryPrice": "0.0", "unrealizedProfit": "0", "leverage": "20"}
                        ]
                    }"#,
                ))
            });
        transport
            .expect_execute()
            .withf(|req| is_get(req, "/fapi/v1/premiumIndex"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(500, "")));

        let summary = AccountSummary::fetch(&client(transport)).await.unwrap();

        assert_eq!(summary.total_balance, dec!(1005));
        assert_eq!(summary.positions.len(), 1);

        let eth = &summary.positions[0];
        assert_eq!(eth.side, PositionSide::Long);
        assert_eq!(eth.mark_price, None);
        assert_eq!(eth.roi, dec!(100));
    }
}
