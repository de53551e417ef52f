use chrono::{TimeZone, Utc};
use reqwest::Method;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tradelink::{
    core::kernel::{FixedClock, HmacSigner, MockReply, MockTransport},
    exchanges::okx::{conversions::OKX_SIGNING, OkxBuilder, OkxConnector},
    ConnectionState, ConnectorConfig, ExchangeConnector, ExchangeCredentials, ExchangeError,
    ExchangeId, OrderParams, OrderSide, OrderStatus, OrderType, TimeInForce,
};

fn connector_with(transport: &Arc<MockTransport>, sandbox: bool) -> OkxConnector {
    let config = ConnectorConfig::production(ExchangeId::Okx)
        .with_retry_delays(Duration::from_millis(1), Duration::from_millis(5));
    OkxBuilder::new()
        .with_config(config)
        .with_sandbox(sandbox)
        .with_transport(transport.clone())
        .with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        )))
        .build()
        .unwrap()
}

fn credentials() -> ExchangeCredentials {
    ExchangeCredentials::new("k".to_string(), "s".to_string()).with_passphrase("p".to_string())
}

fn ok(data: Value) -> MockReply {
    MockReply::json(200, json!({"code": "0", "msg": "", "data": data}))
}

fn mock_account(transport: &MockTransport) {
    transport.respond(
        Method::GET,
        "/api/v5/account/balance",
        ok(json!([{
            "totalEq": "1000",
            "details": [
                {"ccy": "USDT", "availBal": "900", "frozenBal": "100"},
                {"ccy": "BTC", "availBal": "0.01", "frozenBal": "0"},
                {"ccy": "ETH", "availBal": "0", "frozenBal": "0"}
            ]
        }])),
    );
    transport.respond(
        Method::GET,
        "/api/v5/account/config",
        ok(json!([{"uid": "44705892343619584", "perm": "read_only,trade"}])),
    );
}

async fn connected(transport: &Arc<MockTransport>) -> OkxConnector {
    mock_account(transport);
    let mut connector = connector_with(transport, false);
    assert!(connector.connect(credentials()).await.unwrap());
    connector
}

#[tokio::test]
async fn test_connect_verifies_account_and_signs_with_raw_secret() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;
    assert_eq!(connector.state(), ConnectionState::Connected);

    let request = transport.requests_to("/api/v5/account/balance").remove(0);
    let timestamp = "2024-01-02T03:04:05.000Z";
    let expected = HmacSigner::new(OKX_SIGNING)
        .signature(
            "s",
            &HmacSigner::prehash(timestamp, "GET", "/api/v5/account/balance", ""),
        )
        .unwrap();

    assert_eq!(request.header("OK-ACCESS-KEY"), Some("k"));
    assert_eq!(request.header("OK-ACCESS-PASSPHRASE"), Some("p"));
    assert_eq!(request.header("OK-ACCESS-TIMESTAMP"), Some(timestamp));
    assert_eq!(request.header("OK-ACCESS-SIGN"), Some(expected.as_str()));
}

#[tokio::test]
async fn test_account_info_filters_zero_balances() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    let info = connector.get_account_info().await.unwrap();
    let assets: Vec<&str> = info.balances.iter().map(|b| b.asset.as_str()).collect();
    assert_eq!(assets, vec!["USDT", "BTC"]);
    assert_eq!(info.balances[0].locked, dec!(100));
    assert_eq!(info.permissions, vec!["read_only", "trade"]);
}

#[tokio::test]
async fn test_market_order_returns_accepted_result() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    transport.respond(
        Method::POST,
        "/api/v5/trade/order",
        ok(json!([{"ordId": "312269865356374016", "clOrdId": "", "sCode": "0", "sMsg": ""}])),
    );
    let result = connector
        .place_order(OrderParams::market("BTCUSDT", OrderSide::Buy, dec!(0.01)))
        .await
        .unwrap();

    assert_eq!(result.id, "312269865356374016");
    assert_eq!(result.status, OrderStatus::New);
    assert_eq!(result.quantity, dec!(0.01));
    assert_eq!(result.symbol, "BTCUSDT");
    let stamped = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(result.created_at, stamped);
    assert_eq!(result.updated_at, stamped);

    let request = transport.last_request().unwrap();
    let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["instId"], "BTC-USDT");
    assert_eq!(body["ordType"], "market");
    assert_eq!(body["tgtCcy"], "base_ccy");
    assert_eq!(body["sz"], "0.01");

    let client_id = body["clOrdId"].as_str().unwrap();
    assert_eq!(client_id.len(), 32);
    assert!(client_id.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(result.client_order_id.as_deref(), Some(client_id));
}

#[tokio::test]
async fn test_stop_order_uses_algo_endpoint() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    transport.respond(
        Method::POST,
        "/api/v5/trade/order-algo",
        ok(json!([{"algoId": "681096944655273984", "algoClOrdId": "mine", "sCode": "0", "sMsg": ""}])),
    );
    let result = connector
        .place_order(
            OrderParams::stop("ETHUSDT", OrderSide::Sell, dec!(1), dec!(3100))
                .with_client_order_id("mine"),
        )
        .await
        .unwrap();

    assert_eq!(result.id, "algo:681096944655273984");
    assert_eq!(result.order_type, OrderType::Stop);
    assert_eq!(result.stop_price, Some(dec!(3100)));
    assert_eq!(result.client_order_id.as_deref(), Some("mine"));

    let request = transport.last_request().unwrap();
    let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["ordType"], "trigger");
    assert_eq!(body["triggerPx"], "3100");
    assert_eq!(body["orderPx"], "-1");
    assert_eq!(body["algoClOrdId"], "mine");
    assert!(transport.requests_to("/api/v5/trade/order").is_empty());
}

#[tokio::test]
async fn test_rejected_order_surfaces_item_message_without_retry() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    transport.respond(
        Method::POST,
        "/api/v5/trade/order",
        MockReply::json(
            200,
            json!({
                "code": "1",
                "msg": "Operation failed.",
                "data": [{"ordId": "", "sCode": "51008", "sMsg": "Insufficient balance"}]
            }),
        ),
    );
    let err = connector
        .place_order(
            OrderParams::limit("BTCUSDT", OrderSide::Buy, dec!(1), dec!(40000))
                .with_time_in_force(TimeInForce::FOK),
        )
        .await
        .unwrap_err();

    match err.kind() {
        ExchangeError::HttpError { message, .. } => {
            assert!(message.contains("Insufficient balance"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(transport.requests_to("/api/v5/trade/order").len(), 1);

    let body: Value =
        serde_json::from_str(transport.last_request().unwrap().body.as_deref().unwrap()).unwrap();
    assert_eq!(body["ordType"], "fok");
    assert_eq!(body["px"], "40000");
}

#[tokio::test]
async fn test_envelope_rate_limit_and_timestamp_codes() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    transport.respond(
        Method::GET,
        "/api/v5/trade/orders-pending",
        MockReply::json(429, json!({"code": "50011", "msg": "Too Many Requests", "data": []})),
    );
    transport.respond(
        Method::GET,
        "/api/v5/trade/orders-algo-pending",
        ok(json!([])),
    );
    let err = connector.get_open_orders(None).await.unwrap_err();
    assert!(matches!(err.kind(), ExchangeError::RateLimitExceeded { .. }));
    assert_eq!(transport.requests_to("/api/v5/trade/orders-pending").len(), 1);

    transport.respond(
        Method::GET,
        "/api/v5/trade/order",
        MockReply::json(
            401,
            json!({"code": "50102", "msg": "Timestamp request expired", "data": []}),
        ),
    );
    let err = connector
        .get_order_status("312269865356374016", "BTCUSDT")
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ExchangeError::TimestampRejected(_)));
}

#[tokio::test]
async fn test_order_status_and_open_orders() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    let order = json!({
        "instId": "BTC-USDT",
        "ordId": "312269865356374016",
        "clOrdId": "b15",
        "px": "40000",
        "sz": "2",
        "ordType": "limit",
        "side": "buy",
        "accFillSz": "1",
        "avgPx": "39990",
        "state": "partially_filled",
        "cTime": "1704164645000",
        "uTime": "1704164646000"
    });
    transport.respond(Method::GET, "/api/v5/trade/order", ok(json!([order.clone()])));
    transport.respond(
        Method::GET,
        "/api/v5/trade/orders-pending",
        ok(json!([order])),
    );

    let status = connector
        .get_order_status("312269865356374016", "BTCUSDT")
        .await
        .unwrap();
    assert_eq!(status.status, OrderStatus::PartiallyFilled);
    assert_eq!(status.executed_quantity, dec!(1));
    assert_eq!(status.executed_price, Some(dec!(39990)));
    assert_eq!(status.time_in_force, Some(TimeInForce::GTC));

    let request = transport.last_request().unwrap();
    assert!(request
        .path_and_query()
        .contains("instId=BTC-USDT&ordId=312269865356374016"));

    transport.respond(
        Method::GET,
        "/api/v5/trade/orders-algo-pending",
        ok(json!([])),
    );
    let open = connector.get_open_orders(Some("BTCUSDT")).await.unwrap();
    assert_eq!(open.len(), 1);
    let request = transport.requests_to("/api/v5/trade/orders-pending").remove(0);
    assert_eq!(
        request.path_and_query(),
        "/api/v5/trade/orders-pending?instType=SPOT&instId=BTC-USDT"
    );
}

fn trigger_order(algo_id: &str, state: &str) -> Value {
    json!({
        "instId": "ETH-USDT",
        "algoId": algo_id,
        "algoClOrdId": "mine",
        "side": "sell",
        "sz": "1",
        "triggerPx": "3100",
        "orderPx": "-1",
        "state": state,
        "actualSz": "",
        "actualPx": "",
        "cTime": "1704164645000",
        "uTime": ""
    })
}

#[tokio::test]
async fn test_stop_order_round_trip_through_algo_endpoints() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    transport.respond(
        Method::POST,
        "/api/v5/trade/order-algo",
        ok(json!([{"algoId": "681096944655273984", "algoClOrdId": "", "sCode": "0", "sMsg": ""}])),
    );
    transport.respond(
        Method::GET,
        "/api/v5/trade/order-algo",
        ok(json!([trigger_order("681096944655273984", "live")])),
    );
    transport.respond(
        Method::POST,
        "/api/v5/trade/cancel-algos",
        ok(json!([{"algoId": "681096944655273984", "sCode": "0", "sMsg": ""}])),
    );

    let placed = connector
        .place_order(OrderParams::stop("ETHUSDT", OrderSide::Sell, dec!(1), dec!(3100)))
        .await
        .unwrap();

    let status = connector
        .get_order_status(&placed.id, "ETHUSDT")
        .await
        .unwrap();
    assert_eq!(status.id, placed.id);
    assert_eq!(status.status, OrderStatus::New);
    assert_eq!(status.order_type, OrderType::Stop);
    assert_eq!(status.stop_price, Some(dec!(3100)));
    let request = transport.last_request().unwrap();
    assert_eq!(
        request.path_and_query(),
        "/api/v5/trade/order-algo?algoId=681096944655273984"
    );

    assert!(connector.cancel_order(&placed.id, "ETHUSDT").await.unwrap());
    let request = transport.last_request().unwrap();
    assert_eq!(request.url.path(), "/api/v5/trade/cancel-algos");
    let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(
        body,
        json!([{"algoId": "681096944655273984", "instId": "ETH-USDT"}])
    );

    assert!(transport.requests_to("/api/v5/trade/cancel-order").is_empty());
    assert!(transport.requests_to("/api/v5/trade/order").is_empty());
}

#[tokio::test]
async fn test_open_orders_include_untriggered_stops() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    transport.respond(
        Method::GET,
        "/api/v5/trade/orders-pending",
        ok(json!([{
            "instId": "ETH-USDT",
            "ordId": "312269865356374016",
            "clOrdId": "",
            "px": "3000",
            "sz": "2",
            "ordType": "limit",
            "side": "buy",
            "accFillSz": "0",
            "avgPx": "",
            "state": "live",
            "cTime": "1704164645000",
            "uTime": "1704164645000"
        }])),
    );
    transport.respond(
        Method::GET,
        "/api/v5/trade/orders-algo-pending",
        ok(json!([trigger_order("681096944655273984", "live")])),
    );

    let open = connector.get_open_orders(Some("ETHUSDT")).await.unwrap();
    let ids: Vec<&str> = open.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["312269865356374016", "algo:681096944655273984"]);
    assert_eq!(open[1].order_type, OrderType::Stop);
    assert_eq!(open[1].client_order_id.as_deref(), Some("mine"));

    let request = transport
        .requests_to("/api/v5/trade/orders-algo-pending")
        .remove(0);
    assert_eq!(
        request.path_and_query(),
        "/api/v5/trade/orders-algo-pending?ordType=trigger&instType=SPOT&instId=ETH-USDT"
    );
}

#[tokio::test]
async fn test_algo_cancel_failure_is_reported() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    transport.respond(
        Method::POST,
        "/api/v5/trade/cancel-algos",
        MockReply::json(
            200,
            json!({
                "code": "1",
                "msg": "Operation failed.",
                "data": [{"algoId": "681096944655273984", "sCode": "51400", "sMsg": "Cancellation failed as the order does not exist"}]
            }),
        ),
    );
    let err = connector
        .cancel_order("algo:681096944655273984", "ETHUSDT")
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ExchangeError::HttpError { .. }));

    let err = connector.cancel_order("algo:", "ETHUSDT").await.unwrap_err();
    assert!(matches!(err.kind(), ExchangeError::InvalidParameters(_)));
}

#[tokio::test]
async fn test_cancel_order_posts_inst_id() {
    let transport = Arc::new(MockTransport::new());
    let connector = connected(&transport).await;

    transport.respond(
        Method::POST,
        "/api/v5/trade/cancel-order",
        ok(json!([{"ordId": "312269865356374016", "sCode": "0", "sMsg": ""}])),
    );
    assert!(connector
        .cancel_order("312269865356374016", "BTCUSDT")
        .await
        .unwrap());

    let body: Value =
        serde_json::from_str(transport.last_request().unwrap().body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"instId": "BTC-USDT", "ordId": "312269865356374016"}));
}

#[tokio::test]
async fn test_market_data_from_single_ticker() {
    let transport = Arc::new(MockTransport::new());
    let connector = connector_with(&transport, false);

    transport.respond(
        Method::GET,
        "/api/v5/market/ticker",
        ok(json!([{
            "instId": "ETH-USDT",
            "last": "2200",
            "bidPx": "2199.9",
            "askPx": "2200.1",
            "open24h": "2000",
            "high24h": "2250",
            "low24h": "1990",
            "vol24h": "35000",
            "volCcy24h": "75000000",
            "ts": "1704164645000"
        }])),
    );

    let data = connector.get_market_data("ETHUSDT").await.unwrap();
    assert_eq!(data.symbol, "ETHUSDT");
    assert_eq!(data.exchange, "okx");
    assert_eq!(data.change_24h, dec!(10));
    assert_eq!(data.timestamp.timestamp(), 1_704_164_645);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_market_data_rejects_out_of_range_change() {
    let transport = Arc::new(MockTransport::new());
    let connector = connector_with(&transport, false);

    transport.respond(
        Method::GET,
        "/api/v5/market/ticker",
        ok(json!([{
            "instId": "SHIB-USDT",
            "last": "1000000000",
            "bidPx": "999999999",
            "askPx": "1000000001",
            "open24h": "0.00000000000000000001",
            "high24h": "1000000000",
            "low24h": "0.00000000000000000001",
            "vol24h": "1",
            "volCcy24h": "1",
            "ts": "1704164645000"
        }])),
    );

    let err = connector.get_market_data("SHIBUSDT").await.unwrap_err();
    assert!(matches!(err.kind(), ExchangeError::ParseError(_)));
}

#[tokio::test]
async fn test_market_data_retries_transient_failures() {
    let transport = Arc::new(MockTransport::new());
    let connector = connector_with(&transport, false);

    transport.respond(Method::GET, "/api/v5/market/ticker", MockReply::network_error());
    let err = connector.get_market_data("ETHUSDT").await.unwrap_err();

    assert!(matches!(err.kind(), ExchangeError::MarketDataError(_)));
    // One attempt plus three retries
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test]
async fn test_order_book_depth_and_ordering() {
    let transport = Arc::new(MockTransport::new());
    let connector = connector_with(&transport, true);

    transport.respond(
        Method::GET,
        "/api/v5/market/books",
        ok(json!([{
            "asks": [["41006.8", "0.6", "0", "1"], ["41006.3", "0.3", "0", "2"]],
            "bids": [["41006.1", "0.5", "0", "1"], ["41006.2", "0.1", "0", "3"]],
            "ts": "1704164645000"
        }])),
    );

    let book = connector.get_order_book("BTCUSDT", 1).await.unwrap();
    assert_eq!(book.bids.len(), 1);
    assert_eq!(book.bids[0].price, dec!(41006.2));
    assert_eq!(book.asks[0].price, dec!(41006.3));

    let request = transport.last_request().unwrap();
    assert_eq!(
        request.path_and_query(),
        "/api/v5/market/books?instId=BTC-USDT&sz=1"
    );
    assert_eq!(request.header("x-simulated-trading"), Some("1"));
}

#[tokio::test]
async fn test_not_connected_guard_and_failed_connect() {
    let transport = Arc::new(MockTransport::new());
    let mut connector = connector_with(&transport, false);

    let err = connector
        .place_order(OrderParams::market("BTCUSDT", OrderSide::Buy, dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ExchangeError::NotConnected));
    assert_eq!(transport.call_count(), 0);

    transport.respond(
        Method::GET,
        "/api/v5/account/balance",
        MockReply::json(401, json!({"code": "50113", "msg": "Invalid Sign", "data": []})),
    );
    transport.respond(
        Method::GET,
        "/api/v5/account/config",
        ok(json!([{"uid": "1", "perm": "read_only"}])),
    );
    let err = connector.connect(credentials()).await.unwrap_err();
    assert!(matches!(err.kind(), ExchangeError::ConnectionError(_)));
    assert_eq!(connector.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connect_requires_passphrase() {
    let transport = Arc::new(MockTransport::new());
    let mut connector = connector_with(&transport, false);

    let err = connector
        .connect(ExchangeCredentials::new("k".to_string(), "s".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ExchangeError::CredentialError(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_price_subscriptions_are_unsupported() {
    let transport = Arc::new(MockTransport::new());
    let connector = connector_with(&transport, false);
    let symbols = vec!["BTCUSDT".to_string()];

    assert!(!connector.subscribe_price_updates(&symbols, Arc::new(|_: tradelink::MarketData| {})));
    assert!(!connector.unsubscribe_price_updates(&symbols));
}
