//! End-to-end dispatch over the hyper transport.
//!
//! Wires up: mock directory → `SellerClient` → mock gateways, and checks
//! failover order, envelope shape and error classification on the wire.

use std::time::Duration;

use httpmock::prelude::*;
use seller_client::{
    Credentials, DEFAULT_USER_AGENT, RpcConfig, RpcError, RpcErrorKind, SelectionPolicy,
    SellerClient, SellerError,
};
use serde_json::json;

/// Nothing listens here; connections are refused immediately.
const DEAD_GATEWAY: &str = "ws://127.0.0.1:1";

fn ws_address(server: &MockServer) -> String {
    format!("ws://{}", server.address())
}

fn directory_listing<'a>(directory: &'a MockServer, gateways: &[String]) -> httpmock::Mock<'a> {
    let body = serde_json::to_string(gateways).unwrap();
    directory.mock(|when, then| {
        when.method(GET).path("/shop-1");
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

fn client(directory: &MockServer) -> SellerClient {
    client_with(RpcConfig::for_testing(directory.base_url()))
}

fn client_with(config: RpcConfig) -> SellerClient {
    let credentials = Credentials::new("shop-1", "s3cret").unwrap();
    SellerClient::new(credentials, config).unwrap()
}

fn reply<'a>(gateway: &'a MockServer, status: u16, body: &str) -> httpmock::Mock<'a> {
    let body = body.to_owned();
    gateway.mock(|when, then| {
        when.method(POST).path("/seller-proxy");
        then.status(status)
            .header("content-type", "application/json")
            .body(body);
    })
}

#[tokio::test]
async fn failover_skips_unreachable_and_failing_gateways() {
    let directory = MockServer::start();
    let failing = MockServer::start();
    let healthy = MockServer::start();

    let lookup = directory_listing(
        &directory,
        &[
            DEAD_GATEWAY.to_owned(),
            ws_address(&failing),
            ws_address(&healthy),
        ],
    );
    let failing_mock = reply(&failing, 503, "overloaded");
    let healthy_mock = reply(&healthy, 200, r#"{"result": 42, "error": null}"#);

    let qty = client(&directory).get_stock_quantity(1001).await.unwrap();

    assert_eq!(qty, 42);
    lookup.assert_calls(1);
    failing_mock.assert_calls(1);
    healthy_mock.assert_calls(1);
}

#[tokio::test]
async fn envelope_is_posted_as_json() {
    let directory = MockServer::start();
    let gateway = MockServer::start();
    directory_listing(&directory, &[ws_address(&gateway)]);

    let gateway_mock = gateway.mock(|when, then| {
        when.method(POST)
            .path("/seller-proxy")
            .header("content-type", "application/json")
            .header("user-agent", DEFAULT_USER_AGENT)
            .json_body(json!({
                "app-id": "shop-1",
                "app-secret": "s3cret",
                "fn-name": "set-stock-quantity",
                "fn-arg": {"sku": 5, "qty": 0},
            }));
        then.status(200).body(r#"{"result": true}"#);
    });

    client(&directory).set_stock_quantity(5, 0).await.unwrap();
    gateway_mock.assert_calls(1);
}

#[tokio::test]
async fn remote_error_is_not_retried() {
    let directory = MockServer::start();
    let first = MockServer::start();
    let second = MockServer::start();
    directory_listing(&directory, &[ws_address(&first), ws_address(&second)]);

    let first_mock = reply(&first, 200, r#"{"result": null, "error": "unknown sku"}"#);
    let second_mock = reply(&second, 200, r#"{"result": 1}"#);

    let err = client(&directory).get_sku_info(99).await.unwrap_err();

    match err {
        SellerError::Rpc(RpcError::RemoteError { message }) => assert_eq!(message, "unknown sku"),
        other => panic!("expected RemoteError, got {other:?}"),
    }
    first_mock.assert_calls(1);
    second_mock.assert_calls(0);
}

#[tokio::test]
async fn malformed_envelope_fails_over() {
    let directory = MockServer::start();
    let broken = MockServer::start();
    let healthy = MockServer::start();
    directory_listing(&directory, &[ws_address(&broken), ws_address(&healthy)]);

    reply(&broken, 200, "<html>maintenance</html>");
    let healthy_mock = reply(
        &healthy,
        200,
        r#"{"result": {"skus": [7, 3, 7], "qtys": [10, 20, 99]}}"#,
    );

    let cart = client(&directory).get_cart(42).await.unwrap();

    assert_eq!(cart.skus().collect::<Vec<_>>(), vec![7, 3]);
    assert_eq!(cart.get(7), Some(&99));
    assert_eq!(cart.get(3), Some(&20));
    healthy_mock.assert_calls(1);
}

#[tokio::test]
async fn all_gateways_unreachable_lists_every_attempt() {
    let directory = MockServer::start();
    let failing = MockServer::start();
    directory_listing(&directory, &[DEAD_GATEWAY.to_owned(), ws_address(&failing)]);
    reply(&failing, 500, "boom");

    let err = client(&directory).empty_cart(1).await.unwrap_err();

    match err {
        SellerError::Rpc(RpcError::AllGatewaysUnreachable { failures }) => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].gateway, "http://127.0.0.1:1/seller-proxy");
            assert!(failures[1].reason.contains("500"), "{}", failures[1].reason);
        }
        other => panic!("expected AllGatewaysUnreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_gateway_list_is_unreachable() {
    let directory = MockServer::start();
    let lookup = directory_listing(&directory, &[]);

    let err = client(&directory).reset_all_purchase_histories().await.unwrap_err();

    assert_eq!(err.rpc_kind(), Some(RpcErrorKind::AllGatewaysUnreachable));
    lookup.assert_calls(1);
}

#[tokio::test]
async fn directory_failure_attempts_no_gateway() {
    let directory = MockServer::start();
    let gateway = MockServer::start();
    directory.mock(|when, then| {
        when.method(GET).path("/shop-1");
        then.status(500).body("directory down");
    });
    let gateway_mock = reply(&gateway, 200, r#"{"result": 1}"#);

    let err = client(&directory).get_cart_duration_seconds().await.unwrap_err();

    assert_eq!(err.rpc_kind(), Some(RpcErrorKind::DirectoryUnavailable));
    gateway_mock.assert_calls(0);
}

#[tokio::test]
async fn directory_garbage_is_unavailable() {
    let directory = MockServer::start();
    directory.mock(|when, then| {
        when.method(GET).path("/shop-1");
        then.status(200).body(r#"{"gateways": "nope"}"#);
    });

    let err = client(&directory).get_auth_token_url().await.unwrap_err();
    assert_eq!(err.rpc_kind(), Some(RpcErrorKind::DirectoryUnavailable));
}

#[tokio::test]
async fn validation_failure_touches_no_server() {
    let directory = MockServer::start();
    let gateway = MockServer::start();
    let lookup = directory_listing(&directory, &[ws_address(&gateway)]);
    let gateway_mock = reply(&gateway, 200, r#"{"result": true}"#);

    let client = client(&directory);
    assert!(client.set_stock_quantity(5, -1).await.unwrap_err().is_validation());
    assert!(client.get_stock_quantities(vec![]).await.unwrap_err().is_validation());
    assert!(
        client
            .set_stock_quantities([(1, 3), (2, -1)])
            .await
            .unwrap_err()
            .is_validation()
    );

    lookup.assert_calls(0);
    gateway_mock.assert_calls(0);
}

#[tokio::test]
async fn random_pick_uses_one_gateway() {
    let directory = MockServer::start();
    let gateway = MockServer::start();
    directory_listing(&directory, &[ws_address(&gateway)]);
    let gateway_mock = reply(&gateway, 200, r#"{"result": "https://shop.example.com/auth"}"#);

    let config = RpcConfig::for_testing(directory.base_url())
        .with_selection(SelectionPolicy::RandomPick);
    let url = client_with(config).get_auth_token_url().await.unwrap();

    assert_eq!(url, "https://shop.example.com/auth");
    gateway_mock.assert_calls(1);
}

#[tokio::test]
async fn total_timeout_bounds_the_dispatch() {
    let directory = MockServer::start();
    let slow = MockServer::start();
    directory_listing(&directory, &[ws_address(&slow)]);
    slow.mock(|when, then| {
        when.method(POST).path("/seller-proxy");
        then.status(200)
            .delay(Duration::from_secs(2))
            .body(r#"{"result": 1}"#);
    });

    let config = RpcConfig::for_testing(directory.base_url())
        .with_total_timeout(Duration::from_millis(200));
    let err = client_with(config).get_cart_duration_seconds().await.unwrap_err();

    assert_eq!(err.rpc_kind(), Some(RpcErrorKind::DeadlineExceeded));
}
