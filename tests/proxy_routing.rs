//! End-to-end routing through the sidecar to mock upstreams.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde_json::Value;
use smart_router::routing::{Condition, Operator, RoutingRule};
use smart_router::{PluginConfig, RouterConfig};

mod common;

fn config_with_upstreams(proxy: SocketAddr, v1: SocketAddr, v2: SocketAddr) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.plugin = PluginConfig::sample();
    config.listener.bind_address = proxy.to_string();
    config.upstreams = BTreeMap::from([
        ("v1".to_string(), format!("http://{v1}")),
        ("v2".to_string(), format!("http://{v2}")),
    ]);
    config
}

#[tokio::test]
async fn test_routes_beta_tester_to_v2() {
    let v1: SocketAddr = "127.0.0.1:28381".parse().unwrap();
    let v2: SocketAddr = "127.0.0.1:28382".parse().unwrap();
    let proxy: SocketAddr = "127.0.0.1:28383".parse().unwrap();
    common::start_echo_backend(v1, "v1").await;
    common::start_echo_backend(v2, "v2").await;

    let config = config_with_upstreams(proxy, v1, v2);
    let (shutdown, _updates) = common::start_router(proxy, config).await;
    let client = common::client();

    let res = client
        .get(format!("http://{proxy}/api/items?page=2"))
        .header("User-Agent", "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)")
        .header("X-Geo-Country", "DE")
        .header("Cookie", "session=abc; beta-tester=true")
        .send()
        .await
        .expect("Router unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-smart-router"], "active");
    assert!(res.headers().contains_key("x-request-id"));

    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["backend"], "v2");
    assert_eq!(echo["path"], "/api/items?page=2");
    assert_eq!(echo["headers"]["x-route-target"], "v2");
    assert_eq!(echo["headers"]["x-routed-by"], "smart-router");
    // The rule's own X-Route-Reason replaces the rule name.
    assert_eq!(echo["headers"]["x-route-reason"], "beta-tester-match");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_request_goes_to_default() {
    let v1: SocketAddr = "127.0.0.1:28481".parse().unwrap();
    let v2: SocketAddr = "127.0.0.1:28482".parse().unwrap();
    let proxy: SocketAddr = "127.0.0.1:28483".parse().unwrap();
    common::start_echo_backend(v1, "v1").await;
    common::start_echo_backend(v2, "v2").await;

    let config = config_with_upstreams(proxy, v1, v2);
    let (shutdown, _updates) = common::start_router(proxy, config).await;
    let client = common::client();

    // Two of three beta conditions hold, and the hash is not a single digit.
    let res = client
        .get(format!("http://{proxy}/"))
        .header("User-Agent", "iPhone")
        .header("X-Geo-Country", "FR")
        .header("X-Request-Hash", "42")
        .header("X-Route-Target", "v2")
        .send()
        .await
        .expect("Router unreachable");

    assert_eq!(res.status(), 200);
    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["backend"], "v1");
    // A client-supplied route header is overwritten.
    assert_eq!(echo["headers"]["x-route-target"], "v1");
    assert_eq!(echo["headers"]["x-route-reason"], "default");

    shutdown.trigger();
}

#[tokio::test]
async fn test_reload_changes_routing() {
    let v1: SocketAddr = "127.0.0.1:28581".parse().unwrap();
    let v2: SocketAddr = "127.0.0.1:28582".parse().unwrap();
    let proxy: SocketAddr = "127.0.0.1:28583".parse().unwrap();
    common::start_echo_backend(v1, "v1").await;
    common::start_echo_backend(v2, "v2").await;

    let config = config_with_upstreams(proxy, v1, v2);
    let (shutdown, updates) = common::start_router(proxy, config).await;
    let client = common::client();

    let res = client
        .get(format!("http://{proxy}/premium?user_type=premium"))
        .header("X-Debug", "1")
        .send()
        .await
        .unwrap();
    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["backend"], "v1");

    let mut config = config_with_upstreams(proxy, v1, v2);
    config.plugin.rules.push(RoutingRule {
        name: "premium".to_string(),
        priority: 0,
        conditions: vec![Condition::query("user_type", Operator::Equals, "premium")],
        target: "v2".to_string(),
        add_headers: BTreeMap::from([("X-Tier".to_string(), "gold".to_string())]),
        remove_headers: vec!["X-Debug".to_string()],
    });
    updates.send(config).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client
        .get(format!("http://{proxy}/premium?user_type=premium"))
        .header("X-Debug", "1")
        .send()
        .await
        .unwrap();
    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["backend"], "v2");
    assert_eq!(echo["headers"]["x-route-reason"], "premium");
    assert_eq!(echo["headers"]["x-tier"], "gold");
    assert!(echo["headers"].get("x-debug").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_upstream_is_bad_gateway() {
    let v1: SocketAddr = "127.0.0.1:28681".parse().unwrap();
    let proxy: SocketAddr = "127.0.0.1:28683".parse().unwrap();
    common::start_echo_backend(v1, "v1").await;

    let mut config = RouterConfig::default();
    config.plugin = PluginConfig::sample();
    config.upstreams = BTreeMap::from([("v1".to_string(), format!("http://{v1}"))]);

    let (shutdown, _updates) = common::start_router(proxy, config).await;
    let client = common::client();

    // The canary rule picks v2, which has no upstream.
    let res = client
        .get(format!("http://{proxy}/"))
        .header("X-Request-Hash", "7")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(res.headers()["x-smart-router"], "active");

    shutdown.trigger();
}

#[tokio::test]
async fn test_decision_endpoint_does_not_forward() {
    let proxy: SocketAddr = "127.0.0.1:28783".parse().unwrap();
    let mut config = RouterConfig::default();
    config.plugin = PluginConfig::sample();

    let (shutdown, _updates) = common::start_router(proxy, config).await;
    let client = common::client();

    let res = client
        .get(format!("http://{proxy}/_smart-router/decision"))
        .header("X-Request-Hash", "3")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let decision: Value = res.json().await.unwrap();
    assert_eq!(decision["target"], "v2");
    assert_eq!(decision["matched_rule"], "canary");
    assert_eq!(decision["add_headers"]["X-Route-Reason"], "canary");

    shutdown.trigger();
}
