#![allow(clippy::unwrap_used)]
// Integration tests for `DashboardClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stackport_api::{DashboardClient, Error, SwitchPortUpdate, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DashboardClient) {
    let server = MockServer::start().await;
    let client =
        DashboardClient::from_reqwest(&format!("{}/api/v1", server.uri()), reqwest::Client::new())
            .unwrap();
    (server, client)
}

fn access_update() -> SwitchPortUpdate {
    SwitchPortUpdate {
        name: Some("Printer".into()),
        enabled: true,
        port_type: "access".into(),
        vlan: 20,
        voice_vlan: Some(30),
        allowed_vlans: "1-1000".into(),
        poe_enabled: true,
        isolation_enabled: false,
        rstp_enabled: true,
        stp_guard: "bpdu guard".into(),
        link_negotiation: "Auto negotiate".into(),
    }
}

// ── Port inventory ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_switch_ports() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/Q2AB-CDEF-0001/switch/ports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "portId": "1", "name": null, "enabled": true, "type": "access", "vlan": 1 },
            { "portId": "2", "enabled": false, "type": "trunk", "vlan": 10 },
        ])))
        .mount(&server)
        .await;

    let ports = client.list_switch_ports("Q2AB-CDEF-0001").await.unwrap();

    assert_eq!(ports.len(), 2);
    assert_eq!(ports[0].port_id, "1");
    assert_eq!(ports[1].port_type.as_deref(), Some("trunk"));
    assert_eq!(ports[1].vlan.as_deref(), Some("10"));
}

#[tokio::test]
async fn test_update_switch_port_sends_full_body() {
    let (server, client) = setup().await;
    let update = access_update();

    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/Q2AB-CDEF-0001/switch/ports/5"))
        .and(body_json(json!({
            "name": "Printer",
            "enabled": true,
            "type": "access",
            "vlan": 20,
            "voiceVlan": 30,
            "allowedVlans": "1-1000",
            "poeEnabled": true,
            "isolationEnabled": false,
            "rstpEnabled": true,
            "stpGuard": "bpdu guard",
            "linkNegotiation": "Auto negotiate",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "portId": "5", "name": "Printer" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let port = client
        .update_switch_port("Q2AB-CDEF-0001", "5", &update)
        .await
        .unwrap();
    assert_eq!(port.port_id, "5");
    assert_eq!(port.name.as_deref(), Some("Printer"));
}

#[tokio::test]
async fn test_list_port_statuses() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/Q2AB-CDEF-0001/switch/ports/statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "portId": "1", "enabled": true, "status": "Connected" },
            { "portId": "2", "enabled": true, "status": "Disconnected" },
        ])))
        .mount(&server)
        .await;

    let statuses = client.list_port_statuses("Q2AB-CDEF-0001").await.unwrap();
    assert!(statuses[0].is_connected());
    assert!(!statuses[1].is_connected());
}

#[tokio::test]
async fn test_list_device_clients_passes_timespan() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/Q2AB-CDEF-0001/clients"))
        .and(query_param("timespan", "86400"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "k1", "mac": "00:11:22:33:44:55", "vlan": 20, "switchport": "3" },
        ])))
        .mount(&server)
        .await;

    let clients = client
        .list_device_clients("Q2AB-CDEF-0001", Duration::from_secs(86_400))
        .await
        .unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].switchport.as_deref(), Some("3"));
    assert_eq!(clients[0].vlan.as_deref(), Some("20"));
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_header_is_sent() {
    let server = MockServer::start().await;
    let base = Url::parse(&format!("{}/api/v1", server.uri())).unwrap();
    let key = SecretString::from("abc123".to_string());
    let client = DashboardClient::new(base, &key, &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/S1/switch/ports"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let ports = client.list_switch_ports("S1").await.unwrap();
    assert!(ports.is_empty());
}

// ── Error handling ──────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/S1/switch/ports"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "errors": ["Invalid API key"] })),
        )
        .mount(&server)
        .await;

    let result = client.list_switch_ports("S1").await;
    assert!(
        matches!(result, Err(Error::InvalidApiKey)),
        "expected InvalidApiKey, got: {result:?}"
    );
}

#[tokio::test]
async fn test_error_body_is_surfaced() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/S1/switch/ports/9"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": ["'vlan' must be between 1 and 4094"]
        })))
        .mount(&server)
        .await;

    let err = client
        .update_switch_port("S1", "9", &access_update())
        .await
        .unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("between 1 and 4094"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_serial() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/NOPE/switch/ports"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let err = client.list_switch_ports("NOPE").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/S1/switch/ports/statuses"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = client.list_port_statuses("S1").await.unwrap_err();
    assert!(matches!(err, Error::RateLimited { retry_after_secs: 7 }));
    assert!(err.is_transient());
}
