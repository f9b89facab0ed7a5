use httpmock::prelude::*;
use pinpoint_core::{
    Bridge, Coordinate, NominatimClient, ResolveError, ResolverConfig, ReverseGeocoder,
    NO_PLACE_NAME,
};
use serde_json::json;
use std::time::{Duration, Instant};

fn config_for(server: &MockServer) -> ResolverConfig {
    ResolverConfig {
        endpoint: server.url("/reverse"),
        min_interval: Duration::ZERO,
        ..ResolverConfig::default()
    }
}

fn xian() -> Coordinate {
    Coordinate::new(34.26, 108.95).unwrap()
}

#[test]
fn test_sends_expected_request_once() {
    let server = MockServer::start();
    let config = config_for(&server);
    let user_agent = config.user_agent.clone();

    let reverse_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/reverse")
            .query_param("format", "json")
            .query_param("lat", "34.26")
            .query_param("lon", "108.95")
            .query_param("zoom", "10")
            .query_param("addressdetails", "1")
            .header("User-Agent", user_agent.as_str());
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "display_name": "Xi'an, Shaanxi, China",
                "address": {
                    "city": "Xi'an",
                    "town": "Ignored Town",
                    "village": "Ignored Village",
                    "locality": "Ignored Locality",
                    "country": "China"
                }
            }));
    });

    let client = NominatimClient::new(config).unwrap();
    let place = client.reverse(xian()).unwrap();

    reverse_mock.assert();
    assert_eq!(place, Some("Xi'an".to_string()));
}

#[test]
fn test_locality_fallback() {
    let server = MockServer::start();
    let reverse_mock = server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200)
            .json_body(json!({"address": {"locality": "Hundred Mile", "state": "British Columbia"}}));
    });

    let client = NominatimClient::new(config_for(&server)).unwrap();
    let place = client
        .reverse(Coordinate::new(51.64, -121.29).unwrap())
        .unwrap();

    reverse_mock.assert();
    assert_eq!(place, Some("Hundred Mile".to_string()));
}

#[test]
fn test_empty_address_has_no_place_name() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(json!({"address": {}}));
    });

    let client = NominatimClient::new(config_for(&server)).unwrap();
    assert_eq!(client.reverse(xian()).unwrap(), None);
}

#[test]
fn test_malformed_body_has_no_place_name() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).body("<html>maintenance</html>");
    });

    let client = NominatimClient::new(config_for(&server)).unwrap();
    assert_eq!(client.reverse(xian()).unwrap(), None);
}

#[test]
fn test_non_success_status_is_an_error() {
    let server = MockServer::start();
    let reverse_mock = server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(503);
    });

    let client = NominatimClient::new(config_for(&server)).unwrap();
    let result = client.reverse(xian());

    reverse_mock.assert();
    assert!(matches!(result, Err(ResolveError::Status(503))));
}

#[test]
fn test_timeout_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({"address": {"city": "Too Late"}}));
    });

    let config = ResolverConfig {
        timeout: Duration::from_millis(200),
        ..config_for(&server)
    };
    let client = NominatimClient::new(config).unwrap();

    assert!(matches!(client.reverse(xian()), Err(ResolveError::Timeout)));
}

#[test]
fn test_connection_failure_is_reported() {
    let config = ResolverConfig {
        endpoint: "http://127.0.0.1:9/reverse".to_string(),
        timeout: Duration::from_secs(2),
        ..ResolverConfig::default()
    };
    let client = NominatimClient::new(config).unwrap();

    assert!(matches!(
        client.reverse(xian()),
        Err(ResolveError::Transport(_)) | Err(ResolveError::Timeout)
    ));
}

#[test]
fn test_bridge_end_to_end() {
    let server = MockServer::start();
    let reverse_mock = server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(json!({"address": {"town": "Lintong"}}));
    });

    let client = NominatimClient::new(config_for(&server)).unwrap();
    let mut bridge = Bridge::spawn(client, || {}).unwrap();
    bridge.submit(Coordinate::new(34.37, 109.21).unwrap());

    let deadline = Instant::now() + Duration::from_secs(5);
    let resolution = loop {
        if let Some(resolution) = bridge.poll() {
            break resolution;
        }
        assert!(Instant::now() < deadline, "no resolution within 5s");
        std::thread::sleep(Duration::from_millis(10));
    };

    reverse_mock.assert();
    assert_eq!(resolution.summary(), "Lintong");
    assert_ne!(resolution.summary(), NO_PLACE_NAME);
}

#[test]
fn test_bridge_spaces_requests_by_configured_interval() {
    let server = MockServer::start();
    let reverse_mock = server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(json!({"address": {"city": "Xi'an"}}));
    });

    let config = ResolverConfig {
        min_interval: Duration::from_millis(300),
        ..config_for(&server)
    };
    let client = NominatimClient::new(config).unwrap();
    assert_eq!(client.min_interval(), Duration::from_millis(300));

    let mut bridge = Bridge::spawn(client, || {}).unwrap();
    let wait_for_result = |bridge: &mut Bridge| {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(resolution) = bridge.poll() {
                break resolution;
            }
            assert!(Instant::now() < deadline, "no resolution within 5s");
            std::thread::sleep(Duration::from_millis(10));
        }
    };

    let start = Instant::now();
    bridge.submit(xian());
    assert_eq!(wait_for_result(&mut bridge).seq, 1);
    bridge.submit(xian());
    assert_eq!(wait_for_result(&mut bridge).seq, 2);

    assert!(start.elapsed() >= Duration::from_millis(300));
    reverse_mock.assert_hits(2);
}
