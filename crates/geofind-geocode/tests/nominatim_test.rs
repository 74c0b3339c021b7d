//! Nominatim geocoder against a mock HTTP server.

use geofind_core::{Error, Geocoder};
use geofind_geocode::{GeocoderConfig, NominatimGeocoder};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geocoder_for(server: &MockServer) -> NominatimGeocoder {
    NominatimGeocoder::new(GeocoderConfig {
        base_url: server.uri(),
        user_agent: "LocationFinder/1.0".to_string(),
        timeout_secs: 5,
    })
    .expect("valid config")
}

#[tokio::test]
async fn test_geocode_sends_expected_request_and_maps_fields() {
    let server = MockServer::start().await;

    let body = serde_json::json!([{
        "lat": "51.5033635",
        "lon": "-0.1276248",
        "display_name": "10 Downing Street, Westminster, London, SW1A 2AA, United Kingdom",
        "type": "house",
        "importance": 0.72,
        "address": {
            "town": "Westminster",
            "state": "England",
            "country": "United Kingdom",
            "postcode": "SW1A 2AA"
        }
    }]);

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "10 Downing Street"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(query_param("addressdetails", "1"))
        .and(header("User-Agent", "LocationFinder/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let candidate = geocoder_for(&server)
        .geocode("10 Downing Street")
        .await
        .expect("geocode")
        .expect("one candidate");

    assert_eq!(candidate.latitude, 51.5033635);
    assert_eq!(candidate.longitude, -0.1276248);
    assert_eq!(
        candidate.display_name,
        "10 Downing Street, Westminster, London, SW1A 2AA, United Kingdom"
    );
    assert_eq!(candidate.place_type.as_deref(), Some("house"));
    assert_eq!(candidate.importance, Some(0.72));
    assert_eq!(candidate.city.as_deref(), Some("Westminster"));
    assert_eq!(candidate.state.as_deref(), Some("England"));
    assert_eq!(candidate.country.as_deref(), Some("United Kingdom"));
    assert_eq!(candidate.postal_code.as_deref(), Some("SW1A 2AA"));
}

#[tokio::test]
async fn test_geocode_empty_result_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let result = geocoder_for(&server).geocode("Atlantis").await.expect("geocode");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_geocode_server_error_is_geocoding_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = geocoder_for(&server).geocode("Paris").await.unwrap_err();
    match err {
        Error::Geocoding(msg) => assert!(msg.contains("503")),
        other => panic!("expected geocoding error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_geocode_malformed_coordinate_is_geocoding_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "lat": "not-a-number",
            "lon": "2.35",
            "display_name": "Broken"
        }])))
        .mount(&server)
        .await;

    let err = geocoder_for(&server).geocode("Broken").await.unwrap_err();
    assert!(matches!(err, Error::Geocoding(_)));
}

#[tokio::test]
async fn test_geocode_non_json_body_is_geocoding_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = geocoder_for(&server).geocode("Paris").await.unwrap_err();
    assert!(matches!(err, Error::Geocoding(_)));
}

#[tokio::test]
async fn test_geocode_unreachable_server_is_geocoding_error() {
    let geocoder = NominatimGeocoder::new(GeocoderConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        user_agent: "LocationFinder/1.0".to_string(),
        timeout_secs: 2,
    })
    .expect("valid config");

    let err = geocoder.geocode("Paris").await.unwrap_err();
    assert!(matches!(err, Error::Geocoding(_)));
}
