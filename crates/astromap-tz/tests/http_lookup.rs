//! Integration tests for `HttpTimezoneLookup` and the full local-time
//! pipeline using wiremock HTTP mocks.

use std::sync::Arc;

use astromap_core::BirthMoment;
use astromap_tz::{HttpTimezoneLookup, LookupError, TimeError, TimeNormalizer, TimezoneLookup};
use chrono::NaiveDate;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_lookup(base_url: &str) -> HttpTimezoneLookup {
    HttpTimezoneLookup::new(base_url, 5, "astromap-test/0.1")
        .expect("client construction should not fail")
}

#[tokio::test]
async fn resolves_zone_from_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/TimeZone/coordinate"))
        .and(query_param("latitude", "41.8781"))
        .and(query_param("longitude", "-87.6298"))
        .and(header("user-agent", "astromap-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timeZone": "America/Chicago",
            "currentLocalTime": "2024-01-01T06:00:00",
            "hasDayLightSaving": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tz = test_lookup(&server.uri())
        .resolve(41.8781, -87.6298)
        .await
        .expect("lookup should succeed");
    assert_eq!(tz.as_deref(), Some("America/Chicago"));
}

#[tokio::test]
async fn not_found_means_no_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/TimeZone/coordinate"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let tz = test_lookup(&server.uri())
        .resolve(-45.0, -140.0)
        .await
        .expect("404 is not an error");
    assert!(tz.is_none());
}

#[tokio::test]
async fn bad_request_for_unplaceable_coordinates_means_no_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/TimeZone/coordinate"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Invalid coordinates: no timezone found"),
        )
        .mount(&server)
        .await;

    let tz = test_lookup(&server.uri())
        .resolve(-48.8767, -123.3933)
        .await
        .expect("400 is not an error");
    assert!(tz.is_none());
}

#[tokio::test]
async fn rate_limiting_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = test_lookup(&server.uri())
        .resolve(41.8781, -87.6298)
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn null_or_blank_zone_means_no_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/TimeZone/coordinate"))
        .and(query_param("latitude", "-45"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timeZone": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/TimeZone/coordinate"))
        .and(query_param("latitude", "-46"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timeZone": "  "
        })))
        .mount(&server)
        .await;

    let lookup = test_lookup(&server.uri());
    assert!(lookup.resolve(-45.0, -140.0).await.expect("ok").is_none());
    assert!(lookup.resolve(-46.0, -140.0).await.expect("ok").is_none());
}

#[tokio::test]
async fn server_error_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_lookup(&server.uri())
        .resolve(0.0, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_lookup(&server.uri())
        .resolve(0.0, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Deserialize { .. }), "got {err:?}");
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/TimeZone/coordinate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timeZone": "Europe/London"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tz = test_lookup(&format!("{}/api", server.uri()))
        .resolve(51.5074, -0.1278)
        .await
        .expect("lookup");
    assert_eq!(tz.as_deref(), Some("Europe/London"));
}

#[tokio::test]
async fn chicago_birth_moment_normalizes_through_http_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/TimeZone/coordinate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timeZone": "America/Chicago"
        })))
        .mount(&server)
        .await;

    let normalizer = TimeNormalizer::new(Arc::new(test_lookup(&server.uri())));
    let local = NaiveDate::from_ymd_opt(1992, 11, 3)
        .and_then(|d| d.and_hms_opt(14, 45, 0))
        .expect("valid date");
    let moment = BirthMoment::new(local, 41.8781, -87.6298).expect("moment");

    let out = normalizer.normalize(&moment).await.expect("normalize");
    assert_eq!(out.timezone.name(), "America/Chicago");
    assert!((out.time.julian_day() - 2_448_930.364_583_3).abs() < 1e-6);
}

#[tokio::test]
async fn ocean_point_aborts_normalization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let normalizer = TimeNormalizer::new(Arc::new(test_lookup(&server.uri())));
    let local = NaiveDate::from_ymd_opt(1992, 11, 3)
        .and_then(|d| d.and_hms_opt(14, 45, 0))
        .expect("valid date");
    let moment = BirthMoment::new(local, -48.8767, -123.3933).expect("moment");

    let err = normalizer.normalize(&moment).await.unwrap_err();
    assert!(matches!(err, TimeError::TimezoneResolution { .. }));
}

#[tokio::test]
async fn bad_request_from_service_aborts_normalization_as_unresolved() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let normalizer = TimeNormalizer::new(Arc::new(test_lookup(&server.uri())));
    let local = NaiveDate::from_ymd_opt(1992, 11, 3)
        .and_then(|d| d.and_hms_opt(14, 45, 0))
        .expect("valid date");
    let moment = BirthMoment::new(local, -48.8767, -123.3933).expect("moment");

    let err = normalizer.normalize(&moment).await.unwrap_err();
    assert!(matches!(err, TimeError::TimezoneResolution { .. }), "got {err:?}");
}
