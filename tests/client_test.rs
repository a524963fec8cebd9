use std::time::Duration;

use futures::future;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inventory_forecast_client::config::ApiConfig;
use inventory_forecast_client::models::forecast::ForecastParams;
use inventory_forecast_client::services::forecast::{ForecastApiError, ForecastClient};

// 1x1 transparent PNG.
const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

fn test_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        api_base_url: base_url.to_string(),
        api_timeout_ms: 2_000,
        health_timeout_ms: 500,
        forecast_retries: 2,
        plot_retries: 1,
        retry_base_delay_ms: 10,
    }
}

fn client_for(server: &MockServer) -> ForecastClient {
    ForecastClient::new(&test_config(&server.uri())).expect("client should build")
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "Reorder Point": 120.0,
        "Safety Stock": 45.0,
        "Minimum Level": 30.0,
        "Maximum Level": 300.0,
        "Forecast": [
            {"date": "2026-08-01", "demand": 42.0},
            {"date": "2026-08-02", "demand": 38.0},
        ],
        "Warnings": ["Lead time variance is high"],
    })
}

fn plot_body() -> serde_json::Value {
    serde_json::json!({"plot_data": {"image": PNG_BASE64}})
}

#[tokio::test]
async fn forecast_sends_normalized_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forecast"))
        .and(body_partial_json(serde_json::json!({
            "product_id": "P017",
            "days": 30,
            "category": "A",
            "region": "North",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = ForecastParams::for_product("  P017  ");
    params.days = Some(45.0);
    params.category = Some("unknown".to_string());

    let response = tokio_test::assert_ok!(client_for(&server).get_forecast(&params).await);
    assert_eq!(response.reorder_point, Some(120.0));
    assert_eq!(response.forecast.len(), 2);
    assert_eq!(response.warnings.len(), 1);
}

#[tokio::test]
async fn forecast_retries_server_errors_until_success() {
    let server = MockServer::start().await;

    // First two calls fail with 503, the third succeeds.
    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let response = tokio_test::assert_ok!(
        client_for(&server)
            .get_forecast(&ForecastParams::for_product("P017"))
            .await
    );
    assert_eq!(response.safety_stock, Some(45.0));
}

#[tokio::test]
async fn forecast_does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Unknown product"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let error = client_for(&server)
        .get_forecast_with_retries(&ForecastParams::for_product("P404"), 3)
        .await
        .unwrap_err();

    assert!(error.is_client_error());
    assert!(!error.is_transient());
    assert_eq!(error.user_message(), "Unknown product");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn exhausted_retries_surface_the_last_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.forecast_retries = 1;
    let client = ForecastClient::new(&config).unwrap();

    let error = client
        .get_forecast(&ForecastParams::for_product("P017"))
        .await
        .unwrap_err();

    assert!(error.is_server_error());
    assert_eq!(
        error.user_message(),
        "Server is temporarily unavailable. Please try again later."
    );
}

#[tokio::test]
async fn missing_product_id_fails_before_any_request() {
    let server = MockServer::start().await;

    let error = client_for(&server)
        .get_forecast(&ForecastParams::default())
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Product ID is required");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_body_is_an_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let error = client_for(&server)
        .get_forecast(&ForecastParams::for_product("P017"))
        .await
        .unwrap_err();

    assert!(matches!(error, ForecastApiError::InvalidResponse));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn null_body_is_an_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("null", "application/json"))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .get_forecast(&ForecastParams::for_product("P017"))
        .await
        .unwrap_err();

    assert!(matches!(error, ForecastApiError::InvalidResponse));
}

#[tokio::test]
async fn slow_responses_classify_as_timeouts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.api_timeout_ms = 50;
    config.forecast_retries = 0;
    let client = ForecastClient::new(&config).unwrap();

    let error = client
        .get_forecast(&ForecastParams::for_product("P017"))
        .await
        .unwrap_err();

    assert!(error.is_timeout());
    assert!(error.is_transient());
    assert_eq!(
        error.user_message(),
        "Request timed out. The server may be busy, please try again."
    );
}

#[tokio::test]
async fn unreachable_host_classifies_as_network_error() {
    let mut config = test_config("http://127.0.0.1:9");
    config.forecast_retries = 0;
    let client = ForecastClient::new(&config).unwrap();

    let error = client
        .get_forecast(&ForecastParams::for_product("P017"))
        .await
        .unwrap_err();

    assert!(error.is_network_error());
    assert_eq!(
        error.user_message(),
        "Unable to connect to the server. Please check your internet connection."
    );
}

#[tokio::test]
async fn plot_round_trip_decodes_png() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plot_body()))
        .expect(1)
        .mount(&server)
        .await;

    let plot = tokio_test::assert_ok!(client_for(&server).get_plot().await);
    let bytes = plot.png_bytes().unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn plot_retries_once_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plot"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/plot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plot_body()))
        .expect(1)
        .mount(&server)
        .await;

    tokio_test::assert_ok!(client_for(&server).get_plot().await);
}

#[tokio::test]
async fn missing_plot_body_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plot"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("null", "application/json"))
        .mount(&server)
        .await;

    let error = client_for(&server).get_plot().await.unwrap_err();
    assert!(matches!(error, ForecastApiError::InvalidResponse));
}

#[tokio::test]
async fn health_check_reports_ok_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client_for(&server).health_check().await);
}

#[tokio::test]
async fn health_check_false_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!client_for(&server).health_check().await);
}

#[tokio::test]
async fn health_check_false_when_unreachable() {
    let client = ForecastClient::new(&test_config("http://127.0.0.1:9")).unwrap();
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn health_check_false_on_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.health_timeout_ms = 50;
    let client = ForecastClient::new(&config).unwrap();

    assert!(!client.health_check().await);
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/plot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plot_body()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (forecast, plot) = future::join(
        client.get_forecast(&ForecastParams::for_product("P017")),
        client.get_plot(),
    )
    .await;

    assert!(forecast.is_ok());
    assert!(plot.is_ok());
}
