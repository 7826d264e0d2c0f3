mod common;

use common::{CannedResponse, serve, unused_base_url};
use forecast_dashboard::application::payload_builder;
use forecast_dashboard::domain::errors::ApiError;
use forecast_dashboard::domain::forecast::{Horizon, Window};
use forecast_dashboard::domain::ohlcv::{History, OhlcvRecord};
use forecast_dashboard::domain::ports::{ForecastApi, ResponseBody};
use forecast_dashboard::infrastructure::forecast_api::{ForecastApiClient, HttpMethod};
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::time::Duration;

fn client(base_url: &str) -> ForecastApiClient {
    ForecastApiClient::new(base_url, Duration::from_secs(5))
}

#[tokio::test]
async fn test_unreachable_host_returns_error_not_panic() {
    let base = unused_base_url().await;
    let call = client(&base).health().await;

    assert!(call.body().is_none());
    assert!(call.elapsed_secs() >= 0.0);
    assert!(matches!(call.outcome, Err(ApiError::Connection { .. })));
    assert!(!call.error_message().unwrap().is_empty());
}

#[tokio::test]
async fn test_json_body_decoded() {
    let server = serve(CannedResponse::json(200, json!({"status": "ok"}))).await;
    let call = client(&server.base_url).health().await;

    assert_eq!(call.body(), Some(&ResponseBody::Json(json!({"status": "ok"}))));
    assert!(call.error_message().is_none());

    let requests = server.requests.lock().unwrap();
    assert_eq!(requests[0].request_line, "GET /health HTTP/1.1");
}

#[tokio::test]
async fn test_non_json_body_returned_as_text() {
    let server = serve(CannedResponse::text(200, "model v3 ready")).await;
    let call = client(&server.base_url).metadata().await;

    let body = call.body().unwrap();
    assert_eq!(body, &ResponseBody::Text("model v3 ready".to_string()));
    assert_eq!(body.to_json(), json!({"raw": "model v3 ready"}));
}

#[tokio::test]
async fn test_error_status_carries_code_and_body() {
    let server = serve(CannedResponse::text(503, "model loading")).await;
    let call = client(&server.base_url).health().await;

    assert!(call.body().is_none());
    assert_eq!(
        call.outcome,
        Err(ApiError::Status {
            status: 503,
            body: "model loading".to_string()
        })
    );
    assert_eq!(call.error_message().unwrap(), "HTTP 503: model loading");
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = serve(
        CannedResponse::json(200, json!({"status": "ok"})).delayed(Duration::from_secs(3)),
    )
    .await;
    let client = ForecastApiClient::new(&server.base_url, Duration::from_millis(200));

    let call = client.health().await;
    assert!(matches!(call.outcome, Err(ApiError::Timeout { .. })));
    assert!(call.elapsed < Duration::from_secs(3));
}

#[tokio::test]
async fn test_predict_posts_payload_as_json() {
    let server = serve(CannedResponse::json(
        200,
        json!({"predictions": [101.0], "last_date": "2024-03-01", "horizon": 1}),
    ))
    .await;

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let rows = (0..40)
        .map(|i| {
            let c = 100.0 + f64::from(i);
            OhlcvRecord::new(start + chrono::Duration::days(i64::from(i)), c, c, c, c, 10.0)
        })
        .collect();
    let history = History::from_records(rows).unwrap();
    let request = payload_builder::build(
        &history,
        Window::new(30).unwrap(),
        Horizon::One,
        Some("amzn"),
    );

    let call = client(&server.base_url).predict(&request).await;
    let outcome = call.body().cloned().unwrap().into_prediction_outcome();
    assert_eq!(outcome.predictions(), &[101.0]);
    assert_eq!(outcome.last_date(), Some("2024-03-01"));

    let requests = server.requests.lock().unwrap();
    assert_eq!(requests[0].request_line, "POST /predict HTTP/1.1");
    let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(sent["horizon"], json!(1));
    assert_eq!(sent["window"], json!(30));
    assert_eq!(sent["ticker"], json!("amzn"));
    let sent_history = sent["history"].as_array().unwrap();
    assert_eq!(sent_history.len(), 30);
    assert_eq!(sent_history[29]["date"], json!("2024-02-09"));
}

#[tokio::test]
async fn test_call_with_explicit_url_and_timeout() {
    let server = serve(CannedResponse::json(200, json!([]))).await;
    let client = client("http://unused.invalid");

    let url = format!("{}/custom", server.base_url);
    let call = client
        .call(HttpMethod::Get, &url, None, Duration::from_secs(2))
        .await;
    assert_eq!(call.body(), Some(&ResponseBody::Json(json!([]))));
    assert!(call.body().unwrap().is_empty());
}
