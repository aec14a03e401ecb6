//! End-to-end runs against a mocked open-data endpoint.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use parking_forecast::api::{self, AppState};
use parking_forecast::config::Config;
use parking_forecast::domain::{DataSource, ModelKind};
use parking_forecast::forecast::ForecastService;
use parking_forecast::ingest::OpenDataClient;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_SIZE: usize = 50;

fn config(base_url: String) -> Config {
    let mut cfg = Config::default();
    cfg.upstream.base_url = base_url;
    cfg.upstream.page_size = PAGE_SIZE;
    cfg.upstream.page_delay_ms = 0;
    cfg.forecast.n_trees = 10;
    cfg.forecast.seed = Some(3);
    cfg
}

/// Two bays reporting every hour for `hours` hours, newest first.
fn sensor_records(hours: i64) -> Vec<Value> {
    let start = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
    (0..hours)
        .rev()
        .flat_map(|h| {
            let ts = (start + Duration::hours(h) + Duration::minutes(17)).to_rfc3339();
            [56874, 56875].map(|bay| {
                json!({
                    "lastupdated": ts.clone(),
                    "status_timestamp": ts.clone(),
                    "zone_number": 7301,
                    "status_description": "Present",
                    "kerbsideid": bay,
                    "location": {"lon": 144.96, "lat": -37.81},
                })
            })
        })
        .collect()
}

async fn mount_pages(server: &MockServer, records: &[Value]) {
    for (i, chunk) in records.chunks(PAGE_SIZE).enumerate() {
        Mock::given(method("GET"))
            .and(query_param("offset", (i * PAGE_SIZE).to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"total_count": records.len(), "results": chunk})),
            )
            .mount(server)
            .await;
    }
}

fn service(cfg: &Config) -> ForecastService {
    let client = OpenDataClient::new(&cfg.upstream).unwrap();
    ForecastService::new(Arc::new(client), cfg)
}

#[cfg(feature = "ml")]
#[tokio::test]
async fn dense_history_trains_random_forest() {
    let server = MockServer::start().await;
    let records = sensor_records(60);
    mount_pages(&server, &records).await;

    let cfg = config(server.uri());
    let run = service(&cfg).run(None, 24).await;

    assert_eq!(run.data_source, DataSource::Live);
    assert_eq!(run.series.len(), 60);
    assert!(run.series.values().iter().all(|v| *v == 2.0));
    assert_eq!(run.forecast.model, ModelKind::RandomForest);
    assert_eq!(run.forecast.len(), 24);
    // constant history: the forest can only ever predict the constant
    assert!(run.forecast.values.iter().all(|v| (*v - 2.0).abs() < 1e-9));
    assert!(run.forecast.lower.iter().all(|v| (*v - 2.0).abs() < 1e-9));
}

#[tokio::test]
async fn upstream_outage_falls_back_to_demo_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cfg = config(server.uri());
    let response = service(&cfg).predict(Some("7301"), 12).await;

    assert!(response.ok);
    assert_eq!(response.data_source, DataSource::Synthetic);
    assert_eq!(response.zone.as_deref(), Some("7301"));
    assert_eq!(response.predictions.len(), 12);
    for p in &response.predictions {
        assert!(p.y >= 0.0);
        assert!(p.lo <= p.y && p.y <= p.hi);
    }
}

#[tokio::test]
async fn zone_filter_is_forwarded_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("where", "zone_number=\"7301\""))
        .and(query_param("order_by", "lastupdated desc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"results": sensor_records(10)})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cfg = config(server.uri());
    let run = service(&cfg).run(Some("7301"), 6).await;

    assert_eq!(run.data_source, DataSource::Live);
    // ten real hours get a three day synthetic backbone
    assert!(run.series.len() >= 72);
}

#[cfg(feature = "ml")]
#[tokio::test]
async fn http_predict_over_mocked_upstream() {
    let server = MockServer::start().await;
    mount_pages(&server, &sensor_records(60)).await;

    let cfg = config(server.uri());
    let app = api::router(AppState::new(cfg).unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/predict?hours=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["model"], "RandomForest-ML");
    assert_eq!(body["data_source"], "live");
    assert_eq!(body["history"]["points"], 48);
    assert_eq!(body["history"]["avg"], 2.0);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 5);
    assert_eq!(
        body["predictions"][0]["time"],
        "2024-08-03T12:00:00Z"
    );
}
