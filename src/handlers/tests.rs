//! Router tests - full request/response cycle through the axum stack

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::features::FeatureSchema;
use crate::model::linear::LinearModel;
use crate::model::LoadedModel;
use crate::{create_router, AppState};

fn app_with(schema: FeatureSchema, model: LinearModel, decimals: Option<u32>) -> Router {
    let loaded = LoadedModel::new(Box::new(model), &schema, "<memory>", b"test-artifact").unwrap();
    let config = Config {
        prediction_decimals: decimals,
        ..Config::default()
    };

    create_router(AppState {
        schema: Arc::new(schema),
        model: Arc::new(loaded),
        config,
    })
}

/// sales = 3 + 0.05*TV + 0.2*Radio + 0*Newspaper
fn advertising_app() -> Router {
    app_with(
        FeatureSchema::advertising(),
        LinearModel::new(3.0, vec![0.05, 0.2, 0.0]),
        None,
    )
}

/// conversions = 0.5*clicks
fn engagement_app() -> Router {
    app_with(
        FeatureSchema::engagement(),
        LinearModel::new(0.0, vec![0.0, 0.5]),
        None,
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_predict_json_success() {
    let (status, body) = send(
        advertising_app(),
        post_json("/predict", r#"{"TV": 100, "Radio": 10, "Newspaper": 5}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["schema"], "advertising");
    assert!((body["prediction"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_predict_query_matches_json() {
    let (_, from_json) = send(
        advertising_app(),
        post_json("/predict", r#"{"TV": 230.1, "Radio": 37.8, "Newspaper": 69.2}"#),
    )
    .await;
    let (status, from_query) = send(
        advertising_app(),
        get("/predict?Newspaper=69.2&Radio=37.8&TV=230.1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(from_json["prediction"], from_query["prediction"]);
}

#[tokio::test]
async fn test_missing_features_is_400() {
    let (status, body) = send(advertising_app(), post_json("/predict", r#"{"Radio": 1}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing features: ['TV', 'Newspaper']");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_invalid_type_is_400() {
    let (status, body) = send(advertising_app(), get("/predict?TV=abc&Radio=1&Newspaper=2")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("'TV'"));
}

#[tokio::test]
async fn test_constraint_violation_is_400() {
    let (status, body) = send(
        engagement_app(),
        post_json("/predict", r#"{"impressions": 100, "clicks": 150}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("clicks <= impressions"));
}

#[tokio::test]
async fn test_engagement_success() {
    let (status, body) = send(engagement_app(), get("/predict?impressions=100&clicks=50")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 25.0);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let (status, body) = send(advertising_app(), post_json("/predict", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_non_object_body_is_400() {
    let (status, body) = send(advertising_app(), post_json("/predict", "[1, 2, 3]")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request body must be a JSON object");
}

#[tokio::test]
async fn test_prediction_rounding() {
    let app = app_with(
        FeatureSchema::engagement(),
        LinearModel::new(0.0, vec![0.0, 1.0 / 3.0]),
        Some(2),
    );
    let (status, body) = send(app, get("/predict?impressions=10&clicks=1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 0.33);
}

#[tokio::test]
async fn test_model_error_is_500() {
    // Model trained on 2 columns served under a 3-column layout hash
    let schema = FeatureSchema::engagement();
    let loaded = LoadedModel::new(
        Box::new(LinearModel::new(0.0, vec![1.0, 1.0])),
        &schema,
        "<memory>",
        b"",
    )
    .unwrap();
    let app = create_router(AppState {
        schema: Arc::new(FeatureSchema::advertising()),
        model: Arc::new(loaded),
        config: Config::default(),
    });

    let (status, body) = send(app, get("/predict?TV=1&Radio=2&Newspaper=3")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Prediction failed");
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(engagement_app(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["schema"], "engagement");
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn test_model_info() {
    let (status, body) = send(engagement_app(), get("/model/info")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schema"]["feature_count"], 2);
    assert_eq!(body["schema"]["features"][0]["name"], "impressions");
    assert_eq!(body["schema"]["features"][1]["kind"], "non_negative");
    assert_eq!(body["schema"]["constraints"][0], "clicks <= impressions");
    assert_eq!(body["model"]["model_type"], "linear");
    assert_eq!(body["stats"]["inference_count"], 0);
}

#[tokio::test]
async fn test_form_lists_schema_fields() {
    let response = advertising_app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();

    let tv = html.find(r#"name="TV""#).unwrap();
    let radio = html.find(r#"name="Radio""#).unwrap();
    let newspaper = html.find(r#"name="Newspaper""#).unwrap();
    assert!(tv < radio && radio < newspaper);
    assert!(html.contains(r#"action="/predict""#));
}
