use axum::body::{Body, to_bytes};
use axum::extract::rejection::JsonRejection;
use axum::http::{Request, header};
use rest_advice::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
struct CreateUser {
    #[validate(email(message = "must be a well-formed email address"))]
    email: String,
    #[validate(range(min = 18, message = "must be at least 18"))]
    age: u32,
}

#[derive(Debug, Deserialize)]
struct Paging {
    page: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("payment required for plan {0}")]
struct PaymentRequired(String);

#[derive(Debug, thiserror::Error)]
#[error("disk on fire")]
struct DiskOnFire;

async fn create_user(Valid(user): Valid<CreateUser>) -> String {
    user.email
}

async fn echo(Json(value): Json<Value>) -> Json<Value> {
    Json(value)
}

async fn list(Query(paging): Query<Paging>) -> String {
    paging.page.to_string()
}

async fn get_user(Path(id): Path<i64>) -> Result<String, Exception> {
    Err(EntityNotFound::with_id("User", id).into())
}

async fn import(payload: Result<axum::Json<Value>, JsonRejection>) -> Result<String, Exception> {
    let axum::Json(value) = payload?;
    Ok(value.to_string())
}

async fn upgrade() -> Result<String, Exception> {
    Err(PaymentRequired("pro".to_string()).into())
}

async fn explode() -> Result<String, Exception> {
    Err(DiskOnFire.into())
}

fn app(filter: RestExceptionFilter) -> Router {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    Router::new()
        .route("/users", post(create_user).get(list))
        .route("/users/{id}", get(get_user))
        .route("/echo", post(echo))
        .route("/import", post(import))
        .route("/upgrade", post(upgrade))
        .route("/explode", get(explode))
        .layer(TraceLayer::new_for_http())
        .with_exception_handling(filter)
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (status, body) = send(app(RestExceptionFilter::default()), get_request("/foo/bar")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "NOT_FOUND");
    assert_eq!(body["message"], "Path '/foo/bar' not found");
    assert_eq!(body["subErrors"], json!([]));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_wrong_method_is_method_not_allowed() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/echo")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(RestExceptionFilter::default()), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "Request method not supported in this URI");
    assert_eq!(body["debugMessage"], "Request method 'DELETE' is not supported");
}

#[tokio::test]
async fn test_wrong_content_type_is_unsupported_media_type() {
    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let (status, body) = send(app(RestExceptionFilter::default()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Media type not suported");
    assert_eq!(body["debugMessage"], "Content type 'text/plain' not supported");
}

#[tokio::test]
async fn test_malformed_json() {
    let (status, body) = send(app(RestExceptionFilter::default()), json_post("/echo", "{\"a\":")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid JSON error");
    assert!(body["debugMessage"].is_string());
}

#[tokio::test]
async fn test_invalid_format_reports_field() {
    let (status, body) = send(
        app(RestExceptionFilter::default()),
        json_post("/users", r#"{"email":"a@b.io","age":"old"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid format error");
    let sub_error = &body["subErrors"][0];
    assert_eq!(sub_error["field"], "age");
    assert_eq!(sub_error["rejectedValue"], "old");
    assert!(sub_error["objectType"].as_str().unwrap().ends_with("CreateUser"));
}

#[tokio::test]
async fn test_validation_errors() {
    let (status, body) = send(
        app(RestExceptionFilter::default()),
        json_post("/users", r#"{"email":"nope","age":12}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    assert_eq!(
        body["subErrors"],
        json!([
            {
                "objectType": "CreateUser",
                "field": "age",
                "rejectedValue": 12,
                "message": "must be at least 18"
            },
            {
                "objectType": "CreateUser",
                "field": "email",
                "rejectedValue": "nope",
                "message": "must be a well-formed email address"
            }
        ])
    );
}

#[tokio::test]
async fn test_missing_query_parameter() {
    let (status, body) = send(app(RestExceptionFilter::default()), get_request("/users")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Required query parameter 'page' not present");
}

#[tokio::test]
async fn test_path_type_mismatch() {
    let (status, body) = send(app(RestExceptionFilter::default()), get_request("/users/abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Type conversion error. The value {abc} can not be converted to the type {i64}."
    );
}

#[tokio::test]
async fn test_handler_entity_not_found() {
    let (status, body) = send(app(RestExceptionFilter::default()), get_request("/users/42")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User with id [42] not found");
    assert!(body["debugMessage"].is_null());
}

#[tokio::test]
async fn test_registered_handler_is_used_by_layer() {
    let filter = RestExceptionFilter::default().register(|e: &PaymentRequired| {
        let mut response = ErrorResponse::new(HttpStatus::Forbidden);
        response.set_message(e.to_string());
        response
    });
    let request = Request::builder()
        .method("POST")
        .uri("/upgrade")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(filter), request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "payment required for plan pro");
}

#[tokio::test]
async fn test_unknown_error_is_internal_server_error() {
    let (status, body) = send(app(RestExceptionFilter::default()), get_request("/explode")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["message"], "Unknown error");
    assert_eq!(body["debugMessage"], "disk on fire");
}

#[tokio::test]
async fn test_debug_message_can_be_disabled() {
    let filter = RestExceptionFilter::new(FilterConfig {
        include_debug_message: false,
        ..FilterConfig::default()
    });
    let (status, body) = send(app(filter), get_request("/explode")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["debugMessage"].is_null());
}

#[tokio::test]
async fn test_exception_translates_without_layer() {
    let router = Router::new().route("/users/{id}", get(get_user));
    let (status, body) = send(router, get_request("/users/7")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User with id [7] not found");
}

#[tokio::test]
async fn test_axum_json_rejection_forwarded_as_exception() {
    let (status, body) = send(app(RestExceptionFilter::default()), json_post("/import", "{\"a\":")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid JSON error");

    let request = Request::builder()
        .method("POST")
        .uri("/import")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(app(RestExceptionFilter::default()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Media type not suported");
}
