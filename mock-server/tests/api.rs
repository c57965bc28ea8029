use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, ApiError, Echo, State};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

#[tokio::test]
async fn state_returns_200() {
    let resp = app().oneshot(get("/state")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let state: State = body_json(resp).await;
    assert_eq!(state.value, "42");
}

#[tokio::test]
async fn unavailable_returns_503_with_error_body() {
    let resp = app().oneshot(get("/unavailable")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let err: ApiError = body_json(resp).await;
    assert_eq!(err.error, "unavailable");
}

#[tokio::test]
async fn status_echoes_requested_code() {
    let resp = app().oneshot(get("/status/418")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    let err: ApiError = body_json(resp).await;
    assert_eq!(err.error, "status 418");
}

#[tokio::test]
async fn status_rejects_non_numeric_code() {
    let resp = app().oneshot(get("/status/teapot")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn redirect_points_at_state() {
    let resp = app().oneshot(get("/redirect")).await.unwrap();

    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()[http::header::LOCATION], "/state");
}

#[tokio::test]
async fn echo_reports_request_shape() {
    let req = Request::builder()
        .method("POST")
        .uri("/echo")
        .header(http::header::HOST, "virtual.test")
        .header(http::header::USER_AGENT, "awesome agent")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::CONNECTION, "close")
        .body(r#"{"n":1}"#.to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.host.as_deref(), Some("virtual.test"));
    assert_eq!(echo.user_agent.as_deref(), Some("awesome agent"));
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.connection.as_deref(), Some("close"));
    assert_eq!(echo.body, serde_json::json!({ "n": 1 }));
}

#[tokio::test]
async fn echo_accepts_any_method() {
    let req = Request::builder()
        .method("PURGE")
        .uri("/echo")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PURGE");
    assert_eq!(echo.connection, None);
    assert_eq!(echo.body, serde_json::Value::Null);
}

#[tokio::test]
async fn echo_rejects_malformed_json() {
    let req = Request::builder()
        .method("POST")
        .uri("/echo")
        .body("{".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
