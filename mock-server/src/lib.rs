use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode},
    response::Redirect,
    routing::{any, get},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Success payload served by `/state`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub value: String,
}

/// Error payload served by failing endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub host: Option<String>,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
    pub accept_encoding: Option<String>,
    pub connection: Option<String>,
    pub body: serde_json::Value,
}

pub fn app() -> Router {
    Router::new()
        .route("/state", get(state))
        .route("/unavailable", get(unavailable))
        .route("/status/{code}", get(status))
        .route("/redirect", get(redirect))
        .route("/echo", any(echo))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn state() -> Json<State> {
    Json(State {
        value: "42".to_string(),
    })
}

async fn unavailable() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiError {
            error: "unavailable".to_string(),
        }),
    )
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<ApiError>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((
        status,
        Json(ApiError {
            error: format!("status {code}"),
        }),
    ))
}

async fn redirect() -> Redirect {
    Redirect::to("/state")
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Result<Json<Echo>, StatusCode> {
    let text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let body = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?
    };
    Ok(Json(Echo {
        method: method.to_string(),
        host: text(header::HOST),
        user_agent: text(header::USER_AGENT),
        content_type: text(header::CONTENT_TYPE),
        accept_encoding: text(header::ACCEPT_ENCODING),
        connection: text(header::CONNECTION),
        body,
    }))
}
