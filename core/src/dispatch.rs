//! Request execution and handler-chain dispatch.
//!
//! # Design
//! `execute` makes exactly one network call. Retries, backoff and caching
//! are not its business; redirects are followed (or not) by the transport
//! according to the client's config. The response is dropped on every
//! exit path, which releases the body and hands the connection back to
//! the pool. Nothing about that release can fail loudly, so it never masks
//! the result the caller sees.

use ureq::http::header::{ACCEPT_ENCODING, CONNECTION};
use ureq::http::{self, HeaderValue, Method};
use ureq::{Agent, Body};

use crate::client::{Client, ClientConfig};
use crate::error::{Error, SendError};
use crate::handler::{Response, ResponseHandler};
use crate::request::Request;

/// Send `request` with `client` and run `handlers` over the response in
/// order.
///
/// Returns `Error::Send` without running any handler if no response came
/// back, and `Error::Handle` with the first handler failure otherwise.
/// Handlers after a failing one are not called.
pub fn execute(
    client: &Client,
    request: Request,
    handlers: &mut [&mut dyn ResponseHandler],
) -> Result<(), Error> {
    let request = to_http(client.config(), request).map_err(Error::Send)?;
    tracing::debug!(method = %request.method(), uri = %request.uri(), "sending request");

    let response = send(client.agent(), request).map_err(|err| {
        tracing::debug!(error = %err, "request failed");
        Error::Send(err)
    })?;
    let (parts, body) = response.into_parts();
    let mut response = Response::new(parts.status, parts.headers, body.into_reader());
    tracing::debug!(status = response.status().as_u16(), "received response");

    run_handlers(&mut response, handlers)
}

pub(crate) fn run_handlers(
    response: &mut Response,
    handlers: &mut [&mut dyn ResponseHandler],
) -> Result<(), Error> {
    for (index, handler) in handlers.iter_mut().enumerate() {
        if let Err(err) = handler.handle(response) {
            tracing::debug!(index, error = %err, "handler stopped the chain");
            return Err(Error::Handle(err));
        }
    }
    Ok(())
}

fn to_http(
    config: &ClientConfig,
    request: Request,
) -> Result<http::Request<Option<Vec<u8>>>, SendError> {
    let uri = request.uri.ok_or(SendError::MissingUrl)?;
    let method = if request.method.is_empty() {
        Method::GET
    } else {
        Method::from_bytes(request.method.as_bytes())
            .map_err(|e| SendError::InvalidRequest(e.into()))?
    };

    let mut headers = request.headers;
    if !config.compression && !headers.contains_key(ACCEPT_ENCODING) {
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    }
    if !config.keep_alive {
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
    }

    let mut out = http::Request::builder()
        .method(method)
        .uri(uri)
        .body(request.body)
        .map_err(SendError::InvalidRequest)?;
    *out.headers_mut() = headers;
    Ok(out)
}

fn send(
    agent: &Agent,
    request: http::Request<Option<Vec<u8>>>,
) -> Result<http::Response<Body>, SendError> {
    let (parts, body) = request.into_parts();
    let response = match body {
        Some(bytes) => agent.run(http::Request::from_parts(parts, bytes))?,
        None => agent.run(http::Request::from_parts(parts, ()))?,
    };
    Ok(response)
}
