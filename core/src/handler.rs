//! Response handlers and the standard JSON handler library.
//!
//! # Design
//! A handler inspects a [`Response`] and either passes or fails. The body
//! is a single-pass stream: at most one handler in a chain gets to read
//! it, and any handler after that sees an empty body. Chains that need
//! the raw bytes in more than one place should read them once in a custom
//! handler and share them through captured state.
//!
//! The JSON handlers fire on disjoint status ranges, [200,299] and
//! [400,599]. Everything else (redirects that were not followed, 1xx, odd
//! codes) passes through untouched unless the caller installs a handler
//! for it.

use std::fmt;
use std::io::{self, Read};
use std::marker::PhantomData;
use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use ureq::http::{HeaderMap, StatusCode};

use crate::error::{BodyError, HandlerError};

const SUCCESS_STATUSES: RangeInclusive<u16> = 200..=299;
const FAIL_STATUSES: RangeInclusive<u16> = 400..=599;

/// A received response: status, headers and a single-pass body.
///
/// Dropping the response releases the body and its connection.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Box<dyn Read>,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Read + 'static) -> Self {
        Self {
            status,
            headers,
            body: Box::new(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body stream. Bytes read here are gone for every later reader.
    pub fn body(&mut self) -> &mut dyn Read {
        self.body.as_mut()
    }

    /// Drain whatever is left of the body.
    pub fn read_body(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// One step of a handler chain.
///
/// Any `FnMut(&mut Response) -> Result<(), HandlerError>` is a handler.
pub trait ResponseHandler {
    fn handle(&mut self, response: &mut Response) -> Result<(), HandlerError>;
}

impl<F> ResponseHandler for F
where
    F: FnMut(&mut Response) -> Result<(), HandlerError>,
{
    fn handle(&mut self, response: &mut Response) -> Result<(), HandlerError> {
        self(response)
    }
}

/// Decodes a JSON body into a borrowed destination when the status falls in
/// a range. Built by [`success_json`] and [`fail_json`].
///
/// The destination is overwritten with the decoded value, not merged.
pub struct JsonBody<'a, T> {
    statuses: RangeInclusive<u16>,
    dest: Option<&'a mut T>,
}

impl<T: DeserializeOwned> ResponseHandler for JsonBody<'_, T> {
    fn handle(&mut self, response: &mut Response) -> Result<(), HandlerError> {
        let Some(dest) = self.dest.as_deref_mut() else {
            return Ok(());
        };
        if !self.statuses.contains(&response.status().as_u16()) {
            return Ok(());
        }
        let buf = response.read_body().map_err(BodyError::Read)?;
        *dest = serde_json::from_slice(&buf).map_err(BodyError::Decode)?;
        Ok(())
    }
}

/// Decode 2xx bodies into `dest`. Does nothing for other statuses or when
/// `dest` is `None`.
pub fn success_json<T>(dest: Option<&mut T>) -> JsonBody<'_, T> {
    JsonBody {
        statuses: SUCCESS_STATUSES,
        dest,
    }
}

/// Decode 4xx and 5xx bodies into `dest`. Does nothing for other statuses
/// or when `dest` is `None`.
pub fn fail_json<T>(dest: Option<&mut T>) -> JsonBody<'_, T> {
    JsonBody {
        statuses: FAIL_STATUSES,
        dest,
    }
}

/// Decodes a 4xx or 5xx body as `E` and fails the chain with it.
///
/// Lets an API's own error document become the error `execute` returns.
pub struct FailAsError<E> {
    _error: PhantomData<fn() -> E>,
}

impl<E> ResponseHandler for FailAsError<E>
where
    E: DeserializeOwned + std::error::Error + Send + Sync + 'static,
{
    fn handle(&mut self, response: &mut Response) -> Result<(), HandlerError> {
        if !FAIL_STATUSES.contains(&response.status().as_u16()) {
            return Ok(());
        }
        let buf = response.read_body().map_err(BodyError::Read)?;
        let err: E = serde_json::from_slice(&buf).map_err(BodyError::Decode)?;
        Err(Box::new(err))
    }
}

pub fn fail_json_error<E>() -> FailAsError<E>
where
    E: DeserializeOwned + std::error::Error + Send + Sync + 'static,
{
    FailAsError {
        _error: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct State {
        value: String,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct ApiError {
        error: String,
    }

    impl fmt::Display for ApiError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.error)
        }
    }

    impl std::error::Error for ApiError {}

    fn response(status: u16, body: &str) -> Response {
        Response::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            Cursor::new(body.as_bytes().to_vec()),
        )
    }

    #[test]
    fn success_json_decodes_2xx() {
        let mut state = State::default();
        let mut resp = response(200, r#"{"value":"ok"}"#);
        success_json(Some(&mut state)).handle(&mut resp).unwrap();
        assert_eq!(state.value, "ok");
    }

    #[test]
    fn success_json_covers_whole_range() {
        for status in [200, 201, 204, 299] {
            let mut state = State::default();
            let mut resp = response(status, r#"{"value":"edge"}"#);
            success_json(Some(&mut state)).handle(&mut resp).unwrap();
            assert_eq!(state.value, "edge", "status {status}");
        }
    }

    #[test]
    fn success_json_ignores_other_statuses() {
        for status in [101, 302, 404, 500, 600] {
            let mut state = State {
                value: "untouched".to_string(),
            };
            let mut resp = response(status, r#"{"value":"ok"}"#);
            success_json(Some(&mut state)).handle(&mut resp).unwrap();
            assert_eq!(state.value, "untouched", "status {status}");
        }
    }

    #[test]
    fn success_json_without_destination_leaves_body_unread() {
        let mut resp = response(200, r#"{"value":"ok"}"#);
        success_json::<State>(None).handle(&mut resp).unwrap();
        assert_eq!(resp.read_body().unwrap(), br#"{"value":"ok"}"#);
    }

    #[test]
    fn success_json_fills_empty_option_destination() {
        let mut dest: Option<State> = None;
        let mut resp = response(200, r#"{"value":"42"}"#);
        success_json(Some(&mut dest)).handle(&mut resp).unwrap();
        assert_eq!(
            dest,
            Some(State {
                value: "42".to_string()
            })
        );
    }

    #[test]
    fn success_json_surfaces_decode_errors() {
        let mut state = State::default();
        let mut resp = response(200, "not json");
        let err = success_json(Some(&mut state)).handle(&mut resp).unwrap_err();
        let err = err.downcast::<BodyError>().unwrap();
        assert!(matches!(*err, BodyError::Decode(_)));
    }

    #[test]
    fn fail_json_decodes_error_bodies() {
        let mut api_err = ApiError::default();
        let mut resp = response(500, r#"{"error":"boom"}"#);
        fail_json(Some(&mut api_err)).handle(&mut resp).unwrap();
        assert_eq!(api_err.error, "boom");

        let mut api_err = ApiError::default();
        let mut resp = response(400, r#"{"error":"bad"}"#);
        fail_json(Some(&mut api_err)).handle(&mut resp).unwrap();
        assert_eq!(api_err.error, "bad");
    }

    #[test]
    fn fail_json_ignores_success() {
        let mut api_err = ApiError::default();
        let mut resp = response(200, r#"{"error":"boom"}"#);
        fail_json(Some(&mut api_err)).handle(&mut resp).unwrap();
        assert_eq!(api_err, ApiError::default());
    }

    #[test]
    fn fail_json_error_returns_decoded_payload() {
        let mut resp = response(503, r#"{"error":"unavailable"}"#);
        let err = fail_json_error::<ApiError>().handle(&mut resp).unwrap_err();
        assert_eq!(err.to_string(), "unavailable");
        assert!(err.downcast_ref::<ApiError>().is_some());

        let mut resp = response(201, r#"{"value":"fine"}"#);
        fail_json_error::<ApiError>().handle(&mut resp).unwrap();
    }

    #[test]
    fn body_is_single_pass() {
        let mut first = State::default();
        let mut second = State::default();
        let mut resp = response(200, r#"{"value":"once"}"#);

        success_json(Some(&mut first)).handle(&mut resp).unwrap();
        assert_eq!(first.value, "once");

        // Nothing left to decode for the second reader.
        let err = success_json(Some(&mut second)).handle(&mut resp).unwrap_err();
        assert!(err.to_string().starts_with("unmarshal json"));
        assert_eq!(second, State::default());
    }

    #[test]
    fn closures_are_handlers() {
        let mut seen = None;
        let mut record = |resp: &mut Response| -> Result<(), HandlerError> {
            seen = Some(resp.status());
            Ok(())
        };
        record.handle(&mut response(418, "")).unwrap();
        assert_eq!(seen, Some(StatusCode::IM_A_TEAPOT));
    }
}
