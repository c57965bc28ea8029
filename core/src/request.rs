//! HTTP request construction from composable options.
//!
//! # Design
//! `Request` is plain data with public fields, in the same spirit as
//! `ClientConfig`. `Request::new` starts from an empty shell and applies
//! options strictly in order; the first failure aborts with no request.
//! Headers live in an `http::HeaderMap`, so names are case-insensitive and
//! `insert` gives last-write-wins per name.

use serde::Serialize;
use ureq::http::header::{self, HeaderName, HeaderValue};
use ureq::http::{HeaderMap, Uri};
use url::Url;

use crate::error::{Error, OptionError};

pub const SCHEME_HTTP: &str = "http";
pub const SCHEME_HTTPS: &str = "https";

const APPLICATION_JSON: &str = "application/json";

/// An outbound request, ready for [`execute`](crate::execute).
///
/// An empty `method` is sent as `GET`. A request without a `uri` fails at
/// dispatch time.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub uri: Option<Uri>,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Build a request from an empty shell plus `options`, applied in order.
    pub fn new(options: &[&dyn RequestOption]) -> Result<Self, Error> {
        let mut request = Self::default();
        for (index, option) in options.iter().enumerate() {
            if let Err(err) = option.apply(&mut request) {
                tracing::debug!(index, error = %err, "request option failed");
                return Err(Error::RequestOption(err));
            }
        }
        Ok(request)
    }
}

/// A deferred change to a `Request` that may fail.
///
/// Any `Fn(&mut Request) -> Result<(), OptionError>` is an option.
pub trait RequestOption {
    fn apply(&self, request: &mut Request) -> Result<(), OptionError>;
}

impl<F> RequestOption for F
where
    F: Fn(&mut Request) -> Result<(), OptionError>,
{
    fn apply(&self, request: &mut Request) -> Result<(), OptionError> {
        self(request)
    }
}

/// Set the HTTP verb. Any token is accepted as-is.
pub fn method(method: impl Into<String>) -> impl RequestOption {
    let method = method.into();
    move |request: &mut Request| -> Result<(), OptionError> {
        request.method = method.clone();
        Ok(())
    }
}

/// Target `scheme://host/path` and send `host` as the `Host` header.
///
/// `host` may carry a port. The header follows the token, not the address
/// that ends up being dialed, which is what virtual hosting needs.
///
/// `path` is a path only. A missing leading `/` is added, and characters
/// that cannot appear in a path (spaces, `?`, `#`) are percent-encoded.
pub fn url(
    scheme: impl Into<String>,
    host: impl Into<String>,
    path: impl Into<String>,
) -> impl RequestOption {
    let (scheme, host, path) = (scheme.into(), host.into(), path.into());
    move |request: &mut Request| -> Result<(), OptionError> {
        let mut target =
            Url::parse(&format!("{scheme}://{host}/")).map_err(OptionError::Url)?;
        if path.starts_with('/') {
            target.set_path(&path);
        } else {
            target.set_path(&format!("/{path}"));
        }
        let uri: Uri = target
            .as_str()
            .parse()
            .map_err(|e: ureq::http::uri::InvalidUri| OptionError::Uri(e.into()))?;
        let value = HeaderValue::from_str(&host).map_err(|e| OptionError::Header(e.into()))?;
        request.uri = Some(uri);
        request.headers.insert(header::HOST, value);
        Ok(())
    }
}

/// Encode `value` as the JSON body and set `Content-Type: application/json`.
///
/// Encoding happens when the option is applied, so an unencodable value
/// fails request construction.
pub fn json_body<T: Serialize>(value: T) -> impl RequestOption {
    move |request: &mut Request| -> Result<(), OptionError> {
        let buf = serde_json::to_vec(&value)?;
        request.body = Some(buf);
        request
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Ok(())
    }
}

/// Raw body bytes with the given media type.
pub fn body(content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> impl RequestOption {
    let (content_type, bytes) = (content_type.into(), bytes.into());
    move |request: &mut Request| -> Result<(), OptionError> {
        let value =
            HeaderValue::from_str(&content_type).map_err(|e| OptionError::Header(e.into()))?;
        request.body = Some(bytes.clone());
        request.headers.insert(header::CONTENT_TYPE, value);
        Ok(())
    }
}

pub fn user_agent(agent: impl Into<String>) -> impl RequestOption {
    header(header::USER_AGENT.as_str(), agent)
}

/// Set `name` to `value`, replacing whatever was there.
pub fn header(name: impl Into<String>, value: impl Into<String>) -> impl RequestOption {
    let (name, value) = (name.into(), value.into());
    move |request: &mut Request| -> Result<(), OptionError> {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| OptionError::Header(e.into()))?;
        let value = HeaderValue::from_str(&value).map_err(|e| OptionError::Header(e.into()))?;
        request.headers.insert(name, value);
        Ok(())
    }
}
