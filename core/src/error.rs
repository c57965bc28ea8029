//! Error types for client construction, request construction and dispatch.
//!
//! # Design
//! Failures are grouped by the stage that produced them. Option failures
//! surface while a `Client` or `Request` is being built, `Send` covers the
//! network round trip, and `Handle` carries whatever a response handler
//! chose to return. Callers tell configuration-time problems apart from
//! network-time and application-level problems by matching on the variant.
//!
//! Every message embeds the text of the error it wraps, so a single
//! `to_string()` reads like a full chain (`send request: ...`). The inner
//! error is also exposed through `source()` for downcasting. Reporters that
//! walk the source chain will therefore print the inner text twice; print
//! the top-level message alone, or walk the chain, but not both.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error produced by a response handler.
///
/// Handlers may fail with any error type, including a decoded
/// application-level payload that implements `std::error::Error`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `Client::new`, `Request::new` and `execute`.
#[derive(Debug, Error)]
pub enum Error {
    /// A client option failed; no client was built.
    #[error("apply client option: {0}")]
    ClientOption(#[source] OptionError),

    /// A request option failed; no request was built.
    #[error("apply request option: {0}")]
    RequestOption(#[source] OptionError),

    /// The transport rejected a configuration assembled outside the options.
    #[error("configure transport: {0}")]
    Transport(#[source] ureq::Error),

    /// The request could not be sent or no response came back.
    #[error("send request: {0}")]
    Send(#[source] SendError),

    /// A response handler failed; later handlers were skipped.
    #[error("handle: {0}")]
    Handle(#[source] HandlerError),
}

/// Failure of a single client or request option.
#[derive(Debug, Error)]
pub enum OptionError {
    #[error("read certificate file {}: {source}", path.display())]
    ReadCertificate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse certificate file {}: {source}", path.display())]
    ParseCertificate {
        path: PathBuf,
        #[source]
        source: ureq::Error,
    },

    /// The file decoded fine but held no certificate.
    #[error("can't append root CA: no certificate in {}", path.display())]
    NoCertificate { path: PathBuf },

    #[error("invalid proxy {url}: {source}")]
    Proxy {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("invalid url: {0}")]
    Url(#[source] url::ParseError),

    /// The assembled URL is not a valid request target.
    #[error("invalid request target: {0}")]
    Uri(#[source] ureq::http::Error),

    #[error("invalid header: {0}")]
    Header(#[source] ureq::http::Error),

    #[error("marshal json data: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure raised by an option defined outside this crate.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl OptionError {
    /// Wrap an arbitrary error raised by a custom option.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        OptionError::Other(err.into())
    }
}

/// Reasons a request never produced a response.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("request has no url")]
    MissingUrl,

    #[error("invalid request: {0}")]
    InvalidRequest(#[source] ureq::http::Error),

    #[error(transparent)]
    Transport(#[from] ureq::Error),
}

/// Failures of the standard JSON response handlers.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("read response body: {0}")]
    Read(#[source] io::Error),

    #[error("unmarshal json: {0}")]
    Decode(#[source] serde_json::Error),
}
