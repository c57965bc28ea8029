//! Composable HTTP client, request and response-handler assembly.
//!
//! # Overview
//! Three pieces with the same shape. A [`Client`] is built from
//! [`ClientOption`]s, a [`Request`] from [`RequestOption`]s, and
//! [`execute`] sends the request once and runs the response through a
//! chain of [`ResponseHandler`]s until one fails.
//!
//! # Design
//! - Options and handlers are single-method traits with blanket impls for
//!   closures, so any crate can add its own without touching this one.
//! - Options apply in the order given; the first failure aborts the build
//!   and nothing partial is returned.
//! - The client wraps a `ureq::Agent` and is cheap to clone and safe to
//!   share across threads. Requests are consumed by `execute`.
//! - Handlers run in order on the calling thread. The response body is a
//!   single-pass stream; see [`handler`] for what that means for chains.
//!
//! ```no_run
//! use httpcli::{client, execute, handler, request, Client, Request};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct State {
//!     value: String,
//! }
//!
//! let client = Client::new(&[&client::tls_ca("ca.pem")])?;
//! let req = Request::new(&[
//!     &request::method("GET"),
//!     &request::url(request::SCHEME_HTTPS, "127.0.0.1:8080", "/state"),
//!     &request::user_agent("awesome agent"),
//! ])?;
//!
//! let mut state = State::default();
//! execute(&client, req, &mut [&mut handler::success_json(Some(&mut state))])?;
//! println!("{state:?}");
//! # Ok::<(), httpcli::Error>(())
//! ```

pub mod client;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod request;
pub mod tls;

pub use client::{Client, ClientConfig, ClientOption, ProxyPolicy};
pub use dispatch::execute;
pub use error::{BodyError, Error, HandlerError, OptionError, SendError};
pub use handler::{fail_json, fail_json_error, success_json, Response, ResponseHandler};
pub use request::{Request, RequestOption, SCHEME_HTTP, SCHEME_HTTPS};
pub use tls::TrustStore;
