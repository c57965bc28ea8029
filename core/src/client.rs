//! HTTP client construction from composable options.
//!
//! # Design
//! `ClientConfig` is a plain struct with independently settable fields.
//! `Client::new` starts from the baseline in [`defaults`], applies each
//! option in the order given and stops at the first failure, so no partial
//! client is ever returned. Options only touch the fields they own: the
//! trust-store option replaces the trust facet and leaves pool sizes and
//! timeouts alone, whichever order the options come in.
//!
//! The finished config is translated into a `ureq::Agent`, which owns the
//! connection pool. No connection is opened until the first request.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ureq::{Agent, Proxy};

use crate::error::{Error, OptionError};
use crate::tls::TrustStore;

/// Baseline settings every client starts from.
pub mod defaults {
    use std::time::Duration;

    pub const TIMEOUT: Duration = Duration::from_secs(20);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const TCP_KEEPALIVE: Duration = Duration::from_secs(300);
    pub const MAX_IDLE_CONNECTIONS: usize = 1;
    pub const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 1;
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(20);
    pub const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
    pub const EXPECT_CONTINUE_TIMEOUT: Duration = Duration::from_secs(1);
    pub const MAX_REDIRECTS: u32 = 10;
}

/// Where outbound requests find their proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyPolicy {
    /// Read `HTTP_PROXY`, `HTTPS_PROXY`, `ALL_PROXY` and friends.
    Environment,
    /// Connect directly.
    Disabled,
    /// Route everything through this proxy URL.
    Url(String),
}

/// Transport settings for a `Client`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on a whole call, response body included.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// TCP keep-alive probe interval. The transport has no knob for it, so it
    /// is recorded but not enforced.
    pub tcp_keepalive: Option<Duration>,
    pub max_idle_connections: usize,
    pub max_idle_connections_per_host: usize,
    pub idle_timeout: Duration,
    /// Recorded only; the connect timeout bounds the handshake.
    pub tls_handshake_timeout: Option<Duration>,
    pub expect_continue_timeout: Option<Duration>,
    pub compression: bool,
    pub keep_alive: bool,
    /// Redirects the transport follows within one call.
    pub max_redirects: u32,
    pub proxy: ProxyPolicy,
    /// Replaces the platform roots when set.
    pub trust_store: Option<TrustStore>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(defaults::TIMEOUT),
            connect_timeout: Some(defaults::CONNECT_TIMEOUT),
            tcp_keepalive: Some(defaults::TCP_KEEPALIVE),
            max_idle_connections: defaults::MAX_IDLE_CONNECTIONS,
            max_idle_connections_per_host: defaults::MAX_IDLE_CONNECTIONS_PER_HOST,
            idle_timeout: defaults::IDLE_TIMEOUT,
            tls_handshake_timeout: Some(defaults::TLS_HANDSHAKE_TIMEOUT),
            expect_continue_timeout: Some(defaults::EXPECT_CONTINUE_TIMEOUT),
            compression: true,
            keep_alive: true,
            max_redirects: defaults::MAX_REDIRECTS,
            proxy: ProxyPolicy::Environment,
            trust_store: None,
        }
    }
}

impl ClientConfig {
    /// Apply `options` in order on top of the baseline.
    pub fn with_options(options: &[&dyn ClientOption]) -> Result<Self, OptionError> {
        let mut config = Self::default();
        for (index, option) in options.iter().enumerate() {
            if let Err(err) = option.apply(&mut config) {
                tracing::debug!(index, error = %err, "client option failed");
                return Err(err);
            }
        }
        Ok(config)
    }

    fn agent(&self) -> Result<Agent, Error> {
        let proxy = match &self.proxy {
            ProxyPolicy::Environment => Proxy::try_from_env(),
            ProxyPolicy::Disabled => None,
            ProxyPolicy::Url(url) => Some(Proxy::new(url).map_err(Error::Transport)?),
        };

        let mut builder = Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .timeout_global(self.timeout)
            .timeout_connect(self.connect_timeout)
            .timeout_await_100(self.expect_continue_timeout)
            .max_idle_connections(self.max_idle_connections)
            .max_idle_connections_per_host(self.max_idle_connections_per_host)
            .max_idle_age(self.idle_timeout)
            .max_redirects(self.max_redirects)
            .proxy(proxy);
        if let Some(store) = &self.trust_store {
            builder = builder.tls_config(store.tls_config());
        }
        Ok(builder.build().new_agent())
    }
}

/// A deferred change to a `ClientConfig` that may fail.
///
/// Any `Fn(&mut ClientConfig) -> Result<(), OptionError>` is an option, so
/// other crates can add their own without touching this one.
pub trait ClientOption {
    fn apply(&self, config: &mut ClientConfig) -> Result<(), OptionError>;
}

impl<F> ClientOption for F
where
    F: Fn(&mut ClientConfig) -> Result<(), OptionError>,
{
    fn apply(&self, config: &mut ClientConfig) -> Result<(), OptionError> {
        self(config)
    }
}

/// Reusable, thread-safe HTTP client.
///
/// Cloning is cheap and clones share one connection pool.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    agent: Agent,
}

impl Client {
    /// Build a client from the baseline plus `options`, applied in order.
    pub fn new(options: &[&dyn ClientOption]) -> Result<Self, Error> {
        let config = ClientConfig::with_options(options).map_err(Error::ClientOption)?;
        Self::from_config(config)
    }

    /// Build a client from a config assembled by hand.
    pub fn from_config(config: ClientConfig) -> Result<Self, Error> {
        let agent = config.agent()?;
        tracing::debug!(
            timeout = ?config.timeout,
            connect_timeout = ?config.connect_timeout,
            tcp_keepalive = ?config.tcp_keepalive,
            tls_handshake_timeout = ?config.tls_handshake_timeout,
            max_idle_connections = config.max_idle_connections,
            proxy = ?config.proxy,
            custom_roots = config.trust_store.is_some(),
            "built http client"
        );
        Ok(Self {
            config: Arc::new(config),
            agent,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn agent(&self) -> &Agent {
        &self.agent
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish()
    }
}

pub fn timeout(timeout: Duration) -> impl ClientOption {
    move |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.timeout = Some(timeout);
        Ok(())
    }
}

pub fn connect_timeout(timeout: Duration) -> impl ClientOption {
    move |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.connect_timeout = Some(timeout);
        Ok(())
    }
}

/// Cap on idle pooled connections across all hosts.
pub fn max_idle_connections(total: usize) -> impl ClientOption {
    move |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.max_idle_connections = total;
        Ok(())
    }
}

pub fn max_idle_connections_per_host(per_host: usize) -> impl ClientOption {
    move |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.max_idle_connections_per_host = per_host;
        Ok(())
    }
}

pub fn idle_timeout(timeout: Duration) -> impl ClientOption {
    move |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.idle_timeout = timeout;
        Ok(())
    }
}

/// Stop advertising gzip support; responses arrive as the server sent them.
pub fn disable_compression() -> impl ClientOption {
    |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.compression = false;
        Ok(())
    }
}

/// Ask the server to close every connection after one exchange.
pub fn disable_keep_alives() -> impl ClientOption {
    |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.keep_alive = false;
        Ok(())
    }
}

pub fn max_redirects(limit: u32) -> impl ClientOption {
    move |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.max_redirects = limit;
        Ok(())
    }
}

/// Route requests through `url`. Fails if `url` is not a usable proxy.
pub fn proxy(url: impl Into<String>) -> impl ClientOption {
    let url = url.into();
    move |config: &mut ClientConfig| -> Result<(), OptionError> {
        Proxy::new(&url).map_err(|source| OptionError::Proxy {
            url: url.clone(),
            source,
        })?;
        config.proxy = ProxyPolicy::Url(url.clone());
        Ok(())
    }
}

pub fn no_proxy() -> impl ClientOption {
    |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.proxy = ProxyPolicy::Disabled;
        Ok(())
    }
}

/// Trust only the certificate authorities in the PEM file at `path`.
///
/// The file is read when the option is applied. Only the trust store is
/// replaced; every other setting is preserved.
pub fn tls_ca(path: impl AsRef<Path>) -> impl ClientOption {
    let path = path.as_ref().to_path_buf();
    move |config: &mut ClientConfig| -> Result<(), OptionError> {
        config.trust_store = Some(TrustStore::from_pem_file(&path)?);
        Ok(())
    }
}
