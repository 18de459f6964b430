//! Client configuration.
//!
//! [`SellerClientConfig`] is layered with figment:
//! 1) built-in defaults -> 2) YAML file (if provided) -> 3) `F1_SELLER__*` env vars
//!
//! Nested keys are separated by a double underscore, e.g.
//! `F1_SELLER__RPC__SELECTION=random_pick`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::credentials::{AppSecret, Credentials};
use crate::error::ValidationError;

/// Directory serving the gateway list for an application
pub const DEFAULT_DIRECTORY_URL: &str = "https://gws.f1shoppingcart.com";

/// Path appended to every gateway base address
pub const DEFAULT_PROXY_PATH: &str = "/seller-proxy";

/// Default User-Agent string for outbound requests
pub const DEFAULT_USER_AGENT: &str = concat!("f1-seller-client/", env!("CARGO_PKG_VERSION"));

/// Prefix of environment variables merged over the YAML file
pub const ENV_PREFIX: &str = "F1_SELLER__";

/// How the dispatcher picks among the resolved gateways.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Try every gateway in directory order until one delivers an envelope.
    ///
    /// Worst-case latency is the sum of all attempts; bound it with
    /// [`RpcConfig::total_timeout`].
    #[default]
    SequentialFailover,
    /// Send to one uniformly random gateway and surface its transport failure
    /// as-is. No resilience to a single bad gateway.
    RandomPick,
}

/// TLS root certificate source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsRootConfig {
    /// Mozilla's root certificates (webpki-roots, no OS dependency)
    #[default]
    Webpki,
    /// OS native root certificate store
    Native,
}

/// Dispatch and transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcConfig {
    /// Base URL of the gateway directory; the app id is appended as a path segment
    pub directory_url: String,

    /// Path appended to each rewritten gateway address
    pub proxy_path: String,

    /// Gateway selection policy (default: sequential failover)
    pub selection: SelectionPolicy,

    /// Per-attempt timeout, applied to the directory lookup and each gateway POST
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,

    /// Deadline for a whole dispatch including every failover attempt (default: none)
    #[serde(with = "humantime_duration::option")]
    pub total_timeout: Option<Duration>,

    /// Maximum accepted response body size in bytes
    pub max_body_size: usize,

    /// User-Agent header value
    pub user_agent: String,

    /// TLS root certificate strategy
    pub tls_roots: TlsRootConfig,

    /// Idle connection lifetime in the pool (`None` = hyper-util default)
    #[serde(with = "humantime_duration::option")]
    pub pool_idle_timeout: Option<Duration>,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// Requests that may queue in front of the transport worker
    pub buffer_capacity: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.to_owned(),
            proxy_path: DEFAULT_PROXY_PATH.to_owned(),
            selection: SelectionPolicy::default(),
            request_timeout: Duration::from_secs(30),
            total_timeout: None,
            max_body_size: 1024 * 1024, // 1 MB
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            tls_roots: TlsRootConfig::default(),
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 8,
            buffer_capacity: 256,
        }
    }
}

impl RpcConfig {
    /// Configuration for local mock servers: short timeouts, small pool.
    #[must_use]
    pub fn for_testing(directory_url: impl Into<String>) -> Self {
        Self {
            directory_url: directory_url.into(),
            request_timeout: Duration::from_secs(5),
            pool_idle_timeout: Some(Duration::from_secs(5)),
            pool_max_idle_per_host: 2,
            buffer_capacity: 64,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_directory_url(mut self, url: impl Into<String>) -> Self {
        self.directory_url = url.into();
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = Some(timeout);
        self
    }
}

/// Full client configuration: credentials plus [`RpcConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SellerClientConfig {
    #[serde(deserialize_with = "crate::credentials::deserialize_text")]
    pub app_id: String,
    pub app_secret: AppSecret,
    #[serde(default)]
    pub rpc: RpcConfig,
}

/// Configuration loading failure
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

impl SellerClientConfig {
    /// Load from an optional YAML file overlaid with `F1_SELLER__*` variables.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingFile` if `path` is given but is not a file,
    /// `ConfigError::Invalid` if the merged configuration does not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::default("rpc", RpcConfig::default()));

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&[APP_ID_KEY, APP_SECRET_KEY])
                .split("__"),
        );
        // Credentials are opaque text; figment's value parsing would turn
        // "007" into 7 or "true" into a bool.
        for key in [APP_ID_KEY, APP_SECRET_KEY] {
            if let Some(raw) = raw_env(key) {
                figment = figment.merge(Serialized::default(key, raw));
            }
        }

        Self::from_figment(figment)
    }

    /// Extract from a caller-assembled figment.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the figment does not deserialize.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Validated credentials from this configuration.
    ///
    /// # Errors
    /// Returns `ValidationError` if the app id or secret is empty.
    pub fn credentials(&self) -> Result<Credentials, ValidationError> {
        Credentials::from_parts(self.app_id.clone(), self.app_secret.clone())
    }
}

const APP_ID_KEY: &str = "app_id";
const APP_SECRET_KEY: &str = "app_secret";

fn raw_env(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{}", key.to_ascii_uppercase())).ok()
}

/// Serde adapter for `Duration` as humantime strings ("30s", "1m 30s").
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer, de};
        use std::time::Duration;

        #[allow(clippy::ref_option)] // signature required by serde(with)
        pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => s.serialize_some(&humantime::format_duration(*d).to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| humantime::parse_duration(&raw).map_err(de::Error::custom))
                .transpose()
        }
    }
}
