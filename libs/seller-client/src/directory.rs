//! Gateway lookup: which gateways currently serve an application.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::DirectoryError;
use crate::transport::Transport;

/// Gateway base address as listed by the directory (`ws://` or `wss://`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct GatewayAddress(String);

impl GatewayAddress {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// HTTP URL of this gateway's seller proxy.
    ///
    /// A leading `ws` becomes `http` (so `wss` becomes `https`), then
    /// `proxy_path` is appended. Addresses without the prefix are kept as-is.
    #[must_use]
    pub fn proxy_url(&self, proxy_path: &str) -> String {
        let base = self.0.trim_end_matches('/');
        match base.strip_prefix("ws") {
            Some(rest) => format!("http{rest}{proxy_path}"),
            None => format!("{base}{proxy_path}"),
        }
    }
}

impl fmt::Display for GatewayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the gateways currently serving an application.
///
/// Every lookup goes to the network; nothing is cached.
#[derive(Clone)]
pub struct GatewayDirectory {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl GatewayDirectory {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// `<base>/<url-encoded app id>`
    #[must_use]
    pub fn lookup_url(&self, app_id: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(app_id)
        )
    }

    /// Gateway addresses in server order.
    ///
    /// # Errors
    /// Returns `DirectoryError::Fetch` if the lookup request fails and
    /// `DirectoryError::Parse` if the body is not a JSON array of strings.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, app_id: &str) -> Result<Vec<GatewayAddress>, DirectoryError> {
        let url = self.lookup_url(app_id);
        let body = self
            .transport
            .get(&url)
            .await
            .map_err(DirectoryError::Fetch)?;
        let gateways: Vec<GatewayAddress> =
            serde_json::from_slice(&body).map_err(DirectoryError::Parse)?;

        tracing::debug!(count = gateways.len(), "resolved gateways");
        Ok(gateways)
    }
}
