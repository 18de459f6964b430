//! Function-name + argument dispatch over the resolved gateways.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rand::seq::IndexedRandom;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{RpcConfig, SelectionPolicy};
use crate::credentials::Credentials;
use crate::directory::{GatewayAddress, GatewayDirectory};
use crate::envelope::{Outcome, RequestEnvelope, ResponseEnvelope};
use crate::error::{GatewayFailure, RpcError};
use crate::transport::Transport;

/// Sends one call to the gateways of the configured application.
///
/// Cheap to clone; clones share credentials and transport.
#[derive(Clone)]
pub struct Dispatcher {
    credentials: Arc<Credentials>,
    directory: GatewayDirectory,
    transport: Arc<dyn Transport>,
    policy: SelectionPolicy,
    proxy_path: String,
    total_timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        credentials: Arc<Credentials>,
        transport: Arc<dyn Transport>,
        config: &RpcConfig,
    ) -> Self {
        Self {
            credentials,
            directory: GatewayDirectory::new(
                Arc::clone(&transport),
                config.directory_url.clone(),
            ),
            transport,
            policy: config.selection,
            proxy_path: config.proxy_path.clone(),
            total_timeout: config.total_timeout,
            cancel: None,
        }
    }

    /// Fail in-flight and future dispatches with `Cancelled` once `token` fires.
    #[must_use]
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Resolve the gateways, deliver the envelope and decode the reply.
    ///
    /// # Errors
    /// - `InvalidFunction` for an empty `fn_name`
    /// - `DirectoryUnavailable` if the gateway list cannot be fetched
    /// - `RemoteError` when a gateway returns a logical error (never retried)
    /// - `AllGatewaysUnreachable` when failover runs out of gateways
    /// - `Transport` / `MalformedEnvelope` for a failed single random pick
    /// - `DeadlineExceeded` / `Cancelled` when the call is cut short
    #[tracing::instrument(
        name = "rpc_dispatch",
        skip(self, fn_arg),
        fields(policy = ?self.policy)
    )]
    pub async fn dispatch(&self, fn_name: &str, fn_arg: Value) -> Result<Value, RpcError> {
        if fn_name.is_empty() {
            return Err(RpcError::InvalidFunction);
        }

        let run = self.run(fn_name, &fn_arg);
        let bounded = async {
            match self.total_timeout {
                Some(limit) => tokio::time::timeout(limit, run)
                    .await
                    .unwrap_or(Err(RpcError::DeadlineExceeded(limit))),
                None => run.await,
            }
        };

        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(RpcError::Cancelled),
                result = bounded => result,
            },
            None => bounded.await,
        }
    }

    async fn run(&self, fn_name: &str, fn_arg: &Value) -> Result<Value, RpcError> {
        let gateways = self
            .directory
            .resolve(self.credentials.app_id())
            .await
            .map_err(|source| RpcError::DirectoryUnavailable { source })?;

        let body = RequestEnvelope::new(&self.credentials, fn_name, fn_arg)
            .to_bytes()
            .map_err(RpcError::Encode)?;

        match self.policy {
            SelectionPolicy::SequentialFailover => self.failover(&gateways, &body).await,
            SelectionPolicy::RandomPick => self.random_pick(&gateways, body).await,
        }
    }

    async fn failover(
        &self,
        gateways: &[GatewayAddress],
        body: &Bytes,
    ) -> Result<Value, RpcError> {
        if gateways.is_empty() {
            warn!("directory returned no gateways");
        }

        let mut failures = Vec::with_capacity(gateways.len());
        for (index, gateway) in gateways.iter().enumerate() {
            let url = gateway.proxy_url(&self.proxy_path);
            let attempt = index + 1;
            debug!(attempt, gateway = %url, "sending RPC");

            let reason = match self.transport.post_json(&url, body.clone()).await {
                Ok(reply) => match ResponseEnvelope::parse(&reply) {
                    Ok(envelope) => return finish(envelope, attempt, &url),
                    Err(e) => e.to_string(),
                },
                Err(e) => e.to_string(),
            };

            warn!(attempt, gateway = %url, error = %reason, "gateway failed, trying next");
            failures.push(GatewayFailure {
                gateway: url,
                reason,
            });
        }

        Err(RpcError::AllGatewaysUnreachable { failures })
    }

    async fn random_pick(
        &self,
        gateways: &[GatewayAddress],
        body: Bytes,
    ) -> Result<Value, RpcError> {
        let Some(gateway) = pick_random(gateways) else {
            warn!("directory returned no gateways");
            return Err(RpcError::AllGatewaysUnreachable {
                failures: Vec::new(),
            });
        };

        let url = gateway.proxy_url(&self.proxy_path);
        debug!(gateway = %url, "sending RPC");

        let reply = match self.transport.post_json(&url, body).await {
            Ok(reply) => reply,
            Err(source) => {
                return Err(RpcError::Transport {
                    gateway: url,
                    source,
                });
            }
        };
        match ResponseEnvelope::parse(&reply) {
            Ok(envelope) => finish(envelope, 1, &url),
            Err(source) => Err(RpcError::MalformedEnvelope {
                gateway: url,
                source,
            }),
        }
    }
}

fn pick_random(gateways: &[GatewayAddress]) -> Option<&GatewayAddress> {
    gateways.choose(&mut rand::rng())
}

fn finish(envelope: ResponseEnvelope, attempts: usize, gateway: &str) -> Result<Value, RpcError> {
    match envelope.into_outcome() {
        Outcome::Success(value) => {
            info!(attempts, gateway, "RPC succeeded");
            Ok(value)
        }
        Outcome::Failure(message) => {
            debug!(attempts, gateway, error = %message, "RPC returned a remote error");
            Err(RpcError::RemoteError { message })
        }
    }
}
