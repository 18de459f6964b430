use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::RpcConfig;
use crate::credentials::Credentials;
use crate::dispatch::Dispatcher;
use crate::error::{SellerError, TransportError};
use crate::operation::{Operation, Quantity, Sku, UserId};
use crate::sku_map::SkuMap;
use crate::transport::{HttpTransport, Transport};

/// Seller-side client for the F1 backend.
///
/// Every method validates its arguments locally (nothing is sent on
/// failure), dispatches one call and decodes the result into a typed value.
///
/// `Clone + Send + Sync`; clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// let client = SellerClient::new(Credentials::new("shop-1", "secret")?, RpcConfig::default())?;
/// client.set_stock_quantities([(1001, 25), (1002, 0)]).await?;
/// let limits = client.get_all_sku_purchase_limits().await?;
/// ```
#[derive(Clone)]
pub struct SellerClient {
    dispatcher: Dispatcher,
}

impl SellerClient {
    /// Client over the default hyper transport.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    /// Returns `TransportError` if the TLS roots or user agent are unusable.
    pub fn new(credentials: Credentials, config: RpcConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(credentials, Arc::new(transport), &config))
    }

    /// Client over a caller-supplied transport.
    #[must_use]
    pub fn with_transport(
        credentials: Credentials,
        transport: Arc<dyn Transport>,
        config: &RpcConfig,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::new(credentials), transport, config),
        }
    }

    /// Calls in flight when `token` fires fail with `RpcErrorKind::Cancelled`.
    #[must_use]
    pub fn with_cancellation_token(self, token: CancellationToken) -> Self {
        Self {
            dispatcher: self.dispatcher.with_cancellation_token(token),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Validate and send `operation`, returning the raw result.
    ///
    /// # Errors
    /// `SellerError::Validation` before any I/O, `SellerError::Rpc` otherwise.
    pub async fn call(&self, operation: &Operation) -> Result<Value, SellerError> {
        operation.validate()?;
        let value = self
            .dispatcher
            .dispatch(operation.fn_name(), operation.fn_arg())
            .await?;
        Ok(value)
    }

    async fn call_as<T>(
        &self,
        operation: Operation,
        decode: impl FnOnce(Value) -> Result<T, String>,
    ) -> Result<T, SellerError> {
        let fn_name = operation.fn_name();
        let value = self.call(&operation).await?;
        decode(value).map_err(|reason| SellerError::unexpected(fn_name, reason))
    }

    // Stock

    /// # Errors
    /// See [`SellerClient::call`]; `UnexpectedResult` if the result is not an integer.
    pub async fn get_stock_quantity(&self, sku: Sku) -> Result<Quantity, SellerError> {
        self.call_as(Operation::GetStockQuantity { sku }, integer).await
    }

    /// # Errors
    /// `Validation` if `skus` is empty.
    pub async fn get_stock_quantities(
        &self,
        skus: Vec<Sku>,
    ) -> Result<SkuMap<Quantity>, SellerError> {
        self.call_as(Operation::GetStockQuantities { skus }, quantities)
            .await
    }

    /// # Errors
    /// `Validation` if `qty` is negative.
    pub async fn set_stock_quantity(&self, sku: Sku, qty: Quantity) -> Result<(), SellerError> {
        self.call_as(Operation::SetStockQuantity { sku, qty }, ignore)
            .await
    }

    /// Set several quantities at once; a repeated sku keeps its last quantity.
    ///
    /// # Errors
    /// `Validation` if any quantity is negative.
    pub async fn set_stock_quantities(
        &self,
        qtys: impl IntoIterator<Item = (Sku, Quantity)>,
    ) -> Result<(), SellerError> {
        let qtys = qtys.into_iter().collect();
        self.call_as(Operation::SetStockQuantities { qtys }, ignore)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn get_all_stock_quantities(&self) -> Result<SkuMap<Quantity>, SellerError> {
        self.call_as(Operation::GetAllStockQuantities, quantities)
            .await
    }

    // Sku info

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn get_sku_info(&self, sku: Sku) -> Result<Value, SellerError> {
        self.call_as(Operation::GetSkuInfo { sku }, Ok).await
    }

    /// # Errors
    /// `Validation` if `skus` is empty.
    pub async fn get_sku_infos(&self, skus: Vec<Sku>) -> Result<SkuMap<Value>, SellerError> {
        self.call_as(Operation::GetSkuInfos { skus }, infos).await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn get_all_sku_infos(&self) -> Result<SkuMap<Value>, SellerError> {
        self.call_as(Operation::GetAllSkuInfos, infos).await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn get_aggregate_sku_info(&self) -> Result<Value, SellerError> {
        self.call_as(Operation::GetAggregateSkuInfo, Ok).await
    }

    // Carts

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn get_cart(&self, user_id: UserId) -> Result<SkuMap<Quantity>, SellerError> {
        self.call_as(Operation::GetCart { user_id }, quantities)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn empty_cart(&self, user_id: UserId) -> Result<(), SellerError> {
        self.call_as(Operation::EmptyCart { user_id }, ignore).await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn remove_sku_from_all_carts(&self, sku: Sku) -> Result<(), SellerError> {
        self.call_as(Operation::RemoveSkuFromAllCarts { sku }, ignore)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn mark_cart_as_purchased(&self, user_id: UserId) -> Result<(), SellerError> {
        self.call_as(Operation::MarkCartAsPurchased { user_id }, ignore)
            .await
    }

    /// # Errors
    /// `Validation` if `skus` is empty.
    pub async fn mark_some_cart_skus_as_purchased(
        &self,
        user_id: UserId,
        skus: Vec<Sku>,
    ) -> Result<(), SellerError> {
        self.call_as(
            Operation::MarkSomeCartSkusAsPurchased { user_id, skus },
            ignore,
        )
        .await
    }

    // Purchase limits

    /// # Errors
    /// See [`SellerClient::call`]; `UnexpectedResult` if the result is not an integer.
    pub async fn get_sku_purchase_limit(&self, sku: Sku) -> Result<Quantity, SellerError> {
        self.call_as(Operation::GetSkuPurchaseLimit { sku }, integer)
            .await
    }

    /// # Errors
    /// `Validation` if `limit` is negative.
    pub async fn set_sku_purchase_limit(
        &self,
        sku: Sku,
        limit: Quantity,
    ) -> Result<(), SellerError> {
        self.call_as(Operation::SetSkuPurchaseLimit { sku, limit }, ignore)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn get_all_sku_purchase_limits(&self) -> Result<SkuMap<Quantity>, SellerError> {
        self.call_as(Operation::GetAllSkuPurchaseLimits, quantities)
            .await
    }

    /// # Errors
    /// `Validation` if any limit is negative.
    pub async fn set_sku_purchase_limits(
        &self,
        limits: impl IntoIterator<Item = (Sku, Quantity)>,
    ) -> Result<(), SellerError> {
        let limits = limits.into_iter().collect();
        self.call_as(Operation::SetSkuPurchaseLimits { limits }, ignore)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn reset_purchase_history(&self, user_id: UserId) -> Result<(), SellerError> {
        self.call_as(Operation::ResetPurchaseHistory { user_id }, ignore)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn reset_all_purchase_histories(&self) -> Result<(), SellerError> {
        self.call_as(Operation::ResetAllPurchaseHistories, ignore)
            .await
    }

    // Cart timing

    /// # Errors
    /// See [`SellerClient::call`]; `UnexpectedResult` if the result is not an integer.
    pub async fn get_cart_duration_seconds(&self) -> Result<i64, SellerError> {
        self.call_as(Operation::GetCartDurationSeconds, integer)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn set_cart_duration_seconds(&self, seconds: i64) -> Result<(), SellerError> {
        self.call_as(Operation::SetCartDurationSeconds { seconds }, ignore)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`]; `UnexpectedResult` if the result is not an integer.
    pub async fn get_cart_seconds_remaining(&self, user_id: UserId) -> Result<i64, SellerError> {
        self.call_as(Operation::GetCartSecondsRemaining { user_id }, integer)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn reset_cart_start_time(&self, user_id: UserId) -> Result<(), SellerError> {
        self.call_as(Operation::ResetCartStartTime { user_id }, ignore)
            .await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn reset_all_cart_start_times(&self) -> Result<(), SellerError> {
        self.call_as(Operation::ResetAllCartStartTimes, ignore)
            .await
    }

    // Auth tokens

    /// # Errors
    /// See [`SellerClient::call`]; `UnexpectedResult` if the result is not a string.
    pub async fn generate_auth_token(
        &self,
        user_id: UserId,
        duration_mins: i64,
    ) -> Result<String, SellerError> {
        self.call_as(
            Operation::GenerateAuthToken {
                user_id,
                duration_mins,
            },
            text,
        )
        .await
    }

    /// # Errors
    /// See [`SellerClient::call`]; `UnexpectedResult` if the result is not a string.
    pub async fn get_auth_token_url(&self) -> Result<String, SellerError> {
        self.call_as(Operation::GetAuthTokenUrl, text).await
    }

    /// # Errors
    /// `Validation` if `url` is empty.
    pub async fn set_auth_token_url(&self, url: impl Into<String>) -> Result<(), SellerError> {
        self.call_as(Operation::SetAuthTokenUrl { url: url.into() }, ignore)
            .await
    }

    // Shopper events

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn send_event_to_shopper(
        &self,
        user_id: UserId,
        event_name: impl Into<String>,
        event_data: impl Into<String>,
    ) -> Result<(), SellerError> {
        let operation = Operation::SendEventToShopper {
            user_id,
            event_name: event_name.into(),
            event_data: event_data.into(),
        };
        self.call_as(operation, ignore).await
    }

    /// # Errors
    /// See [`SellerClient::call`].
    pub async fn send_event_to_all_shoppers(
        &self,
        event_name: impl Into<String>,
        event_data: impl Into<String>,
    ) -> Result<(), SellerError> {
        let operation = Operation::SendEventToAllShoppers {
            event_name: event_name.into(),
            event_data: event_data.into(),
        };
        self.call_as(operation, ignore).await
    }
}

#[allow(clippy::needless_pass_by_value, clippy::unnecessary_wraps)] // decoder signature
fn ignore(_: Value) -> Result<(), String> {
    Ok(())
}

#[allow(clippy::needless_pass_by_value)] // decoder signature
fn integer(value: Value) -> Result<i64, String> {
    value
        .as_i64()
        .ok_or_else(|| format!("expected an integer, got {value}"))
}

fn text(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(format!("expected a string, got {other}")),
    }
}

fn quantities(value: Value) -> Result<SkuMap<Quantity>, String> {
    SkuMap::from_parallel_arrays(value, "qtys")
}

fn infos(value: Value) -> Result<SkuMap<Value>, String> {
    SkuMap::from_parallel_arrays(value, "infos")
}
