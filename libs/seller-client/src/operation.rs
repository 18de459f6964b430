//! The closed set of seller operations.
//!
//! Each variant knows its wire name, its argument rules and how its `fn-arg`
//! is shaped. Argument types already rule out non-integers and non-strings;
//! [`Operation::validate`] checks what the types cannot.

use serde_json::{Value, json};

use crate::error::ValidationError;
use crate::sku_map::SkuMap;
use crate::validate;

pub type Sku = i64;
pub type UserId = i64;
pub type Quantity = i64;

/// A seller-side call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GetStockQuantity { sku: Sku },
    GetStockQuantities { skus: Vec<Sku> },
    SetStockQuantity { sku: Sku, qty: Quantity },
    SetStockQuantities { qtys: SkuMap<Quantity> },
    GetAllStockQuantities,
    GetSkuInfo { sku: Sku },
    GetSkuInfos { skus: Vec<Sku> },
    GetAllSkuInfos,
    GetAggregateSkuInfo,
    GetCart { user_id: UserId },
    EmptyCart { user_id: UserId },
    RemoveSkuFromAllCarts { sku: Sku },
    MarkCartAsPurchased { user_id: UserId },
    MarkSomeCartSkusAsPurchased { user_id: UserId, skus: Vec<Sku> },
    GetSkuPurchaseLimit { sku: Sku },
    SetSkuPurchaseLimit { sku: Sku, limit: Quantity },
    GetAllSkuPurchaseLimits,
    SetSkuPurchaseLimits { limits: SkuMap<Quantity> },
    ResetPurchaseHistory { user_id: UserId },
    ResetAllPurchaseHistories,
    GetCartDurationSeconds,
    SetCartDurationSeconds { seconds: i64 },
    GetCartSecondsRemaining { user_id: UserId },
    ResetCartStartTime { user_id: UserId },
    ResetAllCartStartTimes,
    GenerateAuthToken { user_id: UserId, duration_mins: i64 },
    GetAuthTokenUrl,
    SetAuthTokenUrl { url: String },
    SendEventToShopper {
        user_id: UserId,
        event_name: String,
        event_data: String,
    },
    SendEventToAllShoppers {
        event_name: String,
        event_data: String,
    },
}

impl Operation {
    /// Wire token sent as `fn-name`.
    #[must_use]
    pub fn fn_name(&self) -> &'static str {
        match self {
            Self::GetStockQuantity { .. } => "get-stock-quantity",
            Self::GetStockQuantities { .. } => "get-stock-quantities",
            Self::SetStockQuantity { .. } => "set-stock-quantity",
            Self::SetStockQuantities { .. } => "set-stock-quantities",
            Self::GetAllStockQuantities => "get-all-stock-quantities",
            Self::GetSkuInfo { .. } => "get-sku-info",
            Self::GetSkuInfos { .. } => "get-sku-infos",
            Self::GetAllSkuInfos => "get-all-sku-infos",
            Self::GetAggregateSkuInfo => "get-aggregate-sku-info",
            Self::GetCart { .. } => "get-cart",
            Self::EmptyCart { .. } => "empty-cart",
            Self::RemoveSkuFromAllCarts { .. } => "remove-sku-from-all-carts",
            // Marking the whole cart is the same call with an empty sku list
            Self::MarkCartAsPurchased { .. } | Self::MarkSomeCartSkusAsPurchased { .. } => {
                "mark-cart-as-purchased"
            }
            Self::GetSkuPurchaseLimit { .. } => "get-sku-purchase-limit",
            Self::SetSkuPurchaseLimit { .. } => "set-sku-purchase-limit",
            Self::GetAllSkuPurchaseLimits => "get-all-sku-purchase-limits",
            Self::SetSkuPurchaseLimits { .. } => "set-sku-purchase-limits",
            Self::ResetPurchaseHistory { .. } => "reset-purchase-history",
            Self::ResetAllPurchaseHistories => "reset-all-purchase-histories",
            Self::GetCartDurationSeconds => "get-cart-duration-seconds",
            Self::SetCartDurationSeconds { .. } => "set-cart-duration-seconds",
            Self::GetCartSecondsRemaining { .. } => "get-cart-seconds-remaining",
            Self::ResetCartStartTime { .. } => "reset-cart-start-time",
            Self::ResetAllCartStartTimes => "reset-all-cart-start-times",
            Self::GenerateAuthToken { .. } => "generate-auth-token",
            Self::GetAuthTokenUrl => "get-auth-token-url",
            Self::SetAuthTokenUrl { .. } => "set-auth-token-url",
            Self::SendEventToShopper { .. } => "send-event-to-shopper",
            Self::SendEventToAllShoppers { .. } => "send-event-to-all-shoppers",
        }
    }

    /// Check the argument rules the types cannot express.
    ///
    /// # Errors
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::SetStockQuantity { qty, .. } => validate::non_negative("qty", *qty).map(drop),
            Self::SetSkuPurchaseLimit { limit, .. } => {
                validate::non_negative("limit", *limit).map(drop)
            }
            Self::SetStockQuantities { qtys } => {
                validate::non_negative_values("qtys", qtys.values().copied())
            }
            Self::SetSkuPurchaseLimits { limits } => {
                validate::non_negative_values("limits", limits.values().copied())
            }
            Self::GetStockQuantities { skus }
            | Self::GetSkuInfos { skus }
            | Self::MarkSomeCartSkusAsPurchased { skus, .. } => {
                validate::non_empty_sequence("skus", skus)
            }
            Self::SetAuthTokenUrl { url } => validate::non_empty_text("url", url),
            Self::GetStockQuantity { .. }
            | Self::GetAllStockQuantities
            | Self::GetSkuInfo { .. }
            | Self::GetAllSkuInfos
            | Self::GetAggregateSkuInfo
            | Self::GetCart { .. }
            | Self::EmptyCart { .. }
            | Self::RemoveSkuFromAllCarts { .. }
            | Self::MarkCartAsPurchased { .. }
            | Self::GetSkuPurchaseLimit { .. }
            | Self::GetAllSkuPurchaseLimits
            | Self::ResetPurchaseHistory { .. }
            | Self::ResetAllPurchaseHistories
            | Self::GetCartDurationSeconds
            | Self::SetCartDurationSeconds { .. }
            | Self::GetCartSecondsRemaining { .. }
            | Self::ResetCartStartTime { .. }
            | Self::ResetAllCartStartTimes
            | Self::GenerateAuthToken { .. }
            | Self::GetAuthTokenUrl
            | Self::SendEventToShopper { .. }
            | Self::SendEventToAllShoppers { .. } => Ok(()),
        }
    }

    /// Argument sent as `fn-arg`.
    #[must_use]
    pub fn fn_arg(&self) -> Value {
        match self {
            Self::GetStockQuantity { sku }
            | Self::GetSkuInfo { sku }
            | Self::RemoveSkuFromAllCarts { sku }
            | Self::GetSkuPurchaseLimit { sku } => json!(sku),
            Self::GetCart { user_id }
            | Self::EmptyCart { user_id }
            | Self::ResetPurchaseHistory { user_id }
            | Self::GetCartSecondsRemaining { user_id }
            | Self::ResetCartStartTime { user_id } => json!(user_id),
            Self::SetCartDurationSeconds { seconds } => json!(seconds),
            Self::GetStockQuantities { skus } | Self::GetSkuInfos { skus } => {
                json!({ "skus": skus })
            }
            Self::SetStockQuantity { sku, qty } => json!({ "sku": sku, "qty": qty }),
            Self::SetSkuPurchaseLimit { sku, limit } => json!({ "sku": sku, "qty": limit }),
            Self::SetStockQuantities { qtys: values }
            | Self::SetSkuPurchaseLimits { limits: values } => json!({
                "skus": values.skus().collect::<Vec<_>>(),
                "qtys": values.values().collect::<Vec<_>>(),
            }),
            Self::MarkCartAsPurchased { user_id } => {
                json!({ "user-id": user_id, "skus": [] })
            }
            Self::MarkSomeCartSkusAsPurchased { user_id, skus } => {
                json!({ "user-id": user_id, "skus": skus })
            }
            Self::GenerateAuthToken {
                user_id,
                duration_mins,
            } => json!({ "user-id": user_id, "token-duration-mins": duration_mins }),
            Self::SetAuthTokenUrl { url } => json!(url),
            Self::SendEventToShopper {
                user_id,
                event_name,
                event_data,
            } => json!({
                "user-id": user_id,
                "event-name": event_name,
                "event-data": event_data,
            }),
            Self::SendEventToAllShoppers {
                event_name,
                event_data,
            } => json!({ "event-name": event_name, "event-data": event_data }),
            Self::GetAllStockQuantities
            | Self::GetAllSkuInfos
            | Self::GetAggregateSkuInfo
            | Self::GetAllSkuPurchaseLimits
            | Self::ResetAllPurchaseHistories
            | Self::GetCartDurationSeconds
            | Self::ResetAllCartStartTimes
            | Self::GetAuthTokenUrl => Value::Null,
        }
    }
}
