use anyhow::{Context, Result};
use clap::Subcommand;
use seller_client::{Quantity, SellerClient, Sku, UserId};
use serde_json::Value;

#[derive(Subcommand)]
pub enum Command {
    /// Stock level of one sku
    GetStockQuantity { sku: Sku },
    /// Stock levels of several skus
    GetStockQuantities {
        #[arg(required = true)]
        skus: Vec<Sku>,
    },
    /// Set the stock level of one sku
    SetStockQuantity {
        sku: Sku,
        #[arg(allow_negative_numbers = true)]
        qty: Quantity,
    },
    /// Set several stock levels, given as SKU=QTY pairs
    SetStockQuantities {
        #[arg(required = true, value_parser = parse_entry, allow_hyphen_values = true)]
        entries: Vec<(Sku, Quantity)>,
    },
    /// Stock levels of every sku
    GetAllStockQuantities,
    /// Info record of one sku
    GetSkuInfo { sku: Sku },
    /// Info records of several skus
    GetSkuInfos {
        #[arg(required = true)]
        skus: Vec<Sku>,
    },
    /// Info records of every sku
    GetAllSkuInfos,
    /// Aggregate info across all skus
    GetAggregateSkuInfo,
    /// Contents of a shopper's cart
    GetCart { user_id: UserId },
    /// Remove everything from a shopper's cart
    EmptyCart { user_id: UserId },
    /// Remove a sku from every cart
    RemoveSkuFromAllCarts { sku: Sku },
    /// Mark a whole cart as purchased
    MarkCartAsPurchased { user_id: UserId },
    /// Mark some skus of a cart as purchased
    MarkSomeCartSkusAsPurchased {
        user_id: UserId,
        #[arg(required = true)]
        skus: Vec<Sku>,
    },
    /// Per-shopper purchase limit of one sku
    GetSkuPurchaseLimit { sku: Sku },
    /// Set the purchase limit of one sku
    SetSkuPurchaseLimit {
        sku: Sku,
        #[arg(allow_negative_numbers = true)]
        limit: Quantity,
    },
    /// Purchase limits of every sku
    GetAllSkuPurchaseLimits,
    /// Set several purchase limits, given as SKU=LIMIT pairs
    SetSkuPurchaseLimits {
        #[arg(required = true, value_parser = parse_entry, allow_hyphen_values = true)]
        entries: Vec<(Sku, Quantity)>,
    },
    /// Forget a shopper's purchase history
    ResetPurchaseHistory { user_id: UserId },
    /// Forget every purchase history
    ResetAllPurchaseHistories,
    /// How long a cart is held
    GetCartDurationSeconds,
    /// Change how long a cart is held
    SetCartDurationSeconds {
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },
    /// Time left on a shopper's cart
    GetCartSecondsRemaining { user_id: UserId },
    /// Restart a shopper's cart timer
    ResetCartStartTime { user_id: UserId },
    /// Restart every cart timer
    ResetAllCartStartTimes,
    /// Issue an auth token for a shopper
    GenerateAuthToken { user_id: UserId, duration_mins: i64 },
    /// URL shoppers are sent to for authentication
    GetAuthTokenUrl,
    /// Change the authentication URL
    SetAuthTokenUrl { url: String },
    /// Push an event to one shopper
    SendEventToShopper {
        user_id: UserId,
        event_name: String,
        event_data: String,
    },
    /// Push an event to every connected shopper
    SendEventToAllShoppers {
        event_name: String,
        event_data: String,
    },
    /// Send an arbitrary function with a JSON argument, bypassing local validation
    Call {
        fn_name: String,
        /// JSON value sent as fn-arg (default: null)
        #[arg(long)]
        arg: Option<String>,
    },
}

fn parse_entry(raw: &str) -> Result<(Sku, Quantity), String> {
    let (sku, qty) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SKU=VALUE, got '{raw}'"))?;
    let sku = sku.trim().parse().map_err(|e| format!("invalid sku '{sku}': {e}"))?;
    let qty = qty.trim().parse().map_err(|e| format!("invalid value '{qty}': {e}"))?;
    Ok((sku, qty))
}

fn json(value: impl serde::Serialize) -> Result<Option<Value>> {
    Ok(Some(serde_json::to_value(value)?))
}

impl Command {
    /// Run against `client`; `None` for operations without a meaningful result.
    #[allow(clippy::too_many_lines)] // one arm per operation
    pub async fn execute(self, client: &SellerClient) -> Result<Option<Value>> {
        match self {
            Self::GetStockQuantity { sku } => json(client.get_stock_quantity(sku).await?),
            Self::GetStockQuantities { skus } => json(client.get_stock_quantities(skus).await?),
            Self::SetStockQuantity { sku, qty } => {
                client.set_stock_quantity(sku, qty).await?;
                Ok(None)
            }
            Self::SetStockQuantities { entries } => {
                client.set_stock_quantities(entries).await?;
                Ok(None)
            }
            Self::GetAllStockQuantities => json(client.get_all_stock_quantities().await?),
            Self::GetSkuInfo { sku } => json(client.get_sku_info(sku).await?),
            Self::GetSkuInfos { skus } => json(client.get_sku_infos(skus).await?),
            Self::GetAllSkuInfos => json(client.get_all_sku_infos().await?),
            Self::GetAggregateSkuInfo => json(client.get_aggregate_sku_info().await?),
            Self::GetCart { user_id } => json(client.get_cart(user_id).await?),
            Self::EmptyCart { user_id } => {
                client.empty_cart(user_id).await?;
                Ok(None)
            }
            Self::RemoveSkuFromAllCarts { sku } => {
                client.remove_sku_from_all_carts(sku).await?;
                Ok(None)
            }
            Self::MarkCartAsPurchased { user_id } => {
                client.mark_cart_as_purchased(user_id).await?;
                Ok(None)
            }
            Self::MarkSomeCartSkusAsPurchased { user_id, skus } => {
                client.mark_some_cart_skus_as_purchased(user_id, skus).await?;
                Ok(None)
            }
            Self::GetSkuPurchaseLimit { sku } => json(client.get_sku_purchase_limit(sku).await?),
            Self::SetSkuPurchaseLimit { sku, limit } => {
                client.set_sku_purchase_limit(sku, limit).await?;
                Ok(None)
            }
            Self::GetAllSkuPurchaseLimits => json(client.get_all_sku_purchase_limits().await?),
            Self::SetSkuPurchaseLimits { entries } => {
                client.set_sku_purchase_limits(entries).await?;
                Ok(None)
            }
            Self::ResetPurchaseHistory { user_id } => {
                client.reset_purchase_history(user_id).await?;
                Ok(None)
            }
            Self::ResetAllPurchaseHistories => {
                client.reset_all_purchase_histories().await?;
                Ok(None)
            }
            Self::GetCartDurationSeconds => json(client.get_cart_duration_seconds().await?),
            Self::SetCartDurationSeconds { seconds } => {
                client.set_cart_duration_seconds(seconds).await?;
                Ok(None)
            }
            Self::GetCartSecondsRemaining { user_id } => {
                json(client.get_cart_seconds_remaining(user_id).await?)
            }
            Self::ResetCartStartTime { user_id } => {
                client.reset_cart_start_time(user_id).await?;
                Ok(None)
            }
            Self::ResetAllCartStartTimes => {
                client.reset_all_cart_start_times().await?;
                Ok(None)
            }
            Self::GenerateAuthToken {
                user_id,
                duration_mins,
            } => json(client.generate_auth_token(user_id, duration_mins).await?),
            Self::GetAuthTokenUrl => json(client.get_auth_token_url().await?),
            Self::SetAuthTokenUrl { url } => {
                client.set_auth_token_url(url).await?;
                Ok(None)
            }
            Self::SendEventToShopper {
                user_id,
                event_name,
                event_data,
            } => {
                client
                    .send_event_to_shopper(user_id, event_name, event_data)
                    .await?;
                Ok(None)
            }
            Self::SendEventToAllShoppers {
                event_name,
                event_data,
            } => {
                client
                    .send_event_to_all_shoppers(event_name, event_data)
                    .await?;
                Ok(None)
            }
            Self::Call { fn_name, arg } => {
                let fn_arg = match arg {
                    Some(raw) => serde_json::from_str(&raw).context("--arg is not valid JSON")?,
                    None => Value::Null,
                };
                json(client.dispatcher().dispatch(&fn_name, fn_arg).await?)
            }
        }
    }
}
