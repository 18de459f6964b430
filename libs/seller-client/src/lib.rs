#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Seller-side client for the F1 shopping-cart backend
//!
//! Every administrative call (stock levels, purchase limits, carts, auth
//! tokens, shopper events) travels as a fixed JSON envelope POSTed to one of
//! the gateways currently serving the application:
//!
//! - The gateway list is resolved from the directory on every call
//! - Gateways are tried in order until one answers (or one is picked at random,
//!   see [`SelectionPolicy`])
//! - A logical error reported by the backend is authoritative and never retried
//! - Arguments are validated locally; nothing is sent when validation fails
//!
//! # Example
//!
//! ```ignore
//! use seller_client::{Credentials, RpcConfig, SellerClient};
//!
//! let credentials = Credentials::new("my-app", "my-secret")?;
//! let client = SellerClient::new(credentials, RpcConfig::default())?;
//!
//! client.set_stock_quantity(1001, 25).await?;
//! let cart = client.get_cart(42).await?;
//! for (sku, qty) in &cart {
//!     println!("{sku}: {qty}");
//! }
//! ```

mod client;
mod config;
mod credentials;
mod directory;
mod dispatch;
mod envelope;
mod error;
mod operation;
mod sku_map;
mod transport;
mod validate;

pub use client::SellerClient;
pub use config::{
    ConfigError, DEFAULT_DIRECTORY_URL, DEFAULT_PROXY_PATH, DEFAULT_USER_AGENT, ENV_PREFIX,
    RpcConfig, SelectionPolicy, SellerClientConfig, TlsRootConfig,
};
pub use credentials::{AppSecret, Credentials};
pub use directory::{GatewayAddress, GatewayDirectory};
pub use dispatch::Dispatcher;
pub use envelope::{Outcome, RequestEnvelope, ResponseEnvelope};
pub use error::{
    DirectoryError, EnvelopeError, GatewayFailure, RpcError, RpcErrorKind, SellerError,
    TransportError, ValidationError, ValidationRule,
};
pub use operation::{Operation, Quantity, Sku, UserId};
pub use sku_map::SkuMap;
pub use transport::{HttpTransport, Transport};
