use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Rule an argument failed during local validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationRule {
    /// Text must not be empty
    NonEmptyText,
    /// Integer must be zero or greater
    NonNegative,
    /// Sequence of integers must contain at least one element
    NonEmptySequence,
}

impl ValidationRule {
    fn describe(self) -> &'static str {
        match self {
            Self::NonEmptyText => "must be a non-empty string",
            Self::NonNegative => "must not be negative",
            Self::NonEmptySequence => "must be a non-empty sequence of integers",
        }
    }
}

/// An argument failed its validation rule; raised before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} {}", .rule.describe())]
pub struct ValidationError {
    /// Name of the offending argument (e.g. `qty`, `qtys[2]`)
    pub field: String,
    pub rule: ValidationRule,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, rule: ValidationRule) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }
}

/// Failure of a single HTTP exchange.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// URL could not be parsed or lacks scheme/host
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri { url: String, reason: String },

    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Single attempt exceeded the per-request timeout
    #[error("Request attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Network-level failure (connect, reset, DNS, ...)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS setup failure
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// HTTP non-2xx status
    #[error("HTTP {status}: {body_preview}")]
    HttpStatus {
        status: http::StatusCode,
        body_preview: String,
    },

    /// Response body exceeded the configured limit
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// The buffered transport worker is gone
    #[error("Service unavailable: transport worker closed")]
    ServiceClosed,
}

impl From<hyper_util::client::legacy::Error> for TransportError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        TransportError::Transport(Box::new(err))
    }
}

/// Gateway directory lookup failure.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Fetch(#[source] TransportError),

    #[error("directory response is not a JSON array of addresses: {0}")]
    Parse(#[source] serde_json::Error),
}

/// A response body that is not a usable response envelope.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EnvelopeError {
    #[error("response body is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    #[error("response envelope is not a JSON object")]
    NotAnObject,

    #[error("response envelope has neither 'result' nor 'error'")]
    MissingFields,
}

/// Why one gateway was skipped during sequential failover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayFailure {
    /// Proxy URL that was attempted
    pub gateway: String,
    /// Diagnostic message (unstable format, for logging only)
    pub reason: String,
}

impl fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.gateway, self.reason)
    }
}

/// Dispatch failure.
///
/// Use [`RpcError::kind`] for programmatic matching.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RpcError {
    /// Empty function name
    #[error("fnName must be a non-empty string")]
    InvalidFunction,

    /// The gateway list could not be resolved; no gateway was attempted
    #[error("gateway directory unavailable: {source}")]
    DirectoryUnavailable {
        #[source]
        source: DirectoryError,
    },

    /// Every candidate gateway failed at the transport or envelope level
    /// (also returned when the directory lists no gateway at all)
    #[error("no F1 gateway could be reached ({} attempted)", .failures.len())]
    AllGatewaysUnreachable { failures: Vec<GatewayFailure> },

    /// The backend reported a logical error
    #[error("remote error: {message}")]
    RemoteError { message: String },

    /// Single-attempt policy only: the picked gateway answered with garbage
    #[error("malformed response envelope from {gateway}: {source}")]
    MalformedEnvelope {
        gateway: String,
        #[source]
        source: EnvelopeError,
    },

    /// Single-attempt policy only: the picked gateway could not be reached
    #[error("gateway {gateway} unreachable: {source}")]
    Transport {
        gateway: String,
        #[source]
        source: TransportError,
    },

    /// Total dispatch deadline exceeded (directory lookup plus all attempts)
    #[error("dispatch deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The client's cancellation token fired while the call was in flight
    #[error("dispatch cancelled")]
    Cancelled,

    /// The request envelope could not be serialized
    #[error("failed to encode request envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Classification of [`RpcError`] without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RpcErrorKind {
    InvalidFunction,
    DirectoryUnavailable,
    AllGatewaysUnreachable,
    RemoteError,
    MalformedEnvelope,
    Transport,
    DeadlineExceeded,
    Cancelled,
    Encode,
}

impl RpcError {
    #[must_use]
    pub fn kind(&self) -> RpcErrorKind {
        match self {
            Self::InvalidFunction => RpcErrorKind::InvalidFunction,
            Self::DirectoryUnavailable { .. } => RpcErrorKind::DirectoryUnavailable,
            Self::AllGatewaysUnreachable { .. } => RpcErrorKind::AllGatewaysUnreachable,
            Self::RemoteError { .. } => RpcErrorKind::RemoteError,
            Self::MalformedEnvelope { .. } => RpcErrorKind::MalformedEnvelope,
            Self::Transport { .. } => RpcErrorKind::Transport,
            Self::DeadlineExceeded(_) => RpcErrorKind::DeadlineExceeded,
            Self::Cancelled => RpcErrorKind::Cancelled,
            Self::Encode(_) => RpcErrorKind::Encode,
        }
    }

    /// Message reported by the backend, for `RemoteError` only.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::RemoteError { message } => Some(message),
            _ => None,
        }
    }
}

/// Error returned by every [`SellerClient`](crate::SellerClient) operation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SellerError {
    /// An argument was rejected locally; nothing was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The RPC itself failed
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The call succeeded but its result does not have the expected shape
    #[error("unexpected result for '{fn_name}': {reason}")]
    UnexpectedResult {
        fn_name: &'static str,
        reason: String,
    },
}

impl SellerError {
    /// Kind of the underlying RPC failure, if this is one.
    #[must_use]
    pub fn rpc_kind(&self) -> Option<RpcErrorKind> {
        match self {
            Self::Rpc(e) => Some(e.kind()),
            Self::Validation(_) | Self::UnexpectedResult { .. } => None,
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub(crate) fn unexpected(fn_name: &'static str, reason: impl fmt::Display) -> Self {
        Self::UnexpectedResult {
            fn_name,
            reason: reason.to_string(),
        }
    }
}
