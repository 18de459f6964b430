//! Wire envelopes exchanged with a gateway's seller proxy.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::credentials::Credentials;
use crate::error::EnvelopeError;

/// Body POSTed to a gateway:
/// `{"app-id", "app-secret", "fn-name", "fn-arg"}`.
#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequestEnvelope<'a> {
    app_id: &'a str,
    app_secret: &'a str,
    fn_name: &'a str,
    fn_arg: &'a Value,
}

impl<'a> RequestEnvelope<'a> {
    #[must_use]
    pub fn new(credentials: &'a Credentials, fn_name: &'a str, fn_arg: &'a Value) -> Self {
        Self {
            app_id: credentials.app_id(),
            app_secret: credentials.app_secret().expose(),
            fn_name,
            fn_arg,
        }
    }

    /// # Errors
    /// Returns `serde_json::Error` if the argument cannot be serialized.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

impl fmt::Debug for RequestEnvelope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEnvelope")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("fn_name", &self.fn_name)
            .field("fn_arg", &self.fn_arg)
            .finish()
    }
}

/// Decoded `{result, error}` reply.
///
/// Absent and `null` members are both `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub result: Option<Value>,
    pub error: Option<Value>,
}

/// What a well-formed envelope says about the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    /// Logical error reported by the backend
    Failure(String),
}

impl ResponseEnvelope {
    /// Parse a gateway response body.
    ///
    /// # Errors
    /// Returns `EnvelopeError` if the body is not JSON, not an object, or
    /// carries neither `result` nor `error`.
    pub fn parse(body: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_slice(body).map_err(EnvelopeError::NotJson)?;
        let Value::Object(mut object) = value else {
            return Err(EnvelopeError::NotAnObject);
        };
        if !object.contains_key("result") && !object.contains_key("error") {
            return Err(EnvelopeError::MissingFields);
        }

        let mut member = |key: &str| object.remove(key).filter(|v| !v.is_null());
        Ok(Self {
            result: member("result"),
            error: member("error"),
        })
    }

    /// A non-null `result` wins even if `error` is also set.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        match (self.result, self.error) {
            (Some(result), _) => Outcome::Success(result),
            (None, Some(Value::String(message))) => Outcome::Failure(message),
            (None, Some(other)) => Outcome::Failure(other.to_string()),
            (None, None) => Outcome::Failure(String::new()),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope_wire_shape() {
        let creds = Credentials::new("shop-1", "s3cret").unwrap();
        let arg = json!({"sku": 5, "qty": 0});
        let envelope = RequestEnvelope::new(&creds, "set-stock-quantity", &arg);

        let wire: Value = serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(
            wire,
            json!({
                "app-id": "shop-1",
                "app-secret": "s3cret",
                "fn-name": "set-stock-quantity",
                "fn-arg": {"sku": 5, "qty": 0},
            })
        );
    }

    #[test]
    fn test_request_envelope_null_arg() {
        let creds = Credentials::new("shop-1", "s3cret").unwrap();
        let envelope = RequestEnvelope::new(&creds, "get-all-stock-quantities", &Value::Null);
        let wire: Value = serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();
        assert!(wire["fn-arg"].is_null());
        assert!(wire.as_object().unwrap().contains_key("fn-arg"));
    }

    #[test]
    fn test_request_envelope_debug_redacts_secret() {
        let creds = Credentials::new("shop-1", "s3cret").unwrap();
        let envelope = RequestEnvelope::new(&creds, "empty-cart", &Value::Null);
        let dbg = format!("{envelope:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("empty-cart"));
    }

    #[test]
    fn test_success_outcome() {
        let outcome = ResponseEnvelope::parse(br#"{"result": 42, "error": null}"#)
            .unwrap()
            .into_outcome();
        assert_eq!(outcome, Outcome::Success(json!(42)));
    }

    #[test]
    fn test_result_wins_over_error() {
        let outcome = ResponseEnvelope::parse(br#"{"result": true, "error": "ignored"}"#)
            .unwrap()
            .into_outcome();
        assert_eq!(outcome, Outcome::Success(json!(true)));
    }

    #[test]
    fn test_falsy_results_are_success() {
        for body in [r#"{"result": 0}"#, r#"{"result": false}"#, r#"{"result": ""}"#] {
            let outcome = ResponseEnvelope::parse(body.as_bytes()).unwrap().into_outcome();
            assert!(matches!(outcome, Outcome::Success(_)), "{body}");
        }
    }

    #[test]
    fn test_failure_outcomes() {
        let outcome = ResponseEnvelope::parse(br#"{"result": null, "error": "unknown sku"}"#)
            .unwrap()
            .into_outcome();
        assert_eq!(outcome, Outcome::Failure("unknown sku".to_owned()));

        let outcome = ResponseEnvelope::parse(br#"{"error": {"code": 7}}"#)
            .unwrap()
            .into_outcome();
        assert_eq!(outcome, Outcome::Failure(r#"{"code":7}"#.to_owned()));

        let outcome = ResponseEnvelope::parse(br#"{"result": null}"#)
            .unwrap()
            .into_outcome();
        assert_eq!(outcome, Outcome::Failure(String::new()));
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(
            ResponseEnvelope::parse(b"<html>bad gateway</html>"),
            Err(EnvelopeError::NotJson(_))
        ));
        assert!(matches!(
            ResponseEnvelope::parse(b"[1, 2]"),
            Err(EnvelopeError::NotAnObject)
        ));
        assert!(matches!(
            ResponseEnvelope::parse(br#"{"status": "ok"}"#),
            Err(EnvelopeError::MissingFields)
        ));
    }
}
