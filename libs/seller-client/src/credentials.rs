use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ValidationError;
use crate::validate;

/// Application secret.
///
/// `Debug` and `Display` print `[REDACTED]`; the buffer is zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AppSecret(String);

impl AppSecret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read-only access for building the request envelope.
    ///
    /// Callers must not log or persist the returned slice.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for AppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for AppSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_text(deserializer).map(Self)
    }
}

/// Text that a config file may spell as a bare number (`app_id: 1234`).
pub(crate) fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextVisitor;

    impl Visitor<'_> for TextVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

/// Application identity sent with every call.
///
/// Validated once at construction and immutable afterwards.
#[derive(Clone, Debug)]
pub struct Credentials {
    app_id: String,
    app_secret: AppSecret,
}

impl Credentials {
    /// # Errors
    /// Returns `ValidationError` if either value is empty.
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::from_parts(app_id.into(), AppSecret::new(app_secret))
    }

    /// # Errors
    /// Returns `ValidationError` if either value is empty.
    pub fn from_parts(app_id: String, app_secret: AppSecret) -> Result<Self, ValidationError> {
        validate::non_empty_text("appId", &app_id)?;
        validate::non_empty_text("appSecret", app_secret.expose())?;
        Ok(Self { app_id, app_secret })
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    #[must_use]
    pub fn app_secret(&self) -> &AppSecret {
        &self.app_secret
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::error::ValidationRule;

    #[test]
    fn test_credentials_valid() {
        let creds = Credentials::new("shop-1", "s3cret").unwrap();
        assert_eq!(creds.app_id(), "shop-1");
        assert_eq!(creds.app_secret().expose(), "s3cret");
    }

    #[test]
    fn test_empty_app_id_rejected() {
        let err = Credentials::new("", "s3cret").unwrap_err();
        assert_eq!(err.field, "appId");
        assert_eq!(err.rule, ValidationRule::NonEmptyText);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = Credentials::new("shop-1", "").unwrap_err();
        assert_eq!(err.field, "appSecret");
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let creds = Credentials::new("shop-1", "super-secret-value").unwrap();
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("shop-1"));
        assert!(!dbg.contains("super-secret-value"));
        assert!(dbg.contains("[REDACTED]"));
        assert_eq!(format!("{}", creds.app_secret()), "[REDACTED]");
    }

    #[test]
    fn test_secret_deserializes_from_string() {
        let secret: AppSecret = serde_json::from_str("\"hunter2\"").unwrap();
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_secret_deserializes_from_number() {
        let secret: AppSecret = serde_json::from_str("12345").unwrap();
        assert_eq!(secret.expose(), "12345");
    }
}
