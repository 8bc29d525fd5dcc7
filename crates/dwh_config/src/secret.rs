//! Secret-typed configuration values.

use std::fmt;

/// A configuration value that must never be printed, logged or exported.
///
/// The wrapped string is only reachable through [`SecretString::expose`].
/// `Debug` is redacted. There is no `Display` or `Serialize` impl.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}
