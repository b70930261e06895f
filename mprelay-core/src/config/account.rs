//! Source account configuration.

use compact_str::CompactString;
use url::Url;

/// Bearer token for the payment-search API.
///
/// `Debug` and `Display` never print the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Box<str>);

impl Credential {
    pub fn new(token: impl Into<Box<str>>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// One polled payment account and the collector its records go to.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Unique account name. Used as the seen-cache namespace and as the
    /// `origen` of every record forwarded for this account.
    pub name: CompactString,
    pub credential: Credential,
    pub destination: Url,
}

impl AccountConfig {
    pub fn new(name: impl Into<CompactString>, credential: Credential, destination: Url) -> Self {
        Self {
            name: name.into(),
            credential,
            destination,
        }
    }
}
