//! Envelope address type.

use crate::error::{Error, Result};

/// Address used in `MAIL FROM` / `RCPT TO`.
///
/// Only emptiness and characters that would break the command line are
/// rejected; full RFC 5321 syntax is left to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty or contains whitespace,
    /// angle brackets or control characters.
    pub fn new(addr: impl AsRef<str>) -> Result<Self> {
        let addr = addr.as_ref().trim();
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }
        if let Some(c) = addr
            .chars()
            .find(|&c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>'))
        {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} contains forbidden character {c:?}"
            )));
        }
        Ok(Self(addr.to_string()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address_is_trimmed() {
        let addr = Address::new("  user@example.com ").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.to_string(), "user@example.com");
    }

    #[test]
    fn test_empty_address() {
        assert!(Address::new("").is_err());
        assert!(Address::new("   ").is_err());
    }

    #[test]
    fn test_inner_whitespace_rejected() {
        assert!(Address::new("user @example.com").is_err());
    }

    #[test]
    fn test_command_injection_rejected() {
        assert!(Address::new("a@x.com>\r\nRCPT TO:<b@y.com").is_err());
        assert!(Address::new("<a@x.com>").is_err());
    }

    #[test]
    fn test_local_names_accepted() {
        assert!(Address::new("postmaster").is_ok());
    }
}
