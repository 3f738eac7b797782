//! SMTP extension types.

/// SMTP extensions advertised in an EHLO reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS - TLS upgrade
    StartTls,
    /// Anything this client does not act on
    Unknown(String),
}

impl Extension {
    /// Parses an extension line from an EHLO reply.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line.split_whitespace().next() {
            Some(keyword) if keyword.eq_ignore_ascii_case("STARTTLS") => Self::StartTls,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_starttls_any_case() {
        assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert_eq!(
            Extension::parse("AUTH PLAIN LOGIN"),
            Extension::Unknown("AUTH PLAIN LOGIN".to_string())
        );
        assert_eq!(
            Extension::parse("STARTTLSX"),
            Extension::Unknown("STARTTLSX".to_string())
        );
        assert!(matches!(Extension::parse(""), Extension::Unknown(_)));
    }
}
