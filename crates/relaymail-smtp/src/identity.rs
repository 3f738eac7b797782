//! Client identity announced in EHLO/HELO.

/// Identity used when the machine name is unavailable or unusable.
pub const FALLBACK_IDENTITY: &str = "localhost";

/// Returns an RFC 5321 safe name for the local machine.
///
/// Falls back to [`FALLBACK_IDENTITY`] when the name cannot be read.
#[must_use]
pub fn local_identity() -> String {
    match hostname::get() {
        Ok(name) => sanitize_hostname(&name.to_string_lossy()),
        Err(e) => {
            tracing::debug!(error = %e, "hostname lookup failed");
            FALLBACK_IDENTITY.to_string()
        }
    }
}

/// Restricts a raw machine name to letters, digits and hyphens.
///
/// Every other character becomes `-`, then leading and trailing hyphens are
/// trimmed. An empty result yields [`FALLBACK_IDENTITY`].
#[must_use]
pub fn sanitize_hostname(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();

    let trimmed = mapped.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_IDENTITY.to_string()
    } else {
        trimmed.to_string()
    }
}
