//! `host:port` helpers that are safe for IPv6 literals.

use crate::error::{Error, Result};

/// Joins a host and port into an authority string.
///
/// Hosts containing a colon (IPv6 literals) are wrapped in brackets unless
/// they already are.
#[must_use]
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Splits an authority string produced by [`join_host_port`].
///
/// The returned host has brackets removed.
///
/// # Errors
///
/// Returns [`Error::InvalidRelay`] when the port is missing or not a
/// number, brackets are unbalanced, or an IPv6 literal is not bracketed.
pub fn split_host_port(addr: &str) -> Result<(&str, u16)> {
    let invalid = |reason| Error::InvalidRelay {
        addr: addr.to_string(),
        reason,
    };

    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| invalid("missing ']' in address"))?;
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        (host, port)
    } else {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        if host.contains(':') {
            return Err(invalid("too many colons in address"));
        }
        if host.contains(['[', ']']) {
            return Err(invalid("unexpected bracket in address"));
        }
        (host, port)
    };

    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("invalid port"));
    }
    let port = port.parse().map_err(|_| invalid("port out of range"))?;
    Ok((host, port))
}
