// ── Tapkeeper Atoms: Error Types ───────────────────────────────────────────
// Single canonical error enum for the crate, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, network, config…).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • Exactly one variant — `InvalidSession` — is fatal: it ends the owning
//     session's task permanently. Every other variant is transient and is
//     handled by log-and-sleep at the point of failure.
//   • No variant carries secret material (credential blobs, proxy passwords)
//     in its message.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClaimerError {
    /// The Telegram account behind this session is unauthorized, deactivated,
    /// or its auth key is unregistered. The only fatal error: the session
    /// task must stop and never retry.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// HTTP / network failure (reqwest layer).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is missing, unparseable, or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Telegram gateway returned a non-fatal error payload.
    #[error("telegram error: {0}")]
    Telegram(String),

    /// The handshake redirect URL or the credential blob inside it could not
    /// be parsed. Transient — the next refresh attempt starts from scratch.
    #[error("malformed web-app data: {0}")]
    WebAppData(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

impl ClaimerError {
    /// Fatal errors terminate the per-session loop; everything else is
    /// logged and retried on the loop's own schedule.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClaimerError::InvalidSession(_))
    }
}

// ── Migration bridge: String → ClaimerError ────────────────────────────────
// Allows `?` on helpers that format their own error strings.

impl From<String> for ClaimerError {
    fn from(s: String) -> Self {
        ClaimerError::Other(s)
    }
}

impl From<&str> for ClaimerError {
    fn from(s: &str) -> Self {
        ClaimerError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All fallible operations in the crate return this type.
pub type ClaimerResult<T> = Result<T, ClaimerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invalid_session_is_fatal() {
        assert!(ClaimerError::InvalidSession("main".into()).is_fatal());
        assert!(!ClaimerError::Config("bad".into()).is_fatal());
        assert!(!ClaimerError::Telegram("FLOOD_WAIT".into()).is_fatal());
        assert!(!ClaimerError::WebAppData("no user field".into()).is_fatal());
        assert!(!ClaimerError::Other("boom".into()).is_fatal());
    }

    #[test]
    fn string_bridge_maps_to_other() {
        let err: ClaimerError = "plain message".into();
        assert!(matches!(err, ClaimerError::Other(_)));
        assert_eq!(err.to_string(), "plain message");
    }
}
