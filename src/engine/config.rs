// ── Tapkeeper Engine: Settings ─────────────────────────────────────────────
// TOML settings file: one gateway block plus one [[sessions]] entry per
// Telegram account. Validated up front so a typo'd proxy or duplicate session
// name fails the process before any task starts.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::atoms::error::{ClaimerError, ClaimerResult};
use crate::atoms::types::ProxyConfig;

// ── Schema ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
}

/// The local MTProto session gateway (see engine/telegram.rs).
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig { base_url: "http://127.0.0.1:8787".into(), api_key: String::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    /// `scheme://[user:pass@]host:port`, shared by the Telegram session and
    /// the game HTTP client.
    #[serde(default)]
    pub proxy: Option<String>,
}

impl SessionConfig {
    pub fn proxy_config(&self) -> ClaimerResult<Option<ProxyConfig>> {
        self.proxy.as_deref().map(str::parse).transpose()
    }
}

// ── Loading ────────────────────────────────────────────────────────────────

impl Settings {
    pub fn load(path: &Path) -> ClaimerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ClaimerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> ClaimerResult<Self> {
        let settings: Settings =
            toml::from_str(raw).map_err(|e| ClaimerError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> ClaimerResult<()> {
        if self.sessions.is_empty() {
            return Err(ClaimerError::Config("no [[sessions]] configured".into()));
        }
        if self.gateway.base_url.is_empty() {
            return Err(ClaimerError::Config("gateway.base_url is empty".into()));
        }

        let mut seen = HashSet::new();
        for session in &self.sessions {
            if session.name.is_empty() {
                return Err(ClaimerError::Config("session with empty name".into()));
            }
            if !seen.insert(session.name.as_str()) {
                return Err(ClaimerError::Config(format!(
                    "duplicate session name `{}`",
                    session.name
                )));
            }
            // Surface proxy typos at startup, not mid-loop.
            session.proxy_config().map_err(|e| {
                ClaimerError::Config(format!("session `{}`: {e}", session.name))
            })?;
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_settings() {
        let settings = Settings::parse(
            r#"
            [gateway]
            base_url = "http://127.0.0.1:9000"
            api_key = "k"

            [[sessions]]
            name = "main"
            proxy = "socks5://u:p@10.0.0.1:1080"

            [[sessions]]
            name = "alt"
            "#,
        )
        .unwrap();

        assert_eq!(settings.gateway.base_url, "http://127.0.0.1:9000");
        assert_eq!(settings.sessions.len(), 2);
        let proxy = settings.sessions[0].proxy_config().unwrap().unwrap();
        assert_eq!(proxy.host, "10.0.0.1");
        assert!(settings.sessions[1].proxy_config().unwrap().is_none());
    }

    #[test]
    fn gateway_block_is_optional() {
        let settings = Settings::parse("[[sessions]]\nname = \"main\"\n").unwrap();
        assert_eq!(settings.gateway.base_url, "http://127.0.0.1:8787");
    }

    #[test]
    fn rejects_empty_sessions() {
        let err = Settings::parse("[gateway]\nbase_url = \"http://x\"\n").unwrap_err();
        assert!(matches!(err, ClaimerError::Config(_)));
    }

    #[test]
    fn rejects_duplicate_session_names() {
        let err = Settings::parse(
            "[[sessions]]\nname = \"main\"\n[[sessions]]\nname = \"main\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_malformed_proxy_at_startup() {
        let err = Settings::parse(
            "[[sessions]]\nname = \"main\"\nproxy = \"not-a-proxy\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ClaimerError::Config(_)));
        assert!(err.to_string().contains("main"));
    }
}
