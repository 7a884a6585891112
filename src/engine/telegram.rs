// ── Tapkeeper Engine: Telegram Gateway Bridge ──────────────────────────────
//
// Tapkeeper does not speak MTProto itself. Each Telegram account session
// lives in a local session gateway that owns the account's auth key; this
// module is the HTTP client for that gateway plus the credential extraction
// that turns a web-view handshake into a game credential.
//
// Gateway surface (JSON over HTTP, `apikey` header):
//   POST {base}/sessions/{name}/connect     {"proxy": "<url>" | null}
//   POST {base}/sessions/{name}/disconnect
//   POST {base}/sessions/{name}/webview     {"bot", "url", "platform"} → {"url": "<redirect>"}
//
// Gateway errors carry {"error": "<CODE>"}. The three MTProto auth-rejection
// codes classify as the fatal InvalidSession; everything else is transient.

use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;

use crate::atoms::constants::{
    AUTH_RETRY_DELAY_SECS, GAME_BOT_USERNAME, WEB_APP_DATA_MARKER, WEB_APP_URL,
    WEB_APP_VERSION_MARKER,
};
use crate::atoms::error::{ClaimerError, ClaimerResult};
use crate::atoms::traits::TelegramSession;
use crate::atoms::types::ProxyConfig;
use crate::engine::config::GatewayConfig;

/// Gateway error codes that mean the account itself is unusable. These — and
/// only these — end the owning session's loop.
const AUTH_ERROR_CODES: [&str; 3] = ["UNAUTHORIZED", "USER_DEACTIVATED", "AUTH_KEY_UNREGISTERED"];

// ── Credential extraction ──────────────────────────────────────────────────

/// Cut the credential blob out of a web-view redirect URL and URL-decode it
/// once. The blob sits between `tgWebAppData=` and `&tgWebAppVersion`; when
/// the second marker is absent the rest of the URL is taken as-is.
pub fn extract_web_app_data(auth_url: &str) -> ClaimerResult<String> {
    let (_, after) = auth_url.split_once(WEB_APP_DATA_MARKER).ok_or_else(|| {
        ClaimerError::WebAppData("redirect URL has no tgWebAppData fragment".into())
    })?;

    let raw = match after.split_once(WEB_APP_VERSION_MARKER) {
        Some((head, _)) => head,
        None => after,
    };

    let decoded = urlencoding::decode(raw)
        .map_err(|e| ClaimerError::WebAppData(format!("web-app data is not valid UTF-8: {e}")))?;
    Ok(decoded.into_owned())
}

/// Obtain one web-app-data blob for this session: apply the proxy, connect if
/// disconnected, run the web-view handshake, extract the blob, disconnect.
///
/// Fatal auth rejection propagates. Any other failure is logged, backed off
/// `AUTH_RETRY_DELAY_SECS`, and returned as `Ok(None)` — the caller retries
/// on its own schedule without advancing its refresh clock.
pub async fn fetch_web_app_data<T: TelegramSession + ?Sized>(
    session: &mut T,
    proxy: Option<&ProxyConfig>,
) -> ClaimerResult<Option<String>> {
    session.set_proxy(proxy);

    match handshake(session).await {
        Ok(blob) => Ok(Some(blob)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            error!("{} | Unknown error during authorization: {e}", session.name());
            tokio::time::sleep(Duration::from_secs(AUTH_RETRY_DELAY_SECS)).await;
            Ok(None)
        }
    }
}

async fn handshake<T: TelegramSession + ?Sized>(session: &mut T) -> ClaimerResult<String> {
    if !session.is_connected() {
        session.connect().await?;
    }

    let auth_url = session.request_web_view(GAME_BOT_USERNAME, WEB_APP_URL).await?;
    let blob = extract_web_app_data(&auth_url)?;

    if session.is_connected() {
        session.disconnect().await;
    }

    Ok(blob)
}

// ── Gateway-backed session ─────────────────────────────────────────────────

pub struct GatewaySession {
    name: String,
    base_url: String,
    api_key: String,
    client: Client,
    proxy: Option<ProxyConfig>,
    connected: bool,
}

impl GatewaySession {
    /// The gateway runs next to tapkeeper, so this client is deliberately not
    /// routed through the session proxy — the proxy is forwarded to the
    /// gateway in the connect body instead.
    pub fn new(name: impl Into<String>, gateway: &GatewayConfig) -> ClaimerResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(GatewaySession {
            name: name.into(),
            base_url: gateway.base_url.trim_end_matches('/').to_string(),
            api_key: gateway.api_key.clone(),
            client,
            proxy: None,
            connected: false,
        })
    }

    fn endpoint(&self, op: &str) -> String {
        format!("{}/sessions/{}/{op}", self.base_url, self.name)
    }
}

/// Map a gateway error response to the fatal/transient split. `op` names the
/// failed call for the transient message.
fn classify_gateway_error(
    session_name: &str,
    op: &str,
    status: StatusCode,
    body: &str,
) -> ClaimerError {
    let code = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));

    if let Some(code) = &code {
        if AUTH_ERROR_CODES.contains(&code.as_str()) {
            return ClaimerError::InvalidSession(session_name.to_string());
        }
    }
    if status == StatusCode::UNAUTHORIZED {
        return ClaimerError::InvalidSession(session_name.to_string());
    }

    ClaimerError::Telegram(format!(
        "{op} failed ({status}): {}",
        code.unwrap_or_else(|| body.chars().take(200).collect())
    ))
}

#[async_trait]
impl TelegramSession for GatewaySession {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_proxy(&mut self, proxy: Option<&ProxyConfig>) {
        self.proxy = proxy.cloned();
    }

    async fn connect(&mut self) -> ClaimerResult<()> {
        let body = json!({ "proxy": self.proxy.as_ref().map(ProxyConfig::url) });

        let resp = self
            .client
            .post(self.endpoint("connect"))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_gateway_error(&self.name, "connect", status, &text));
        }

        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        match self
            .client
            .post(self.endpoint("disconnect"))
            .header("apikey", &self.api_key)
            .send()
            .await
        {
            Ok(resp) if !resp.status().is_success() => {
                warn!("{} | Gateway disconnect returned {}", self.name, resp.status());
            }
            Err(e) => warn!("{} | Gateway disconnect failed: {e}", self.name),
            _ => {}
        }
        self.connected = false;
    }

    async fn request_web_view(&mut self, bot: &str, url: &str) -> ClaimerResult<String> {
        let body = json!({ "bot": bot, "url": url, "platform": "android" });

        let resp = self
            .client
            .post(self.endpoint("webview"))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_gateway_error(&self.name, "webview", status, &text));
        }

        let payload: serde_json::Value = resp.json().await?;
        let auth_url = payload
            .get("url")
            .and_then(|u| u.as_str())
            .ok_or_else(|| ClaimerError::Telegram("webview response has no `url`".into()))?;

        info!("{} | Web view handshake complete", self.name);
        Ok(auth_url.to_string())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::Credential;

    const AUTH_URL: &str = "https://web.telegram.org/#tgWebAppData=\
user%3D%257B%2522id%2522%253A42%257D%26auth_date%3D1700000000%26hash%3Dabc\
&tgWebAppVersion=7.0&tgWebAppPlatform=android";

    #[test]
    fn extracts_and_decodes_blob() {
        let blob = extract_web_app_data(AUTH_URL).unwrap();
        assert_eq!(blob, "user=%7B%22id%22%3A42%7D&auth_date=1700000000&hash=abc");

        let cred = Credential::from_web_app_data(&blob).unwrap();
        assert_eq!(cred.user_id, 42);
    }

    #[test]
    fn extraction_is_idempotent() {
        assert_eq!(
            extract_web_app_data(AUTH_URL).unwrap(),
            extract_web_app_data(AUTH_URL).unwrap()
        );
    }

    #[test]
    fn missing_version_marker_takes_rest_of_url() {
        let blob = extract_web_app_data("https://t.me/#tgWebAppData=user%3D1").unwrap();
        assert_eq!(blob, "user=1");
    }

    #[test]
    fn missing_data_marker_is_transient_error() {
        let err = extract_web_app_data("https://t.me/#tgWebAppPlatform=android").unwrap_err();
        assert!(matches!(err, ClaimerError::WebAppData(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn auth_codes_classify_as_fatal() {
        for code in AUTH_ERROR_CODES {
            let body = format!("{{\"error\":\"{code}\"}}");
            let err = classify_gateway_error("main", "connect", StatusCode::BAD_REQUEST, &body);
            assert!(err.is_fatal(), "{code} should be fatal");
        }
    }

    #[test]
    fn bare_401_classifies_as_fatal() {
        let err = classify_gateway_error("main", "connect", StatusCode::UNAUTHORIZED, "");
        assert!(err.is_fatal());
    }

    #[test]
    fn other_gateway_errors_are_transient() {
        let err = classify_gateway_error(
            "main",
            "connect",
            StatusCode::BAD_GATEWAY,
            "{\"error\":\"FLOOD_WAIT_30\"}",
        );
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("FLOOD_WAIT_30"));

        let err =
            classify_gateway_error("main", "webview", StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(matches!(err, ClaimerError::Telegram(_)));
    }
}
