// ── Tapkeeper Engine: Game API Client ──────────────────────────────────────
// The three tap-game operations plus the proxy probe, over one session-scoped
// reqwest client. Every request body is the same envelope:
//
//   {"devAuthData": <user_id>, "authData": "<blob>", "platform": "android",
//    "data": {...}}
//
// (the `platform` field rides only on the profile query).
//
// These operations never return errors. A failure is logged with the session
// label, backed off in place (3 s for profile reads, 30 s for claim/farm so a
// broken endpoint is not hammered once per tick), and folded into the
// `None`/`false` return.

use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::atoms::constants::{
    CLAIM_FARM_PATH, CLAIM_RETRY_DELAY_SECS, CLAIM_SETTLE_DELAY_SECS, CLAIM_TAPS_PATH,
    GAME_API_BASE, IP_ECHO_URL, PROXY_PROBE_TIMEOUT_SECS, START_FARM_PATH, USER_INFO_PATH,
};
use crate::atoms::error::ClaimerResult;
use crate::atoms::traits::GameApi;
use crate::atoms::types::{Credential, ProxyConfig};

pub struct CexApiClient {
    session_name: String,
    client: Client,
    base_url: String,
}

impl CexApiClient {
    pub fn new(session_name: impl Into<String>, client: Client) -> Self {
        Self::with_base_url(session_name, client, GAME_API_BASE)
    }

    pub fn with_base_url(
        session_name: impl Into<String>,
        client: Client,
        base_url: impl Into<String>,
    ) -> Self {
        CexApiClient {
            session_name: session_name.into(),
            client,
            base_url: base_url.into(),
        }
    }

    async fn post(&self, path: &str, payload: &Value) -> ClaimerResult<Value> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn try_available_taps(&self, credential: &Credential) -> ClaimerResult<Option<u64>> {
        let body = self.post(USER_INFO_PATH, &query_payload(credential)).await?;
        let balance = body.pointer("/data/balance").cloned().unwrap_or(Value::Null);
        let taps = available_taps_from(&body);
        info!(
            "{} | balance {balance} | availableTaps {}",
            self.session_name,
            taps.map_or_else(|| "unknown".into(), |t| t.to_string())
        );
        Ok(taps)
    }

    async fn try_claim_taps(&self, credential: &Credential, taps: u64) -> ClaimerResult<()> {
        self.post(CLAIM_TAPS_PATH, &claim_payload(credential, taps)).await?;
        info!("{} | Claimed {taps} taps", self.session_name);
        Ok(())
    }

    async fn try_restart_farm(&self, credential: &Credential) -> ClaimerResult<()> {
        let payload = farm_payload(credential);
        self.post(CLAIM_FARM_PATH, &payload).await?;
        self.post(START_FARM_PATH, &payload).await?;
        info!("{} | Farm restarted", self.session_name);
        Ok(())
    }
}

#[async_trait]
impl GameApi for CexApiClient {
    async fn available_taps(&self, credential: &Credential) -> Option<u64> {
        match self.try_available_taps(credential).await {
            Ok(taps) => taps,
            Err(e) => {
                error!("{} | Unknown error when getting profile data: {e}", self.session_name);
                tokio::time::sleep(Duration::from_secs(CLAIM_SETTLE_DELAY_SECS)).await;
                None
            }
        }
    }

    async fn claim_taps(&self, credential: &Credential, taps: u64) -> bool {
        match self.try_claim_taps(credential, taps).await {
            Ok(()) => {
                tokio::time::sleep(Duration::from_secs(CLAIM_SETTLE_DELAY_SECS)).await;
                true
            }
            Err(e) => {
                error!("{} | Unknown error when claiming: {e}", self.session_name);
                tokio::time::sleep(Duration::from_secs(CLAIM_RETRY_DELAY_SECS)).await;
                false
            }
        }
    }

    async fn restart_farm(&self, credential: &Credential) -> bool {
        match self.try_restart_farm(credential).await {
            Ok(()) => {
                tokio::time::sleep(Duration::from_secs(CLAIM_SETTLE_DELAY_SECS)).await;
                true
            }
            Err(e) => {
                error!("{} | Unknown error when restarting farm: {e}", self.session_name);
                tokio::time::sleep(Duration::from_secs(CLAIM_RETRY_DELAY_SECS)).await;
                false
            }
        }
    }

    async fn check_proxy(&self, proxy: &ProxyConfig) {
        let result = async {
            let resp = self
                .client
                .get(IP_ECHO_URL)
                .timeout(Duration::from_secs(PROXY_PROBE_TIMEOUT_SECS))
                .send()
                .await?
                .error_for_status()?;
            resp.json::<Value>().await
        }
        .await;

        match result {
            Ok(body) => {
                let ip = body.get("origin").and_then(Value::as_str).unwrap_or("unknown");
                info!("{} | Proxy IP: {ip}", self.session_name);
            }
            Err(e) => {
                error!("{} | Proxy: {proxy} | Error: {e}", self.session_name);
            }
        }
    }
}

// ── Payload builders ───────────────────────────────────────────────────────

fn query_payload(credential: &Credential) -> Value {
    json!({
        "devAuthData": credential.user_id,
        "authData": credential.web_app_data,
        "platform": "android",
        "data": {},
    })
}

fn claim_payload(credential: &Credential, taps: u64) -> Value {
    json!({
        "devAuthData": credential.user_id,
        "authData": credential.web_app_data,
        "data": { "taps": taps },
    })
}

fn farm_payload(credential: &Credential) -> Value {
    json!({
        "devAuthData": credential.user_id,
        "authData": credential.web_app_data,
        "data": {},
    })
}

fn available_taps_from(body: &Value) -> Option<u64> {
    body.pointer("/data/availableTaps").and_then(Value::as_u64)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential {
            web_app_data: "user=%7B%22id%22%3A42%7D&hash=abc".into(),
            user_id: 42,
        }
    }

    #[test]
    fn query_payload_carries_platform() {
        let payload = query_payload(&credential());
        assert_eq!(payload["devAuthData"], 42);
        assert_eq!(payload["authData"], "user=%7B%22id%22%3A42%7D&hash=abc");
        assert_eq!(payload["platform"], "android");
        assert_eq!(payload["data"], json!({}));
    }

    #[test]
    fn claim_payload_carries_taps_and_no_platform() {
        let payload = claim_payload(&credential(), 128);
        assert_eq!(payload["data"]["taps"], 128);
        assert!(payload.get("platform").is_none());
    }

    #[test]
    fn farm_payload_has_empty_data() {
        let payload = farm_payload(&credential());
        assert_eq!(payload["data"], json!({}));
        assert!(payload.get("platform").is_none());
    }

    #[test]
    fn parses_available_taps() {
        let body = json!({"data": {"balance": 1234.5, "availableTaps": 77}});
        assert_eq!(available_taps_from(&body), Some(77));

        assert_eq!(available_taps_from(&json!({"data": {}})), None);
        assert_eq!(available_taps_from(&json!({})), None);
        assert_eq!(available_taps_from(&json!({"data": {"availableTaps": "many"}})), None);
    }

    // Claim against a closed port: the operation must swallow the transport
    // error, back off, and report failure instead of raising.
    #[tokio::test(start_paused = true)]
    async fn claim_failure_returns_false() {
        let api = CexApiClient::with_base_url(
            "test",
            Client::new(),
            "http://127.0.0.1:9/api",
        );
        assert!(!api.claim_taps(&credential(), 10).await);
    }

    #[tokio::test(start_paused = true)]
    async fn profile_failure_returns_none() {
        let api = CexApiClient::with_base_url(
            "test",
            Client::new(),
            "http://127.0.0.1:9/api",
        );
        assert_eq!(api.available_taps(&credential()).await, None);
    }
}
