// ── Tapkeeper Atoms: Collaborator Traits ───────────────────────────────────
// Seams for the two external services the claim loop drives. The loop is
// generic over both, so tests exercise the full state machine with in-memory
// fakes while production wires in the gateway-backed Telegram session and the
// reqwest-backed game client.

use async_trait::async_trait;

use crate::atoms::error::ClaimerResult;
use crate::atoms::types::{Credential, ProxyConfig};

// ── Telegram session ───────────────────────────────────────────────────────

/// A handle on one Telegram account session, owned by exactly one claim loop.
///
/// `connect` must surface authentication rejection (unauthorized account,
/// deactivated account, unregistered auth key) as the fatal
/// `ClaimerError::InvalidSession`; every other failure is transient.
#[async_trait]
pub trait TelegramSession: Send {
    /// Human-readable session label, used only for log attribution.
    fn name(&self) -> &str;

    fn is_connected(&self) -> bool;

    /// Route this session through an upstream proxy. Applied before `connect`;
    /// `None` clears any previously configured proxy.
    fn set_proxy(&mut self, proxy: Option<&ProxyConfig>);

    async fn connect(&mut self) -> ClaimerResult<()>;

    /// Best-effort; the session is left disconnected between credential
    /// refreshes either way.
    async fn disconnect(&mut self);

    /// Perform the web-view handshake against `bot` and return the redirect
    /// URL carrying the `tgWebAppData` fragment.
    async fn request_web_view(&mut self, bot: &str, url: &str) -> ClaimerResult<String>;
}

// ── Game API ───────────────────────────────────────────────────────────────

/// The three game operations plus the proxy probe. Implementations never
/// return errors: every failure is logged, backed off, and folded into the
/// `None`/`false` return so the claim loop keeps running.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Read the claimable-tap count (and log the balance). `None` means the
    /// count is unknown this cycle.
    async fn available_taps(&self, credential: &Credential) -> Option<u64>;

    /// Claim `taps` taps. `false` means the attempt failed and was backed off.
    async fn claim_taps(&self, credential: &Credential, taps: u64) -> bool;

    /// Stop then restart passive accrual (claim-farm, start-farm in order).
    async fn restart_farm(&self, credential: &Credential) -> bool;

    /// Observational egress check through the configured proxy. Never fails.
    async fn check_proxy(&self, proxy: &ProxyConfig);
}
