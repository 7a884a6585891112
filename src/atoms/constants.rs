// ── Tapkeeper Atoms: Constants ─────────────────────────────────────────────
// All named constants for the crate live here.
// Rationale: collecting constants in one place eliminates magic strings,
// makes auditing easier, and keeps every layer's code self-documenting.

// ── Game service endpoints ────────────────────────────────────────────────
// Fixed HTTP surface of the tap game. The four POST paths below are appended
// to GAME_API_BASE. Changing GAME_BOT_USERNAME or WEB_APP_URL would point the
// Telegram handshake at a different bot entirely — treat as stable.
pub const GAME_API_BASE: &str = "https://cexp.cex.io/api";
pub const GAME_BOT_USERNAME: &str = "cexio_tap_bot";
pub const WEB_APP_URL: &str = "https://cexp.cex.io";

pub const USER_INFO_PATH: &str = "/getUserInfo";
pub const CLAIM_TAPS_PATH: &str = "/claimTaps";
pub const CLAIM_FARM_PATH: &str = "/claimFarm";
pub const START_FARM_PATH: &str = "/startFarm";

// ── Handshake markers ─────────────────────────────────────────────────────
// The web-view redirect URL embeds the credential blob between these two
// fragment parameters.
pub const WEB_APP_DATA_MARKER: &str = "tgWebAppData=";
pub const WEB_APP_VERSION_MARKER: &str = "&tgWebAppVersion";

// ── Credential lifetime ───────────────────────────────────────────────────
// The game never reports an expiry, so the credential is assumed valid for
// one hour and refreshed proactively on that assumption.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 3600;

// ── Loop delays ───────────────────────────────────────────────────────────
// Fixed pauses used by the claim loop and the API client. AUTH_RETRY covers
// failed credential extraction and failed profile reads; CLAIM_RETRY is the
// longer cool-off after a failed claim/farm call so a broken endpoint is not
// hammered once per tick; ZERO_TAPS_IDLE parks an account that has nothing
// to claim for a full hour.
pub const AUTH_RETRY_DELAY_SECS: u64 = 3;
pub const CLAIM_SETTLE_DELAY_SECS: u64 = 3;
pub const CLAIM_RETRY_DELAY_SECS: u64 = 30;
pub const ZERO_TAPS_IDLE_SECS: u64 = 3600;
pub const TICK_DELAY_SECS: u64 = 1;

// ── Diagnostic probe ──────────────────────────────────────────────────────
// IP echo endpoint used once at session start when a proxy is configured.
pub const IP_ECHO_URL: &str = "https://httpbin.org/ip";
pub const PROXY_PROBE_TIMEOUT_SECS: u64 = 5;

// ── HTTP client defaults ──────────────────────────────────────────────────
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
pub const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
