// ── Tapkeeper Engine: Claim Loop ───────────────────────────────────────────
// One `Claimer` per configured session drives the whole lifecycle: refresh
// the web credential when its assumed one-hour validity elapses, read the
// tap count, claim, restart the farm, repeat forever.
//
// Error discipline: the loop ends only on the fatal `InvalidSession`. Every
// other failure was either already absorbed at its operation boundary
// (extraction → 3 s, game ops → 3/30 s) or is caught here, logged, and
// followed by a short pause before the next tick.

use log::{error, info, warn};
use std::time::Duration;
use tokio::time::sleep;

use crate::atoms::constants::{AUTH_RETRY_DELAY_SECS, TICK_DELAY_SECS, ZERO_TAPS_IDLE_SECS};
use crate::atoms::error::{ClaimerError, ClaimerResult};
use crate::atoms::traits::{GameApi, TelegramSession};
use crate::atoms::types::{epoch_secs, Credential, CycleState, ProxyConfig};
use crate::engine::telegram::fetch_web_app_data;

pub struct Claimer<T: TelegramSession, G: GameApi> {
    session_name: String,
    telegram: T,
    game: G,
    proxy: Option<ProxyConfig>,
}

impl<T: TelegramSession, G: GameApi> Claimer<T, G> {
    pub fn new(telegram: T, game: G, proxy: Option<ProxyConfig>) -> Self {
        Claimer {
            session_name: telegram.name().to_string(),
            telegram,
            game,
            proxy,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Run until the session dies. The proxy probe fires once up front and is
    /// purely observational; after that every iteration is one `tick` plus
    /// the end-of-tick pause.
    pub async fn run(&mut self) -> ClaimerResult<()> {
        if let Some(proxy) = self.proxy.clone() {
            self.game.check_proxy(&proxy).await;
        }

        let mut state = CycleState::default();
        loop {
            match self.tick(&mut state).await {
                Ok(()) => sleep(Duration::from_secs(TICK_DELAY_SECS)).await,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("{} | Unknown error: {e}", self.session_name);
                    sleep(Duration::from_secs(AUTH_RETRY_DELAY_SECS)).await;
                }
            }
        }
    }

    /// One tick: refresh the credential if its window has elapsed, then run
    /// the claim cycle on the fresh credential. Ticks inside the validity
    /// window are no-ops — the cadence comes from `run`'s 1 s pause.
    pub async fn tick(&mut self, state: &mut CycleState) -> ClaimerResult<()> {
        let now = epoch_secs();
        if !state.needs_refresh(now) {
            return Ok(());
        }

        let Some(blob) = fetch_web_app_data(&mut self.telegram, self.proxy.as_ref()).await? else {
            // Transient extraction failure, already logged and backed off.
            // The refresh clock stays put so the next tick retries at once.
            return Ok(());
        };

        let credential = Credential::from_web_app_data(&blob)?;
        state.last_auth_time = now;
        info!("{} | Credential refreshed (user {})", self.session_name, credential.user_id);

        self.cycle(state, &credential).await;
        Ok(())
    }

    /// One claim cycle. A zero count parks the session for an hour before
    /// claiming anyway (the farm restart is still due); an unknown count
    /// skips the claim/farm pair entirely rather than submitting garbage.
    async fn cycle(&mut self, state: &mut CycleState, credential: &Credential) {
        let Some(taps) = self.game.available_taps(credential).await else {
            warn!("{} | Tap count unknown, skipping claim this cycle", self.session_name);
            return;
        };

        if taps == 0 {
            info!("{} | Nothing to claim, idling {ZERO_TAPS_IDLE_SECS}s", self.session_name);
            sleep(Duration::from_secs(ZERO_TAPS_IDLE_SECS)).await;
        }

        self.game.claim_taps(credential, taps).await;
        self.game.restart_farm(credential).await;
        state.last_claim_time = epoch_secs();
    }
}

/// Drive one session to completion. The fatal path produces exactly one
/// terminal log line and hands the error back to the caller; transient
/// failures never reach this level.
pub async fn run_claimer<T: TelegramSession, G: GameApi>(
    telegram: T,
    game: G,
    proxy: Option<ProxyConfig>,
) -> ClaimerResult<()> {
    let mut claimer = Claimer::new(telegram, game, proxy);
    match claimer.run().await {
        Err(e @ ClaimerError::InvalidSession(_)) => {
            error!("{} | Invalid Session", claimer.session_name());
            Err(e)
        }
        other => other,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
