// Tapkeeper — unattended tap-claim agent for the CEX.IO tap game.
//
// One tokio task per configured session; tasks share nothing. A fatal
// (invalid-session) result ends only its own task; transient failures never
// end a task at all.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use tokio::task::JoinSet;

use tapkeeper::atoms::error::ClaimerResult;
use tapkeeper::engine::claimer::run_claimer;
use tapkeeper::engine::config::Settings;
use tapkeeper::engine::game::CexApiClient;
use tapkeeper::engine::http::build_client;
use tapkeeper::engine::telegram::GatewaySession;

#[derive(Parser)]
#[command(name = "tapkeeper", version, about = "Claims taps and restarts farm cycles for every configured session")]
struct Cli {
    /// Path to the TOML settings file.
    #[arg(short, long, env = "TAPKEEPER_CONFIG", default_value = "tapkeeper.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("tapkeeper: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> ClaimerResult<()> {
    let settings = Settings::load(&cli.config)?;
    info!("Starting {} session(s)", settings.sessions.len());

    let mut tasks = JoinSet::new();
    for session in &settings.sessions {
        let proxy = session.proxy_config()?;

        let telegram = GatewaySession::new(session.name.clone(), &settings.gateway)?;
        let game = CexApiClient::new(session.name.clone(), build_client(proxy.as_ref())?);

        tasks.spawn(async move {
            // The fatal case already produced its terminal log line inside
            // run_claimer; nothing to add here.
            let _ = run_claimer(telegram, game, proxy).await;
        });
    }

    while tasks.join_next().await.is_some() {}
    Ok(())
}
