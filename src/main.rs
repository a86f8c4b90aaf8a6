//! COINFLIP — streak-multiplier coin flip wager game
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores game state from disk (or starts fresh), and serves the game
//! API until Ctrl+C.

use anyhow::Result;
use tracing::info;

use coinflip::config;
use coinflip::engine::coin::{CoinSource, RandomCoin};
use coinflip::notify::Notifier;
use coinflip::server;
use coinflip::session::GameSession;
use coinflip::storage::{FileSlot, PersistenceAdapter};
use coinflip::table::Table;

const BANNER: &str = r#"
  ____ ___ ___ _   _ _____ _     ___ ____
 / ___/ _ \_ _| \ | |  ___| |   |_ _|  _ \
| |  | | | | ||  \| | |_  | |    | || |_) |
| |__| |_| | || |\  |  _| | |___ | ||  __/
 \____\___/___|_| \_|_|   |_____|___|_|

  Win up to 20x your bet with consecutive wins!
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("COINFLIP_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load_or_default(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        port = cfg.server.port,
        settle_delay_ms = cfg.timing.settle_delay_ms,
        auto_cashout_delay_ms = cfg.timing.auto_cashout_delay_ms,
        state_dir = %cfg.storage.state_dir,
        "COINFLIP starting up"
    );

    // -- Restore or create state -----------------------------------------

    let store = PersistenceAdapter::new(
        Box::new(FileSlot::new(&cfg.storage.state_dir)),
        cfg.storage.slot_key.clone(),
    );

    let coin: Box<dyn CoinSource> = match cfg.game.seed {
        Some(seed) => {
            info!(seed, "Using seeded coin");
            Box::new(RandomCoin::seeded(seed))
        }
        None => Box::new(RandomCoin::from_entropy()),
    };

    let session = GameSession::open(store, coin, Notifier::new(cfg.server.event_log_capacity));
    info!(state = %session.state(), "Table ready");

    let table = Table::new(session, cfg.timing.clone());

    // -- Serve -----------------------------------------------------------

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received.");
    };
    server::serve(table.clone(), cfg.server.port, shutdown).await?;

    // Save final state
    table.persist().await;
    let snapshot = table.snapshot().await;
    info!(
        balance = format!("${:.2}", snapshot.state.balance),
        wins = snapshot.state.tally.wins,
        losses = snapshot.state.tally.losses,
        "COINFLIP shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coinflip=info"));

    let json_logging = std::env::var("COINFLIP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
