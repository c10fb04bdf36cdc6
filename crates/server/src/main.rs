//! Combat engine host process.
//!
//! Loads content, starts the tick engine and logs what happens until
//! interrupted. Environment (also read from `.env`):
//!
//! - `MUD_DATA_DIR`: content directory (defaults to the bundled data)
//! - `MUD_LOG_DIR`: when set, also log to `<dir>/mud-server.log`
//! - `MUD_DEMO`: when set, seeds a training room with a dummy encounter
//! - `MUD_TICK_MS`, `MUD_COMMAND_BUFFER`, `MUD_EVENT_BUFFER`, `MUD_RNG_SEED`
//! - `RUST_LOG`: tracing filter
mod demo;

use std::sync::Arc;

use anyhow::{Context, Result};
use mud_content::ContentFactory;
use mud_core::World;
use mud_runtime::{EngineConfig, Event, OracleBundle, SpellOracle, TickEngine, Topic};
use tokio::sync::broadcast::error::RecvError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = setup_logging()?;

    let factory = match std::env::var_os("MUD_DATA_DIR") {
        Some(dir) => ContentFactory::new(dir),
        None => ContentFactory::bundled(),
    };
    let combat = factory
        .load_config()
        .context("loading combat config")?;
    let spells = factory.load_spells().context("loading spell catalog")?;
    tracing::info!(
        data_dir = %factory.data_dir().display(),
        spells = spells.len(),
        "content loaded"
    );

    let config = EngineConfig::from_env()?.with_combat(combat);
    let oracles = OracleBundle::new(Arc::new(SpellOracle::new(spells)));

    let mut world = World::new();
    let demo = std::env::var_os("MUD_DEMO").is_some();
    let encounter = if demo {
        Some(demo::seed(&mut world)?)
    } else {
        None
    };

    let mut engine = TickEngine::new(config, oracles, world);
    let mut combat_rx = engine.subscribe(Topic::Combat);
    let mut tick_rx = engine.subscribe(Topic::Tick);
    let handle = engine.start()?;

    if let Some(encounter) = encounter {
        demo::open(&handle, &encounter).await?;
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("interrupt received, stopping");
                break;
            }
            event = combat_rx.recv() => log_event(event),
            event = tick_rx.recv() => log_event(event),
        }
    }

    let world = engine.stop().await?;
    tracing::info!(combatants = world.len(), "engine stopped");
    Ok(())
}

fn log_event(event: Result<Event, RecvError>) {
    match event {
        Ok(Event::Combat(record)) => {
            tracing::info!(target: "mud::events", at = record.at.0, event = ?record.event);
        }
        Ok(Event::Tick(tick)) => {
            tracing::trace!(target: "mud::events", ?tick);
        }
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(target: "mud::events", skipped, "event log fell behind");
        }
        Err(RecvError::Closed) => {}
    }
}

/// Stderr logging, plus a non-blocking file layer under `MUD_LOG_DIR`.
///
/// The returned guard flushes the file writer when dropped.
fn setup_logging() -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match std::env::var_os("MUD_LOG_DIR") {
        Some(dir) => {
            let dir = std::path::PathBuf::from(dir);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(&dir, "mud-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
