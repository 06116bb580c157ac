mod registry;

use anyhow::Result;
use fsroute::{Config, Options, Server, TracePlugin};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Demo routes shipped with this crate
fn default_routes_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src").join("routes")
}

#[tokio::main]
async fn main() -> Result<()> {
    let started = Instant::now();
    dotenvy::dotenv().ok();

    let mut config = Config::load_default().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {:#}, using defaults", e);
        Config::default()
    });
    fsroute::logging::init(&config.logging.level);

    if config.routing.routes_dir.is_none() {
        config.routing.routes_dir = Some(default_routes_dir());
    }
    if config.routing.base_path.is_none() {
        config.routing.base_path = Some("api".to_string());
    }
    let watch = config.dev.watch_enabled();

    let options = Options::new(config).plugin(TracePlugin);
    let mut server = Server::new(registry::registry(), options)?;

    match server.start().await {
        Ok(running) => info!(
            "fsroute started: {} ({:?})",
            running.url,
            started.elapsed()
        ),
        Err(e) => {
            error!("Couldn't bootstrap fsroute: {}", e);
            for failure in e.failures() {
                error!("  {}", failure);
            }
            if !watch {
                return Err(e.into());
            }
        }
    }

    if watch {
        let dir = server.router().dir().to_path_buf();
        fsroute::watch(&mut server, dir).await?;
    } else {
        tokio::signal::ctrl_c().await?;
        server.stop().await?;
    }

    Ok(())
}
