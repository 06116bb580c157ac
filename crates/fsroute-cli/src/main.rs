mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fsroute::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fsroute")]
#[command(version, about = "fsroute CLI - file-system routing for axum", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "fsroute.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy and transpile the source tree into the output directory
    Build {
        /// Source directory (default: ./src)
        #[arg(long)]
        src: Option<PathBuf>,

        /// Output directory (default: ./dist)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write external source maps next to transpiled files
        #[arg(long)]
        sourcemaps: bool,
    },

    /// List the routes discovered in the routes directory
    Routes {
        /// Routes directory (default: ./src/routes)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Prefix applied to every route pattern
        #[arg(short, long)]
        base_path: Option<String>,
    },
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    fsroute::logging::init(&config.logging.level);

    // Execute command
    match cli.command {
        Commands::Build {
            src,
            out,
            sourcemaps,
        } => {
            commands::build::execute(config, src, out, sourcemaps)?;
        }
        Commands::Routes { dir, base_path } => {
            commands::routes::execute(config, dir, base_path)?;
        }
    }

    Ok(())
}
