//! slopetile CLI - render composite slope tiles from the command line.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "slopetile")]
#[command(version = slopetile::VERSION)]
#[command(about = "Render slope-shaded composite map tiles", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.slopetile/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one composite tile to a PNG file
    Render {
        /// Layer stack, e.g. topo~slope_a_64
        tilespec: String,

        /// Zoom level
        #[arg(short, long)]
        zoom: u8,

        /// Tile column (use with --y)
        #[arg(long, requires = "y", conflicts_with_all = ["lat", "lon"])]
        x: Option<u32>,

        /// Tile row (use with --x)
        #[arg(long, requires = "x")]
        y: Option<u32>,

        /// Latitude in decimal degrees (use with --lon)
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees (use with --lat)
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check a tilespec without fetching anything
    Validate {
        /// Layer stack to check
        tilespec: String,
    },

    /// List the layers a tilespec can name
    Layers,

    /// Write a default config file if none exists
    InitConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            tilespec,
            zoom,
            x,
            y,
            lat,
            lon,
            output,
        } => {
            commands::render::run(RenderArgs {
                config: cli.config,
                verbose: cli.verbose,
                tilespec,
                zoom,
                x,
                y,
                lat,
                lon,
                output,
            })
            .await
        }
        Commands::Validate { tilespec } => commands::catalogue::run_validate(cli.config, &tilespec),
        Commands::Layers => commands::catalogue::run_layers(cli.config),
        Commands::InitConfig => commands::init::run(cli.config),
    };

    if let Err(e) = result {
        e.exit();
    }
}
