mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "astromap-cli")]
#[command(about = "Astrocartography power-spot lookup")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Find cities where the given bodies were rising at a birth moment
    Match {
        /// ISO birth date-time, e.g. 1990-05-15T10:30:00 (UT unless --lat/--lon given)
        #[arg(long)]
        birth_date: String,
        /// Comma-separated body names (defaults to Sun,Moon,Mercury,Venus,Mars)
        #[arg(long, value_delimiter = ',')]
        planets: Option<Vec<String>>,
        /// Orb tolerance in degrees, 0 to 10
        #[arg(long, default_value_t = 3.0)]
        orb: f64,
        /// Birth latitude; makes --birth-date local time at that place
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Birth longitude, east positive
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Persist the result to the results directory and print its id
        #[arg(long)]
        save: bool,
    },
    /// Show the loaded city catalog size and source
    Cities,
    /// Print a stored reading
    Reading {
        /// Reading id as returned by `match --save` or the API
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = astromap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Match {
            birth_date,
            planets,
            orb,
            lat,
            lon,
            save,
        }) => {
            let args = commands::MatchArgs {
                birth_date,
                planets,
                orb,
                location: lat.zip(lon),
                save,
            };
            commands::run_match(&config, args).await?;
        }
        Some(Commands::Cities) => commands::run_cities(&config)?,
        Some(Commands::Reading { id }) => commands::run_reading(&config, &id).await?,
        None => println!("astromap-cli: try `astromap-cli match --birth-date 1990-05-15T10:30:00`"),
    }

    Ok(())
}
