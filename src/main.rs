use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use login_sentinel::{api, config, synthetic, utils};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    component: Component,
}

#[derive(Subcommand)]
enum Component {
    /// Run the baseline-similarity reporter service
    Reporter,

    /// Run the rule-based backend service
    Backend,

    /// Generate a synthetic login-event batch
    Synth {
        /// Output path for the event batch
        #[arg(long, default_value = "synthetic_events.json")]
        out: String,

        /// Number of normal events
        #[arg(long, default_value_t = 10)]
        normal: usize,

        /// Number of attack events
        #[arg(long, default_value_t = 3)]
        attacks: usize,
    },

    /// Replay an event batch against the backend intake
    Ingest {
        /// Path of the event batch to replay
        #[arg(long, default_value = "synthetic_events.json")]
        file: String,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    utils::logging::init_logger();

    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config()?;

    // Run the selected component
    match cli.component {
        Component::Reporter => {
            info!("Starting reporter service...");
            api::run_reporter(config).await?;
        }
        Component::Backend => {
            info!("Starting backend service...");
            api::run_backend(config).await?;
        }
        Component::Synth { out, normal, attacks } => {
            synthetic::write_batch(&out, normal, attacks)?;
        }
        Component::Ingest { file } => {
            synthetic::ingest(&file, &config.backend_intake_url).await?;
        }
    }

    Ok(())
}
