//! Round-trip harness CLI

use clap::{Parser, Subcommand};
use eclipsera::EclipseraConfig;
use roundtrip_harness::{Error, Result, RoundtripRunner, write_json, write_markdown};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roundtrip-harness")]
#[command(about = "Encode a golden message into covers and check that analysis finds it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every scenario against every cover
    Run {
        /// Directory of cover images (PNG, JPEG, WEBP)
        #[arg(short, long)]
        covers: PathBuf,

        /// Output directory for encoded images, run folders and reports
        #[arg(short, long, default_value = "roundtrip-results")]
        output: PathBuf,

        /// Eclipsera configuration file for tool paths and timeouts
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { covers, output, config } => {
            let config = match config {
                Some(path) => EclipseraConfig::from_file(&path)
                    .map_err(|e| Error::Config(format!("Failed to load {}: {}", path.display(), e)))?,
                None => EclipseraConfig::discover()?.unwrap_or_default(),
            };

            let runner = RoundtripRunner::new(&covers, &output).with_analyze_config(config.analyze);
            let report = runner.run().await?;

            write_json(&report, &output.join("report.json"))?;
            write_markdown(&report, &output.join("report.md"))?;

            println!(
                "Completed {} runs: {}",
                report.total_runs,
                if report.overall_pass { "PASS" } else { "FAIL" }
            );

            if !report.overall_pass {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
