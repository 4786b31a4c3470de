//! Eclipsera CLI

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use eclipsera::{
    AggregatedReport, AnalyzeOptions, EclipseraConfig, EncodeOptions, PlaneSelection, analyze_image,
    capacity_for_image, decode_bytes_from_image, decode_text_from_image, encode_bytes_to_image,
    encode_text_to_image,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Human,
    /// Full report as JSON
    Json,
}

#[derive(Parser)]
#[command(name = "eclipsera")]
#[command(about = "Hide text in image LSBs and hunt for hidden payloads", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json); defaults to a discovered eclipsera.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed text or a file into a cover image
    Encode {
        /// Cover image (PNG, JPEG, WEBP or BMP)
        #[arg(short, long)]
        cover: PathBuf,

        /// Text to embed
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// File to embed (always zlib-compressed)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Channel letters to use, e.g. RGB or RB
        #[arg(long)]
        channels: Option<String>,

        /// Use R, G and B regardless of --channels
        #[arg(long)]
        all_channels: bool,

        /// zlib-compress the payload
        #[arg(long)]
        compress: bool,

        /// Keep the cover's original dimensions
        #[arg(long)]
        no_reduce: bool,

        /// Output PNG path (defaults to the configured output basename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Recover a payload with a known plane and compression flag
    Decode {
        /// Encoded image
        #[arg(short, long)]
        image: PathBuf,

        /// Channel letters the payload was embedded in
        #[arg(long, default_value = "RGB")]
        channels: String,

        /// Inflate the payload after extraction
        #[arg(long)]
        decompress: bool,

        /// Write the raw payload here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how many payload bytes an image can carry
    Capacity {
        /// Cover image
        #[arg(short, long)]
        image: PathBuf,

        /// Channel letters to count
        #[arg(long, default_value = "RGB")]
        channels: String,
    },

    /// Analyze an image for hidden payloads
    Analyze {
        /// Suspect image
        #[arg(short, long)]
        image: PathBuf,

        /// Passphrase for keyed tools (steghide, outguess)
        #[arg(short, long)]
        password: Option<String>,

        /// Also run deep-analysis collaborators
        #[arg(long)]
        deep: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Directory to save plane images and artifacts into
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Directory to keep collaborator stdout/stderr captures in
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<EclipseraConfig> {
    match path {
        Some(path) => EclipseraConfig::from_file(path).with_context(|| format!("Failed to load {}", path.display())),
        None => Ok(EclipseraConfig::discover()?.unwrap_or_default()),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Replace characters that do not belong in a file name.
fn sanitize_label(label: &str) -> String {
    label.replace([' ', ':', '/'], "_")
}

fn save_report_files(report: &AggregatedReport, dir: &Path) -> Result<usize> {
    let planes_dir = dir.join("planes");
    let artifacts_dir = dir.join("artifacts");
    fs::create_dir_all(&planes_dir)?;
    fs::create_dir_all(&artifacts_dir)?;

    for (index, plane) in report.planes.iter().enumerate() {
        let name = format!("{:02}_{}", index + 1, sanitize_label(&plane.label));
        fs::write(planes_dir.join(name), &plane.bytes)?;
    }
    for artifact in &report.artifacts {
        fs::write(artifacts_dir.join(&artifact.name), &artifact.bytes)?;
    }
    Ok(report.planes.len() + report.artifacts.len())
}

fn print_report(report: &AggregatedReport) {
    println!(
        "Image: {} {}x{} ({} bytes)",
        report.meta.format, report.meta.width, report.meta.height, report.meta.size_bytes
    );
    println!("Analyzers: {}", report.summary);

    match &report.best_candidate {
        Some(best) => println!("Best candidate [{} {}]: {}", best.source, best.selector, best.text),
        None => println!("Best candidate: (none)"),
    }

    if report.candidates.len() > 1 {
        println!();
        println!("Candidates:");
        for candidate in &report.candidates {
            println!("  [{} {}] {}", candidate.source, candidate.label, candidate.text);
        }
    }

    if !report.logs.is_empty() {
        println!();
        for line in &report.logs {
            println!("{}", line);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Encode {
            cover,
            text,
            file,
            channels,
            all_channels,
            compress,
            no_reduce,
            output,
        } => {
            let cover_bytes = read_input(&cover)?;
            let mut options = EncodeOptions {
                use_all_channels: all_channels || config.encode.use_all_channels,
                compress: compress || config.encode.compress,
                reduce_size: config.encode.reduce_size && !no_reduce,
                ..config.encode.clone()
            };
            if let Some(channels) = channels {
                options.channels = Some(channels.chars().map(String::from).collect());
            }

            let outcome = match (text, file) {
                (Some(text), _) => encode_text_to_image(&cover_bytes, &text, &options)?,
                (None, Some(file)) => {
                    options.compress = true;
                    encode_bytes_to_image(&cover_bytes, &read_input(&file)?, &options)?
                }
                (None, None) => bail!("Either --text or --file is required"),
            };

            let output = output.unwrap_or_else(|| PathBuf::from(&outcome.filename));
            fs::write(&output, &outcome.image_bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!(
                "Wrote {} ({}x{}, plane {}, {} of {} bytes used)",
                output.display(),
                outcome.width,
                outcome.height,
                outcome.plane,
                outcome.payload_bytes,
                outcome.capacity_bytes
            );
            Ok(())
        }

        Commands::Decode {
            image,
            channels,
            decompress,
            output,
        } => {
            let image_bytes = read_input(&image)?;
            let plane = PlaneSelection::parse(&channels);

            match output {
                Some(output) => {
                    let Some(payload) = decode_bytes_from_image(&image_bytes, &plane, decompress)? else {
                        bail!("No payload could be recovered from plane {}", plane);
                    };
                    fs::write(&output, &payload).with_context(|| format!("Failed to write {}", output.display()))?;
                    println!("Wrote {} bytes to {}", payload.len(), output.display());
                }
                None => {
                    let Some(text) = decode_text_from_image(&image_bytes, &plane, decompress)? else {
                        bail!("No payload could be recovered from plane {}", plane);
                    };
                    println!("{}", text);
                }
            }
            Ok(())
        }

        Commands::Capacity { image, channels } => {
            let plane = PlaneSelection::parse(&channels);
            let capacity = capacity_for_image(&read_input(&image)?, &plane)?;
            println!("{} bytes in plane {}", capacity, plane);
            Ok(())
        }

        Commands::Analyze {
            image,
            password,
            deep,
            format,
            save_dir,
            log_dir,
        } => {
            let image_bytes = read_input(&image)?;
            let options = AnalyzeOptions {
                filename: image
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                password,
                deep,
                log_dir,
            };

            let report = analyze_image(&image_bytes, &options, &config.analyze).await?;

            if let Some(dir) = save_dir {
                let saved = save_report_files(&report, &dir)?;
                tracing::info!("Saved {} file(s) to {}", saved, dir.display());
            }

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Human => print_report(&report),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("Red: Red_bit_0.png"), "Red__Red_bit_0.png");
        assert_eq!(sanitize_label("a/b c"), "a_b_c");
    }
}
