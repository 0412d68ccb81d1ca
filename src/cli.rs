use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments. Anything given here overrides the environment and the
/// config file.
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// YAML config file. Overrides CONFIG_FILE; defaults to config.yml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// CSV corpus of labeled URLs. Overrides DATASET_FILE and [dataset_file].
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Maximum number of probes in flight.
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Number of shuffled batches to send.
    #[arg(short, long)]
    pub loops: Option<usize>,

    /// Maximum number of targets per batch.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Probe timeout in seconds, for the handshake and for each read.
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Also write the run summary as JSON to this file.
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Logging level. One of: trace, debug, info, warn, error
    #[arg(long = "log.level")]
    pub log_level: Option<String>,
}
