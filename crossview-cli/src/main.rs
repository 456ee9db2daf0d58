//! crossview CLI - Command-line interface for three-view cluster repair.
//!
//! Reads an event file, matches clusters across the U, V and W views and
//! writes the repaired cluster lists.
#![allow(clippy::uninlined_format_args, clippy::too_many_lines)]

use clap::{Args, Parser, Subcommand};

use crossview_algorithms::{CrossViewMatching, MatchingConfig, MatchingError};
use crossview_core::{InputListNames, SlidingLinearFitter, WireGeometry};
use crossview_io::{load_config, read_event, read_event_file, write_refreshed_event};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    CrossviewIo(#[from] crossview_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] crossview_core::Error),

    #[error("Matching error: {0}")]
    Matching(#[from] MatchingError),

    #[error("cannot determine cluster list names: {0}")]
    ListNames(String),
}

/// Three-view cluster matching and repair.
#[derive(Parser)]
#[command(name = "crossview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match clusters across views and write the repaired event
    Process {
        /// Input event file (JSON)
        input: PathBuf,

        /// Output event file (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,

        /// Wire angle of the U and V views from vertical (degrees)
        #[arg(long, default_value = "60.0")]
        wire_angle: f64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the cluster lists of an event file
    Info {
        /// Input event file (JSON)
        input: PathBuf,
    },
}

/// Command-line values taking precedence over the configuration file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// U-view cluster list name
    #[arg(long)]
    u_list: Option<String>,

    /// V-view cluster list name
    #[arg(long)]
    v_list: Option<String>,

    /// W-view cluster list name
    #[arg(long)]
    w_list: Option<String>,

    /// Minimum length of a clean cluster
    #[arg(long)]
    cluster_min_length: Option<f64>,

    /// Half window (layers) of the sliding trajectory fit
    #[arg(long)]
    sliding_fit_half_window: Option<usize>,

    /// Minimum drift overlap of a cluster pair
    #[arg(long)]
    min_x_overlap: Option<f64>,

    /// Minimum overlap fraction of a cluster pair
    #[arg(long)]
    min_x_overlap_fraction: Option<f64>,

    /// Number of sample points per cluster pair
    #[arg(long)]
    n_sampling_points: Option<usize>,

    /// Maximum hit distance from a projected point
    #[arg(long)]
    max_point_displacement: Option<f64>,

    /// Maximum distance between corroborating hits
    #[arg(long)]
    max_hit_displacement: Option<f64>,

    /// Minimum fraction of corroborated sample points
    #[arg(long)]
    min_matched_point_fraction: Option<f64>,

    /// Minimum number of matched hits
    #[arg(long)]
    min_matched_hits: Option<usize>,
}

impl Overrides {
    fn apply(&self, mut config: MatchingConfig) -> MatchingConfig {
        if let Some(v) = self.cluster_min_length {
            config = config.with_cluster_min_length(v);
        }
        if let Some(v) = self.sliding_fit_half_window {
            config = config.with_sliding_fit_half_window(v);
        }
        if let Some(v) = self.min_x_overlap {
            config = config.with_min_x_overlap(v);
        }
        if let Some(v) = self.min_x_overlap_fraction {
            config = config.with_min_x_overlap_fraction(v);
        }
        if let Some(v) = self.n_sampling_points {
            config = config.with_n_sampling_points(v);
        }
        if let Some(v) = self.max_point_displacement {
            config = config.with_max_point_displacement(v);
        }
        if let Some(v) = self.max_hit_displacement {
            config = config.with_max_hit_displacement(v);
        }
        if let Some(v) = self.min_matched_point_fraction {
            config = config.with_min_matched_point_fraction(v);
        }
        if let Some(v) = self.min_matched_hits {
            config = config.with_min_matched_hits(v);
        }
        config
    }

    fn apply_names(&self, names: Option<InputListNames>) -> Result<InputListNames> {
        let pick = |flag: &Option<String>, fallback: Option<&String>, view: &str| {
            flag.clone()
                .or_else(|| fallback.cloned())
                .ok_or_else(|| CliError::ListNames(format!("no {view} list given")))
        };
        Ok(InputListNames::new(
            pick(&self.u_list, names.as_ref().map(|n| &n.u), "U")?,
            pick(&self.v_list, names.as_ref().map(|n| &n.v), "V")?,
            pick(&self.w_list, names.as_ref().map(|n| &n.w), "W")?,
        ))
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            overrides,
            wire_angle,
            verbose,
        } => {
            init_logging(verbose);

            let start = Instant::now();
            let (records, mut event) = read_event(&input)?;
            info!(
                "Read {} hits in {} clusters from {}",
                event.hit_count(),
                event.cluster_count(),
                input.display()
            );

            // File configuration first, then the event's own list names.
            let (matching, file_names) = match &config {
                Some(path) => {
                    let file = load_config(path)?;
                    (file.matching, Some(file.input_cluster_list_names))
                }
                None => (MatchingConfig::default(), records.list_names()),
            };
            let matching = overrides.apply(matching);
            let names = overrides.apply_names(file_names)?;
            debug!("configuration: {:?}", matching);
            debug!("cluster lists: {:?}", names);

            let theta = wire_angle.to_radians();
            let fitter = SlidingLinearFitter::new(matching.sliding_fit_layer_pitch);
            let pipeline =
                CrossViewMatching::new(matching, names, WireGeometry::new(theta, theta), fitter)?;
            let report = pipeline.run(&mut event)?;

            // Every input list is written back, touched or not.
            write_refreshed_event(&output, &records, &event)?;

            let elapsed = start.elapsed();
            print!("{}", report);
            println!(
                "Processed {} in {:.2}s, wrote {}",
                input.display(),
                elapsed.as_secs_f64(),
                output.display()
            );
        }

        Commands::Info { input } => {
            init_logging(false);

            let records = read_event_file(&input)?;
            println!("File: {}", input.display());
            println!(
                "{:<6} | {:<24} | {:>10} | {:>10}",
                "View", "List", "Clusters", "Hits"
            );
            println!("{:-<60}", "");
            for (record, clusters, hits) in records.counts() {
                println!(
                    "{:<6} | {:<24} | {:>10} | {:>10}",
                    record.view, record.list_name, clusters, hits
                );
            }

            let consumed: usize = records
                .views
                .iter()
                .map(|r| r.clusters.iter().filter(|c| !c.available).count())
                .sum();
            if consumed > 0 {
                println!("Consumed clusters: {}", consumed);
            }
        }
    }

    Ok(())
}
