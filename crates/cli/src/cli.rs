//! Command line definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ffshepherd")]
#[command(about = "Keeps ffmpeg processes in check and normalizes video folders in place")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(short, long, global = true, env = "FFSHEPHERD_CONFIG", default_value = "ffshepherd.toml")]
    pub config: PathBuf,

    /// Log filter, e.g. `debug` or `ffshepherd_core=trace`. `RUST_LOG` wins when set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch ffmpeg processes and kill the newest ones above the limit
    Monitor {
        /// Processes allowed to run
        #[arg(short, long)]
        max_processes: Option<usize>,

        /// Seconds between checks
        #[arg(short = 'i', long)]
        check_interval: Option<f64>,

        /// Write Prometheus metrics to this file on exit
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },

    /// Convert every video in a folder and replace the originals
    Fix {
        /// Folder with the videos
        input_dir: PathBuf,

        /// Folder for converted files before they replace the originals
        temp_dir: PathBuf,

        /// Parallel conversions
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Do not wait for a free ffmpeg slot before converting
        #[arg(long)]
        no_limit: bool,

        /// Leave ffmpeg processes running when the batch ends
        #[arg(long)]
        no_kill_on_exit: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Write Prometheus metrics to this file on exit
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },

    /// Put backed up originals back
    Restore {
        /// Folder the backups were taken from
        input_dir: PathBuf,

        /// Delete the backup folder after restoring
        #[arg(long)]
        purge: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Walk through restoring backups and deleting leftovers
    Cleanup {
        /// Folder the backups were taken from
        input_dir: PathBuf,

        /// Temp folder used by `fix`
        temp_dir: PathBuf,

        /// Answer yes to every question
        #[arg(short, long)]
        yes: bool,
    },

    /// Replace `X.mp4` with `X<marker>.mp4` wherever both exist
    ReplaceConverted {
        /// Folder to scan
        dir: PathBuf,

        /// Suffix of converted files
        #[arg(long, default_value = "_converted")]
        marker: String,
    },

    /// Kill every ffmpeg process
    Kill,

    /// List running ffmpeg processes
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}
