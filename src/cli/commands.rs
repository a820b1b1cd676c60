use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trendintel", about = "Cross-source trend validation and conviction scoring")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build (or rebuild) the consolidated snapshot for a date
    SnapshotBuild {
        /// Snapshot date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Path to a JSON array of raw source outputs
        #[arg(long)]
        input: String,
    },
    /// List stored snapshot dates
    Snapshots,
    /// Refresh financial signals and print the signal report
    Refresh {
        /// As-of date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Change window in days
        #[arg(long, default_value = "7")]
        window: u32,
    },
    /// Resolve and validate entities against the snapshot at a date
    Resolve {
        /// Snapshot date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Resolve a single raw name instead of scanning the snapshot
        #[arg(long)]
        name: Option<String>,
        /// Source category of the mention (technical, social, financial, predictive)
        #[arg(long)]
        category: Option<String>,
        /// Nearby context text for ambiguity checks
        #[arg(long, default_value = "")]
        context: String,
    },
    /// Score conviction for an entity as of a date
    Score {
        /// Entity id from the registry
        #[arg(long)]
        entity: String,
        /// Analysis date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// Replay history and score predictions against ground truth
    Backtest {
        /// Prediction date (YYYY-MM-DD)
        #[arg(long)]
        prediction_date: String,
        /// Validation date (YYYY-MM-DD)
        #[arg(long)]
        validation_date: String,
        #[arg(long, default_value = "10")]
        top_k: usize,
    },
}
