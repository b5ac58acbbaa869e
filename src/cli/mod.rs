pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "plasclass",
    version,
    about = "Classify assembled sequences as plasmid or chromosome derived",
    long_about = "PlasClass scores each sequence with a logistic-regression model chosen by \
                  sequence length, using canonical k-mer frequencies as features. The output \
                  is one plasmid probability per input record."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of worker threads (0 = all available; default from config)
    #[arg(short = 'j', long, global = true)]
    pub threads: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify the sequences of a FASTA/FASTQ file
    Classify(commands::classify::ClassifyArgs),

    /// Write the k-mer feature vector of every sequence
    Features(commands::features::FeaturesArgs),

    /// Write the default configuration as TOML
    Config(commands::config::ConfigArgs),
}
