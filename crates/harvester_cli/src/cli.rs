use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tweet-harvester")]
#[command(about = "Windowed, resumable harvesting of recent posts into CSV shards")]
#[command(version)]
pub struct Cli {
    /// Also write the log to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log debug detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Harvest posts for a list of authors, in batches
    Authors {
        /// Session config (RON)
        #[arg(short, long)]
        config: PathBuf,

        /// Author ids: CSV with an author_id column, or one id per line
        #[arg(short, long)]
        authors: PathBuf,
    },

    /// Harvest posts matching the configured keywords
    Keywords {
        /// Session config (RON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Collect unique author ids from a directory of shards
    CollectAuthors {
        /// Directory holding shard CSVs
        #[arg(short, long)]
        input: PathBuf,

        /// Author list to create
        #[arg(short, long)]
        output: PathBuf,
    },
}
