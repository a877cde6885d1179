//! Command line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vault-ingest")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging to the console
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(
        short,
        long,
        env = "VAULT_INGEST_CONFIG",
        default_value = "etc/config.yml",
        global = true
    )]
    pub config: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the inbox and ingest deposits until interrupted
    Run,

    /// Ingest a single deposit from the inbox and exit
    Ingest {
        /// Deposit directory, directly inside the configured inbox
        deposit_dir: PathBuf,
    },

    /// Check a bag's manifests against the files on disk
    VerifyBag {
        /// Bag directory
        bag_dir: PathBuf,
    },
}
