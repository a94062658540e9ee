//! CLI module for the entailment judgment service

pub mod serve;

use clap::{Parser, Subcommand};

/// Entail Judge - sentence entailment judgments over embedding similarity
#[derive(Parser)]
#[command(name = "entail-judge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,
}
