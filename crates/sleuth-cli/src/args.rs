use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// The Sleuth instrumentation tool.
#[derive(Debug, Clone, Parser)]
#[clap(name = "sleuth", version, author)]
pub struct CliArguments {
    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// What to do.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Runs a parsed script against a synthetic browser context and reports
    /// the DOM manipulations it performed
    Run(RunCommand),
}

/// Runs a parsed script and reports the recorded manipulations
#[derive(Debug, Clone, Parser)]
pub struct RunCommand {
    /// Path to the script's ESTree AST as JSON (`-` reads from stdin)
    pub input: PathBuf,

    /// The script URL used in trace locations; defaults to the input name
    #[clap(long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// The format to report the trace in
    #[clap(long, default_value = "plain")]
    pub format: SerializationFormat,

    /// Also print the program's final value
    #[clap(long)]
    pub value: bool,
}

/// A serialization format for the recorded trace.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum SerializationFormat {
    Plain,
    Json,
}
