mod args;
mod run;

use std::process::ExitCode;

use clap::Parser;

use crate::args::{CliArguments, Command};

/// Entry point.
fn main() -> ExitCode {
    let arguments = CliArguments::parse();

    let res = match arguments.command {
        Command::Run(command) => crate::run::run(&command),
    };

    if let Err(message) = res {
        eprintln!("error: {message}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
