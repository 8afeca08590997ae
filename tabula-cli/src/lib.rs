//! Command-line interface for inspecting a Tabula data service.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod commands;
mod error;

pub use error::CliError;

use commands::{
    CountArgs, DescribeArgs, FindArgs, HttpTransportBuilder, Operation, execute, write_output,
};

/// Run the Tabula CLI with the current process arguments and environment.
///
/// # Errors
///
/// [`CliError`] when arguments or configuration are invalid, the service
/// call fails, or the output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let operation = resolve(cli.command)?;
    let output = execute(&operation, &HttpTransportBuilder)?;
    let mut stdout = std::io::stdout().lock();
    write_output(&mut stdout, &output)
}

fn resolve(command: Command) -> Result<Operation, CliError> {
    match command {
        Command::Describe(args) => args.into_operation(),
        Command::Count(args) => args.into_operation(),
        Command::Find(args) => args.into_operation(),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tabula",
    about = "Inspect the tables of a Tabula data service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the column schema of a table.
    Describe(DescribeArgs),
    /// Count matching objects.
    Count(CountArgs),
    /// Print matching objects as JSON.
    Find(FindArgs),
}

#[cfg(test)]
mod tests;
