mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::market_data::{CcpUdisArgs, UdiArgs};
use commands::mora::CalculateArgs;

/// Art. 276 LISF default-interest calculations
#[derive(Parser)]
#[command(
    name = "mora",
    version,
    about = "Art. 276 LISF default-interest (mora) calculations in UDI",
    long_about = "Computes statutory default interest under Art. 276 of the Ley de \
                  Instituciones de Seguros y de Fianzas: the principal is denominated \
                  in UDI, accrues daily at 1.25x the CCP-UDIS rate and compounds \
                  monthly. UDI and CCP-UDIS values come from Banxico SIE or an \
                  offline market data file."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log provider requests and calculation steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate default interest for a principal over a delinquency period
    #[command(alias = "calcular")]
    Calculate(CalculateArgs),
    /// Look up the UDI value for a date
    #[command(alias = "consultar-udis")]
    Udi(UdiArgs),
    /// List published CCP-UDIS rates for a date range
    #[command(alias = "consultar-ccp-udis")]
    CcpUdis(CcpUdisArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::mora::run_calculate(args),
        Commands::Udi(args) => commands::market_data::run_udi(args),
        Commands::CcpUdis(args) => commands::market_data::run_ccp_udis(args),
        Commands::Version => {
            println!("mora {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            cli.output.print(&value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
