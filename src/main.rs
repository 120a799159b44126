use anyhow::Result;
use clap::Parser;
use serialdaq_rs::app::{run_session, SessionOptions};
use serialdaq_rs::config::{GraphMode, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Serial data acquisition: classify delimited records from a device and
/// write them to an Excel workbook or a CSV file, with optional live
/// charting. Anything not given on the command line is prompted for.
#[derive(Debug, Parser)]
#[command(name = "serialdaq", version, about)]
struct Cli {
    /// Serial port name, e.g. /dev/ttyUSB0 (prompted when omitted)
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Output file path; the extension is added when missing
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output form
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Chart mode
    #[arg(long, value_enum)]
    graph: Option<GraphMode>,

    /// Header column index (0-based) feeding the chart's x axis
    #[arg(long)]
    x_col: Option<usize>,

    /// Header column index (0-based) feeding the chart's y axis
    #[arg(long)]
    y_col: Option<usize>,

    /// TOML file overriding the wire-protocol defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

impl From<Cli> for SessionOptions {
    fn from(cli: Cli) -> Self {
        SessionOptions {
            port: cli.port,
            baud: cli.baud,
            output: cli.output,
            format: cli.format,
            graph: cli.graph,
            x_col: cli.x_col,
            y_col: cli.y_col,
            protocol_config: cli.config,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    run_session(cli.into())?;
    Ok(())
}
