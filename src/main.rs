use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use lateral_report::model::PageOrder;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Order {
    VerticalFirst,
    HorizontalFirst,
}

impl From<Order> for PageOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::VerticalFirst => PageOrder::VerticalFirst,
            Order::HorizontalFirst => PageOrder::HorizontalFirst,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lateral-report", version, about = "Render XML report definitions to PDF")]
struct Cli {
    /// Report definition (XML)
    input: PathBuf,

    /// Output file; defaults to the input path with a .pdf extension
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the definition's page order
    #[arg(long, value_enum)]
    page_order: Option<Order>,

    /// Do not paint alternating row backgrounds
    #[arg(long)]
    no_odd_backgrounds: bool,

    /// More logging (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let t0 = Instant::now();
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("pdf"));

    let result = lateral_report::definition::parse(&cli.input).and_then(|mut set| {
        if let Some(order) = cli.page_order {
            set.engine.page_order = order.into();
        }
        if cli.no_odd_backgrounds {
            set.engine.print_odd_backgrounds = false;
        }
        lateral_report::write_timed(&set, &output, t0)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}: {e}", cli.input.display());
            ExitCode::FAILURE
        }
    }
}
