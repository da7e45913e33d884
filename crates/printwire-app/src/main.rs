// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printwire — send a PDF (or a page range of it) straight to a network
// printer over IPP.
//
// Entry point. Initialises logging and config, then either dispatches one
// print request (`print`) or drives the host method channel (`call`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::runtime::Handle;

use printwire_bridge::{ChannelReply, MethodCall, PrintChannelHandler, reply_channel};
use printwire_core::config::DispatchConfig;
use printwire_core::error::PrintwireError;
use printwire_core::human_errors::humanize_error;
use printwire_core::types::{
    ColorMode, Orientation, OrientationMode, PageRange, PageSize, PrintOutcome, PrintRequest,
};
use printwire_print::PrintDispatcher;

/// Default config file, looked up in the working directory.
const DEFAULT_CONFIG: &str = "printwire.json";

/// Printwire - print PDFs directly to IPP network printers
#[derive(Parser, Debug)]
#[command(name = "printwire")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Print PDFs directly to IPP network printers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a PDF file
    Print(PrintArgs),

    /// Invoke a host method (printPDF, printInvoicePdf) with JSON arguments
    Call {
        /// Method name
        method: String,

        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        arguments: String,
    },
}

#[derive(clap::Args, Debug)]
struct PrintArgs {
    /// PDF file to print
    file: PathBuf,

    /// Printer IP address or host name
    #[arg(long)]
    ip: String,

    /// Page orientation
    #[arg(long, value_enum, default_value_t = OrientationArg::Auto)]
    orientation: OrientationArg,

    /// Print in colour
    #[arg(long)]
    color: bool,

    /// Print on both sides (long edge)
    #[arg(long)]
    duplex: bool,

    /// Number of copies
    #[arg(long, default_value_t = 1)]
    copies: i32,

    /// Inclusive page range, e.g. 3-5
    #[arg(long, value_parser = parse_page_range)]
    pages: Option<PageRange>,

    /// Paper size (A4, Letter, Legal, A3, A5, F4)
    #[arg(long, default_value = "A4")]
    page_size: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OrientationArg {
    /// Detect from the first page
    Auto,
    Portrait,
    Landscape,
    ReverseLandscape,
    ReversePortrait,
}

impl From<OrientationArg> for OrientationMode {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Auto => Self::Auto,
            OrientationArg::Portrait => Self::Explicit(Orientation::Portrait),
            OrientationArg::Landscape => Self::Explicit(Orientation::Landscape),
            OrientationArg::ReverseLandscape => Self::Explicit(Orientation::ReverseLandscape),
            OrientationArg::ReversePortrait => Self::Explicit(Orientation::ReversePortrait),
        }
    }
}

impl PrintArgs {
    fn into_request(self) -> PrintRequest {
        let mut request = PrintRequest::new(self.file, self.ip);
        request.orientation = self.orientation.into();
        request.color_mode = if self.color {
            ColorMode::Color
        } else {
            ColorMode::Monochrome
        };
        request.duplex = self.duplex;
        request.copies = self.copies;
        request.page_range = self.pages;
        request.page_size = PageSize::from_name(&self.page_size);
        request
    }
}

fn parse_page_range(value: &str) -> Result<PageRange, String> {
    let (start, end) = match value.split_once('-') {
        Some((start, end)) => (start, end),
        None => (value, value),
    };
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|_| format!("'{value}' is not a page range like 3-5"))
    };
    Ok(PageRange::new(parse(start)?, parse(end)?))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            report_error(&e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(port = config.ipp_port, path = %config.resource_path, "Printwire starting");
    let dispatcher = PrintDispatcher::new(config);

    match cli.command {
        Commands::Print(args) => print(&dispatcher, args).await,
        Commands::Call { method, arguments } => call(dispatcher, method, &arguments).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> printwire_core::error::Result<DispatchConfig> {
    match path {
        // An explicit path must exist.
        Some(path) => DispatchConfig::load(path),
        None => DispatchConfig::load_or_default(DEFAULT_CONFIG),
    }
}

async fn print(dispatcher: &PrintDispatcher, args: PrintArgs) -> ExitCode {
    match dispatcher.dispatch(args.into_request()).await {
        PrintOutcome::Succeeded(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(_) => println!("job {} accepted", report.job_id),
            }
            ExitCode::SUCCESS
        }
        PrintOutcome::Failed {
            kind,
            stage,
            message,
        } => {
            eprintln!("Printing failed while {stage} [{kind}]");
            eprintln!("  {message}");
            ExitCode::FAILURE
        }
    }
}

async fn call(dispatcher: PrintDispatcher, method: String, arguments: &str) -> ExitCode {
    let arguments: Value = match serde_json::from_str(arguments) {
        Ok(value) => value,
        Err(e) => {
            report_error(&PrintwireError::from(e));
            return ExitCode::FAILURE;
        }
    };

    let handler = PrintChannelHandler::new(dispatcher, Handle::current());
    let (result, reply) = reply_channel();
    if let Some(task) = handler.handle(MethodCall::new(method, arguments), result) {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "print task failed");
            return ExitCode::FAILURE;
        }
    }

    let Ok(reply) = reply.await else {
        eprintln!("No reply was produced");
        return ExitCode::FAILURE;
    };
    match serde_json::to_string(&reply) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Could not encode reply: {e}"),
    }
    match reply {
        ChannelReply::Success { .. } => ExitCode::SUCCESS,
        ChannelReply::Error { .. } | ChannelReply::NotImplemented => ExitCode::FAILURE,
    }
}

fn report_error(err: &PrintwireError) {
    let human = humanize_error(err);
    eprintln!("{}", human.message);
    eprintln!("  {}", human.suggestion);
    tracing::debug!(error = %err, severity = ?human.severity, "error detail");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_range_forms() {
        assert_eq!(parse_page_range("3-5").unwrap(), PageRange::new(3, 5));
        assert_eq!(parse_page_range(" 2 - 2 ").unwrap(), PageRange::new(2, 2));
        assert_eq!(parse_page_range("4").unwrap(), PageRange::new(4, 4));
        assert!(parse_page_range("a-b").is_err());
        assert!(parse_page_range("-3").is_err());
    }

    #[test]
    fn print_command_builds_request() {
        let cli = Cli::try_parse_from([
            "printwire",
            "print",
            "report.pdf",
            "--ip",
            "192.168.1.50",
            "--orientation",
            "landscape",
            "--duplex",
            "--copies",
            "2",
            "--pages",
            "3-5",
            "--page-size",
            "letter",
        ])
        .unwrap();
        let Commands::Print(args) = cli.command else {
            panic!("expected print command");
        };
        let request = args.into_request();
        assert_eq!(request.orientation, OrientationMode::Explicit(Orientation::Landscape));
        assert!(request.duplex);
        assert_eq!(request.copies, 2);
        assert_eq!(request.page_range, Some(PageRange::new(3, 5)));
        assert_eq!(request.page_size, PageSize::Letter);
        assert_eq!(request.color_mode, ColorMode::Monochrome);
    }

    #[test]
    fn call_command_defaults_to_empty_arguments() {
        let cli = Cli::try_parse_from(["printwire", "call", "printInvoicePdf"]).unwrap();
        let Commands::Call { method, arguments } = cli.command else {
            panic!("expected call command");
        };
        assert_eq!(method, "printInvoicePdf");
        assert_eq!(arguments, "{}");
    }
}
