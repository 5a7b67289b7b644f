//! DXIL signing CLI
//!
//! Entry point for the `dxil-sign` command-line tool.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use dxil_signer::config::{self, ConfigEnvironment, DEFAULT_LOG_FILTER};
use dxil_signer::dxc::DxcLoader;
use dxil_signer::{run_and_report, ExitCode, SigningPipeline, SigningRequest};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dxil-sign")]
#[command(about = "Validate and sign a DXIL shader container", version)]
struct Cli {
    /// Unsigned container to sign
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Destination for the signed container
    #[arg(short = 'o', long)]
    output: PathBuf,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1; status 2 means the validator rejected content.
            let code = if e.use_stderr() {
                ExitCode::Failure
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            process::exit(code.as_i32());
        }
    };

    let (config, effective) = match config::load(&ConfigEnvironment::from_process()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(ExitCode::Failure.as_i32());
        }
    };

    init_tracing(&config.log.filter);
    for source in &effective.sources {
        tracing::debug!(
            origin = ?source.origin,
            path = source.path.as_deref().unwrap_or("-"),
            digest = source.digest.as_deref().unwrap_or("-"),
            "config source"
        );
    }

    let loader = DxcLoader::from_settings(&config.validator);
    let mut pipeline = SigningPipeline::new(loader);
    let request = SigningRequest::new(cli.input, cli.output);

    let code = run_and_report(&mut pipeline, &request, &mut io::stdout(), &mut io::stderr());
    process::exit(code.as_i32());
}

/// `RUST_LOG` wins over the configured filter; logs go to stderr.
fn init_tracing(configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
