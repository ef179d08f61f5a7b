#![forbid(unsafe_code)]

use clap::Parser;
use dsx_contracts::Validate;
use dsx_orchestration::{ConsoleConfig, UreqConnectorTransport};
use dsx_tools::cli::Cli;
use dsx_tools::console::execute_console_command;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = ConsoleConfig::from_env();
    if let Some(participant_id) = cli.participant_id.as_deref().map(str::trim) {
        config.participant_id = participant_id.to_string();
    }
    if let Some(url) = cli.management_url.as_deref().map(str::trim) {
        config.management_url = url.to_string();
    }
    config
        .validate()
        .map_err(|e| format!("invalid configuration: {e}"))?;
    debug!(
        management_url = %config.management_url,
        participant = %config.participant_id,
        "configuration loaded"
    );

    let transport = UreqConnectorTransport::from_config(&config);
    let output = execute_console_command(&config, &transport, &cli.command)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// `--debug` wins over `RUST_LOG`; HTTP internals stay at warn either way.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug,ureq=warn,rustls=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
