//! Process entry point: parses the command line, installs the `tracing`
//! subscriber, opens the transport, and drives one batch to completion.

use std::process::ExitCode;

use clap::Parser;
use hslink_cli::args::Cli;
use hslink_cli::config_file;
use hslink_cli::run::run_batch;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let expanded = match config_file::expand_response_files(&raw_args) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("hslink: failed to read -@ response file: {err}");
            return ExitCode::from(1);
        }
    };
    let cli = Cli::parse_from(expanded);

    hslink_logging::init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("hslink: failed to start async runtime: {err}");
            return ExitCode::from(1);
        }
    };

    runtime.block_on(async_main(cli))
}

#[cfg(feature = "serial")]
async fn async_main(cli: Cli) -> ExitCode {
    let device = format!("/dev/ttyS{}", cli.port.saturating_sub(1));
    match hslink_transport::SerialTransport::open(&device, cli.com_speed, cli.require_carrier) {
        Ok(transport) => run_batch(&cli, transport).await.into(),
        Err(err) => {
            eprintln!("hslink: failed to open {device}: {err}");
            hslink_engine::CancelReason::BadComSpeed.into()
        }
    }
}

#[cfg(not(feature = "serial"))]
async fn async_main(_cli: Cli) -> ExitCode {
    eprintln!("hslink: built without the `serial` feature; no transport backend is available");
    hslink_engine::CancelReason::BadOption.into()
}
