use clap::Parser;
use execstream_app::cli::InteractiveArgs;
use execstream_app::{logging, worker};
use execstream_core::EntryPoint;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let args = InteractiveArgs::parse();

    match worker::run(EntryPoint::Interactive, &args.common, args.repl).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "worker failed to start");
            eprintln!("interactive-tool: {e:#}");
            ExitCode::from(2)
        }
    }
}
