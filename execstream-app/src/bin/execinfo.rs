use clap::Parser;
use execstream_app::cli::ExecinfoArgs;
use execstream_app::{logging, worker};
use execstream_core::EntryPoint;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let args = ExecinfoArgs::parse();

    match worker::run(EntryPoint::Exec, &args.common, false).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "worker failed to start");
            eprintln!("execinfo: {e:#}");
            ExitCode::from(2)
        }
    }
}
