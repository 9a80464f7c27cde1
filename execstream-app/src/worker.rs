use crate::bootstrap;
use crate::cli::CommonArgs;
use crate::config::Config;
use crate::repl;
use anyhow::Result;
use execstream_core::EntryPoint;
use execstream_protocol::{Framer, OutputMode, Request};
use tracing::debug;

pub const USAGE: &str = "Usage: pass one request argument, either a JSON object {\"content\", \"projectDir\", \"sequenceId\"} or a raw command string";

pub fn output_mode(args: &CommonArgs) -> OutputMode {
    if args.legacy {
        OutputMode::Legacy
    } else {
        OutputMode::Json
    }
}

/// Runs a worker binary. Returns the process exit code; `Err` only for
/// startup failures such as invalid configuration.
pub async fn run(entry: EntryPoint, args: &CommonArgs, interactive_loop: bool) -> Result<u8> {
    let config = Config::resolve(args.config.as_deref(), args.mock)?;
    let worker = bootstrap::build(entry, &config)?;
    let framer = Framer::stdout(output_mode(args));

    if interactive_loop {
        repl::run(&worker, &framer).await;
        return Ok(0);
    }

    let Some(arg) = args.request.as_deref() else {
        let stream = framer.stream("");
        stream.error(USAGE);
        stream.finish();
        return Ok(1);
    };

    let request = Request::parse(arg);
    if let Err(e) = worker.driver.handle(&request, &framer).await {
        debug!(error = %e, "request finished with an error");
    }
    Ok(0)
}
