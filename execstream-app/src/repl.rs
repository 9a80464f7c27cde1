//! Line-oriented loop: one request per stdin line until `exit` or EOF.

use crate::bootstrap::Worker;
use execstream_protocol::{Framer, Request};
use execstream_tools::StdinInput;
use tracing::{debug, info};

pub async fn run(worker: &Worker, framer: &Framer) {
    // Tool prompts and the loop must share one reader so no line is lost.
    let stdin = worker
        .stdin
        .clone()
        .unwrap_or_else(|| StdinInput::new(None));

    info!("interactive loop started");
    let mut counter = 0usize;
    while let Some(line) = stdin.read_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        counter += 1;
        let request = sequenced(Request::parse(line), counter);
        if let Err(e) = worker.driver.handle(&request, framer).await {
            debug!(error = %e, sequence_id = %request.sequence_id, "request finished with an error");
        }
    }
    info!(requests = counter, "interactive loop finished");
}

/// Gives requests without their own id the next `seq-N`.
fn sequenced(mut request: Request, counter: usize) -> Request {
    if request.sequence_id.is_empty() {
        request.sequence_id = format!("seq-{counter}");
    }
    request
}
