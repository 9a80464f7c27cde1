//! Where answers to `request_user_input` come from.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[async_trait]
pub trait InputSource: Send + Sync {
    /// Next answer for `prompt`, or `None` when no answer is available.
    async fn next_input(&self, prompt: &str) -> Option<String>;
}

/// Never has an answer; callers fall back to their default.
pub struct NoInput;

#[async_trait]
impl InputSource for NoInput {
    async fn next_input(&self, _prompt: &str) -> Option<String> {
        None
    }
}

/// Pre-seeded answers, handed out in order.
#[derive(Default)]
pub struct ScriptedInput {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn next_input(&self, _prompt: &str) -> Option<String> {
        self.answers.lock().pop_front()
    }
}

/// Line reader over the worker's stdin. Lines are read on a dedicated
/// thread and handed over through a channel, so a timed-out wait never
/// leaves a read the runtime has to join on shutdown. Clones share one
/// receiver so the REPL and tool prompts never lose each other's lines.
#[derive(Clone)]
pub struct StdinInput {
    lines: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
    timeout: Option<Duration>,
}

impl StdinInput {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()), timeout)
    }

    /// Reads lines from `reader` instead of the process stdin.
    pub fn from_reader<R>(reader: R, timeout: Option<Duration>) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let spawned = std::thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || forward_lines(reader, tx));
        if let Err(e) = spawned {
            // The sender is gone with the closure, so reads report EOF.
            warn!(error = %e, "failed to start stdin reader thread");
        }

        Self {
            lines: Arc::new(tokio::sync::Mutex::new(rx)),
            timeout,
        }
    }

    /// One line without its terminator. `None` on EOF or read failure.
    pub async fn read_line(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }
}

const LINE_BUFFER: usize = 64;

fn forward_lines<R: BufRead>(reader: R, tx: mpsc::Sender<String>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line.trim_end_matches('\r').to_string(),
            Err(e) => {
                warn!(error = %e, "failed to read from stdin");
                break;
            }
        };
        if tx.blocking_send(line).is_err() {
            break;
        }
    }
    debug!("stdin reader finished");
}

#[async_trait]
impl InputSource for StdinInput {
    async fn next_input(&self, prompt: &str) -> Option<String> {
        debug!(prompt = %prompt, "waiting for user input on stdin");
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.read_line()).await {
                Ok(line) => line,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "timed out waiting for user input");
                    None
                }
            },
            None => self.read_line().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_scripted_answers_in_order() {
        let input = ScriptedInput::new(["first", "second"]);
        assert_eq!(input.next_input("?").await.as_deref(), Some("first"));
        assert_eq!(input.remaining(), 1);
        assert_eq!(input.next_input("?").await.as_deref(), Some("second"));
        assert_eq!(input.next_input("?").await, None);
    }

    #[tokio::test]
    async fn test_no_input() {
        assert_eq!(NoInput.next_input("Name?").await, None);
    }

    #[tokio::test]
    async fn test_reader_lines_then_eof() {
        let input = StdinInput::from_reader(Cursor::new("first\r\nsecond\n"), None);
        let shared = input.clone();

        assert_eq!(input.next_input("?").await.as_deref(), Some("first"));
        assert_eq!(shared.read_line().await.as_deref(), Some("second"));
        assert_eq!(input.next_input("?").await, None);
    }

    /// Never yields a line and never reaches EOF.
    struct Silent;

    impl std::io::Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            std::thread::sleep(Duration::from_secs(3600));
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_timeout_returns_none_promptly() {
        let input = StdinInput::from_reader(
            std::io::BufReader::new(Silent),
            Some(Duration::from_millis(100)),
        );

        let started = std::time::Instant::now();
        assert_eq!(input.next_input("Name?").await, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
