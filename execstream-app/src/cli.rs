use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Request: a JSON object {"content", "projectDir", "sequenceId"} or a raw string
    #[arg(allow_hyphen_values = true)]
    pub request: Option<String>,

    /// Emit plain text with block markers instead of JSON lines
    #[arg(long)]
    pub legacy: bool,

    /// Path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use the scripted decision-maker regardless of configuration
    #[arg(long)]
    pub mock: bool,
}

/// Runs one shell command and streams its output as events
#[derive(Parser, Debug)]
#[command(name = "execinfo", version, about)]
pub struct ExecinfoArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Interactive worker: sub-commands, tools and decision-maker requests
#[derive(Parser, Debug)]
#[command(name = "interactive-tool", version, about)]
pub struct InteractiveArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Read requests line by line from stdin until `exit`
    #[arg(long)]
    pub repl: bool,
}
