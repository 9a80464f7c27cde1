//! Keywords understood by the interactive entry point, and the canned
//! content some of them produce.

use execstream_protocol::TableContent;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subcommand {
    Help,
    Run,
    Info(String),
    Generate(String),
    Exec(String),
    Tools,
    Register(String),
    Unregister(String),
    Ask(String),
    /// Anything unrecognised; the whole content goes to the decision-maker.
    Prompt(String),
}

impl Subcommand {
    pub fn parse(content: &str) -> Self {
        let content = content.trim();
        if content.is_empty() {
            return Subcommand::Help;
        }

        let (keyword, args) = match content.split_once(char::is_whitespace) {
            Some((keyword, args)) => (keyword, args.trim()),
            None => (content, ""),
        };
        let first_arg = || {
            args.split_whitespace()
                .next()
                .map(str::to_lowercase)
        };

        match keyword.to_lowercase().as_str() {
            "help" => Subcommand::Help,
            "run" => Subcommand::Run,
            "info" => Subcommand::Info(first_arg().unwrap_or_else(|| "general".to_string())),
            "generate" | "code" => {
                Subcommand::Generate(first_arg().unwrap_or_else(|| "python".to_string()))
            }
            "exec" => Subcommand::Exec(args.to_string()),
            "tools" => Subcommand::Tools,
            "register" => Subcommand::Register(args.to_string()),
            "unregister" => Subcommand::Unregister(args.to_string()),
            "ask" | "qianwen" => Subcommand::Ask(args.to_string()),
            _ => Subcommand::Prompt(content.to_string()),
        }
    }
}

pub const HELP_LINES: &[&str] = &[
    "=== Interactive Tool Help ===",
    "Available commands:",
    "  help               - Show this help message",
    "  run                - Run a sample interactive command",
    "  info [topic]       - Show information (general, commands, features, system)",
    "  generate [lang]    - Generate sample code (python, bash, javascript); alias: code",
    "  exec <command>     - Run a shell command and stream its output",
    "  tools              - List available tools",
    "  register <json>    - Register a custom tool from a JSON descriptor",
    "  unregister <name>  - Remove a custom tool",
    "  ask <text>         - Send text to the decision-maker",
    "Anything else is sent to the decision-maker as is.",
];

pub fn info_text(topic: &str) -> Option<&'static str> {
    match topic {
        "general" => Some(
            "An interactive worker that executes commands and streams their results as events.",
        ),
        "commands" => Some(
            "Main commands run in the background; secondary commands are offered as code blocks.",
        ),
        "features" => Some(
            "Features include command execution, code block interaction, multiple output types and tool calls.",
        ),
        _ => None,
    }
}

pub const INFO_SAMPLE_COMMAND: &str = "python -c \"print('Hello from the interactive tool!')\"";

pub fn code_sample(language: &str) -> String {
    match language {
        "python" => "print('Hello, World!')\nfor i in range(5):\n    print(f'Count: {i}')".to_string(),
        "bash" => "echo 'Hello, World!'\nfor i in {1..5}; do\n    echo \"Count: $i\"\ndone".to_string(),
        "javascript" => {
            "console.log('Hello, World!');\nfor (let i = 0; i < 5; i++) {\n    console.log(`Count: ${i}`);\n}"
                .to_string()
        }
        other => format!("# No sample code for {other}"),
    }
}

pub const SHOWCASE_LISTING: &str = "ls -la";
pub const SHOWCASE_MKDIR: &str = "mkdir -p project/src";
pub const SHOWCASE_CODE: &str = "def hello():\n    print('Hello, world!')\n\nhello()";

pub fn showcase_table() -> TableContent {
    let mut metadata = serde_json::Map::new();
    metadata.insert("title".to_string(), json!("Files"));
    TableContent {
        header: vec![json!("Name"), json!("Size"), json!("Date")],
        rows: vec![
            vec![json!("file1.txt"), json!("1024"), json!("2023-01-01")],
            vec![json!("file2.txt"), json!("2048"), json!("2023-01-02")],
        ],
        metadata,
    }
}
