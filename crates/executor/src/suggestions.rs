//! Best-effort follow-up suggestions for common command shapes.
//!
//! Purely advisory: anything the classifier does not recognise yields no
//! suggestion.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandShape {
    Listing,
    VersionControl,
    Interpreter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub shape: CommandShape,
    pub command: &'static str,
}

const LISTING_FOLLOW_UP: &str = "stat $(ls -la | head -n 3 | tail -n 1 | awk '{print $9}')";
const VCS_FOLLOW_UP: &str = "git log --oneline -n 5";
const INTERPRETER_FOLLOW_UP: &str = "python -c \"import sys, os; print('Python version:', sys.version); print('Current directory:', os.getcwd())\"";

/// Program names in command position: the first word of every segment
/// separated by `|`, `;` or `&`, without any leading path.
fn programs(command: &str) -> impl Iterator<Item = String> + '_ {
    command
        .split(['|', ';', '&', '(', ')', '\n'])
        .filter_map(|segment| segment.split_whitespace().next())
        .map(|word| {
            word.rsplit(['/', '\\'])
                .next()
                .unwrap_or(word)
                .to_ascii_lowercase()
        })
}

pub fn classify(command: &str) -> Option<CommandShape> {
    let programs: Vec<String> = programs(command).collect();

    if programs.iter().any(|p| matches!(p.as_str(), "ls" | "dir" | "ll")) {
        Some(CommandShape::Listing)
    } else if programs.iter().any(|p| p == "git") {
        Some(CommandShape::VersionControl)
    } else if programs
        .iter()
        .any(|p| p.starts_with("python") || p == "py")
    {
        Some(CommandShape::Interpreter)
    } else {
        None
    }
}

pub fn suggest(command: &str) -> Option<Suggestion> {
    let shape = classify(command)?;
    let command = match shape {
        CommandShape::Listing => LISTING_FOLLOW_UP,
        CommandShape::VersionControl => VCS_FOLLOW_UP,
        CommandShape::Interpreter => INTERPRETER_FOLLOW_UP,
    };
    Some(Suggestion { shape, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_commands() {
        assert_eq!(classify("ls -la"), Some(CommandShape::Listing));
        assert_eq!(classify("cd src && ls"), Some(CommandShape::Listing));
        assert_eq!(classify("DIR"), Some(CommandShape::Listing));
        assert_eq!(classify("/bin/ls"), Some(CommandShape::Listing));
    }

    #[test]
    fn test_vcs_and_interpreter() {
        assert_eq!(classify("git status"), Some(CommandShape::VersionControl));
        assert_eq!(classify("python3 script.py"), Some(CommandShape::Interpreter));
        assert_eq!(
            classify("/usr/bin/python -V"),
            Some(CommandShape::Interpreter)
        );
    }

    #[test]
    fn test_unrecognised_commands_have_no_suggestion() {
        assert_eq!(classify("echo hi"), None);
        assert_eq!(classify("echo ls"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("   |  ; "), None);
        assert!(suggest("cargo build").is_none());
    }

    #[test]
    fn test_listing_takes_precedence() {
        let suggestion = suggest("git ls-files | ls").unwrap();
        assert_eq!(suggestion.shape, CommandShape::Listing);
        assert!(suggestion.command.starts_with("stat"));
    }

    #[test]
    fn test_vcs_suggestion_command() {
        assert_eq!(suggest("git pull").unwrap().command, "git log --oneline -n 5");
    }
}
