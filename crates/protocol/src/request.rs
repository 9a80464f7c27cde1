//! Parsing of the single request argument a worker is invoked with.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// How the request argument was understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFormat {
    Json,
    /// JSON recovered after stripping a layer of backslash escaping.
    Unescaped,
    /// Not JSON; the whole argument is the content.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub content: String,
    pub project_dir: Option<PathBuf>,
    pub sequence_id: String,
    pub format: RequestFormat,
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "projectDir")]
    project_dir: Option<String>,
    #[serde(default, rename = "sequenceId")]
    sequence_id: Option<String>,
}

impl Request {
    /// Request whose content is taken verbatim.
    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            project_dir: None,
            sequence_id: String::new(),
            format: RequestFormat::Raw,
        }
    }

    pub fn new(
        content: impl Into<String>,
        project_dir: Option<PathBuf>,
        sequence_id: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            project_dir,
            sequence_id: sequence_id.into(),
            format: RequestFormat::Json,
        }
    }

    /// Parses the invocation argument. Never fails: anything that is not a
    /// JSON request object degrades to a raw request.
    pub fn parse(arg: &str) -> Self {
        match Self::from_json(arg, RequestFormat::Json) {
            Ok(request) => request,
            Err(first_error) => {
                if arg.contains('\\') {
                    let unescaped = arg.replace('\\', "");
                    if let Ok(request) = Self::from_json(&unescaped, RequestFormat::Unescaped) {
                        debug!("request recovered after removing escape characters");
                        return request;
                    }
                }
                debug!(error = %first_error, "request is not a JSON object, using raw content");
                Self::raw(arg)
            }
        }
    }

    fn from_json(text: &str, format: RequestFormat) -> Result<Self, serde_json::Error> {
        let raw: RawRequest = serde_json::from_str(text)?;
        Ok(Self {
            content: raw.content.unwrap_or_default(),
            project_dir: raw
                .project_dir
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            sequence_id: raw.sequence_id.unwrap_or_default(),
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_request() {
        let request =
            Request::parse(r#"{"content": "echo hi", "projectDir": ".", "sequenceId": "s1"}"#);
        assert_eq!(request.content, "echo hi");
        assert_eq!(request.project_dir, Some(PathBuf::from(".")));
        assert_eq!(request.sequence_id, "s1");
        assert_eq!(request.format, RequestFormat::Json);
    }

    #[test]
    fn test_parse_raw_command() {
        let request = Request::parse("ls -la | wc -l");
        assert_eq!(request.content, "ls -la | wc -l");
        assert_eq!(request.project_dir, None);
        assert_eq!(request.sequence_id, "");
        assert_eq!(request.format, RequestFormat::Raw);
    }

    #[test]
    fn test_parse_double_escaped_json() {
        let request = Request::parse(r#"{\"content\": \"pwd\", \"sequenceId\": \"x-1\"}"#);
        assert_eq!(request.content, "pwd");
        assert_eq!(request.sequence_id, "x-1");
        assert_eq!(request.format, RequestFormat::Unescaped);
    }

    #[test]
    fn test_non_object_json_is_raw() {
        assert_eq!(Request::parse("42").format, RequestFormat::Raw);
        assert_eq!(Request::parse("\"ls\"").content, "\"ls\"");
        assert_eq!(Request::parse("[1, 2]").format, RequestFormat::Raw);
    }

    #[test]
    fn test_missing_fields_default() {
        let request = Request::parse(r#"{"content": "date"}"#);
        assert_eq!(request.sequence_id, "");
        assert_eq!(request.project_dir, None);

        let request = Request::parse(r#"{"content": "date", "projectDir": "", "sequenceId": null}"#);
        assert_eq!(request.project_dir, None);
        assert_eq!(request.sequence_id, "");
    }

    #[test]
    fn test_truncated_json_is_raw() {
        let request = Request::parse(r#"{"content": "echo"#);
        assert_eq!(request.format, RequestFormat::Raw);
        assert_eq!(request.content, r#"{"content": "echo"#);
    }
}
