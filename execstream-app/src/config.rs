use execstream_protocol::ToolDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.modelscope.cn/v1";
pub const DEFAULT_MODEL: &str = "qwen-plus";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub use_mock: bool,
    pub llm: LlmConfig,
    pub input: InputConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub token: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSourceKind {
    #[default]
    Stdin,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub source: InputSourceKind,
    /// Answer used when no input arrives.
    pub fallback: String,
    pub timeout_secs: Option<u64>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: InputSourceKind::Stdin,
            fallback: String::new(),
            timeout_secs: Some(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub timeout_ms: u64,
    pub custom: Vec<ToolDescriptor>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            custom: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Applies `LLM_BASE_URL`, `LLM_TOKEN`, `LLM_MODEL` and `USE_MOCK_LLM`
    /// as returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(token) = lookup("LLM_TOKEN") {
            self.llm.token = token;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(flag) = lookup("USE_MOCK_LLM") {
            self.use_mock = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.use_mock && self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "llm.base_url must be set unless use_mock is enabled".to_string(),
            ));
        }
        if self.tools.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "tools.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(tool) = self.tools.custom.iter().find(|t| t.name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "custom tool without a name: {tool:?}"
            )));
        }
        Ok(())
    }

    /// File (when given), then environment, then the `--mock` flag.
    pub fn resolve(path: Option<&Path>, force_mock: bool) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
        if force_mock {
            config.use_mock = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.use_mock);
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.input.source, InputSourceKind::Stdin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("LLM_BASE_URL", "http://localhost:9000/v1"),
            ("LLM_TOKEN", "t0k"),
            ("USE_MOCK_LLM", "TRUE"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.base_url, "http://localhost:9000/v1");
        assert_eq!(config.llm.token, "t0k");
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert!(config.use_mock);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.llm.base_url = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.use_mock = true;
        assert!(config.validate().is_ok());

        config.tools.timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
