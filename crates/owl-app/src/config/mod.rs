//! Application configuration.
//!
//! Values come from built-in defaults, then an optional `owl.{yaml,yml,json,toml}`
//! file, then `OWL_*` environment variables. Command-line flags are applied on
//! top by the individual commands.

pub mod error;
pub mod helpers;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use owl_llm_api::BackendType;
use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use helpers::{create_client, model_settings, requirements_clients, society_clients};

/// File names looked up in the working directory, in order
pub const CONFIG_FILE_NAMES: [&str; 4] = ["owl.yaml", "owl.yml", "owl.json", "owl.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementsSettings {
    /// Directory holding `<stage>.json` prompt overrides
    pub templates_dir: Option<PathBuf>,
    pub max_retries: u32,
    /// Model spec for the quality checker; defaults to the main model
    pub quality_model: Option<String>,
}

impl Default for RequirementsSettings {
    fn default() -> Self {
        Self {
            templates_dir: None,
            max_retries: owl_types::MAX_RETRIES,
            quality_model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSettings {
    pub host: String,
    pub port: u16,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwlConfig {
    /// Model spec, `model[@backend[(url)]]`
    pub model: String,
    /// Backend used when the model spec names none
    pub backend: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    /// Separate model spec for the user agent
    pub user_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    pub log_requests: bool,
    pub round_limit: usize,
    pub max_tool_iterations: usize,
    /// Language every agent answers in
    pub language: Option<String>,
    pub toolkits: Vec<String>,
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
    pub mcp_config: Option<PathBuf>,
    pub requirements: RequirementsSettings,
    pub web: WebSettings,
}

impl Default for OwlConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            backend: "openai".to_string(),
            api_key: None,
            api_url: None,
            user_model: None,
            temperature: Some(0.0),
            max_tokens: None,
            timeout_secs: 300,
            log_requests: false,
            round_limit: owl_types::DEFAULT_ROUND_LIMIT,
            max_tool_iterations: owl_types::MAX_TOOL_ITERATIONS,
            language: None,
            toolkits: owl_tools::DEFAULT_TOOLKITS.iter().map(|s| s.to_string()).collect(),
            work_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            mcp_config: None,
            requirements: RequirementsSettings::default(),
            web: WebSettings::default(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl OwlConfig {
    /// Defaults, the config file (explicit or discovered in the current
    /// directory) and `OWL_*` overrides, validated
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(Path::new(".")),
        };

        let mut config = match &path {
            Some(path) => {
                log::info!("loading config from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// First of [`CONFIG_FILE_NAMES`] present in `dir`
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        Self::parse(&text, &extension).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse `text` in the format named by `extension`
    pub fn parse(text: &str, extension: &str) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            path: PathBuf::new(),
            message,
        };
        match extension {
            "yaml" | "yml" => serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string())),
            "json" => serde_json::from_str(text).map_err(|e| parse_error(e.to_string())),
            "toml" => toml::from_str(text).map_err(|e| parse_error(e.to_string())),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `OWL_*` overrides read through `lookup`
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OWL_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("OWL_BACKEND") {
            self.backend = v;
        }
        if let Some(v) = get("OWL_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = get("OWL_API_URL") {
            self.api_url = Some(v);
        }
        if let Some(v) = get("OWL_USER_MODEL") {
            self.user_model = Some(v);
        }
        if let Some(v) = get("OWL_TEMPERATURE") {
            self.temperature = Some(parse_env("OWL_TEMPERATURE", &v)?);
        }
        if let Some(v) = get("OWL_MAX_TOKENS") {
            self.max_tokens = Some(parse_env("OWL_MAX_TOKENS", &v)?);
        }
        if let Some(v) = get("OWL_TIMEOUT_SECS") {
            self.timeout_secs = parse_env("OWL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("OWL_LOG_REQUESTS") {
            self.log_requests = parse_bool("OWL_LOG_REQUESTS", &v)?;
        }
        if let Some(v) = get("OWL_ROUND_LIMIT") {
            self.round_limit = parse_env("OWL_ROUND_LIMIT", &v)?;
        }
        if let Some(v) = get("OWL_MAX_TOOL_ITERATIONS") {
            self.max_tool_iterations = parse_env("OWL_MAX_TOOL_ITERATIONS", &v)?;
        }
        if let Some(v) = get("OWL_LANGUAGE") {
            self.language = Some(v);
        }
        if let Some(v) = get("OWL_TOOLKITS") {
            self.toolkits = split_list(&v);
        }
        if let Some(v) = get("OWL_WORK_DIR") {
            self.work_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OWL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OWL_MCP_CONFIG") {
            self.mcp_config = Some(PathBuf::from(v));
        }
        if let Some(v) = get("OWL_TEMPLATES_DIR") {
            self.requirements.templates_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("OWL_MAX_RETRIES") {
            self.requirements.max_retries = parse_env("OWL_MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("OWL_QUALITY_MODEL") {
            self.requirements.quality_model = Some(v);
        }
        if let Some(v) = get("OWL_WEB_HOST") {
            self.web.host = v;
        }
        if let Some(v) = get("OWL_WEB_PORT") {
            self.web.port = parse_env("OWL_WEB_PORT", &v)?;
        }
        Ok(())
    }

    pub fn backend_type(&self) -> Result<BackendType, ConfigError> {
        BackendType::from_str(&self.backend).ok_or_else(|| ConfigError::UnknownBackend(self.backend.clone()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        self.backend_type()?;
        if self.round_limit == 0 {
            return Err(ConfigError::Invalid("round_limit must be at least 1".to_string()));
        }
        if self.max_tool_iterations == 0 {
            return Err(ConfigError::Invalid("max_tool_iterations must be at least 1".to_string()));
        }
        for name in &self.toolkits {
            if !is_known_toolkit(name) {
                return Err(ConfigError::UnknownToolkit {
                    name: name.clone(),
                    available: owl_tools::TOOLKIT_NAMES.join(", "),
                });
            }
        }
        Ok(())
    }
}

fn is_known_toolkit(name: &str) -> bool {
    owl_tools::TOOLKIT_NAMES.contains(&name) || matches!(name, "code_execution" | "file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = OwlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.round_limit, 15);
        assert_eq!(config.backend_type().unwrap(), BackendType::OpenAI);
    }

    #[test]
    fn test_parse_yaml_partial() {
        let config = OwlConfig::parse(
            "model: deepseek-chat@deepseek\nround_limit: 5\ntoolkits: [search, sec]\nweb:\n  port: 9000\n",
            "yaml",
        )
        .unwrap();
        assert_eq!(config.model, "deepseek-chat@deepseek");
        assert_eq!(config.round_limit, 5);
        assert_eq!(config.toolkits, vec!["search", "sec"]);
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, "127.0.0.1");
    }

    #[test]
    fn test_parse_toml_and_json() {
        let config = OwlConfig::parse("language = \"French\"\n[requirements]\nmax_retries = 5\n", "toml").unwrap();
        assert_eq!(config.language.as_deref(), Some("French"));
        assert_eq!(config.requirements.max_retries, 5);

        let config = OwlConfig::parse(r#"{"backend": "groq", "temperature": 0.3}"#, "json").unwrap();
        assert_eq!(config.backend_type().unwrap(), BackendType::Groq);
        assert_eq!(config.temperature, Some(0.3));
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            OwlConfig::parse("", "ini"),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OWL_MODEL", "qwen-max@qwen"),
            ("OWL_ROUND_LIMIT", "3"),
            ("OWL_TOOLKITS", "search, excel,"),
            ("OWL_LOG_REQUESTS", "yes"),
            ("OWL_WEB_PORT", "8081"),
            ("OWL_LANGUAGE", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = OwlConfig::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.model, "qwen-max@qwen");
        assert_eq!(config.round_limit, 3);
        assert_eq!(config.toolkits, vec!["search", "excel"]);
        assert!(config.log_requests);
        assert_eq!(config.web.port, 8081);
        assert_eq!(config.language, None);
    }

    #[test]
    fn test_env_rejects_bad_number() {
        let mut config = OwlConfig::default();
        let err = config
            .apply_env_with(|key| (key == "OWL_ROUND_LIMIT").then(|| "many".to_string()))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid value for OWL_ROUND_LIMIT: 'many'");
    }

    #[test]
    fn test_validate_rejects_unknown_toolkit_and_backend() {
        let mut config = OwlConfig::default();
        config.toolkits.push("browser".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::UnknownToolkit { name, .. }) if name == "browser"));

        let mut config = OwlConfig::default();
        config.backend = "watson".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::UnknownBackend(_))));

        let mut config = OwlConfig::default();
        config.round_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discover_prefers_yaml() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(OwlConfig::discover(dir.path()), None);
        std::fs::write(dir.path().join("owl.toml"), "round_limit = 2\n").unwrap();
        std::fs::write(dir.path().join("owl.yml"), "round_limit: 4\n").unwrap();
        let found = OwlConfig::discover(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "owl.yml");
        assert_eq!(OwlConfig::from_file(&found).unwrap().round_limit, 4);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = OwlConfig::load(Some(Path::new("/nonexistent/owl.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
