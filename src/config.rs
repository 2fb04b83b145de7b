use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::registry::{ModelRegistry, ModelSpec};

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "openai-mock")]
#[command(about = "Schema-correct mock of the OpenAI HTTP API")]
pub struct Args {
    // Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Optional TOML file with api keys and the model registry
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    // Accepted bearer token, repeatable. No keys means no auth
    #[arg(long = "api-key")]
    pub api_keys: Vec<String>,

    // Seconds between metrics window reports
    #[arg(long, default_value_t = 60)]
    pub metrics_interval: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

// Contents of the optional config file
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api_keys: Vec<String>,

    #[serde(default = "ModelRegistry::builtin_models")]
    pub models: Vec<ModelSpec>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            models: ModelRegistry::builtin_models(),
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Everything the server needs at startup: CLI flags layered over the file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: String,
    pub api_keys: Vec<String>,
    pub models: Vec<ModelSpec>,
    pub metrics_interval: u64,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut api_keys = file.api_keys;
        api_keys.extend(args.api_keys.iter().cloned());

        Ok(Self {
            bind_address: format!("{}:{}", args.host, args.port),
            api_keys,
            models: file.models,
            metrics_interval: args.metrics_interval.max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelKind;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["openai-mock"]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.metrics_interval, 60);
        assert!(args.api_keys.is_empty());

        let settings = Settings::from_args(&args).unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:8080");
        assert_eq!(settings.models.len(), ModelRegistry::builtin_models().len());
    }

    #[test]
    fn test_repeated_api_keys() {
        let args = Args::parse_from(["openai-mock", "--api-key", "sk-a", "--api-key", "sk-b", "-p", "9000"]);
        let settings = Settings::from_args(&args).unwrap();
        assert_eq!(settings.api_keys, vec!["sk-a".to_string(), "sk-b".to_string()]);
        assert_eq!(settings.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn test_file_config() {
        let config: FileConfig = toml::from_str(
            r#"
            api_keys = ["sk-file"]

            [[models]]
            id = "tiny-chat"
            kind = "chat"
            max_output_tokens = 64
        "#,
        )
        .unwrap();
        assert_eq!(config.api_keys, vec!["sk-file".to_string()]);
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].kind, ModelKind::Chat);

        // no [[models]] table keeps the builtin registry
        let config: FileConfig = toml::from_str(r#"api_keys = []"#).unwrap();
        assert_eq!(config.models.len(), ModelRegistry::builtin_models().len());
    }

    #[test]
    fn test_missing_file() {
        let args = Args::parse_from(["openai-mock", "--config", "/definitely/not/here.toml"]);
        assert!(matches!(Settings::from_args(&args), Err(ConfigError::Read { .. })));
    }
}
