use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Effective runtime configuration: optional TOML file plus `CONCIERGE_*`
/// environment overrides, env winning.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub simulate_failures: bool,
    pub simulate_latency: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Explicit config file path. Falls back to `CONCIERGE_CONFIG`, then to
    /// no file at all (defaults + env only).
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    llm: FileLlm,
    #[serde(default)]
    gateway: FileGateway,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileLlm {
    model: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileGateway {
    simulate_failures: Option<bool>,
    simulate_latency: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileLogging {
    level: Option<String>,
    format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig { model: "gpt-4o-mini".to_owned(), api_key: None },
            gateway: GatewayConfig { simulate_failures: false, simulate_latency: true },
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let file_path = options
            .config_path
            .or_else(|| env::var("CONCIERGE_CONFIG").ok().map(PathBuf::from));
        if let Some(path) = file_path {
            config.apply_file(&path)?;
        }
        config.apply_env()?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_owned(), source })?;
        let file: FileConfig = toml::from_str(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_owned(), source })?;

        if let Some(model) = file.llm.model {
            self.llm.model = model;
        }
        if let Some(api_key) = file.llm.api_key {
            self.llm.api_key = Some(SecretString::from(api_key));
        }
        if let Some(simulate_failures) = file.gateway.simulate_failures {
            self.gateway.simulate_failures = simulate_failures;
        }
        if let Some(simulate_latency) = file.gateway.simulate_latency {
            self.gateway.simulate_latency = simulate_latency;
        }
        if let Some(level) = file.logging.level {
            self.logging.level = level;
        }
        if let Some(format) = file.logging.format {
            self.logging.format = parse_log_format("logging.format", &format)?;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(model) = env::var("CONCIERGE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(api_key) = env::var("CONCIERGE_LLM_API_KEY") {
            self.llm.api_key = Some(SecretString::from(api_key));
        }
        if let Some(flag) = env_bool("CONCIERGE_GATEWAY_SIMULATE_FAILURES")? {
            self.gateway.simulate_failures = flag;
        }
        if let Some(flag) = env_bool("CONCIERGE_GATEWAY_SIMULATE_LATENCY")? {
            self.gateway.simulate_latency = flag;
        }
        if let Ok(level) = env::var("CONCIERGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("CONCIERGE_LOG_FORMAT") {
            self.logging.format = parse_log_format("CONCIERGE_LOG_FORMAT", &format)?;
        }
        Ok(())
    }

    /// Rendered for the `config` command; secrets are never printed.
    pub fn redacted_summary(&self) -> String {
        let api_key = match &self.llm.api_key {
            Some(secret) => {
                // Touch the secret so redaction is the only exposure path.
                let _ = secret.expose_secret();
                "<redacted>"
            }
            None => "<unset>",
        };
        format!(
            "llm.model = {model}\nllm.api_key = {api_key}\n\
             gateway.simulate_failures = {failures}\ngateway.simulate_latency = {latency}\n\
             logging.level = {level}\nlogging.format = {format:?}",
            model = self.llm.model,
            failures = self.gateway.simulate_failures,
            latency = self.gateway.simulate_latency,
            level = self.logging.level,
            format = self.logging.format,
        )
    }
}

fn parse_log_format(key: &str, value: &str) -> Result<LogFormat, ConfigError> {
    match value {
        "compact" => Ok(LogFormat::Compact),
        "pretty" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        _ => Err(ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() }),
    }
}

fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(None),
        Ok(value) => match value.as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvOverride { key: key.to_owned(), value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::sync::{Mutex, OnceLock};

    use super::*;

    // Env mutations must not interleave across tests.
    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(Mutex::default)
    }

    const ALL_KEYS: &[&str] = &[
        "CONCIERGE_CONFIG",
        "CONCIERGE_LLM_MODEL",
        "CONCIERGE_LLM_API_KEY",
        "CONCIERGE_GATEWAY_SIMULATE_FAILURES",
        "CONCIERGE_GATEWAY_SIMULATE_LATENCY",
        "CONCIERGE_LOG_LEVEL",
        "CONCIERGE_LOG_FORMAT",
    ];

    fn with_env<F: FnOnce()>(pairs: &[(&str, &str)], run: F) {
        let _guard = env_lock().lock().expect("env lock");
        for key in ALL_KEYS {
            env::remove_var(key);
        }
        for (key, value) in pairs {
            env::set_var(key, value);
        }
        run();
        for key in ALL_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        with_env(&[], || {
            let config = AppConfig::load(LoadOptions::default()).expect("defaults load");
            assert_eq!(config.llm.model, "gpt-4o-mini");
            assert!(!config.gateway.simulate_failures);
            assert!(config.gateway.simulate_latency);
            assert_eq!(config.logging.format, LogFormat::Compact);
        });
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[llm]\nmodel = \"file-model\"\n\n[logging]\nlevel = \"debug\"\nformat = \"json\""
        )
        .expect("write config");

        with_env(&[("CONCIERGE_LLM_MODEL", "env-model")], || {
            let config = AppConfig::load(LoadOptions {
                config_path: Some(file.path().to_owned()),
            })
            .expect("load");
            assert_eq!(config.llm.model, "env-model");
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.logging.format, LogFormat::Json);
        });
    }

    #[test]
    fn invalid_boolean_override_is_rejected() {
        with_env(&[("CONCIERGE_GATEWAY_SIMULATE_FAILURES", "maybe")], || {
            let error = AppConfig::load(LoadOptions::default()).expect_err("bad boolean");
            assert!(matches!(error, ConfigError::InvalidEnvOverride { .. }));
        });
    }

    #[test]
    fn summary_redacts_the_api_key() {
        with_env(&[("CONCIERGE_LLM_API_KEY", "sk-very-secret")], || {
            let config = AppConfig::load(LoadOptions::default()).expect("load");
            let summary = config.redacted_summary();
            assert!(summary.contains("<redacted>"));
            assert!(!summary.contains("sk-very-secret"));
        });
    }
}
