use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::{TEAM_LEADER_LIMIT, TEAM_LEADER_ROLE};
use crate::sink::MessageLocale;

pub const DEFAULT_CONFIG_FILE: &str = "approval-chain.toml";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub approvers: Vec<ApproverConfig>,
    pub require_terminal: bool,
}

/// One `[[chain.approvers]]` entry. A missing `max_price` means the approver
/// covers every price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverConfig {
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub max_price: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub locale: MessageLocale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub locale: Option<MessageLocale>,
    pub require_terminal: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

fn default_role() -> String {
    "approver".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            approvers: vec![ApproverConfig {
                name: "TeamLeader".to_string(),
                role: TEAM_LEADER_ROLE.to_string(),
                max_price: Some(TEAM_LEADER_LIMIT),
            }],
            require_terminal: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            output: OutputConfig { locale: MessageLocale::Source },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file || options.config_path.is_some() {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(chain) = patch.chain {
            if let Some(approvers) = chain.approvers {
                self.chain.approvers = approvers;
            }
            if let Some(require_terminal) = chain.require_terminal {
                self.chain.require_terminal = require_terminal;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(output) = patch.output {
            if let Some(locale) = output.locale {
                self.output.locale = locale;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("APPROVAL_CHAIN_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("APPROVAL_CHAIN_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        if let Some(value) = read_env("APPROVAL_CHAIN_LOCALE") {
            self.output.locale = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "APPROVAL_CHAIN_LOCALE".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env("APPROVAL_CHAIN_REQUIRE_TERMINAL") {
            self.chain.require_terminal = parse_bool("APPROVAL_CHAIN_REQUIRE_TERMINAL", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(locale) = overrides.locale {
            self.output.locale = locale;
        }
        if let Some(require_terminal) = overrides.require_terminal {
            self.chain.require_terminal = require_terminal;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_chain(&self.chain)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_chain(chain: &ChainConfig) -> Result<(), ConfigError> {
    for (position, approver) in chain.approvers.iter().enumerate() {
        if approver.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "chain.approvers[{position}].name must not be empty"
            )));
        }
        if approver.max_price.is_some_and(|max_price| max_price < Decimal::ZERO) {
            return Err(ConfigError::Validation(format!(
                "chain.approvers[{position}].max_price must not be negative"
            )));
        }
    }

    if chain.require_terminal {
        let terminated =
            chain.approvers.last().map(|approver| approver.max_price.is_none()).unwrap_or(false);
        if !terminated {
            return Err(ConfigError::Validation(
                "chain.require_terminal is true but the last approver has a max_price (omit it to make the approver unbounded)"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    chain: Option<ChainPatch>,
    logging: Option<LoggingPatch>,
    output: Option<OutputPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ChainPatch {
    approvers: Option<Vec<ApproverConfig>>,
    require_terminal: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputPatch {
    locale: Option<MessageLocale>,
}
