pub mod batch;
pub mod chain;
pub mod process;

use std::path::PathBuf;

use approval_chain_core::config::{AppConfig, LoadOptions};
use approval_chain_core::{ApprovalChain, ChainBuildError};
use serde::Serialize;

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_UNHANDLED: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }

    pub fn text(exit_code: u8, output: impl Into<String>) -> Self {
        Self { exit_code, output: output.into() }
    }

    pub fn json<T: Serialize>(exit_code: u8, payload: &T) -> Self {
        Self { exit_code, output: serialize_payload(payload) }
    }
}

pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() }).map_err(|error| {
        CommandResult::failure(
            "config",
            "config_validation",
            format!("config validation failed: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn build_chain(
    command: &str,
    config: &AppConfig,
) -> Result<ApprovalChain, CommandResult> {
    ApprovalChain::from_config(&config.chain).map_err(|error: ChainBuildError| {
        CommandResult::failure(command, "chain_build", error.to_string(), EXIT_CONFIG)
    })
}

fn serialize_payload<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
