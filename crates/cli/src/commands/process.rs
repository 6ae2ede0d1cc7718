use approval_chain_core::config::AppConfig;
use approval_chain_core::{
    ApprovalOutcome, ConsoleSink, InMemoryDecisionSink, PurchaseRequest, TracingSink,
};
use serde::Serialize;

use crate::commands::{build_chain, CommandResult, EXIT_OK, EXIT_UNHANDLED};

#[derive(Debug, Serialize)]
struct ProcessReport {
    command: &'static str,
    status: &'static str,
    message: String,
    outcome: ApprovalOutcome,
}

/// Text mode prints the approval line straight to stdout through
/// `ConsoleSink`; JSON mode collects it and returns a report instead.
pub fn run(config: &AppConfig, request: &PurchaseRequest, json_output: bool) -> CommandResult {
    let chain = match build_chain("process", config) {
        Ok(chain) => chain,
        Err(result) => return result,
    };

    if !json_output {
        let sink = (ConsoleSink::new(config.output.locale), TracingSink);
        return match chain.process(request, &sink) {
            Ok(_) => CommandResult::text(EXIT_OK, ""),
            Err(error) => CommandResult::text(EXIT_UNHANDLED, error.to_string()),
        };
    }

    let sink = (InMemoryDecisionSink::default(), TracingSink);
    match chain.process(request, &sink) {
        Ok(outcome) => {
            let message = sink
                .0
                .records()
                .first()
                .map(|record| record.message(config.output.locale))
                .unwrap_or_default();
            CommandResult::json(
                EXIT_OK,
                &ProcessReport { command: "process", status: "approved", message, outcome },
            )
        }
        Err(error) => CommandResult::failure(
            "process",
            error.error_class(),
            error.to_string(),
            EXIT_UNHANDLED,
        ),
    }
}
