use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use approval_chain_core::config::AppConfig;
use approval_chain_core::{InMemoryDecisionSink, PurchaseRequest, PurchaseRequestId, TracingSink};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{build_chain, CommandResult, EXIT_CONFIG, EXIT_OK, EXIT_UNHANDLED};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum EntryStatus {
    Approved,
    Unhandled,
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    request_id: PurchaseRequestId,
    price: Decimal,
    status: EntryStatus,
    approved_by: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct BatchReport {
    command: &'static str,
    status: &'static str,
    approved: usize,
    unhandled: usize,
    results: Vec<BatchEntry>,
}

pub fn run(config: &AppConfig, file: &Path) -> CommandResult {
    let requests = match read_requests(file) {
        Ok(requests) => requests,
        Err(error) => {
            return CommandResult::failure("batch", "input", format!("{error:#}"), EXIT_CONFIG)
        }
    };
    let chain = match build_chain("batch", config) {
        Ok(chain) => chain,
        Err(result) => return result,
    };

    let sink = (InMemoryDecisionSink::default(), TracingSink);
    let mut results = Vec::with_capacity(requests.len());
    for request in &requests {
        let entry = match chain.process(request, &sink) {
            Ok(outcome) => {
                let message = sink
                    .0
                    .records()
                    .last()
                    .map(|record| record.message(config.output.locale))
                    .unwrap_or_default();
                BatchEntry {
                    request_id: outcome.request_id,
                    price: outcome.price,
                    status: EntryStatus::Approved,
                    approved_by: Some(outcome.approved_by),
                    message,
                }
            }
            Err(error) => BatchEntry {
                request_id: request.id(),
                price: request.price(),
                status: EntryStatus::Unhandled,
                approved_by: None,
                message: error.to_string(),
            },
        };
        results.push(entry);
    }

    let unhandled = results.iter().filter(|entry| entry.status == EntryStatus::Unhandled).count();
    let approved = results.len() - unhandled;
    tracing::info!(
        event_name = "chain.batch.completed",
        total = results.len(),
        approved,
        unhandled,
        "purchase request batch processed"
    );

    let (status, exit_code) =
        if unhandled == 0 { ("ok", EXIT_OK) } else { ("partial", EXIT_UNHANDLED) };
    let report = BatchReport { command: "batch", status, approved, unhandled, results };
    CommandResult::json(exit_code, &report)
}

fn read_requests(file: &Path) -> Result<Vec<PurchaseRequest>> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("could not read request file `{}`", file.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse request file `{}`", file.display()))
}
