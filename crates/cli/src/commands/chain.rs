use approval_chain_core::config::AppConfig;
use approval_chain_core::ApproverDescriptor;
use serde::Serialize;

use crate::commands::{build_chain, CommandResult, EXIT_OK};

#[derive(Debug, Serialize)]
struct ChainReport {
    command: &'static str,
    terminated: bool,
    approvers: Vec<ApproverDescriptor>,
}

pub fn run(config: &AppConfig, json_output: bool) -> CommandResult {
    let chain = match build_chain("chain", config) {
        Ok(chain) => chain,
        Err(result) => return result,
    };
    let approvers = chain.approvers();
    let terminated =
        approvers.last().map(|approver| approver.limit.is_unbounded()).unwrap_or(false);

    if json_output {
        let report = ChainReport { command: "chain", terminated, approvers };
        return CommandResult::json(EXIT_OK, &report);
    }

    let mut lines = vec![format!("approval chain ({} approvers, head first):", approvers.len())];
    lines.extend(approvers.iter().map(|approver| {
        format!("  {}. {} [{}] {}", approver.position, approver.name, approver.role, approver.limit)
    }));
    if !terminated {
        lines.push(
            "note: the last approver has a price limit; requests above it have no approver"
                .to_string(),
        );
    }

    CommandResult::text(EXIT_OK, lines.join("\n"))
}
