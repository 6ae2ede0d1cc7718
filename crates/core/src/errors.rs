use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::request::PurchaseRequestId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error(
        "no approver available for request {request_id} at price {price} (consulted: {})",
        render_consulted(.consulted)
    )]
    NoApproverAvailable { request_id: PurchaseRequestId, price: Decimal, consulted: Vec<String> },
}

impl ChainError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::NoApproverAvailable { .. } => "no_approver_available",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainBuildError {
    #[error("approval chain has no approvers")]
    EmptyChain,
    #[error("last approver `{last}` has a price limit; a terminated chain must end with an unbounded approver")]
    MissingTerminalApprover { last: String },
    #[error("approver `{approver}` has negative price limit {limit}")]
    NegativeLimit { approver: String, limit: Decimal },
    #[error("approver at position {position} has an empty name")]
    EmptyApproverName { position: usize },
}

fn render_consulted(consulted: &[String]) -> String {
    if consulted.is_empty() {
        return "none".to_owned();
    }
    consulted.join(" -> ")
}
