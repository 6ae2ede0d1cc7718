pub mod approver;

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use approver::{
    ApprovalLimit, Approver, Review, ThresholdApprover, TEAM_LEADER_LIMIT, TEAM_LEADER_ROLE,
};

use crate::config::ChainConfig;
use crate::domain::request::{PurchaseRequest, PurchaseRequestId};
use crate::errors::{ChainBuildError, ChainError};
use crate::sink::{ApprovalRecord, DecisionSink};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub request_id: PurchaseRequestId,
    pub price: Decimal,
    pub approved_by: String,
    pub position: usize,
    pub forwarded_by: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverDescriptor {
    pub position: usize,
    pub name: String,
    pub role: String,
    pub limit: ApprovalLimit,
}

/// Ordered, immutable sequence of approvers.
///
/// A request enters at the head and moves one position at a time until an
/// approver handles it. Because the links are positions in an owned `Vec`,
/// a chain cannot contain a cycle.
pub struct ApprovalChain {
    approvers: Vec<Box<dyn Approver>>,
}

impl fmt::Debug for ApprovalChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.approvers.iter().map(|approver| approver.name())).finish()
    }
}

impl ApprovalChain {
    pub fn builder() -> ApprovalChainBuilder {
        ApprovalChainBuilder::new()
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self, ChainBuildError> {
        let mut builder = ApprovalChainBuilder::new();
        for (position, entry) in config.approvers.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(ChainBuildError::EmptyApproverName { position });
            }
            if let Some(max_price) = entry.max_price {
                if max_price < Decimal::ZERO {
                    return Err(ChainBuildError::NegativeLimit {
                        approver: entry.name.clone(),
                        limit: max_price,
                    });
                }
            }

            builder = builder.then(ThresholdApprover::new(
                entry.name.clone(),
                entry.role.clone(),
                ApprovalLimit::from(entry.max_price),
            ));
        }

        if config.require_terminal {
            builder.build_terminated()
        } else {
            Ok(builder.build())
        }
    }

    pub fn len(&self) -> usize {
        self.approvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty()
    }

    pub fn approvers(&self) -> Vec<ApproverDescriptor> {
        self.approvers
            .iter()
            .enumerate()
            .map(|(position, approver)| ApproverDescriptor {
                position,
                name: approver.name().to_owned(),
                role: approver.role().to_owned(),
                limit: approver.limit(),
            })
            .collect()
    }

    /// Walks the chain from the head. The first approver whose review is
    /// `Handle` records the approval to `sink`; nobody after it is consulted.
    pub fn process<S>(
        &self,
        request: &PurchaseRequest,
        sink: &S,
    ) -> Result<ApprovalOutcome, ChainError>
    where
        S: DecisionSink + ?Sized,
    {
        let mut forwarded_by = Vec::new();

        for (position, approver) in self.approvers.iter().enumerate() {
            match approver.review(request) {
                Review::Handle => {
                    sink.record(&ApprovalRecord::new(
                        approver.name(),
                        request.id(),
                        request.price(),
                    ));
                    tracing::debug!(
                        event_name = "chain.request.approved",
                        request_id = request.id().0,
                        price = %request.price(),
                        approver = approver.name(),
                        position,
                        "purchase request approved"
                    );
                    return Ok(ApprovalOutcome {
                        request_id: request.id(),
                        price: request.price(),
                        approved_by: approver.name().to_owned(),
                        position,
                        forwarded_by,
                    });
                }
                Review::Forward => {
                    tracing::debug!(
                        event_name = "chain.request.forwarded",
                        request_id = request.id().0,
                        price = %request.price(),
                        approver = approver.name(),
                        position,
                        "purchase request exceeds approver limit; forwarding"
                    );
                    forwarded_by.push(approver.name().to_owned());
                }
            }
        }

        tracing::warn!(
            event_name = "chain.request.unhandled",
            request_id = request.id().0,
            price = %request.price(),
            consulted = forwarded_by.len(),
            "no approver in chain covers purchase request"
        );
        Err(ChainError::NoApproverAvailable {
            request_id: request.id(),
            price: request.price(),
            consulted: forwarded_by,
        })
    }
}

#[derive(Default)]
pub struct ApprovalChainBuilder {
    approvers: Vec<Box<dyn Approver>>,
}

impl ApprovalChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `approver` after the current tail.
    pub fn then<A>(mut self, approver: A) -> Self
    where
        A: Approver + 'static,
    {
        self.approvers.push(Box::new(approver));
        self
    }

    /// Accepts any chain, including an empty one or one whose tail has a
    /// limit. Requests nobody covers fail at dispatch.
    pub fn build(self) -> ApprovalChain {
        ApprovalChain { approvers: self.approvers }
    }

    /// Requires a non-empty chain whose last approver is unbounded, so every
    /// request is guaranteed a handler.
    pub fn build_terminated(self) -> Result<ApprovalChain, ChainBuildError> {
        let Some(last) = self.approvers.last() else {
            return Err(ChainBuildError::EmptyChain);
        };
        if !last.limit().is_unbounded() {
            return Err(ChainBuildError::MissingTerminalApprover { last: last.name().to_owned() });
        }

        Ok(self.build())
    }
}
