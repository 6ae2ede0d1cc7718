use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::request::PurchaseRequest;

pub const TEAM_LEADER_LIMIT: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);
pub const TEAM_LEADER_ROLE: &str = "team_leader";

/// What an approver decided about a single request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Review {
    Handle,
    Forward,
}

/// Highest price an approver may sign off on, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "max_price", rename_all = "snake_case")]
pub enum ApprovalLimit {
    UpTo(Decimal),
    Unbounded,
}

impl ApprovalLimit {
    pub fn covers(&self, price: Decimal) -> bool {
        match self {
            Self::UpTo(max_price) => price <= *max_price,
            Self::Unbounded => true,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl From<Option<Decimal>> for ApprovalLimit {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Self::Unbounded, Self::UpTo)
    }
}

impl fmt::Display for ApprovalLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpTo(max_price) => write!(f, "<= {max_price}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// A link in an approval chain.
///
/// Implementations must be stateless with respect to the requests they have
/// seen: the same request always gets the same review.
pub trait Approver: Send + Sync {
    fn name(&self) -> &str;

    fn role(&self) -> &str {
        "custom"
    }

    fn limit(&self) -> ApprovalLimit;

    fn review(&self, request: &PurchaseRequest) -> Review {
        if self.limit().covers(request.price()) {
            Review::Handle
        } else {
            Review::Forward
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdApprover {
    pub name: String,
    pub role: String,
    pub limit: ApprovalLimit,
}

impl ThresholdApprover {
    pub fn new(name: impl Into<String>, role: impl Into<String>, limit: ApprovalLimit) -> Self {
        Self { name: name.into(), role: role.into(), limit }
    }

    /// Signs off on anything up to and including 5000.
    pub fn team_leader(name: impl Into<String>) -> Self {
        Self::new(name, TEAM_LEADER_ROLE, ApprovalLimit::UpTo(TEAM_LEADER_LIMIT))
    }

    pub fn unbounded(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new(name, role, ApprovalLimit::Unbounded)
    }
}

impl Approver for ThresholdApprover {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> &str {
        &self.role
    }

    fn limit(&self) -> ApprovalLimit {
        self.limit
    }
}
