pub mod chain;
pub mod config;
pub mod domain;
pub mod errors;
pub mod sink;

pub use chain::{
    ApprovalChain, ApprovalChainBuilder, ApprovalLimit, ApprovalOutcome, Approver,
    ApproverDescriptor, Review, ThresholdApprover, TEAM_LEADER_LIMIT,
};
pub use config::{AppConfig, ApproverConfig, ChainConfig, ConfigError, LoadOptions};
pub use domain::request::{PurchaseRequest, PurchaseRequestId};
pub use errors::{ChainBuildError, ChainError};
pub use sink::{
    ApprovalRecord, ConsoleSink, DecisionSink, InMemoryDecisionSink, MessageLocale, TracingSink,
};
