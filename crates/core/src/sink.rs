use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::request::PurchaseRequestId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLocale {
    #[default]
    Source,
    English,
}

impl std::str::FromStr for MessageLocale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "source" | "zh" => Ok(Self::Source),
            "english" | "en" => Ok(Self::English),
            other => Err(format!("unsupported locale `{other}` (expected source|english)")),
        }
    }
}

/// One approval: who signed off, on which request, at what price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub approver: String,
    pub request_id: PurchaseRequestId,
    pub price: Decimal,
}

impl ApprovalRecord {
    pub fn new(approver: impl Into<String>, request_id: PurchaseRequestId, price: Decimal) -> Self {
        Self { approver: approver.into(), request_id, price }
    }

    pub fn message(&self, locale: MessageLocale) -> String {
        match locale {
            MessageLocale::Source => {
                format!("{}审批了{}号请求，价格为{}", self.approver, self.request_id, self.price)
            }
            MessageLocale::English => {
                format!("{} approved request #{}, price {}", self.approver, self.request_id, self.price)
            }
        }
    }
}

impl fmt::Display for ApprovalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message(MessageLocale::Source))
    }
}

pub trait DecisionSink: Send + Sync {
    fn record(&self, record: &ApprovalRecord);
}

/// Records to both sinks, left first.
impl<A, B> DecisionSink for (A, B)
where
    A: DecisionSink,
    B: DecisionSink,
{
    fn record(&self, record: &ApprovalRecord) {
        self.0.record(record);
        self.1.record(record);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink {
    locale: MessageLocale,
}

impl ConsoleSink {
    pub fn new(locale: MessageLocale) -> Self {
        Self { locale }
    }
}

impl DecisionSink for ConsoleSink {
    fn record(&self, record: &ApprovalRecord) {
        let mut stdout = std::io::stdout().lock();
        // stdout closed by the reader (e.g. piped into `head`)
        let _ = writeln!(stdout, "{}", record.message(self.locale));
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DecisionSink for TracingSink {
    fn record(&self, record: &ApprovalRecord) {
        tracing::info!(
            event_name = "chain.request.approval_recorded",
            approver = %record.approver,
            request_id = record.request_id.0,
            price = %record.price,
            "{}",
            record.message(MessageLocale::English)
        );
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryDecisionSink {
    records: Arc<Mutex<Vec<ApprovalRecord>>>,
}

impl InMemoryDecisionSink {
    pub fn records(&self) -> Vec<ApprovalRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DecisionSink for InMemoryDecisionSink {
    fn record(&self, record: &ApprovalRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
    }
}
