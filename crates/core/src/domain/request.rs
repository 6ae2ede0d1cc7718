use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseRequestId(pub u64);

impl fmt::Display for PurchaseRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PurchaseRequestId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A purchase waiting for sign-off. Immutable once built; the id is expected
/// to be unique per request but nothing here enforces that.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    id: PurchaseRequestId,
    price: Decimal,
}

impl PurchaseRequest {
    pub fn new(id: impl Into<PurchaseRequestId>, price: Decimal) -> Self {
        Self { id: id.into(), price }
    }

    pub fn id(&self) -> PurchaseRequestId {
        self.id
    }

    pub fn price(&self) -> Decimal {
        self.price
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{PurchaseRequest, PurchaseRequestId};

    #[test]
    fn accessors_return_constructed_values() {
        let request = PurchaseRequest::new(7, Decimal::new(450_050, 2));

        assert_eq!(request.id(), PurchaseRequestId(7));
        assert_eq!(request.price(), Decimal::new(450_050, 2));
    }

    #[test]
    fn deserializes_numeric_and_string_prices() {
        let requests: Vec<PurchaseRequest> =
            serde_json::from_str(r#"[{"id": 1, "price": 3000}, {"id": 2, "price": "5000.01"}]"#)
                .expect("requests should deserialize");

        assert_eq!(requests[0].id(), PurchaseRequestId(1));
        assert_eq!(requests[0].price(), Decimal::from(3000));
        assert_eq!(requests[1].price(), Decimal::new(500_001, 2));
    }
}
