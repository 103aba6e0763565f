use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::Reservation;
use crate::domain::validation::{self, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

/// A placed order. Immutable once appended to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub line_items: Vec<OrderLine>,
    pub total_cents: i64,
    pub timestamp: DateTime<Utc>,
}

impl Order {
    /// Prices each line from the snapshot its reservation captured.
    ///
    /// Fails when a line amount or the total overflows `i64` cents.
    pub fn from_reservations(
        id: String,
        user_id: String,
        reservations: &[Reservation],
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let line_items: Vec<OrderLine> = reservations
            .iter()
            .map(|r| OrderLine {
                product_id: r.product_id.clone(),
                quantity: r.quantity,
                unit_price_cents: r.unit_price_cents,
            })
            .collect();
        let total_cents = line_items
            .iter()
            .try_fold(0i64, |total, l| {
                i64::from(l.quantity)
                    .checked_mul(l.unit_price_cents)
                    .and_then(|amount| total.checked_add(amount))
            })
            .ok_or(ValidationError::TotalOverflow {
                field: "total_cents",
            })?;
        Ok(Self {
            id,
            user_id,
            line_items,
            total_cents,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Order placement input as received from a caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub line_items: Vec<LineItemRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: String,
    pub quantity: u32,
}

/// A placement request that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub user_id: String,
    pub lines: Vec<DraftLine>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl PlaceOrderRequest {
    pub fn validate(self) -> Result<OrderDraft, ValidationError> {
        validation::require("user_id", &self.user_id)?;
        if self.line_items.is_empty() {
            return Err(ValidationError::Required("line_items"));
        }
        let lines = self
            .line_items
            .into_iter()
            .map(|item| {
                validation::require("product_id", &item.product_id)?;
                let quantity = validation::quantity_at_least("quantity", item.quantity, 1)?;
                Ok(DraftLine {
                    product_id: item.product_id,
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        Ok(OrderDraft {
            user_id: self.user_id,
            lines,
            timestamp: self.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, quantity: i64) -> LineItemRequest {
        LineItemRequest {
            product_id: product_id.into(),
            quantity,
        }
    }

    #[test]
    fn from_reservations_computes_total() {
        let reservations = vec![
            Reservation {
                product_id: "A".into(),
                quantity: 2,
                unit_price_cents: 500,
            },
            Reservation {
                product_id: "B".into(),
                quantity: 1,
                unit_price_cents: 250,
            },
        ];
        let order =
            Order::from_reservations("o1".into(), "u1".into(), &reservations, Utc::now()).unwrap();
        assert_eq!(order.total_cents, 1250);
        assert_eq!(order.line_items.len(), 2);
        assert_eq!(order.line_items[0].product_id, "A");
        assert_eq!(order.line_items[1].unit_price_cents, 250);
    }

    #[test]
    fn from_reservations_rejects_overflowing_total() {
        let huge = Reservation {
            product_id: "A".into(),
            quantity: 2,
            unit_price_cents: i64::MAX / 2 + 1,
        };
        assert_eq!(
            Order::from_reservations("o1".into(), "u1".into(), &[huge.clone()], Utc::now()),
            Err(ValidationError::TotalOverflow {
                field: "total_cents"
            })
        );

        // Each line fits on its own, the sum does not.
        let half = Reservation {
            quantity: 1,
            ..huge
        };
        assert!(
            Order::from_reservations("o1".into(), "u1".into(), &[half.clone(), half], Utc::now())
                .is_err()
        );
    }

    #[test]
    fn validation_errors() {
        let empty_user = PlaceOrderRequest {
            user_id: "".into(),
            line_items: vec![line("p1", 1)],
            timestamp: None,
        };
        assert_eq!(
            empty_user.validate(),
            Err(ValidationError::Required("user_id"))
        );

        let no_lines = PlaceOrderRequest {
            user_id: "u1".into(),
            line_items: vec![],
            timestamp: None,
        };
        assert_eq!(
            no_lines.validate(),
            Err(ValidationError::Required("line_items"))
        );

        let zero_qty = PlaceOrderRequest {
            user_id: "u1".into(),
            line_items: vec![line("p1", 1), line("p2", 0)],
            timestamp: None,
        };
        assert!(zero_qty.validate().is_err());

        let blank_product = PlaceOrderRequest {
            user_id: "u1".into(),
            line_items: vec![line(" ", 1)],
            timestamp: None,
        };
        assert_eq!(
            blank_product.validate(),
            Err(ValidationError::Required("product_id"))
        );
    }

    #[test]
    fn validate_keeps_line_order() {
        let draft = PlaceOrderRequest {
            user_id: "u1".into(),
            line_items: vec![line("p2", 3), line("p1", 1)],
            timestamp: None,
        }
        .validate()
        .unwrap();
        assert_eq!(draft.lines[0].product_id, "p2");
        assert_eq!(draft.lines[0].quantity, 3);
        assert_eq!(draft.lines[1].product_id, "p1");
    }
}
