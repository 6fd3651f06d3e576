//! # Stock Availability
//!
//! Pure half of the stock ledger: decides whether an order fits the stock that
//! was batch-loaded for it. The other half, the guarded in-place decrement,
//! lives in `tally-db` and runs inside the commit unit.
//!
//! ```text
//! order lines ──► aggregate per product ──► compare with loaded stock
//!                                                 │
//!                        first shortfall ◄────────┤
//!                  InsufficientStock{..}          │
//!                                                 ▼
//!                                   Vec<StockRequest> for the ledger
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::pricing::OrderLine;

/// Units of one product an order takes out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Sums quantities per product, keeping the order in which products first appear.
pub fn aggregate_requests(lines: &[OrderLine<'_>]) -> Vec<StockRequest> {
    let mut requests: Vec<StockRequest> = Vec::with_capacity(lines.len());

    for line in lines {
        match requests
            .iter_mut()
            .find(|r| r.product_id == line.product.id)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => requests.push(StockRequest {
                product_id: line.product.id.clone(),
                quantity: line.quantity,
            }),
        }
    }

    requests
}

/// Checks every product has enough stock for the whole order.
///
/// Two lines for the same product are checked against their combined quantity.
/// Stops at the first product that falls short.
pub fn check_availability(lines: &[OrderLine<'_>]) -> CoreResult<Vec<StockRequest>> {
    let requests = aggregate_requests(lines);

    for request in &requests {
        if let Some(line) = lines.iter().find(|l| l.product.id == request.product_id) {
            line.product.ensure_stock(request.quantity)?;
        }
    }

    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::money::Money;
    use crate::types::Product;
    use chrono::Utc;

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            organization_id: "org".to_string(),
            name: format!("Product {}", id),
            description: None,
            price: Money::from_units(10),
            cost: Money::from_units(5),
            stock,
            bundle: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_duplicate_lines_are_summed() {
        let a = product("a", 10);
        let b = product("b", 10);
        let lines = [
            OrderLine { product: &a, quantity: 2 },
            OrderLine { product: &b, quantity: 1 },
            OrderLine { product: &a, quantity: 3 },
        ];

        let requests = aggregate_requests(&lines);
        assert_eq!(
            requests,
            vec![
                StockRequest { product_id: "a".to_string(), quantity: 5 },
                StockRequest { product_id: "b".to_string(), quantity: 1 },
            ]
        );
    }

    #[test]
    fn test_combined_quantity_can_exceed_stock() {
        let a = product("a", 4);
        let lines = [
            OrderLine { product: &a, quantity: 2 },
            OrderLine { product: &a, quantity: 3 },
        ];

        match check_availability(&lines) {
            Err(CoreError::InsufficientStock { available, requested, .. }) => {
                assert_eq!(available, 4);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_stock_is_enough() {
        let a = product("a", 3);
        let lines = [OrderLine { product: &a, quantity: 3 }];
        assert!(check_availability(&lines).is_ok());
    }
}
