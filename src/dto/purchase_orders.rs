use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{inventory_movement_entity, PurchaseOrderStatus};
use crate::repositories::purchase_order_repository::PurchaseOrderDetails;

const DEFAULT_PAGE_LIMIT: u64 = 20;
const MAX_PAGE_LIMIT: u64 = 100;

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("amount must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// One order line. `product_id` of `None` or `0` asks for an ad-hoc product built from
/// `product_name`, `sku` and `product_description`; those three are never stored on the line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PurchaseOrderItemInput {
    #[serde(default)]
    pub product_id: Option<i64>,
    pub product_variant_id: Option<i64>,
    #[validate(length(max = 255))]
    pub product_name: Option<String>,
    #[validate(length(max = 100))]
    pub sku: Option<String>,
    pub product_description: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom = "non_negative")]
    pub unit_price: Decimal,
    #[validate(custom = "non_negative")]
    pub discount_amount: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub tax_amount: Option<Decimal>,
    #[validate(length(max = 100))]
    pub batch_number: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl PurchaseOrderItemInput {
    /// Line referencing an existing catalog product.
    pub fn for_product(product_id: i64, quantity: i32, unit_price: Decimal) -> Self {
        Self {
            product_id: Some(product_id),
            quantity,
            unit_price,
            ..Default::default()
        }
    }

    /// Line that creates a catalog product on the fly.
    pub fn ad_hoc(name: impl Into<String>, quantity: i32, unit_price: Decimal) -> Self {
        Self {
            product_name: Some(name.into()),
            quantity,
            unit_price,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: i64,
    pub location_id: i64,
    /// Initial status; `draft` when absent.
    pub status: Option<PurchaseOrderStatus>,
    #[validate(length(max = 100))]
    pub internal_reference: Option<String>,
    #[validate(length(max = 100))]
    pub supplier_reference: Option<String>,
    pub notes: Option<String>,
    #[validate(custom = "non_negative")]
    pub discount_amount: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub tax_amount: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub shipping_cost: Option<Decimal>,
    pub expected_delivery_date: Option<NaiveDate>,
    #[validate(length(min = 1))]
    pub items: Vec<PurchaseOrderItemInput>,
}

/// Partial update. Absent fields are left untouched; `items`, when present, replaces every
/// line of the order and triggers a subtotal recompute.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePurchaseOrderInput {
    pub supplier_id: Option<i64>,
    pub location_id: Option<i64>,
    pub status: Option<PurchaseOrderStatus>,
    #[validate(length(max = 100))]
    pub internal_reference: Option<String>,
    #[validate(length(max = 100))]
    pub supplier_reference: Option<String>,
    pub notes: Option<String>,
    #[validate(custom = "non_negative")]
    pub discount_amount: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub tax_amount: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub shipping_cost: Option<Decimal>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub items: Option<Vec<PurchaseOrderItemInput>>,
}

impl UpdatePurchaseOrderInput {
    pub fn touches_money(&self) -> bool {
        self.items.is_some()
            || self.discount_amount.is_some()
            || self.tax_amount.is_some()
            || self.shipping_cost.is_some()
    }
}

/// `(item id, quantity arriving now)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveItemInput {
    pub id: i64,
    pub quantity_received: i32,
}

impl ReceiveItemInput {
    pub fn new(id: i64, quantity_received: i32) -> Self {
        Self {
            id,
            quantity_received,
        }
    }
}

/// Read-side filter for purchase order listings.
///
/// `sort_by` and `sort_order` are accepted for wire compatibility; listings are always
/// ordered by `order_date` descending. `page`/`limit` are not applied by the engine, see
/// [`PurchaseOrderFilter::page_window`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseOrderFilter {
    pub store_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub location_id: Option<i64>,
    pub status: Option<PurchaseOrderStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Case-sensitive substring over references, notes and supplier name.
    pub search: Option<String>,
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PurchaseOrderFilter {
    pub fn pending() -> Self {
        Self {
            status: Some(PurchaseOrderStatus::Approved),
            ..Default::default()
        }
    }

    /// `(offset, limit)` for the calling layer. Pages are 1-based.
    pub fn page_window(&self) -> (u64, u64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let page = self.page.unwrap_or(1).max(1);
        ((page - 1) * limit, limit)
    }

    /// Non-empty search term, if any.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLineOutcome {
    pub item_id: i64,
    pub requested: i32,
    pub applied: i32,
    /// Portion of `requested` that exceeded the outstanding quantity.
    pub rejected: i32,
}

impl ReceiptLineOutcome {
    pub fn was_clamped(&self) -> bool {
        self.rejected > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptOutcome {
    pub order: PurchaseOrderDetails,
    pub lines: Vec<ReceiptLineOutcome>,
    pub movements: Vec<inventory_movement_entity::Model>,
}

impl ReceiptOutcome {
    pub fn total_applied(&self) -> i32 {
        self.lines.iter().map(|l| l.applied).sum()
    }

    pub fn total_rejected(&self) -> i32 {
        self.lines.iter().map(|l| l.rejected).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn order_with(items: Vec<PurchaseOrderItemInput>) -> CreatePurchaseOrderInput {
        CreatePurchaseOrderInput {
            supplier_id: 1,
            location_id: 1,
            items,
            ..Default::default()
        }
    }

    #[test]
    fn create_requires_at_least_one_item() {
        assert!(order_with(vec![]).validate().is_err());
        assert!(order_with(vec![PurchaseOrderItemInput::for_product(1, 1, dec!(1))])
            .validate()
            .is_ok());
    }

    #[test]
    fn negative_money_is_rejected() {
        let mut input = order_with(vec![PurchaseOrderItemInput::for_product(1, 1, dec!(1))]);
        input.shipping_cost = Some(dec!(-0.01));
        assert!(input.validate().is_err());

        let line = PurchaseOrderItemInput::for_product(1, 1, dec!(-3));
        assert!(line.validate().is_err());
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        assert!(PurchaseOrderItemInput::ad_hoc("Widget", 0, dec!(2))
            .validate()
            .is_err());
    }

    #[rstest]
    #[case(None, None, (0, 20))]
    #[case(Some(1), Some(10), (0, 10))]
    #[case(Some(3), Some(10), (20, 10))]
    #[case(Some(0), Some(5), (0, 5))]
    #[case(Some(2), Some(1000), (100, 100))]
    fn page_window_is_one_based_and_capped(
        #[case] page: Option<u64>,
        #[case] limit: Option<u64>,
        #[case] expected: (u64, u64),
    ) {
        let filter = PurchaseOrderFilter {
            page,
            limit,
            ..Default::default()
        };
        assert_eq!(filter.page_window(), expected);
    }

    #[test]
    fn pending_preset_means_approved() {
        assert_eq!(
            PurchaseOrderFilter::pending().status,
            Some(PurchaseOrderStatus::Approved)
        );
    }

    #[test]
    fn update_money_detection() {
        assert!(!UpdatePurchaseOrderInput::default().touches_money());
        let input = UpdatePurchaseOrderInput {
            tax_amount: Some(dec!(1)),
            ..Default::default()
        };
        assert!(input.touches_money());
    }
}
