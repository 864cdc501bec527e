use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Purchase order lifecycle: `draft -> approved -> received`, with `cancelled` reachable
/// from `draft` and `approved`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PurchaseOrderStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "received")]
    Received,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl PurchaseOrderStatus {
    /// `received` and `cancelled` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Received | Self::Cancelled)
    }
}

impl Default for PurchaseOrderStatus {
    fn default() -> Self {
        Self::Draft
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub organization_id: i64,
    #[sea_orm(unique)]
    pub order_number: String,
    pub supplier_id: i64,
    pub location_id: i64,
    pub status: PurchaseOrderStatus,
    pub internal_reference: Option<String>,
    pub supplier_reference: Option<String>,
    pub notes: Option<String>,
    pub subtotal_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub approved_date: Option<DateTime<Utc>>,
    pub cancelled_date: Option<DateTime<Utc>>,
    pub received_date: Option<DateTime<Utc>>,
    pub created_by_user_id: Option<i64>,
    pub approved_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier_entity::Entity",
        from = "Column::SupplierId",
        to = "super::supplier_entity::Column::Id"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::location_entity::Entity",
        from = "Column::LocationId",
        to = "super::location_entity::Column::Id"
    )]
    Location,
    #[sea_orm(has_many = "super::purchase_order_item_entity::Entity")]
    Item,
}

impl Related<super::supplier_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::location_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::purchase_order_item_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_its_string_form() {
        for status in [
            PurchaseOrderStatus::Draft,
            PurchaseOrderStatus::Approved,
            PurchaseOrderStatus::Received,
            PurchaseOrderStatus::Cancelled,
        ] {
            assert_eq!(PurchaseOrderStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert_eq!(
            PurchaseOrderStatus::from_str("APPROVED").unwrap(),
            PurchaseOrderStatus::Approved
        );
        assert!(PurchaseOrderStatus::from_str("pending").is_err());
    }

    #[test]
    fn only_received_and_cancelled_are_terminal() {
        assert!(!PurchaseOrderStatus::Draft.is_terminal());
        assert!(!PurchaseOrderStatus::Approved.is_terminal());
        assert!(PurchaseOrderStatus::Received.is_terminal());
        assert!(PurchaseOrderStatus::Cancelled.is_terminal());
    }
}
