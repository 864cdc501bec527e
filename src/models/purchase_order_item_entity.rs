use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub purchase_order_id: i64,
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub quantity_ordered: i32,
    /// Only ever advanced by receipt, through an atomic increment.
    pub quantity_received: i32,
    pub unit_cost: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub batch_number: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn quantity_outstanding(&self) -> i32 {
        (self.quantity_ordered - self.quantity_received).max(0)
    }

    pub fn is_fully_received(&self) -> bool {
        self.quantity_received >= self.quantity_ordered
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order_entity::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order_entity::Column::Id",
        on_delete = "Cascade"
    )]
    PurchaseOrder,
    #[sea_orm(
        belongs_to = "super::product_entity::Entity",
        from = "Column::ProductId",
        to = "super::product_entity::Column::Id"
    )]
    Product,
}

impl Related<super::purchase_order_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::product_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
