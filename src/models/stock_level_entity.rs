use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Running stock totals for a `(product, variant?, location)` key.
///
/// Availability is not persisted; see [`Model::quantity_available`]. Rows are written only by
/// [`crate::services::stock_ledger::StockLedger`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_levels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub location_id: i64,
    pub quantity_on_hand: i32,
    pub quantity_reserved: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn quantity_available(&self) -> i32 {
        (self.quantity_on_hand - self.quantity_reserved).max(0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_entity::Entity",
        from = "Column::ProductId",
        to = "super::product_entity::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::location_entity::Entity",
        from = "Column::LocationId",
        to = "super::location_entity::Column::Id"
    )]
    Location,
}

impl Related<super::product_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::location_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
