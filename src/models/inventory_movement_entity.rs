use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Direction of a movement. Quantities are always positive.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MovementType {
    #[sea_orm(string_value = "stock_in")]
    StockIn,
    #[sea_orm(string_value = "stock_out")]
    StockOut,
}

impl MovementType {
    /// Sign applied to the stock level for a movement of this type.
    pub fn signed(self, quantity: i32) -> i32 {
        match self {
            Self::StockIn => quantity,
            Self::StockOut => -quantity,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceOrderType {
    #[sea_orm(string_value = "purchase")]
    Purchase,
}

/// Immutable audit record of a stock change. Rows are inserted, never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub organization_id: i64,
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub from_location_id: Option<i64>,
    pub to_location_id: Option<i64>,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub source_order_type: SourceOrderType,
    pub source_order_id: i64,
    pub reason: Option<String>,
    pub created_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// The location whose stock level this movement changed.
    pub fn location_id(&self) -> Option<i64> {
        match self.movement_type {
            MovementType::StockIn => self.to_location_id,
            MovementType::StockOut => self.from_location_id,
        }
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
}

impl Related<super::product_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
