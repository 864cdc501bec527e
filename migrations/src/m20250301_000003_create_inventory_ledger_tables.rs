use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_catalog_tables::{Locations, ProductVariants, Products};

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000003_create_inventory_ledger_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only. source_order_id carries no foreign key so history survives order removal.
        manager
            .create_table(
                Table::create()
                    .table(InventoryMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryMovements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryMovements::OrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryMovements::ProductId).big_integer().not_null())
                    .col(
                        ColumnDef::new(InventoryMovements::ProductVariantId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryMovements::FromLocationId).big_integer().null())
                    .col(ColumnDef::new(InventoryMovements::ToLocationId).big_integer().null())
                    .col(ColumnDef::new(InventoryMovements::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(InventoryMovements::MovementType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryMovements::SourceOrderType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryMovements::SourceOrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryMovements::Reason).string_len(255).null())
                    .col(
                        ColumnDef::new(InventoryMovements::CreatedByUserId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InventoryMovements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_movements_product_id")
                            .from(InventoryMovements::Table, InventoryMovements::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_movements_variant_id")
                            .from(InventoryMovements::Table, InventoryMovements::ProductVariantId)
                            .to(ProductVariants::Table, ProductVariants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_movements_source")
                    .table(InventoryMovements::Table)
                    .col(InventoryMovements::SourceOrderType)
                    .col(InventoryMovements::SourceOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockLevels::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StockLevels::ProductId).big_integer().not_null())
                    .col(ColumnDef::new(StockLevels::ProductVariantId).big_integer().null())
                    .col(ColumnDef::new(StockLevels::LocationId).big_integer().not_null())
                    .col(
                        ColumnDef::new(StockLevels::QuantityOnHand)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StockLevels::QuantityReserved)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StockLevels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockLevels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_levels_product_id")
                            .from(StockLevels::Table, StockLevels::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_levels_variant_id")
                            .from(StockLevels::Table, StockLevels::ProductVariantId)
                            .to(ProductVariants::Table, ProductVariants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_levels_location_id")
                            .from(StockLevels::Table, StockLevels::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique: the variant leg is nullable, so lookups go through a first-match query.
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_levels_key")
                    .table(StockLevels::Table)
                    .col(StockLevels::ProductId)
                    .col(StockLevels::ProductVariantId)
                    .col(StockLevels::LocationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockLevels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InventoryMovements {
    Table,
    Id,
    OrganizationId,
    ProductId,
    ProductVariantId,
    FromLocationId,
    ToLocationId,
    Quantity,
    MovementType,
    SourceOrderType,
    SourceOrderId,
    Reason,
    CreatedByUserId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum StockLevels {
    Table,
    Id,
    ProductId,
    ProductVariantId,
    LocationId,
    QuantityOnHand,
    QuantityReserved,
    CreatedAt,
    UpdatedAt,
}
