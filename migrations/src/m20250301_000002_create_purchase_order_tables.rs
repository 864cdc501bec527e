use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_catalog_tables::{
    Locations, ProductVariants, Products, Suppliers,
};

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000002_create_purchase_order_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::OrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::OrderNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::SupplierId).big_integer().not_null())
                    .col(ColumnDef::new(PurchaseOrders::LocationId).big_integer().not_null())
                    .col(ColumnDef::new(PurchaseOrders::Status).string_len(32).not_null())
                    .col(ColumnDef::new(PurchaseOrders::InternalReference).string_len(255).null())
                    .col(ColumnDef::new(PurchaseOrders::SupplierReference).string_len(255).null())
                    .col(ColumnDef::new(PurchaseOrders::Notes).text().null())
                    .col(
                        ColumnDef::new(PurchaseOrders::SubtotalAmount)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::DiscountAmount)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::TaxAmount)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::ShippingCost)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::TotalAmount)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::OrderDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::ExpectedDeliveryDate)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::ApprovedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::CancelledDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::ReceivedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::CreatedByUserId).big_integer().null())
                    .col(ColumnDef::new(PurchaseOrders::ApprovedByUserId).big_integer().null())
                    .col(
                        ColumnDef::new(PurchaseOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_supplier_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_location_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_orders_org_status")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::OrganizationId)
                    .col(PurchaseOrders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_orders_order_date")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::OrderDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrderItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::PurchaseOrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::ProductVariantId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::QuantityOrdered)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::QuantityReceived)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::UnitCost)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::DiscountAmount)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::TaxAmount)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PurchaseOrderItems::BatchNumber).string_len(100).null())
                    .col(ColumnDef::new(PurchaseOrderItems::ManufacturingDate).date().null())
                    .col(ColumnDef::new(PurchaseOrderItems::ExpirationDate).date().null())
                    .col(ColumnDef::new(PurchaseOrderItems::Notes).text().null())
                    .col(
                        ColumnDef::new(PurchaseOrderItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_items_order_id")
                            .from(PurchaseOrderItems::Table, PurchaseOrderItems::PurchaseOrderId)
                            .to(PurchaseOrders::Table, PurchaseOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_items_product_id")
                            .from(PurchaseOrderItems::Table, PurchaseOrderItems::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_items_variant_id")
                            .from(PurchaseOrderItems::Table, PurchaseOrderItems::ProductVariantId)
                            .to(ProductVariants::Table, ProductVariants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_order_items_order_id")
                    .table(PurchaseOrderItems::Table)
                    .col(PurchaseOrderItems::PurchaseOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderNumberSequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderNumberSequences::Day)
                            .string_len(8)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderNumberSequences::LastValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderNumberSequences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PurchaseOrders {
    Table,
    Id,
    OrganizationId,
    OrderNumber,
    SupplierId,
    LocationId,
    Status,
    InternalReference,
    SupplierReference,
    Notes,
    SubtotalAmount,
    DiscountAmount,
    TaxAmount,
    ShippingCost,
    TotalAmount,
    OrderDate,
    ExpectedDeliveryDate,
    ApprovedDate,
    CancelledDate,
    ReceivedDate,
    CreatedByUserId,
    ApprovedByUserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum PurchaseOrderItems {
    Table,
    Id,
    PurchaseOrderId,
    ProductId,
    ProductVariantId,
    QuantityOrdered,
    QuantityReceived,
    UnitCost,
    DiscountAmount,
    TaxAmount,
    BatchNumber,
    ManufacturingDate,
    ExpirationDate,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum OrderNumberSequences {
    Table,
    Day,
    LastValue,
}
