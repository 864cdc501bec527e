pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_catalog_tables;
mod m20250301_000002_create_purchase_order_tables;
mod m20250301_000003_create_inventory_ledger_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_catalog_tables::Migration),
            Box::new(m20250301_000002_create_purchase_order_tables::Migration),
            Box::new(m20250301_000003_create_inventory_ledger_tables::Migration),
        ]
    }
}
