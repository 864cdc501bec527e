// Catalog
pub mod location_entity;
pub mod product_entity;
pub mod product_variant_entity;
pub mod store_entity;
pub mod supplier_entity;

// Purchasing
pub mod order_number_sequence_entity;
pub mod purchase_order_entity;
pub mod purchase_order_item_entity;

// Inventory ledger
pub mod inventory_movement_entity;
pub mod stock_level_entity;

pub use inventory_movement_entity::{MovementType, SourceOrderType};
pub use product_entity::ProductState;
pub use purchase_order_entity::PurchaseOrderStatus;
