// Purchasing
pub mod order_locks;
pub mod order_numbers;
pub mod purchase_orders;

// Catalog
pub mod product_resolver;

// Inventory ledger
pub mod stock_ledger;

pub use purchase_orders::{OrderTotals, PurchaseOrderService};
pub use stock_ledger::{StockKey, StockLedger};
