pub mod purchase_order_repository;

pub use purchase_order_repository::{
    PurchaseOrderDetails, PurchaseOrderLineDetails, PurchaseOrderRepository, ReceiptProgress,
};
