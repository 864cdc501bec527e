pub mod purchase_orders;

pub use purchase_orders::{
    CreatePurchaseOrderInput, PurchaseOrderFilter, PurchaseOrderItemInput, ReceiptLineOutcome,
    ReceiptOutcome, ReceiveItemInput, UpdatePurchaseOrderInput,
};
