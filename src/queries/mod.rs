pub mod purchase_order_queries;

pub use purchase_order_queries::{
    GetPurchaseOrderQuery, ListPendingPurchaseOrdersQuery, ListPurchaseOrdersQuery, Query,
};
