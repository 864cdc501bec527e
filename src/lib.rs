//! Procurement ledger
//!
//! Purchase-order lifecycle (create, approve, receive, cancel) on top of an append-only
//! inventory movement ledger with non-negative stock levels per product, variant and location.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod context;
pub mod db;
pub mod dto;
pub mod errors;
pub mod models;
pub mod queries;
pub mod repositories;
pub mod services;

pub use context::RequestContext;
pub use errors::ServiceError;
pub use services::{PurchaseOrderService, StockLedger};
