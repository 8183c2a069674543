//! Commercial order engine
//!
//! This crate provides the financial computation and fulfillment lifecycle
//! for commercial orders: exact decimal pricing of lines and totals, the
//! order and delivery status machines, virtual delivery projections, and
//! printable document rendering. Persistence and PDF conversion stay behind
//! traits so the hosting application chooses its own backends.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod documents;
pub mod errors;
pub mod events;
pub mod models;
pub mod money;
pub mod pricing;
pub mod services;
pub mod store;

pub use errors::{EngineError, StoreError};

/// Commonly used types, one `use` away.
pub mod prelude {
    pub use crate::config::{EngineConfig, IssuerConfig};
    pub use crate::documents::{DocumentExport, DocumentKind, DocumentRenderer, RenderedDocument};
    pub use crate::errors::{EngineError, StoreError};
    pub use crate::events::{event_channel, Event, EventSender};
    pub use crate::models::{
        CarrierInfo, Client, Counterparty, Delivery, DeliveryPatch, DeliveryStatus, DeliveryView,
        Order, OrderLine, OrderStatus, OrderType, Product, StockLevel, Supplier, VirtualDelivery,
    };
    pub use crate::pricing::{compute_line_amounts, compute_order_totals, LineAmounts, OrderTotals};
    pub use crate::services::{
        DeliveryService, DocumentService, OrderService, Services, SupplierService,
    };
    pub use crate::store::{CommerceStore, InMemoryStore, OrderFilter, ProductCatalog};
}
