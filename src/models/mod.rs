// Core models
pub mod customer;
pub mod delivery;
pub mod order;
pub mod product;
pub mod supplier;

pub use customer::Client;
pub use delivery::{
    CarrierInfo, Delivery, DeliveryPatch, DeliveryStatus, DeliveryView, VirtualDelivery,
    DELIVERY_NUMBER_PREFIX,
};
pub use order::{Counterparty, Order, OrderLine, OrderStatus, OrderType};
pub use product::{Product, StockLevel};
pub use supplier::Supplier;
