pub mod cancel_order_command;
pub mod confirm_order_command;
pub mod create_order_command;
pub mod deliver_order_command;
pub mod process_order_command;
pub mod ship_order_command;

// Re-export commands for easier access
pub use cancel_order_command::CancelOrderCommand;
pub use confirm_order_command::ConfirmOrderCommand;
pub use create_order_command::CreateOrderCommand;
pub use deliver_order_command::DeliverOrderCommand;
pub use process_order_command::ProcessOrderCommand;
pub use ship_order_command::ShipOrderCommand;
