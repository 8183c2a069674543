use crate::{errors::EngineError, events::EventSender, store::CommerceStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// This trait allows for encapsulating all the logic needed to execute a business operation
/// into a single object that can be validated, executed, and produce events.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `store` - Persistence backend for orders and deliveries
    /// * `event_sender` - Channel to publish domain events
    ///
    /// # Returns
    /// * `Result<Self::Result, EngineError>` - The result of command execution or an error
    async fn execute(
        &self,
        store: Arc<dyn CommerceStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, EngineError>;
}

pub mod orders;
