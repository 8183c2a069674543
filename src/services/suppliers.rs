use crate::{errors::EngineError, models::Supplier, store::CommerceStore};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Service for supplier lookups and the pending purchase order counter.
#[derive(Clone)]
pub struct SupplierService {
    store: Arc<dyn CommerceStore>,
}

impl SupplierService {
    /// Creates a new supplier service instance
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// Fetches a supplier or fails with `NotFound`.
    #[instrument(skip(self))]
    pub async fn get_supplier(&self, supplier_id: Uuid) -> Result<Supplier, EngineError> {
        self.store
            .get_supplier(supplier_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Supplier {} not found", supplier_id)))
    }

    /// Bumps the supplier's pending purchase order counter and returns the
    /// updated record. Purchase order creation goes through the store
    /// directly; this entry point serves manual corrections.
    #[instrument(skip(self))]
    pub async fn increment_pending_orders(
        &self,
        supplier_id: Uuid,
    ) -> Result<Supplier, EngineError> {
        self.store
            .increment_supplier_pending_orders(supplier_id)
            .await?;
        let supplier = self.get_supplier(supplier_id).await?;
        info!(
            supplier_id = %supplier_id,
            pending = supplier.pending_orders_count,
            "Supplier pending orders incremented"
        );
        Ok(supplier)
    }
}
