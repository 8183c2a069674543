use crate::{
    documents::{DocumentExport, DocumentKind, DocumentRenderer, RenderedDocument},
    errors::EngineError,
    store::CommerceStore,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Service for generating printable documents from orders. Totals are
/// always recomputed from the lines before rendering; the stored snapshot
/// is never trusted for a printed amount.
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn CommerceStore>,
    renderer: Arc<DocumentRenderer>,
    exporter: Option<Arc<dyn DocumentExport>>,
}

impl DocumentService {
    /// Creates a new document service instance
    pub fn new(store: Arc<dyn CommerceStore>, renderer: Arc<DocumentRenderer>) -> Self {
        Self {
            store,
            renderer,
            exporter: None,
        }
    }

    /// Attaches a PDF export collaborator.
    pub fn with_exporter(mut self, exporter: Arc<dyn DocumentExport>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Renders a document for the order.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        order_id: Uuid,
        kind: DocumentKind,
    ) -> Result<RenderedDocument, EngineError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Order {} not found", order_id)))?;

        let totals = order.compute_totals()?;
        let document = self.renderer.render(&order, &totals, kind)?;

        info!(
            order_id = %order_id,
            reference = %document.reference,
            "Document generated"
        );
        Ok(document)
    }

    /// Renders a document and hands the exact markup to the export
    /// collaborator, returning the PDF bytes.
    #[instrument(skip(self))]
    pub async fn generate_pdf(
        &self,
        order_id: Uuid,
        kind: DocumentKind,
    ) -> Result<Vec<u8>, EngineError> {
        let exporter = self.exporter.as_ref().ok_or_else(|| {
            EngineError::InvalidOperation("No document exporter configured".to_string())
        })?;

        let document = self.generate(order_id, kind).await?;

        exporter.to_pdf(&document).await.map_err(|e| {
            EngineError::ExternalServiceError(format!(
                "PDF export failed for {}: {}",
                document.reference, e
            ))
        })
    }
}
