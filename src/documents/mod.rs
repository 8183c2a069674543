/*!
 * # Printable Documents
 *
 * Renders orders into self-contained HTML documents: invoices, purchase
 * orders and delivery notes. Rendering is pure and deterministic; the same
 * order and totals produce byte-identical markup, so the print path and the
 * PDF path can never disagree on an amount. Amounts are formatted at the
 * document scale (3 decimals, Dinar convention) and always taken verbatim
 * from the pricing output.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::IssuerConfig;
use crate::errors::EngineError;
use crate::models::{Order, OrderType};
use crate::money::{self, DOCUMENT_SCALE};
use crate::pricing::{compute_line_amounts, OrderTotals};

/// The printable document families.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    PurchaseOrder,
    DeliveryNote,
}

impl DocumentKind {
    /// French document title, printed as the heading.
    pub fn title(self) -> &'static str {
        match self {
            Self::Invoice => "FACTURE",
            Self::PurchaseOrder => "BON DE COMMANDE",
            Self::DeliveryNote => "BON DE LIVRAISON",
        }
    }

    /// Reference prefix put in front of the order number.
    pub fn reference_prefix(self) -> &'static str {
        match self {
            Self::Invoice => "FAC-",
            Self::PurchaseOrder => "BC-",
            Self::DeliveryNote => "BL-",
        }
    }

    /// Which order kind the document can be printed for. Invoices bill
    /// clients, purchase orders go to suppliers, delivery notes work for
    /// both directions.
    pub fn allows(self, order_type: OrderType) -> bool {
        match self {
            Self::Invoice => order_type == OrderType::Sale,
            Self::PurchaseOrder => order_type == OrderType::Purchase,
            Self::DeliveryNote => true,
        }
    }
}

/// Synthesized fiscal reference codes for a counterparty. Derived from the
/// counterparty id, memoized per renderer, never persisted.
#[derive(Clone, Debug, PartialEq)]
struct FiscalRefs {
    party_code: String,
    vat_code: String,
}

impl FiscalRefs {
    fn derive(order_type: OrderType, counterparty_id: Uuid) -> Self {
        let simple = counterparty_id.simple().to_string();
        let prefix = match order_type {
            OrderType::Sale => "CLI-",
            OrderType::Purchase => "FRS-",
        };
        let digits: String = simple.chars().filter(|c| c.is_ascii_digit()).take(7).collect();
        Self {
            party_code: format!("{}{}", prefix, simple[..6].to_uppercase()),
            vat_code: format!("{:0>7}/A/M/000", digits),
        }
    }
}

/// A rendered document: the markup plus the totals it displays.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub kind: DocumentKind,
    /// Document reference, prefix + order number (e.g. "FAC-BC2024-0042").
    pub reference: String,
    pub order_id: Uuid,
    pub html: String,
    pub totals: OrderTotals,
    pub generated_at: DateTime<Utc>,
}

/// Converts rendered documents into PDF bytes. The engine hands over the
/// exact markup it rendered; the conversion library is the host's choice.
#[async_trait]
pub trait DocumentExport: Send + Sync {
    async fn to_pdf(&self, document: &RenderedDocument) -> Result<Vec<u8>, anyhow::Error>;
}

/// Renders orders into printable HTML.
#[derive(Debug)]
pub struct DocumentRenderer {
    issuer: IssuerConfig,
    currency: String,
    fiscal_refs: DashMap<Uuid, FiscalRefs>,
}

impl DocumentRenderer {
    pub fn new(issuer: IssuerConfig, currency: String) -> Self {
        Self {
            issuer,
            currency,
            fiscal_refs: DashMap::new(),
        }
    }

    /// Renders `order` with the supplied totals. The renderer never derives
    /// arithmetic of its own: line values come from the pricing module and
    /// the totals block prints `totals` verbatim.
    pub fn render(
        &self,
        order: &Order,
        totals: &OrderTotals,
        kind: DocumentKind,
    ) -> Result<RenderedDocument, EngineError> {
        if !kind.allows(order.order_type) {
            return Err(EngineError::InvalidOperation(format!(
                "A {} cannot be printed for a {} order",
                kind.title(),
                order.order_type
            )));
        }

        let reference = format!("{}{}", kind.reference_prefix(), order.number);
        let refs = self.refs_for(order);

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>{} {}</title>\n",
            kind.title(),
            escape_html(&reference)
        ));
        html.push_str(
            "<style>\n\
             body { font-family: sans-serif; margin: 2em; color: #111; }\n\
             table.lines { width: 100%; border-collapse: collapse; margin-top: 1em; }\n\
             table.lines th, table.lines td { border: 1px solid #444; padding: 4px 8px; }\n\
             td.amount, th.amount { text-align: right; }\n\
             table.totals { margin-top: 1em; margin-left: auto; }\n\
             table.totals td { padding: 2px 8px; }\n\
             table.totals td.label { text-align: left; }\n\
             table.totals tr.payable td { font-weight: bold; border-top: 1px solid #444; }\n\
             @media print { body { margin: 0; } }\n\
             </style>\n</head>\n<body>\n",
        );

        self.push_header(&mut html, order, kind, &reference, &refs);
        self.push_line_table(&mut html, order)?;
        self.push_totals(&mut html, order, totals);

        html.push_str("</body>\n</html>\n");

        Ok(RenderedDocument {
            kind,
            reference,
            order_id: order.id,
            html,
            totals: totals.clone(),
            generated_at: Utc::now(),
        })
    }

    fn refs_for(&self, order: &Order) -> FiscalRefs {
        self.fiscal_refs
            .entry(order.counterparty.id)
            .or_insert_with(|| FiscalRefs::derive(order.order_type, order.counterparty.id))
            .clone()
    }

    fn push_header(
        &self,
        html: &mut String,
        order: &Order,
        kind: DocumentKind,
        reference: &str,
        refs: &FiscalRefs,
    ) {
        html.push_str("<div class=\"issuer\">\n");
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&self.issuer.name)));
        html.push_str(&format!("<p>{}<br>\n", escape_html(&self.issuer.address)));
        html.push_str(&format!(
            "T&eacute;l : {}<br>\n{}<br>\nMF : {}</p>\n",
            escape_html(&self.issuer.phone),
            escape_html(&self.issuer.email),
            escape_html(&self.issuer.tax_id)
        ));
        html.push_str("</div>\n");

        html.push_str(&format!(
            "<h1>{}</h1>\n<p class=\"reference\">{}<br>\nDate : {}</p>\n",
            kind.title(),
            escape_html(reference),
            order.order_date.format("%d/%m/%Y")
        ));

        let party_label = match order.order_type {
            OrderType::Sale => "Client",
            OrderType::Purchase => "Fournisseur",
        };
        html.push_str(&format!(
            "<div class=\"counterparty\">\n<p><strong>{}</strong> : {}<br>\n",
            party_label,
            escape_html(&order.counterparty.name)
        ));
        if let Some(address) = &order.counterparty.address {
            html.push_str(&format!("{}<br>\n", escape_html(address)));
        }
        html.push_str(&format!(
            "Code : {}<br>\nMF : {}</p>\n</div>\n",
            escape_html(&refs.party_code),
            escape_html(&refs.vat_code)
        ));
    }

    fn push_line_table(&self, html: &mut String, order: &Order) -> Result<(), EngineError> {
        html.push_str(
            "<table class=\"lines\">\n<thead>\n<tr>\
             <th>R&eacute;f&eacute;rence</th>\
             <th>D&eacute;signation</th>\
             <th class=\"amount\">Qt&eacute;</th>\
             <th class=\"amount\">P.U. HT</th>\
             <th class=\"amount\">Remise %</th>\
             <th class=\"amount\">Montant HT</th>\
             <th class=\"amount\">TVA %</th>\
             <th class=\"amount\">Montant TVA</th>\
             <th class=\"amount\">Montant TTC</th>\
             </tr>\n</thead>\n<tbody>\n",
        );

        for line in &order.lines {
            let amounts = compute_line_amounts(line)?;
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td>\
                 <td class=\"amount\">{}</td>\
                 <td class=\"amount\">{}</td>\
                 <td class=\"amount\">{}</td>\
                 <td class=\"amount\">{}</td>\
                 <td class=\"amount\">{}</td>\
                 <td class=\"amount\">{}</td>\
                 <td class=\"amount\">{}</td></tr>\n",
                escape_html(&line.product_ref),
                escape_html(&line.designation),
                line.quantity,
                money::format_amount(line.unit_price, DOCUMENT_SCALE),
                money::format_amount(line.discount_percent, 2),
                money::format_amount(amounts.net_amount, DOCUMENT_SCALE),
                money::format_amount(line.vat_percent, 2),
                money::format_amount(amounts.vat_amount, DOCUMENT_SCALE),
                money::format_amount(amounts.total_amount, DOCUMENT_SCALE),
            ));
        }

        html.push_str("</tbody>\n</table>\n");
        Ok(())
    }

    fn push_totals(&self, html: &mut String, order: &Order, totals: &OrderTotals) {
        html.push_str("<table class=\"totals\">\n");
        html.push_str(&format!(
            "<tr><td class=\"label\">Total brut HT</td><td class=\"amount\">{}</td></tr>\n",
            money::format_amount(totals.total_gross, DOCUMENT_SCALE)
        ));
        html.push_str(&format!(
            "<tr><td class=\"label\">Remises lignes</td><td class=\"amount\">{}</td></tr>\n",
            money::format_amount(totals.total_line_discounts, DOCUMENT_SCALE)
        ));
        html.push_str(&format!(
            "<tr><td class=\"label\">Remise globale ({} %)</td><td class=\"amount\">{}</td></tr>\n",
            money::format_amount(order.global_discount_percent, 2),
            money::format_amount(totals.global_discount_amount, DOCUMENT_SCALE)
        ));
        html.push_str(&format!(
            "<tr><td class=\"label\">Total net HT</td><td class=\"amount\">{}</td></tr>\n",
            money::format_amount(totals.total_net, DOCUMENT_SCALE)
        ));
        html.push_str(&format!(
            "<tr><td class=\"label\">Total TVA</td><td class=\"amount\">{}</td></tr>\n",
            money::format_amount(totals.total_vat, DOCUMENT_SCALE)
        ));
        html.push_str(&format!(
            "<tr class=\"payable\"><td class=\"label\">Net &agrave; payer</td>\
             <td class=\"amount\">{} {}</td></tr>\n",
            money::format_amount(totals.net_payable, DOCUMENT_SCALE),
            escape_html(&self.currency)
        ));
        html.push_str("</table>\n");
    }
}

/// Escapes the five HTML-significant characters.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
