use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use time::macros::format_description;
use time::Date;
use tracing::info;

use crate::storage::{certificate_pdf_key, StorageClient};

const ISSUER_NAME: &str = "CertiSphere";

/// Fields printed on a completed certificate.
#[derive(Debug, Clone)]
pub struct RenderInput {
    pub certificate_id: i64,
    pub business_name: Option<String>,
    pub certificate_name: Option<String>,
    pub certificate_type: Option<String>,
    pub certificate_reference: Option<String>,
    pub issued_on: Date,
}

#[async_trait]
pub trait CertificateRenderer: Send + Sync {
    /// Produce the artifact and return the storage key it was written to.
    async fn render(&self, input: RenderInput) -> anyhow::Result<String>;
}

/// Writes a single-page PDF into the document store.
pub struct PdfRenderer {
    storage: Arc<dyn StorageClient>,
}

impl PdfRenderer {
    pub fn new(storage: Arc<dyn StorageClient>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl CertificateRenderer for PdfRenderer {
    async fn render(&self, input: RenderInput) -> anyhow::Result<String> {
        let key = certificate_pdf_key(input.certificate_id);
        let pdf = build_pdf(&certificate_lines(&input)?)?;
        self.storage
            .put_object(&key, Bytes::from(pdf), "application/pdf")
            .await
            .with_context(|| format!("store rendered certificate {}", input.certificate_id))?;
        info!(certificate_id = input.certificate_id, %key, "certificate rendered");
        Ok(key)
    }
}

fn type_statement(certificate_type: Option<&str>) -> &'static str {
    match certificate_type {
        Some("Structural Engineering Certificate") => {
            "The structural design and calculations were audited and found compliant."
        }
        Some("Geotechnical Engineering Certificate") => {
            "The geotechnical investigation and soil evaluation were audited and found compliant."
        }
        Some("Transportation Engineering Certificate") => {
            "The transportation design and safety analysis were audited and found compliant."
        }
        _ => "This certificate is issued after a civil engineering audit of the submitted documentation.",
    }
}

fn certificate_lines(input: &RenderInput) -> anyhow::Result<Vec<String>> {
    let issued = input
        .issued_on
        .format(format_description!("[year]-[month]-[day]"))
        .context("format issuance date")?;
    Ok(vec![
        "Certificate of Audit".to_string(),
        String::new(),
        format!("Organization: {}", input.business_name.as_deref().unwrap_or("N/A")),
        format!(
            "Certificate Title: {}",
            input.certificate_name.as_deref().unwrap_or("Untitled")
        ),
        format!(
            "Certificate Type: {}",
            input.certificate_type.as_deref().unwrap_or("N/A")
        ),
        format!(
            "Certificate Reference #: {}",
            input.certificate_reference.as_deref().unwrap_or("N/A")
        ),
        format!("Date of Issuance: {}", issued),
        String::new(),
        type_statement(input.certificate_type.as_deref()).to_string(),
        String::new(),
        format!("Certified by {}", ISSUER_NAME),
    ])
}

/// Single A4 page, one Helvetica line per entry.
fn build_pdf(lines: &[String]) -> anyhow::Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new("Certificate of Audit", Mm(210.0), Mm(297.0), "certificate");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("load builtin font: {e:?}"))?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut y = 270.0;
    for line in lines {
        if !line.is_empty() {
            layer.use_text(line.as_str(), 12.0, Mm(25.0), Mm(y), &font);
        }
        y -= 7.0;
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow::anyhow!("serialize pdf: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn input() -> RenderInput {
        RenderInput {
            certificate_id: 9,
            business_name: Some("Acme (Holdings)".into()),
            certificate_name: None,
            certificate_type: Some("Structural Engineering Certificate".into()),
            certificate_reference: Some("CS#2025009".into()),
            issued_on: date!(2025 - 03 - 04),
        }
    }

    #[test]
    fn lines_fall_back_for_missing_fields() {
        let lines = certificate_lines(&input()).unwrap();
        assert!(lines.contains(&"Certificate Title: Untitled".to_string()));
        assert!(lines.contains(&"Date of Issuance: 2025-03-04".to_string()));
        assert!(lines.contains(&"Certificate Reference #: CS#2025009".to_string()));
    }

    #[test]
    fn pdf_is_a_complete_document() {
        let mut lines = certificate_lines(&input()).unwrap();
        lines.push("Organization: Société Générale".into());
        let pdf = build_pdf(&lines).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        let tail = String::from_utf8_lossy(&pdf[pdf.len().saturating_sub(32)..]).into_owned();
        assert!(tail.contains("%%EOF"));
    }
}
