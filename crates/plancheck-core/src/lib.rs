pub mod error;
pub mod export;
pub mod extraction;
pub mod markup;
pub mod model;
pub mod parsing;
pub mod profile;
pub mod reconcile;

use std::collections::HashMap;
use std::path::Path;

use error::QcError;
use extraction::{pages_from_text, PdfExtractor};
use model::{DocumentText, StructuredRecord};
use parsing::address::compile_address;
use parsing::extract_document_values;
use profile::schema::ProfileDef;
use reconcile::context::DocumentContext;
use reconcile::{check_derived, QcReport, Reconciler, Summary};

/// Main API entry point: reconcile a plan set PDF against a project record.
pub fn check_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    record: &mut StructuredRecord,
    profile: &ProfileDef,
) -> Result<QcReport, QcError> {
    let doc = load_document(pdf_bytes, extractor)?;
    check_document(record, &doc, profile)
}

/// Extract page-indexed text from a PDF.
pub fn load_document(pdf_bytes: &[u8], extractor: &dyn PdfExtractor) -> Result<DocumentText, QcError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    tracing::debug!(backend = extractor.backend_name(), pages = pages.len(), "document extracted");
    Ok(DocumentText::new(pages))
}

/// Read a plan set from disk: `.pdf` through `extractor`, `.txt` as a
/// form-feed separated text dump.
pub fn read_document(path: &Path, extractor: &dyn PdfExtractor) -> Result<DocumentText, QcError> {
    match extension(path).as_str() {
        "pdf" => load_document(&std::fs::read(path)?, extractor),
        "txt" => Ok(DocumentText::new(pages_from_text(&std::fs::read_to_string(path)?))),
        _ => Err(QcError::UnsupportedInput(format!(
            "{} (expected .pdf or .txt)",
            path.display()
        ))),
    }
}

/// Read a project record export: `.csv` or `.xlsx`.
pub fn read_record(path: &Path) -> Result<StructuredRecord, QcError> {
    let bytes = std::fs::read(path)?;
    match extension(path).as_str() {
        "csv" => extraction::record_csv::record_from_csv(&bytes),
        "xlsx" => extraction::record_xlsx::record_from_xlsx(&bytes),
        _ => Err(QcError::UnsupportedInput(format!(
            "{} (expected .csv or .xlsx)",
            path.display()
        ))),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Run one reconciliation: compile addresses into the record, extract
/// cover-sheet values, produce one verdict per profile field, then compute
/// the derived metrics and write them back into the record.
pub fn check_document(
    record: &mut StructuredRecord,
    doc: &DocumentText,
    profile: &ProfileDef,
) -> Result<QcReport, QcError> {
    if record.is_empty() {
        return Err(QcError::RecordParse("project record has no fields".into()));
    }
    if doc.page_count() == 0 || doc.is_blank() {
        return Err(QcError::EmptyDocument);
    }

    tracing::info!(
        profile = %profile.name,
        fields = record.len(),
        pages = doc.page_count(),
        "starting reconciliation"
    );

    let mut addresses = HashMap::new();
    for def in &profile.addresses {
        let (compiled, parts) = compile_address(record, &def.fields);
        if record.insert_derived(&def.target_key, compiled) {
            addresses.insert(def.target_key.clone(), parts);
        }
    }

    let extracted = extract_document_values(
        doc,
        record.value(&profile.contractor_key),
        &profile.supplementary_pages,
    );

    let ctx = DocumentContext::new(
        doc,
        extracted,
        addresses,
        profile.address_mode,
    );
    let verdicts = Reconciler::new(profile).run(record, &ctx);

    let derived = check_derived(record, doc, &profile.derived);
    for (key, value) in derived.record_entries() {
        record.insert_derived(key, value);
    }

    let summary = Summary::from_verdicts(&verdicts);
    tracing::info!(
        matched = summary.matched,
        mismatched = summary.mismatched,
        missing = summary.missing,
        "reconciliation finished"
    );

    Ok(QcReport {
        profile_name: profile.name.clone(),
        page_count: doc.page_count(),
        verdicts,
        derived,
        summary,
    })
}
