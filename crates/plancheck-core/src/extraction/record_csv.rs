use crate::error::QcError;
use crate::model::StructuredRecord;

/// Parse a two-column (`Field`, `Value`) CSV export into a record.
///
/// Header names are trimmed before lookup. Rows missing either cell are
/// dropped; both cells are trimmed.
pub fn record_from_csv(bytes: &[u8]) -> Result<StructuredRecord, QcError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, QcError> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            QcError::RecordParse(format!(
                "missing '{name}' column (found: {})",
                headers.join(", ")
            ))
        })
    };
    let field_idx = idx("Field")?;
    let value_idx = idx("Value")?;

    let mut record = StructuredRecord::new();
    let mut dropped = 0usize;
    for (row_no, row) in reader.records().enumerate() {
        let row = row.map_err(|e| QcError::RecordParse(format!("row {}: {e}", row_no + 2)))?;
        let field = row.get(field_idx).map(str::trim).unwrap_or("");
        let value = row.get(value_idx).map(str::trim).unwrap_or("");
        if field.is_empty() || value.is_empty() {
            dropped += 1;
            continue;
        }
        record.insert_original(field, value);
    }

    if record.is_empty() {
        return Err(QcError::RecordParse(
            "no Field/Value rows found in CSV".into(),
        ));
    }

    tracing::debug!(fields = record.len(), dropped, "loaded project record from CSV");
    Ok(record)
}
