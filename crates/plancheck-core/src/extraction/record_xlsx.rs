use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use crate::error::QcError;
use crate::model::StructuredRecord;

/// Parse a project record exported as an xlsx workbook.
///
/// Reads the first worksheet. The header row is the first row holding both a
/// `Field` and a `Value` cell; data rows follow until the end of the sheet.
pub fn record_from_xlsx(bytes: &[u8]) -> Result<StructuredRecord, QcError> {
    let cursor = Cursor::new(bytes);
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
        .map_err(|e| QcError::RecordParse(format!("failed to open xlsx: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| QcError::RecordParse("workbook has no worksheets".into()))?;
    let sheet = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| QcError::RecordParse(format!("sheet '{sheet_name}' unreadable: {e}")))?;

    let mut rows = sheet.rows();
    let (field_idx, value_idx) = rows
        .by_ref()
        .find_map(header_columns)
        .ok_or_else(|| {
            QcError::RecordParse(format!(
                "sheet '{sheet_name}' has no header row with 'Field' and 'Value'"
            ))
        })?;

    let mut record = StructuredRecord::new();
    for row in rows {
        let field = row.get(field_idx).and_then(cell_as_string);
        let value = row.get(value_idx).and_then(cell_as_string);
        if let (Some(field), Some(value)) = (field, value) {
            record.insert_original(field, value);
        }
    }

    if record.is_empty() {
        return Err(QcError::RecordParse(format!(
            "no Field/Value rows found in sheet '{sheet_name}'"
        )));
    }

    tracing::debug!(fields = record.len(), sheet = %sheet_name, "loaded project record from xlsx");
    Ok(record)
}

fn header_columns(row: &[Data]) -> Option<(usize, usize)> {
    let position = |name: &str| {
        row.iter()
            .position(|c| cell_as_string(c).is_some_and(|s| s == name))
    };
    Some((position("Field")?, position("Value")?))
}

fn cell_as_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Float(f) => Some(format_float(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Empty | Data::Error(_) => None,
        _ => Some(format!("{cell}")),
    }
}

/// Render integral floats without a trailing ".0" so "24" stays "24".
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float_integral() {
        assert_eq!(format_float(24.0), "24");
        assert_eq!(format_float(9.84), "9.84");
    }

    #[test]
    fn test_header_columns() {
        let row = vec![
            Data::String("Notes".into()),
            Data::String(" Field ".into()),
            Data::String("Value".into()),
        ];
        assert_eq!(header_columns(&row), Some((1, 2)));
        assert_eq!(header_columns(&[Data::String("Field".into())]), None);
    }

    #[test]
    fn test_cell_as_string_skips_blank() {
        assert_eq!(cell_as_string(&Data::String("  ".into())), None);
        assert_eq!(cell_as_string(&Data::Empty), None);
        assert_eq!(cell_as_string(&Data::Int(7)).as_deref(), Some("7"));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = record_from_xlsx(b"not a workbook").unwrap_err();
        assert!(matches!(err, QcError::RecordParse(_)));
    }
}
