use crate::error::QcError;
use crate::model::DocumentText;
use crate::reconcile::outcome::QcReport;

/// One delimited row per verdict: label, field key, value, status, explanation.
pub fn verdicts_csv(report: &QcReport) -> Result<String, QcError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Label", "Field", "Value", "Status", "Explanation"])?;
    for v in &report.verdicts {
        let status = v.status.to_string();
        writer.write_record([
            v.label.as_str(),
            v.key.as_str(),
            v.value.as_str(),
            status.as_str(),
            v.explanation.as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| QcError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| QcError::Extraction(e.to_string()))
}

/// Raw page texts with a `--- Page N ---` header before each page.
pub fn extracted_text(doc: &DocumentText) -> String {
    let mut out = String::new();
    for page in doc.pages() {
        out.push_str(&format!("--- Page {} ---\n", page.page_number));
        for line in &page.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
