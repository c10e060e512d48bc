use plancheck_core::error::QcError;
use plancheck_core::export;
use plancheck_core::extraction::pdftotext::PdftotextExtractor;
use plancheck_core::parsing::extract_document_values;
use plancheck_core::profile::builtin;
use serde_json::json;
use std::path::Path;

pub fn run(document_file: &Path, output_format: &str) -> Result<(), QcError> {
    let extractor = PdftotextExtractor::new();
    let doc = plancheck_core::read_document(document_file, &extractor)?;
    let profile = builtin::load_preset(builtin::DEFAULT_PRESET)?;
    let values = extract_document_values(&doc, "", &profile.supplementary_pages);

    match output_format {
        "json" => {
            let value = json!({
                "pages": doc.pages(),
                "values": values,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => {
            print!("{}", export::extracted_text(&doc));
            println!("--- Cover sheet values ---");
            let count = |c: &Option<plancheck_core::parsing::ExtractedCount>| {
                c.as_ref()
                    .map(|c| format!("{} (line {})", c.value, c.line.line_index + 1))
                    .unwrap_or_else(|| "not found".into())
            };
            println!("  Module quantity:   {}", count(&values.module_quantity));
            println!("  Inverter quantity: {}", count(&values.inverter_quantity));
        }
    }

    Ok(())
}
