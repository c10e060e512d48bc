use plancheck_core::error::QcError;
use plancheck_core::export;
use plancheck_core::markup;
use plancheck_core::extraction::pdftotext::PdftotextExtractor;
use plancheck_core::profile::builtin;
use plancheck_core::profile::schema::ProfileDef;
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(
    record_file: &Path,
    document_file: &Path,
    profile_file: Option<PathBuf>,
    preset: Option<String>,
    output_format: &str,
    export_dir: Option<PathBuf>,
    markup_file: Option<PathBuf>,
    show_all: bool,
) -> Result<(), QcError> {
    let profile = load_profile(profile_file, preset)?;

    let mut record = plancheck_core::read_record(record_file)?;
    let extractor = PdftotextExtractor::new();
    let doc = plancheck_core::read_document(document_file, &extractor)?;

    let report = plancheck_core::check_document(&mut record, &doc, &profile)?;

    if let Some(dir) = export_dir {
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("qc_results.csv"), export::verdicts_csv(&report)?)?;
        std::fs::write(dir.join("extracted_text.txt"), export::extracted_text(&doc))?;
        tracing::info!(dir = %dir.display(), "exported results");
    }

    if let Some(out) = markup_file {
        let is_pdf = document_file
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(QcError::UnsupportedInput(format!(
                "--markup needs a PDF plan set, got {}",
                document_file.display()
            )));
        }
        let marked = markup::highlight_mismatches(&std::fs::read(document_file)?, &report)?;
        std::fs::write(&out, marked.bytes)?;
        eprintln!("Marked-up PDF: {} ({} highlights)", out.display(), marked.highlights);
    }

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print(&report, &profile, show_all),
    }

    Ok(())
}

fn load_profile(file: Option<PathBuf>, preset: Option<String>) -> Result<ProfileDef, QcError> {
    match (file, preset) {
        (Some(path), _) => plancheck_core::profile::load_profile(&path),
        (None, Some(name)) => builtin::load_preset(&name),
        (None, None) => builtin::load_preset(builtin::DEFAULT_PRESET),
    }
}
