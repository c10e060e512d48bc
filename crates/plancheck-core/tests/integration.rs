//! Integration tests for the check_pdf() end-to-end pipeline.
//!
//! Uses a MockExtractor that returns pre-built PageContent without
//! invoking pdftotext, so these tests run without poppler-utils.

use plancheck_core::check_pdf;
use plancheck_core::error::QcError;
use plancheck_core::export::verdicts_csv;
use plancheck_core::extraction::{BBox, LineSpan, PageContent, PdfExtractor};
use plancheck_core::markup::highlight_mismatches;
use plancheck_core::model::{StructuredRecord, DERIVED_DC_SIZE_KW, DERIVED_MODULE_WATTAGE};
use plancheck_core::profile::builtin::load_preset;
use plancheck_core::profile::parse_profile_str;
use plancheck_core::reconcile::derived::{DC_SIZE_CHECK, TESLA_IMP_CHECK};
use plancheck_core::reconcile::{CheckStatus, QcReport, Status, Verdict};
use rust_decimal_macros::dec;

struct MockExtractor {
    pages: Vec<PageContent>,
}

impl PdfExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageContent>, QcError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn page(number: usize, lines: &[&str]) -> PageContent {
    PageContent {
        page_number: number,
        lines: lines.iter().map(|s| s.to_string()).collect(),
        line_spans: vec![],
    }
}

const COVER: &[&str] = &[
    "SUNNY SOLAR INC",
    "1400 ORANGETHORPE AVE, FULLERTON, CA 92831",
    "(714) 555-0132   LIC# 998877",
    "",
    "PROJECT ADDRESS:",
    "123 MAIN ST",
    "ANAHEIM, CA 92805",
    "",
    "AHJ: CITY OF ANAHEIM",
    "UTILITY: ANAHEIM PUBLIC UTILITIES",
    "CODES: 2022 CBC, 2023 NEC",
    "",
    "EQUIPMENT SUMMARY",
    "MODULE:",
    "(24) XYZ SOLAR XYZ-410W",
    "INVERTER:",
    "(1) TESLA POWERWALL 3",
    "SYSTEM DC SIZE: 9.840 KW",
];

const STRUCTURAL: &[&str] = &[
    "STRUCTURAL ATTACHMENT PLAN",
    "RACKING:",
    "IronRidge XR100",
    "ATTACHMENT:",
    "QuickMount PV QBase",
    "ROOF SURFACE TYPE: COMPOSITE SHINGLE",
    "RAFTER: 2\" X 6\" @ 24\" O.C.",
];

const DATASHEET: &[&str] = &[
    "MODULE ELECTRICAL DATA",
    "VOC",
    "49.6",
    "IMP",
    "",
    "12.9A",
];

fn plan_set(datasheet: &[&str]) -> MockExtractor {
    MockExtractor {
        pages: vec![
            page(1, COVER),
            page(2, &["SITE PLAN", "N"]),
            page(3, STRUCTURAL),
            page(4, datasheet),
        ],
    }
}

fn full_record() -> StructuredRecord {
    StructuredRecord::from_pairs([
        ("Engineering_Project__c.Customer__r.Name", "Sunny Solar, Inc."),
        ("Engineering_Project__c.Customer__r.Phone", "714-555-0132"),
        ("Engineering_Project__c.Customer__r.GRDS_Customer_Address_Line_1__c", "1400 Orangethorpe Ave"),
        ("Engineering_Project__c.Customer__r.GRDS_Customer_Address_City__c", "Fullerton"),
        ("Engineering_Project__c.Customer__r.GRDS_Customer_Address_State__c", "CA"),
        ("Engineering_Project__c.Customer__r.GRDS_Customer_Address_Zip__c", "92831"),
        ("Engineering_Project__c.Customer__r.License_Number__c", "998877"),
        ("Engineering_Project__c.Installation_Street_Address_1__c", "123 Main St"),
        ("Engineering_Project__c.Installation_City__c", "Anaheim"),
        ("Engineering_Project__c.Installation_State__c", "California"),
        ("Engineering_Project__c.Installation_Zip_Code__c", "92805"),
        ("Engineering_Project__c.AHJ__c", "City of Anaheim"),
        ("Engineering_Project__c.Utility__c", "Anaheim Public Utilities"),
        ("Engineering_Project__c.Roofing_Material__c", "Asphalt/Composite Shingle"),
        ("Engineering_Project__c.Building_Code__c", "2022 CBC"),
        ("Engineering_Project__c.Electrical_Code__c", "2023 NEC"),
        ("Engineering_Project__c.Rafter_Truss_Size__c", "2x6"),
        ("Engineering_Project__c.Rafter_Truss_Spacing__c", "24\""),
        ("Engineering_Project__c.Module_Manufacturer__c", "XYZ Solar"),
        ("Engineering_Project__c.Module_Part_Number__c", "XYZ-410W"),
        ("Engineering_Project__c.Module_Quantity__c", "24"),
        ("Engineering_Project__c.Inverter_Manufacturer__c", "Tesla"),
        ("Engineering_Project__c.Inverter_Part_Number__c", "Powerwall 3"),
        ("Engineering_Project__c.Inverter_Quantity__c", "1"),
        ("Engineering_Project__c.Racking_Manufacturer__c", "iridg"),
        ("Engineering_Project__c.Racking_Model__c", "XR100"),
        ("Engineering_Project__c.Attachment_Manufacturer__c", "QMPV"),
        ("Engineering_Project__c.Attachment_Model__c", "QBase"),
    ])
}

fn verdict<'a>(report: &'a QcReport, label: &str) -> &'a Verdict {
    report
        .verdicts
        .iter()
        .find(|v| v.label == label)
        .unwrap_or_else(|| panic!("no verdict for {label}"))
}

fn record_with(key: &str, value: &str) -> StructuredRecord {
    let mut pairs: Vec<(String, String)> = full_record()
        .iter()
        .filter(|(k, _)| *k != key)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    pairs.push((key.to_string(), value.to_string()));
    StructuredRecord::from_pairs(pairs)
}

// ---------------------------------------------------------------------------
// Test 1: A consistent record and plan set match on every field
// ---------------------------------------------------------------------------
#[test]
fn consistent_plan_set_all_match() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    assert_eq!(report.verdicts.len(), profile.fields.len());
    for v in &report.verdicts {
        assert_eq!(v.status, Status::Match, "{}: {}", v.label, v.explanation);
    }
    assert_eq!(report.summary.matched, profile.fields.len());
    assert_eq!(report.summary.mismatched, 0);
    assert_eq!(report.summary.missing, 0);
    assert_eq!(report.page_count, 4);
}

// ---------------------------------------------------------------------------
// Test 2: Quantities compare as integers
// ---------------------------------------------------------------------------
#[test]
fn quantity_leading_zeros_match() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = record_with("Engineering_Project__c.Inverter_Quantity__c", "001");

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    assert_eq!(verdict(&report, "Inverter Quantity").status, Status::Match);
}

#[test]
fn quantity_mismatch_reports_document_value() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = record_with("Engineering_Project__c.Module_Quantity__c", "25");

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    let v = verdict(&report, "Module Quantity");
    assert_eq!(v.status, Status::Mismatch { found: Some("24".into()) });
    assert_eq!(v.evidence.len(), 1);
    assert_eq!(v.evidence[0].page_number, 1);
    assert!(v.evidence[0].text.contains("(24)"));
}

#[test]
fn quantity_evidence_carries_bbox() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();
    let mut extractor = plan_set(DATASHEET);
    extractor.pages[0].line_spans = vec![LineSpan {
        page_number: 1,
        line_index: 14,
        text: "(24) XYZ SOLAR XYZ-410W".into(),
        bbox: BBox {
            x_min: 40.0,
            y_min: 500.0,
            x_max: 260.0,
            y_max: 512.0,
        },
    }];

    let report = check_pdf(&[], &extractor, &mut record, &profile).unwrap();

    let evidence = &verdict(&report, "Module Quantity").evidence[0];
    assert_eq!(evidence.line_index, 14);
    assert_eq!(evidence.bbox.as_ref().map(|b| b.x_max), Some(260.0));
}

fn one_page_pdf() -> Vec<u8> {
    use lopdf::{dictionary, Document, Object};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0), Object::Integer(0),
            Object::Integer(1224), Object::Integer(792),
        ],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[test]
fn quantity_mismatch_highlighted_in_marked_up_pdf() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = record_with("Engineering_Project__c.Module_Quantity__c", "25");
    let mut extractor = plan_set(DATASHEET);
    extractor.pages[0].line_spans = vec![LineSpan {
        page_number: 1,
        line_index: 14,
        text: "(24) XYZ SOLAR XYZ-410W".into(),
        bbox: BBox {
            x_min: 40.0,
            y_min: 500.0,
            x_max: 260.0,
            y_max: 512.0,
        },
    }];
    let pdf = one_page_pdf();

    let report = check_pdf(&pdf, &extractor, &mut record, &profile).unwrap();
    let marked = highlight_mismatches(&pdf, &report).unwrap();
    assert_eq!(marked.highlights, 1);

    let doc = lopdf::Document::load_mem(&marked.bytes).unwrap();
    let page_id = doc.get_pages()[&1];
    let annots = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Annots")
        .unwrap()
        .as_array()
        .unwrap();
    assert_eq!(annots.len(), 1);
    let annot = doc.get_dictionary(annots[0].as_reference().unwrap()).unwrap();
    let contents = annot.get(b"Contents").unwrap().as_str().unwrap();
    assert!(String::from_utf8_lossy(contents).starts_with("Module Quantity mismatch"));
}

#[test]
fn consistent_plan_set_has_nothing_to_highlight() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();
    let pdf = one_page_pdf();

    let report = check_pdf(&pdf, &plan_set(DATASHEET), &mut record, &profile).unwrap();
    assert_eq!(highlight_mismatches(&pdf, &report).unwrap().highlights, 0);
}

// ---------------------------------------------------------------------------
// Test 3: Missing input short-circuits document lookup
// ---------------------------------------------------------------------------
#[test]
fn empty_record_value_is_missing_in_input() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = record_with("Engineering_Project__c.AHJ__c", "");

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    assert_eq!(verdict(&report, "AHJ").status, Status::MissingInInput);
    assert_eq!(report.summary.missing, 1);
}

#[test]
fn absent_address_parts_are_missing_in_input() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = StructuredRecord::from_pairs([("Engineering_Project__c.Module_Quantity__c", "24")]);

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    assert_eq!(verdict(&report, "Project Address").status, Status::MissingInInput);
    assert_eq!(verdict(&report, "Module Quantity").status, Status::Match);
    assert_eq!(report.summary.matched, 1);
}

// ---------------------------------------------------------------------------
// Test 4: Alias, roofing and address rules through the full pipeline
// ---------------------------------------------------------------------------
#[test]
fn racking_alias_resolves() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    let v = verdict(&report, "Racking Manufacturer");
    assert_eq!(v.value, "iridg");
    assert_eq!(v.status, Status::Match);
    assert_eq!(v.strategy, "aliased");
}

#[test]
fn roofing_unknown_material_mismatch() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = record_with("Engineering_Project__c.Roofing_Material__c", "Standing Seam Metal");

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    assert_eq!(
        verdict(&report, "Roofing Material").status,
        Status::Mismatch {
            found: Some("COMPOSITE SHINGLE".into())
        }
    );
}

#[test]
fn rafter_spacing_ignores_counts_elsewhere() {
    let profile = load_preset("plan-set").unwrap();
    let mut structural: Vec<&str> = STRUCTURAL.to_vec();
    structural.pop();
    structural.push("RAFTER: 2\" X 6\" @ 16\" O.C.");
    let extractor = MockExtractor {
        pages: vec![
            page(1, COVER),
            page(2, &["SITE PLAN"]),
            page(3, &structural),
            page(4, DATASHEET),
        ],
    };
    let mut record = full_record();

    let report = check_pdf(&[], &extractor, &mut record, &profile).unwrap();

    // the cover sheet's "(24)" module count must not satisfy a 24" spacing
    assert_eq!(
        verdict(&report, "Rafter/Truss Spacing").status,
        Status::Mismatch {
            found: Some("RAFTER: 2\" X 6\" @ 16\" O.C.".into())
        }
    );
    assert_eq!(verdict(&report, "Rafter/Truss Size").status, Status::Match);
}

#[test]
fn project_address_compiled_and_matched() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    let v = verdict(&report, "Project Address");
    assert_eq!(v.value, "123 Main St, Anaheim, California, 92805");
    assert_eq!(v.status, Status::Match);
    assert_eq!(
        record.get("Compiled_Project_Address"),
        Some("123 Main St, Anaheim, California, 92805")
    );
}

#[test]
fn wrong_zip_fails_strict_but_passes_state_only() {
    let mut record = record_with("Engineering_Project__c.Installation_Zip_Code__c", "92806");
    let strict = load_preset("plan-set").unwrap();
    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &strict).unwrap();
    assert!(matches!(
        verdict(&report, "Project Address").status,
        Status::Mismatch { found: None }
    ));

    let loose = parse_profile_str(
        r#"{
            "name": "loose",
            "version": "1.0",
            "address_mode": "state_only",
            "categories": ["Property"],
            "fields": [
                { "label": "Project Address", "key": "Compiled_Project_Address", "category": "Property" }
            ]
        }"#,
    )
    .unwrap();
    let mut record = record_with("Engineering_Project__c.Installation_Zip_Code__c", "92806");
    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &loose).unwrap();
    assert_eq!(verdict(&report, "Project Address").status, Status::Match);
}

// ---------------------------------------------------------------------------
// Test 5: Derived metrics
// ---------------------------------------------------------------------------
#[test]
fn dc_size_computed_from_part_number() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    assert_eq!(report.derived.module_wattage, Some(410));
    assert_eq!(report.derived.computed_dc_kw, Some(dec!(9.840)));
    assert_eq!(report.derived.declared_dc_kw, Some(dec!(9.840)));
    assert_eq!(
        report.derived.check(DC_SIZE_CHECK).unwrap().status,
        CheckStatus::Pass
    );
    assert_eq!(record.get(DERIVED_MODULE_WATTAGE), Some("410"));
    assert_eq!(record.get(DERIVED_DC_SIZE_KW), Some("9.840"));
}

#[test]
fn tesla_imp_above_limit_fails() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();
    let datasheet = &["MODULE ELECTRICAL DATA", "IMP", "13.8A"];

    let report = check_pdf(&[], &plan_set(datasheet), &mut record, &profile).unwrap();

    let check = report.derived.check(TESLA_IMP_CHECK).unwrap();
    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.detail, "Module Imp = 13.8 A (Above 13)");
}

#[test]
fn tesla_imp_within_limit_passes() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    let check = report.derived.check(TESLA_IMP_CHECK).unwrap();
    assert_eq!(check.status, CheckStatus::Pass);
    assert_eq!(check.detail, "Module Imp = 12.9 A (Within 13)");
}

#[test]
fn non_tesla_inverter_skips_imp_check() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = record_with("Engineering_Project__c.Inverter_Manufacturer__c", "Enphase");

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();

    assert!(report.derived.check(TESLA_IMP_CHECK).is_none());
    assert!(matches!(
        verdict(&report, "Inverter Manufacturer").status,
        Status::Mismatch { .. }
    ));
}

// ---------------------------------------------------------------------------
// Test 6: Run-level failures and exports
// ---------------------------------------------------------------------------
#[test]
fn blank_document_is_an_error() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();
    let extractor = MockExtractor {
        pages: vec![page(1, &["", "   "])],
    };

    let result = check_pdf(&[], &extractor, &mut record, &profile);
    assert!(matches!(result, Err(QcError::EmptyDocument)));
}

#[test]
fn short_document_still_produces_verdicts() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();
    let extractor = MockExtractor {
        pages: vec![page(1, COVER)],
    };

    let report = check_pdf(&[], &extractor, &mut record, &profile).unwrap();

    assert_eq!(report.verdicts.len(), profile.fields.len());
    assert_eq!(verdict(&report, "Module Quantity").status, Status::Match);
    assert!(matches!(
        verdict(&report, "Racking Manufacturer").status,
        Status::Mismatch { .. }
    ));
}

#[test]
fn csv_export_has_one_row_per_verdict() {
    let profile = load_preset("plan-set").unwrap();
    let mut record = full_record();

    let report = check_pdf(&[], &plan_set(DATASHEET), &mut record, &profile).unwrap();
    let csv = verdicts_csv(&report).unwrap();

    assert_eq!(csv.lines().count(), profile.fields.len() + 1);
    assert!(csv.starts_with("Label,Field,Value,Status,Explanation"));
}
