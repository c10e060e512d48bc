use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::error::QcError;
use crate::extraction::BBox;
use crate::reconcile::{QcReport, Status};

/// US Letter, used when a page declares no MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// A copy of the plan set with mismatched values highlighted.
#[derive(Debug)]
pub struct MarkedUpPdf {
    pub bytes: Vec<u8>,
    pub highlights: usize,
}

/// Add a highlight annotation over every evidence line of a mismatched verdict.
///
/// Evidence without a bounding box is skipped. Boxes are in pdftotext layout
/// coordinates (origin top-left), converted against each page's MediaBox.
pub fn highlight_mismatches(pdf_bytes: &[u8], report: &QcReport) -> Result<MarkedUpPdf, QcError> {
    let mut doc = Document::load_mem(pdf_bytes).map_err(markup_err)?;
    let pages = doc.get_pages();
    let mut highlights = 0;

    for verdict in &report.verdicts {
        if !matches!(verdict.status, Status::Mismatch { .. }) {
            continue;
        }
        for span in &verdict.evidence {
            let Some(bbox) = &span.bbox else {
                continue;
            };
            let Some(&page_id) = u32::try_from(span.page_number).ok().and_then(|n| pages.get(&n)) else {
                tracing::debug!(page = span.page_number, "evidence page not in PDF");
                continue;
            };

            let media_box = media_box(&doc, page_id);
            let annot = highlight(
                bbox,
                media_box,
                &format!("{} mismatch: {}", verdict.label, verdict.explanation),
            );
            let annot_id = doc.add_object(annot);
            attach_annotation(&mut doc, page_id, annot_id)?;
            highlights += 1;
        }
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|e| markup_err(e.into()))?;
    tracing::info!(highlights, "marked up plan set");
    Ok(MarkedUpPdf { bytes, highlights })
}

fn markup_err(e: lopdf::Error) -> QcError {
    QcError::Markup(e.to_string())
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn real(v: f32) -> Object {
    Object::Real(v.into())
}

/// MediaBox of a page, following inherited values up the page tree.
fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };
        if let Ok(values) = dict.get(b"MediaBox").and_then(Object::as_array) {
            let values: Vec<f32> = values.iter().filter_map(number).collect();
            if let &[x0, y0, x1, y1] = values.as_slice() {
                return [x0, y0, x1, y1];
            }
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    DEFAULT_MEDIA_BOX
}

fn highlight(bbox: &BBox, media_box: [f32; 4], contents: &str) -> Dictionary {
    let [x0, _, _, top] = media_box;
    let left = x0 + bbox.x_min;
    let right = x0 + bbox.x_max;
    let upper = top - bbox.y_min;
    let lower = top - bbox.y_max;

    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => vec![real(left), real(lower), real(right), real(upper)],
        "QuadPoints" => vec![
            real(left), real(upper), real(right), real(upper),
            real(left), real(lower), real(right), real(lower),
        ],
        "C" => vec![real(1.0), real(1.0), real(0.0)],
        "F" => Object::Integer(4),
        "T" => Object::string_literal("Mismatch"),
        "Contents" => Object::string_literal(contents),
    }
}

fn attach_annotation(doc: &mut Document, page_id: ObjectId, annot_id: ObjectId) -> Result<(), QcError> {
    let existing = doc
        .get_dictionary(page_id)
        .map_err(markup_err)?
        .get(b"Annots")
        .ok()
        .cloned();

    // Annots may be an inline array or a reference to one.
    if let Some(Object::Reference(array_id)) = existing {
        doc.get_object_mut(array_id)
            .and_then(Object::as_array_mut)
            .map_err(markup_err)?
            .push(Object::Reference(annot_id));
        return Ok(());
    }

    let mut annots = match existing {
        Some(Object::Array(annots)) => annots,
        _ => Vec::new(),
    };
    annots.push(Object::Reference(annot_id));
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(markup_err)?
        .set("Annots", annots);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::outcome::{DerivedMetrics, EvidenceSpan, Summary, Verdict};

    fn two_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..2 {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(2),
                "MediaBox" => vec![
                    Object::Integer(0), Object::Integer(0),
                    Object::Integer(1224), Object::Integer(792),
                ],
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

    fn verdict(label: &str, status: Status, page_number: usize, bbox: Option<BBox>) -> Verdict {
        Verdict {
            label: label.into(),
            key: "K".into(),
            category: "Equipment".into(),
            value: "25".into(),
            status,
            strategy: "quantity".into(),
            explanation: "Compared: record='25' vs document='24'".into(),
            evidence: vec![EvidenceSpan {
                page_number,
                line_index: 2,
                text: "(24) XYZ-410W".into(),
                bbox,
            }],
        }
    }

    fn report(verdicts: Vec<Verdict>) -> QcReport {
        QcReport {
            profile_name: "test".into(),
            page_count: 2,
            summary: Summary::from_verdicts(&verdicts),
            verdicts,
            derived: DerivedMetrics::default(),
        }
    }

    fn bbox() -> BBox {
        BBox {
            x_min: 10.0,
            y_min: 20.0,
            x_max: 160.0,
            y_max: 30.0,
        }
    }

    fn annotations(bytes: &[u8], page_number: u32) -> Vec<Dictionary> {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&page_number];
        let Ok(annots) = doc.get_dictionary(page_id).unwrap().get(b"Annots") else {
            return vec![];
        };
        annots
            .as_array()
            .unwrap()
            .iter()
            .map(|a| doc.get_dictionary(a.as_reference().unwrap()).unwrap().clone())
            .collect()
    }

    #[test]
    fn test_highlights_only_mismatched_evidence() {
        let report = report(vec![
            verdict("Module Quantity", Status::Mismatch { found: Some("24".into()) }, 1, Some(bbox())),
            verdict("Inverter Quantity", Status::Match, 1, Some(bbox())),
            verdict("Optimizer Quantity", Status::Mismatch { found: None }, 1, None),
        ]);

        let marked = highlight_mismatches(&two_page_pdf(), &report).unwrap();
        assert_eq!(marked.highlights, 1);

        let annots = annotations(&marked.bytes, 1);
        assert_eq!(annots.len(), 1);
        assert_eq!(
            annots[0].get(b"Subtype").unwrap().as_name().unwrap(),
            b"Highlight".as_slice()
        );
        assert!(annotations(&marked.bytes, 2).is_empty());
    }

    #[test]
    fn test_highlight_rect_flips_to_pdf_coordinates() {
        let report = report(vec![verdict(
            "Module Quantity",
            Status::Mismatch { found: Some("24".into()) },
            2,
            Some(bbox()),
        )]);

        let marked = highlight_mismatches(&two_page_pdf(), &report).unwrap();
        let annots = annotations(&marked.bytes, 2);
        let rect: Vec<f32> = annots[0]
            .get(b"Rect")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .filter_map(number)
            .collect();
        // MediaBox is inherited from the page tree root.
        assert_eq!(rect, vec![10.0, 762.0, 160.0, 772.0]);
    }

    #[test]
    fn test_evidence_page_beyond_pdf_is_skipped() {
        let report = report(vec![verdict(
            "Module Quantity",
            Status::Mismatch { found: Some("24".into()) },
            7,
            Some(bbox()),
        )]);
        let marked = highlight_mismatches(&two_page_pdf(), &report).unwrap();
        assert_eq!(marked.highlights, 0);
    }

    #[test]
    fn test_not_a_pdf_is_markup_error() {
        let err = highlight_mismatches(b"plain text", &report(vec![])).unwrap_err();
        assert!(matches!(err, QcError::Markup(_)));
    }
}
