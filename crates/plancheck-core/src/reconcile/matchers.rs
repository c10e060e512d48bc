use crate::parsing::address::{find_address_block, state_mentioned, AddressParts};
use crate::parsing::aliases::AliasTable;
use crate::parsing::lines::TextIndex;
use crate::parsing::normalize::{normalize_dimension, normalize_phone, normalize_text};
use crate::parsing::ExtractedCount;
use crate::profile::schema::{default_roofing_keyword, AddressMode, QuantitySource, StrategyDef};
use crate::reconcile::context::MatchContext;
use crate::reconcile::outcome::{EvidenceSpan, Outcome};

/// A comparison strategy for one kind of field.
///
/// Matchers only see non-empty record values; the missing-input case is
/// handled by the reconciler before dispatch.
pub trait FieldMatcher: Send + Sync {
    fn strategy_name(&self) -> &'static str;

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome;
}

/// Strategy used for a label when the profile does not name one.
pub fn strategy_for_label(label: &str) -> StrategyDef {
    match label {
        "Module Quantity" => StrategyDef::Quantity {
            source: QuantitySource::Module,
        },
        "Inverter Quantity" => StrategyDef::Quantity {
            source: QuantitySource::Inverter,
        },
        "Contractor Name" => StrategyDef::ContractorName,
        "Contractor Phone" => StrategyDef::Phone,
        "AHJ" => StrategyDef::KeywordLine {
            keyword: "AHJ".into(),
        },
        "Utility" => StrategyDef::KeywordLine {
            keyword: "UTILITY".into(),
        },
        "Rafter/Truss Size" | "Rafter/Truss Spacing" => StrategyDef::Dimension {
            keyword: Some("RAFTER|TRUSS".into()),
        },
        "Racking Manufacturer" | "Racking Model" => StrategyDef::Aliased {
            table: AliasTable::Racking,
            keyword: Some("RACKING:".into()),
        },
        "Attachment Manufacturer" | "Attachment Model" => StrategyDef::Aliased {
            table: AliasTable::Attachment,
            keyword: Some("ATTACHMENT:".into()),
        },
        "Inverter Manufacturer" => StrategyDef::Aliased {
            table: AliasTable::Inverter,
            keyword: None,
        },
        "Roofing Material" => StrategyDef::Roofing {
            keyword: default_roofing_keyword(),
        },
        "Project Address" | "Contractor Address" => StrategyDef::Address,
        _ => StrategyDef::Text,
    }
}

/// Instantiate the matcher for a strategy.
pub fn build_matcher(strategy: &StrategyDef) -> Box<dyn FieldMatcher> {
    match strategy {
        StrategyDef::Quantity { source } => Box::new(QuantityMatcher { source: *source }),
        StrategyDef::ContractorName => Box::new(ContractorNameMatcher),
        StrategyDef::Phone => Box::new(PhoneMatcher),
        StrategyDef::KeywordLine { keyword } => Box::new(KeywordLineMatcher {
            keyword: keyword.clone(),
        }),
        StrategyDef::Dimension { keyword } => Box::new(DimensionMatcher {
            keyword: keyword.clone(),
        }),
        StrategyDef::Aliased { table, keyword } => Box::new(AliasedMatcher {
            table: *table,
            keyword: keyword.clone(),
        }),
        StrategyDef::Roofing { keyword } => Box::new(RoofingMatcher {
            keyword: keyword.clone(),
        }),
        StrategyDef::Address => Box::new(AddressMatcher),
        StrategyDef::Text => Box::new(TextMatcher),
    }
}

/// Parse a count, ignoring leading zeros. `None` unless the input is all digits.
pub fn parse_count(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match s.trim_start_matches('0') {
        "" => Some(0),
        digits => digits.parse().ok(),
    }
}

/// Integer equality when both sides are counts, raw string equality otherwise.
pub fn quantities_equal(record: &str, document: &str) -> bool {
    match (parse_count(record), parse_count(document)) {
        (Some(a), Some(b)) => a == b,
        _ => record.trim() == document.trim(),
    }
}

/// Containment in either direction between two normalized values.
fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn not_comparable(value: &str) -> Outcome {
    Outcome::mismatched(None, format!("Record value '{value}' has no comparable characters"))
}

pub struct QuantityMatcher {
    pub source: QuantitySource,
}

impl QuantityMatcher {
    fn marker(&self) -> &'static str {
        match self.source {
            QuantitySource::Module => "MODULE:",
            QuantitySource::Inverter => "INVERTER:",
        }
    }

    fn extracted<'a>(&self, ctx: &'a MatchContext<'_>) -> Option<&'a ExtractedCount> {
        let values = &ctx.document.extracted;
        match self.source {
            QuantitySource::Module => values.module_quantity.as_ref(),
            QuantitySource::Inverter => values.inverter_quantity.as_ref(),
        }
    }
}

impl FieldMatcher for QuantityMatcher {
    fn strategy_name(&self) -> &'static str {
        "quantity"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let Some(count) = self.extracted(ctx) else {
            return Outcome::mismatched(
                None,
                format!(
                    "Compared: record='{value}' vs document=<no parenthesised count after '{}'>",
                    self.marker()
                ),
            );
        };

        let line = &count.line;
        let evidence = EvidenceSpan {
            page_number: line.page_number,
            line_index: line.line_index,
            text: line.text.clone(),
            bbox: ctx
                .document
                .doc
                .line_span(line.page_number, line.line_index)
                .map(|s| s.bbox.clone()),
        };

        Outcome::decide(
            quantities_equal(value, &count.value),
            Some(count.value.clone()),
            format!("Compared: record='{value}' vs document='{}'", count.value),
        )
        .with_evidence(vec![evidence])
    }
}

pub struct ContractorNameMatcher;

impl FieldMatcher for ContractorNameMatcher {
    fn strategy_name(&self) -> &'static str {
        "contractor_name"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let wanted = normalize_text(value);
        if wanted.is_empty() {
            return not_comparable(value);
        }

        let line = ctx.document.extracted.contractor_line.as_deref().unwrap_or("");
        if normalize_text(line).contains(&wanted) {
            return Outcome::matched(format!("Compared: record='{value}' vs document='{line}'"));
        }

        // Names wrapped across two printed lines.
        let index = TextIndex::new(ctx.document.full_text());
        if let Some(block) = index
            .blocks(2)
            .into_iter()
            .find(|b| normalize_text(b).contains(&wanted))
        {
            return Outcome::matched(format!(
                "Record='{value}' found in document block '{block}'"
            ));
        }

        Outcome::mismatched(
            Some(line.to_string()),
            format!("Compared: record='{value}' vs document='{line}'"),
        )
    }
}

pub struct PhoneMatcher;

impl FieldMatcher for PhoneMatcher {
    fn strategy_name(&self) -> &'static str {
        "phone"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let digits = normalize_phone(value);
        if digits.is_empty() {
            return not_comparable(value);
        }
        Outcome::decide(
            ctx.document.full_digits.contains(&digits),
            None,
            format!("Looked for digits '{digits}' in the document's digit stream"),
        )
    }
}

pub struct KeywordLineMatcher {
    pub keyword: String,
}

impl FieldMatcher for KeywordLineMatcher {
    fn strategy_name(&self) -> &'static str {
        "keyword_line"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let label = self.keyword.trim().trim_end_matches(':');
        let index = TextIndex::new(&ctx.document.relevant_text);
        let Some(found) = index.value_after_label(label) else {
            return Outcome::mismatched(None, format!("No '{label}:' line in document"));
        };

        Outcome::decide(
            contains_either(&normalize_text(value), &normalize_text(found)),
            Some(found.to_string()),
            format!("Compared: record='{value}' vs document '{label}:' value='{found}'"),
        )
    }
}

/// Compares dimensions on the first line carrying one of the `|`-separated
/// keywords, tried in order. Without a keyword the relevant pages are searched.
pub struct DimensionMatcher {
    pub keyword: Option<String>,
}

impl FieldMatcher for DimensionMatcher {
    fn strategy_name(&self) -> &'static str {
        "dimension"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let wanted = normalize_dimension(value);
        if wanted.is_empty() {
            return not_comparable(value);
        }

        let relevant = ctx.document.relevant_text.as_str();
        match &self.keyword {
            Some(keywords) => {
                let index = TextIndex::new(relevant);
                let Some((keyword, line)) = keywords
                    .split('|')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(|k| (k, index.line_with_keyword(k)))
                    .find(|(_, line)| !line.is_empty())
                else {
                    return Outcome::mismatched(None, format!("No '{keywords}' line in document"));
                };
                Outcome::decide(
                    normalize_dimension(line).contains(&wanted),
                    Some(line.to_string()),
                    format!("Compared dimension '{wanted}' with '{keyword}' line '{line}'"),
                )
            }
            None => Outcome::decide(
                normalize_dimension(relevant).contains(&wanted),
                None,
                format!("Looked for dimension '{wanted}' in relevant pages"),
            ),
        }
    }
}

pub struct AliasedMatcher {
    pub table: AliasTable,
    pub keyword: Option<String>,
}

impl FieldMatcher for AliasedMatcher {
    fn strategy_name(&self) -> &'static str {
        "aliased"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let normalized = normalize_text(value);
        if normalized.is_empty() {
            return not_comparable(value);
        }
        let canonical = self.table.resolve(&normalized);
        let table = self.table;

        let Some(keyword) = &self.keyword else {
            return Outcome::decide(
                ctx.document.full_normalized.contains(&canonical),
                None,
                format!("Resolved '{value}' to '{canonical}' ({table} aliases); searched full document text"),
            );
        };

        let index = TextIndex::new(&ctx.document.relevant_text);
        let after = index.line_after_keyword(keyword);
        let on = index.line_with_keyword(keyword);

        // The value sits on the line after the label, or after the label on the same line.
        let hit = [after, on]
            .into_iter()
            .filter(|l| !l.is_empty())
            .find(|l| normalize_text(l).contains(&canonical));

        match hit {
            Some(line) => Outcome::matched(format!(
                "Resolved '{value}' to '{canonical}' ({table} aliases); found in '{line}'"
            )),
            None => {
                let found = if after.is_empty() { on } else { after };
                Outcome::mismatched(
                    Some(found.to_string()),
                    format!(
                        "Resolved '{value}' to '{canonical}' ({table} aliases); compared with line after '{keyword}'"
                    ),
                )
            }
        }
    }
}

pub struct RoofingMatcher {
    pub keyword: String,
}

impl FieldMatcher for RoofingMatcher {
    fn strategy_name(&self) -> &'static str {
        "roofing"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let label = self.keyword.trim().trim_end_matches(':');
        let index = TextIndex::new(&ctx.document.relevant_text);
        let Some(line) = index.value_after_label(label) else {
            return Outcome::mismatched(None, format!("No '{label}:' line in document"));
        };
        let document = normalize_text(line);

        if normalize_text(value) == "asphalt/compositeshingle" && document.contains("compositeshingle") {
            return Outcome::matched(format!(
                "'{value}' treated as composite shingle; document '{label}:' value '{line}'"
            ));
        }

        let hit = value
            .split(['/', '|', ','])
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .find(|t| document.contains(t.as_str()));

        match hit {
            Some(term) => Outcome::matched(format!("Term '{term}' of '{value}' found in '{line}'")),
            None => Outcome::mismatched(
                Some(line.to_string()),
                format!("No term of '{value}' found in '{line}'"),
            ),
        }
    }
}

pub struct AddressMatcher;

impl FieldMatcher for AddressMatcher {
    fn strategy_name(&self) -> &'static str {
        "address"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let document = ctx.document;
        let parts = document
            .addresses
            .get(ctx.key)
            .cloned()
            .unwrap_or_else(|| AddressParts::parse(value));

        match document.address_mode {
            AddressMode::Strict => match find_address_block(document.full_text(), &parts) {
                Some(block) => Outcome::matched(format!(
                    "All components of '{value}' found in block '{block}'"
                )),
                None => Outcome::mismatched(
                    None,
                    format!("No 1-3 line block contains every component of '{value}'"),
                ),
            },
            AddressMode::StateOnly => Outcome::decide(
                state_mentioned(document.full_text(), &parts.state),
                None,
                format!(
                    "Looked for state '{}' (name or abbreviation) anywhere in document",
                    parts.state
                ),
            ),
        }
    }
}

pub struct TextMatcher;

impl FieldMatcher for TextMatcher {
    fn strategy_name(&self) -> &'static str {
        "text"
    }

    fn evaluate(&self, value: &str, ctx: &MatchContext<'_>) -> Outcome {
        let document = ctx.document;

        if value.parse::<f64>().is_ok_and(f64::is_finite) {
            return Outcome::decide(
                document.relevant_text.contains(value),
                None,
                format!("Looked for literal number '{value}' in relevant pages"),
            );
        }

        let wanted = normalize_text(value);
        if wanted.is_empty() {
            return not_comparable(value);
        }
        Outcome::decide(
            document.relevant_normalized.contains(&wanted),
            None,
            format!("Looked for normalized value '{wanted}' in relevant pages"),
        )
    }
}
