use std::collections::HashMap;

use crate::model::StructuredRecord;
use crate::profile::schema::{FieldSpec, ProfileDef};
use crate::reconcile::context::{DocumentContext, MatchContext};
use crate::reconcile::matchers::{build_matcher, strategy_for_label, FieldMatcher, TextMatcher};
use crate::reconcile::outcome::{Status, Verdict};

/// Label -> matcher mapping, built once per profile.
pub struct MatcherRegistry {
    matchers: HashMap<String, Box<dyn FieldMatcher>>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        Self {
            matchers: HashMap::new(),
        }
    }

    /// One matcher per profile field: the field's explicit strategy, or the
    /// built-in strategy for its label.
    pub fn from_profile(profile: &ProfileDef) -> Self {
        let mut registry = Self::new();
        for field in &profile.fields {
            let strategy = field
                .strategy
                .clone()
                .unwrap_or_else(|| strategy_for_label(&field.label));
            registry.register(&field.label, build_matcher(&strategy));
        }
        registry
    }

    pub fn register(&mut self, label: &str, matcher: Box<dyn FieldMatcher>) {
        self.matchers.insert(label.to_string(), matcher);
    }

    pub fn get(&self, label: &str) -> Option<&dyn FieldMatcher> {
        self.matchers.get(label).map(|m| m.as_ref())
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces one verdict per profile field.
pub struct Reconciler<'p> {
    fields: &'p [FieldSpec],
    registry: MatcherRegistry,
}

impl<'p> Reconciler<'p> {
    pub fn new(profile: &'p ProfileDef) -> Self {
        Self {
            fields: &profile.fields,
            registry: MatcherRegistry::from_profile(profile),
        }
    }

    pub fn with_registry(fields: &'p [FieldSpec], registry: MatcherRegistry) -> Self {
        Self { fields, registry }
    }

    /// Reconcile every field, in declaration order.
    pub fn run(&self, record: &StructuredRecord, document: &DocumentContext<'_>) -> Vec<Verdict> {
        self.fields
            .iter()
            .map(|field| self.reconcile_field(field, record, document))
            .collect()
    }

    fn reconcile_field(
        &self,
        field: &FieldSpec,
        record: &StructuredRecord,
        document: &DocumentContext<'_>,
    ) -> Verdict {
        let raw = record.get(&field.key).unwrap_or("");
        let value = raw.trim();
        let matcher = self.registry.get(&field.label).unwrap_or(&TextMatcher);

        let (status, explanation, evidence) = if value.is_empty() {
            (
                Status::MissingInInput,
                format!("No value for '{}' in project record", field.key),
                vec![],
            )
        } else {
            let ctx = MatchContext {
                key: &field.key,
                document,
            };
            let outcome = matcher.evaluate(value, &ctx);
            (outcome.status, outcome.explanation, outcome.evidence)
        };

        tracing::debug!(
            label = %field.label,
            strategy = matcher.strategy_name(),
            status = %status,
            "field reconciled"
        );

        Verdict {
            label: field.label.clone(),
            key: field.key.clone(),
            category: field.category.clone(),
            value: raw.to_string(),
            status,
            strategy: matcher.strategy_name().to_string(),
            explanation,
            evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::pages_from_text;
    use crate::model::DocumentText;
    use crate::parsing::extract_document_values;
    use crate::profile::parse_profile_str;
    use crate::profile::schema::AddressMode;
    use crate::reconcile::outcome::Outcome;

    const PROFILE: &str = r#"{
        "name": "test",
        "version": "1.0",
        "categories": ["Equipment", "Property"],
        "fields": [
            { "label": "Module Quantity", "key": "QTY", "category": "Equipment" },
            { "label": "AHJ", "key": "AHJ", "category": "Property" },
            { "label": "Permit Note", "key": "NOTE", "category": "Property",
              "strategy": { "kind": "keyword_line", "keyword": "NOTE" } }
        ]
    }"#;

    fn run(record: &StructuredRecord, text: &str) -> Vec<Verdict> {
        let profile = parse_profile_str(PROFILE).unwrap();
        let doc = DocumentText::new(pages_from_text(text));
        let extracted = extract_document_values(&doc, "", &[3]);
        let ctx = DocumentContext::new(&doc, extracted, HashMap::new(), AddressMode::Strict);
        Reconciler::new(&profile).run(record, &ctx)
    }

    #[test]
    fn test_one_verdict_per_field_in_order() {
        let record = StructuredRecord::from_pairs([("QTY", "24")]);
        let verdicts = run(&record, "MODULE:\n(24)");
        let labels: Vec<&str> = verdicts.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec!["Module Quantity", "AHJ", "Permit Note"]);
        assert_eq!(verdicts[0].status, Status::Match);
        assert_eq!(verdicts[0].strategy, "quantity");
    }

    #[test]
    fn test_missing_input_short_circuits() {
        let record = StructuredRecord::from_pairs([("QTY", "  "), ("AHJ", "")]);
        // the label text appears verbatim in the document
        let verdicts = run(&record, "MODULE:\n(24)\nAHJ: Module Quantity");
        assert_eq!(verdicts[0].status, Status::MissingInInput);
        assert_eq!(verdicts[1].status, Status::MissingInInput);
        assert_eq!(verdicts[2].status, Status::MissingInInput);
        assert!(verdicts[0].evidence.is_empty());
    }

    #[test]
    fn test_explicit_strategy_binds_new_label() {
        let record = StructuredRecord::from_pairs([("NOTE", "Fire setback 36 in")]);
        let verdicts = run(&record, "NOTE: FIRE SETBACK 36 IN");
        assert_eq!(verdicts[2].status, Status::Match);
        assert_eq!(verdicts[2].strategy, "keyword_line");
    }

    #[test]
    fn test_verdict_keeps_raw_value() {
        let record = StructuredRecord::from_pairs([("QTY", " 007 ")]);
        let verdicts = run(&record, "MODULE:\n(7)");
        assert_eq!(verdicts[0].value, " 007 ");
        assert_eq!(verdicts[0].status, Status::Match);
    }

    struct AlwaysMatch;

    impl FieldMatcher for AlwaysMatch {
        fn strategy_name(&self) -> &'static str {
            "always"
        }

        fn evaluate(&self, _value: &str, _ctx: &MatchContext<'_>) -> Outcome {
            Outcome::matched("always")
        }
    }

    #[test]
    fn test_custom_registry() {
        let profile = parse_profile_str(PROFILE).unwrap();
        let mut registry = MatcherRegistry::from_profile(&profile);
        registry.register("AHJ", Box::new(AlwaysMatch));

        let record = StructuredRecord::from_pairs([("AHJ", "Anywhere")]);
        let doc = DocumentText::new(pages_from_text("blank"));
        let ctx = DocumentContext::new(
            &doc,
            extract_document_values(&doc, "", &[]),
            HashMap::new(),
            AddressMode::Strict,
        );
        let verdicts = Reconciler::with_registry(&profile.fields, registry).run(&record, &ctx);
        assert_eq!(verdicts[1].status, Status::Match);
        assert_eq!(verdicts[1].strategy, "always");
    }
}
