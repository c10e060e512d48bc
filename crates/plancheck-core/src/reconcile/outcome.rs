use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extraction::BBox;

/// Per-field reconciliation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    Match,
    /// The document disagrees. `found` is the document-side value, or `None`
    /// when nothing was found.
    Mismatch { found: Option<String> },
    /// The record has no value for this field; the document was not consulted.
    MissingInInput,
}

impl Status {
    pub fn is_match(&self) -> bool {
        matches!(self, Status::Match)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Match => write!(f, "MATCH"),
            Status::Mismatch { found: Some(v) } => write!(f, "MISMATCH (document: {v})"),
            Status::Mismatch { found: None } => write!(f, "MISMATCH (document: not found)"),
            Status::MissingInInput => write!(f, "MISSING IN INPUT"),
        }
    }
}

/// Where in the document a value was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    pub page_number: usize,
    pub line_index: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

/// What a matcher decided for one value.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: Status,
    pub explanation: String,
    pub evidence: Vec<EvidenceSpan>,
}

impl Outcome {
    pub fn matched(explanation: impl Into<String>) -> Self {
        Self {
            status: Status::Match,
            explanation: explanation.into(),
            evidence: vec![],
        }
    }

    pub fn mismatched(found: Option<String>, explanation: impl Into<String>) -> Self {
        Self {
            status: Status::Mismatch {
                found: found.filter(|s| !s.is_empty()),
            },
            explanation: explanation.into(),
            evidence: vec![],
        }
    }

    /// Match when `matched` holds, otherwise a mismatch reporting `found`.
    pub fn decide(matched: bool, found: Option<String>, explanation: impl Into<String>) -> Self {
        if matched {
            Self::matched(explanation)
        } else {
            Self::mismatched(found, explanation)
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<EvidenceSpan>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Reconciliation result for a single field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub label: String,
    /// Record key the value was read from.
    pub key: String,
    pub category: String,
    /// Raw record value ("" when absent).
    pub value: String,
    pub status: Status,
    /// Name of the matcher that produced the verdict.
    pub strategy: String,
    /// Which comparison was performed and against what.
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Undetermined,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
            CheckStatus::Undetermined => write!(f, "CANNOT DETERMINE"),
        }
    }
}

/// A secondary engineering check computed from reconciled values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

/// Values computed by the derived-metric checker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub module_wattage: Option<u32>,
    pub computed_dc_kw: Option<Decimal>,
    pub declared_dc_kw: Option<Decimal>,
    pub module_imp_amps: Option<Decimal>,
    pub checks: Vec<MetricCheck>,
}

/// Aggregate verdict counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub matched: usize,
    pub mismatched: usize,
    pub missing: usize,
}

impl Summary {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let mut summary = Summary::default();
        for v in verdicts {
            match v.status {
                Status::Match => summary.matched += 1,
                Status::Mismatch { .. } => summary.mismatched += 1,
                Status::MissingInInput => summary.missing += 1,
            }
        }
        summary
    }
}

/// Full result of one reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcReport {
    pub profile_name: String,
    pub page_count: usize,
    /// One verdict per profile field, in profile order.
    pub verdicts: Vec<Verdict>,
    pub derived: DerivedMetrics,
    pub summary: Summary,
}
