use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::model::{DocumentText, StructuredRecord, DERIVED_DC_SIZE_KW, DERIVED_MODULE_WATTAGE};
use crate::parsing::aliases::AliasTable;
use crate::parsing::normalize::normalize_text;
use crate::profile::schema::DerivedDef;
use crate::reconcile::matchers::parse_count;
use crate::reconcile::outcome::{CheckStatus, DerivedMetrics, MetricCheck};

static RE_DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digit regex"));

static RE_DC_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)DC\s*SIZE\s*:?\s*([0-9]+(?:\.[0-9]+)?)\s*KW").expect("valid DC size regex")
});

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"));

static RE_IMP_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bIMPP?\b[^0-9\n]{0,12}(\d+(?:\.\d+)?)").expect("valid Imp regex")
});

const PLAUSIBLE_WATTAGE: std::ops::RangeInclusive<u32> = 250..=799;

pub const DC_SIZE_CHECK: &str = "DC Size";
pub const TESLA_IMP_CHECK: &str = "Tesla Module Imp";

/// Panel wattage encoded in a module part number.
///
/// A 3-4 digit run directly preceded by `W` or `WT` wins; otherwise the last
/// run within 250-799 W is taken.
pub fn module_wattage(part_number: &str) -> Option<u32> {
    let upper = part_number.to_ascii_uppercase();
    let runs: Vec<(usize, u32)> = RE_DIGIT_RUN
        .find_iter(&upper)
        .filter(|m| (3..=4).contains(&m.as_str().len()))
        .filter_map(|m| m.as_str().parse().ok().map(|w| (m.start(), w)))
        .collect();

    if let Some(&(_, watts)) = runs.iter().find(|(start, _)| {
        let before = &upper[..*start];
        before.ends_with('W') || before.ends_with("WT")
    }) {
        return Some(watts);
    }

    runs.iter()
        .rev()
        .map(|&(_, watts)| watts)
        .find(|w| PLAUSIBLE_WATTAGE.contains(w))
}

/// DC system size stated on the plan set as `DC SIZE: <n> KW`.
pub fn declared_dc_size(text: &str) -> Option<Decimal> {
    let caps = RE_DC_SIZE.captures(text)?;
    Decimal::from_str(&caps[1]).ok()
}

/// Module operating current (Imp) read from the document.
///
/// An isolated `IMP`/`IMPP` cell is followed by its value on the next
/// non-blank line. Otherwise a module electrical row carrying VMP, VOC or
/// ISC alongside IMP is used, skipping inverter and MPPT rows.
pub fn module_imp(text: &str) -> Option<Decimal> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let token: String = line
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_uppercase();
        if token != "IMP" && token != "IMPP" {
            continue;
        }
        let value = lines[i + 1..]
            .iter()
            .find(|l| !l.trim().is_empty())
            .and_then(|l| RE_NUMBER.find(l))
            .and_then(|m| Decimal::from_str(m.as_str()).ok());
        if value.is_some() {
            return value;
        }
    }

    lines
        .iter()
        .filter(|line| {
            let upper = line.to_uppercase();
            upper.contains("IMP")
                && ["VMP", "VOC", "ISC"].iter().any(|m| upper.contains(m))
                && !upper.contains("INVERTER")
                && !upper.contains("MPPT")
        })
        .find_map(|line| {
            let caps = RE_IMP_VALUE.captures(line)?;
            Decimal::from_str(&caps[1]).ok()
        })
}

/// Compute the secondary engineering checks for one run.
pub fn check_derived(record: &StructuredRecord, doc: &DocumentText, def: &DerivedDef) -> DerivedMetrics {
    let part_number = record.value(&def.module_part_number_key);
    let quantity = parse_count(record.value(&def.module_quantity_key));
    let module_wattage = module_wattage(part_number);
    let declared_dc_kw = declared_dc_size(doc.full_text());
    let computed_dc_kw = match (module_wattage, quantity) {
        (Some(w), Some(q)) => Some(Decimal::from(w) * Decimal::from(q) / Decimal::from(1000)),
        _ => None,
    };

    let mut metrics = DerivedMetrics {
        module_wattage,
        computed_dc_kw,
        declared_dc_kw,
        ..Default::default()
    };

    metrics.checks.push(dc_size_check(
        part_number,
        module_wattage,
        computed_dc_kw,
        declared_dc_kw,
        def.dc_size_tolerance_kw,
    ));

    let manufacturer = normalize_text(record.value(&def.inverter_manufacturer_key));
    if !manufacturer.is_empty() && AliasTable::Inverter.resolve(&manufacturer) == "tesla" {
        metrics.module_imp_amps = module_imp(doc.full_text());
        metrics
            .checks
            .push(tesla_imp_check(metrics.module_imp_amps, def.imp_limit_amps));
    }

    for check in &metrics.checks {
        tracing::debug!(check = %check.name, status = %check.status, detail = %check.detail, "derived check");
    }

    metrics
}

fn dc_size_check(
    part_number: &str,
    wattage: Option<u32>,
    computed: Option<Decimal>,
    declared: Option<Decimal>,
    tolerance: Decimal,
) -> MetricCheck {
    let (status, detail) = match (wattage, computed, declared) {
        (None, _, _) => (
            CheckStatus::Undetermined,
            format!("Module wattage could not be read from part number '{part_number}'"),
        ),
        (Some(_), None, _) => (
            CheckStatus::Undetermined,
            "Module quantity is missing or not a whole number".to_string(),
        ),
        (Some(_), Some(c), None) => (
            CheckStatus::Undetermined,
            format!("Computed {c:.3} kW; no 'DC SIZE: <n> KW' found in document"),
        ),
        (Some(w), Some(c), Some(d)) => {
            let diff = (c - d).abs();
            let status = if diff <= tolerance {
                CheckStatus::Pass
            } else {
                CheckStatus::Fail
            };
            (
                status,
                format!(
                    "{w} W x qty = {c:.3} kW vs document {d} kW (difference {diff:.3}, tolerance {tolerance})"
                ),
            )
        }
    };

    MetricCheck {
        name: DC_SIZE_CHECK.into(),
        status,
        detail,
    }
}

fn tesla_imp_check(imp: Option<Decimal>, limit: Decimal) -> MetricCheck {
    let (status, detail) = match imp {
        Some(amps) if amps > limit => (
            CheckStatus::Fail,
            format!("Module Imp = {amps} A (Above {limit})"),
        ),
        Some(amps) => (
            CheckStatus::Pass,
            format!("Module Imp = {amps} A (Within {limit})"),
        ),
        None => (
            CheckStatus::Undetermined,
            "Module Imp not found in document".to_string(),
        ),
    };

    MetricCheck {
        name: TESLA_IMP_CHECK.into(),
        status,
        detail,
    }
}

impl DerivedMetrics {
    /// Record entries for the computed values.
    pub fn record_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if let Some(w) = self.module_wattage {
            entries.push((DERIVED_MODULE_WATTAGE, w.to_string()));
        }
        if let Some(kw) = self.computed_dc_kw {
            entries.push((DERIVED_DC_SIZE_KW, format!("{kw:.3}")));
        }
        entries
    }

    pub fn check(&self, name: &str) -> Option<&MetricCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}
