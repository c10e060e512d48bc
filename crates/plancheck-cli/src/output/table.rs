use plancheck_core::profile::schema::ProfileDef;
use plancheck_core::reconcile::{CheckStatus, QcReport, Status, Verdict};

pub fn print(report: &QcReport, profile: &ProfileDef, show_all: bool) {
    println!("=== {} ({} pages) ===\n", report.profile_name, report.page_count);

    let max_label = report
        .verdicts
        .iter()
        .map(|v| v.label.len())
        .max()
        .unwrap_or(20);

    for category in &profile.categories {
        let verdicts: Vec<&Verdict> = report
            .verdicts
            .iter()
            .filter(|v| &v.category == category)
            .collect();
        if verdicts.is_empty() {
            continue;
        }

        println!("  {category}");
        for v in verdicts {
            let marker = match v.status {
                Status::Match => "✓",
                Status::Mismatch { .. } => "✗",
                Status::MissingInInput => "!",
            };
            let value = if v.value.trim().is_empty() { "-" } else { v.value.trim() };
            println!(
                "    {} {:<width$}  {}  -> {}",
                marker,
                v.label,
                value,
                v.status,
                width = max_label
            );
            if show_all || !v.status.is_match() {
                println!("        {}", v.explanation);
            }
            for span in &v.evidence {
                println!("        page {}, line {}: {}", span.page_number, span.line_index + 1, span.text);
            }
        }
        println!();
    }

    let derived = &report.derived;
    if !derived.checks.is_empty() {
        println!("  Derived checks");
        for check in &derived.checks {
            let marker = match check.status {
                CheckStatus::Pass => "✓",
                CheckStatus::Fail => "✗",
                CheckStatus::Undetermined => "?",
            };
            println!(
                "    {} {:<width$}  {}  ({})",
                marker,
                check.name,
                check.status,
                check.detail,
                width = max_label
            );
        }
        println!();
    }

    let s = &report.summary;
    println!(
        "  {} matched, {} mismatched, {} missing",
        s.matched, s.mismatched, s.missing
    );
}
