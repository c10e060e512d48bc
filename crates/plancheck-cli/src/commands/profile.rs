use plancheck_core::error::QcError;
use plancheck_core::profile::builtin;
use plancheck_core::profile::schema::{AddressMode, StrategyDef};
use plancheck_core::reconcile::matchers::strategy_for_label;
use std::path::Path;

pub fn list() -> Result<(), QcError> {
    println!("Available predefined profiles:\n");
    for name in builtin::PRESETS {
        let profile = builtin::load_preset(name)?;
        println!("  {:<10} {} (v{}), {} fields", name, profile.name, profile.version, profile.fields.len());
        if let Some(ref desc) = profile.description {
            println!("             {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), QcError> {
    let profile = builtin::load_preset(preset)?;

    println!("{} (version {})\n", profile.name, profile.version);
    if let Some(ref desc) = profile.description {
        println!("{}\n", desc);
    }

    let pages: Vec<String> = profile.supplementary_pages.iter().map(|p| p.to_string()).collect();
    println!("Searched pages: 1 + {}", pages.join(", "));
    let mode = match profile.address_mode {
        AddressMode::Strict => "strict (all components in one 1-3 line block)",
        AddressMode::StateOnly => "state_only (state name or abbreviation anywhere)",
    };
    println!("Address matching: {mode}\n");

    let max_label = profile
        .fields
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(20);

    for category in &profile.categories {
        println!("{category}");
        for field in profile.fields.iter().filter(|f| &f.category == category) {
            let strategy = field
                .strategy
                .clone()
                .unwrap_or_else(|| strategy_for_label(&field.label));
            println!(
                "  {:<width$}  {:<40}  {}",
                field.label,
                describe(&strategy),
                field.key,
                width = max_label
            );
        }
        println!();
    }

    Ok(())
}

fn describe(strategy: &StrategyDef) -> String {
    match strategy {
        StrategyDef::Quantity { source } => format!("quantity ({source:?} count)").to_lowercase(),
        StrategyDef::ContractorName => "contractor name line".into(),
        StrategyDef::Phone => "phone digits".into(),
        StrategyDef::KeywordLine { keyword } => format!("after '{keyword}:'"),
        StrategyDef::Dimension { keyword: Some(k) } => format!("dimension on '{k}' line"),
        StrategyDef::Dimension { keyword: None } => "dimension".into(),
        StrategyDef::Aliased { table, keyword: Some(k) } => format!("{table} aliases, after '{k}'"),
        StrategyDef::Aliased { table, keyword: None } => format!("{table} aliases, whole document"),
        StrategyDef::Roofing { keyword } => format!("any term on '{keyword}' line"),
        StrategyDef::Address => "address block".into(),
        StrategyDef::Text => "text".into(),
    }
}

pub fn schema() -> Result<(), QcError> {
    print!(
        r#"JSON Profile Schema
===================

A profile lists the project record fields that `plancheck check` looks
for in the plan set, and how each one is compared.

Top-level fields:
  name                 (string, required)  Profile name
  description          (string, optional)  What this profile is for
  version              (string, required)  Version identifier (e.g., "1.0")
  supplementary_pages  (array, optional)   1-based pages searched in addition
                                           to page 1. Default: [3, 4]
  address_mode         (string, optional)  "strict" (default): street, city,
                                           state and zip in one 1-3 line block.
                                           "state_only": the state name or
                                           abbreviation anywhere in the document.
  contractor_key       (string, optional)  Record key with the contractor name
                                           used to find the cover-sheet line.
  addresses            (array, optional)   Addresses compiled into the record
                                           before checking. Each entry has a
                                           "target_key" and "fields" with keys
                                           street_1, street_2, city, state,
                                           postal_code.
  derived              (object, optional)  Keys for module part number, module
                                           quantity, inverter manufacturer, plus
                                           "imp_limit_amps" and
                                           "dc_size_tolerance_kw" (decimal strings).
  categories           (array, required)   Display groups, in order
  fields               (array, required)   Fields to check (see below)

Each entry in "fields":
  label     (string, required)  Unique label. Known labels such as
                                "Module Quantity" or "AHJ" pick their
                                built-in strategy. Run `plancheck profile show
                                plan-set` to see them.
  key       (string, required)  Record key to read the value from
  category  (string, required)  One of "categories"
  strategy  (object, optional)  Explicit strategy, tagged by "kind":
              {{"kind": "quantity", "source": "module" | "inverter"}}
              {{"kind": "contractor_name"}}
              {{"kind": "phone"}}
              {{"kind": "keyword_line", "keyword": "AHJ"}}
              {{"kind": "dimension", "keyword": "RAFTER|TRUSS"}}  first line with any
                                                        keyword; optional
              {{"kind": "aliased", "table": "racking" | "attachment" | "inverter",
               "keyword": "RACKING:"}}                          keyword optional
              {{"kind": "roofing", "keyword": "ROOF SURFACE TYPE:"}}
              {{"kind": "address"}}
              {{"kind": "text"}}

Example:
{{
  "name": "commercial",
  "version": "1.0",
  "supplementary_pages": [2],
  "categories": ["Equipment"],
  "fields": [
    {{ "label": "Module Quantity", "key": "Engineering_Project__c.Module_Quantity__c",
      "category": "Equipment" }},
    {{ "label": "Optimizer Manufacturer", "key": "Engineering_Project__c.Optimizer__c",
      "category": "Equipment",
      "strategy": {{ "kind": "aliased", "table": "inverter", "keyword": "OPTIMIZER:" }} }}
  ]
}}
"#
    );
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), QcError> {
    let profile = plancheck_core::profile::load_profile(file)?;

    println!("Profile '{}' (v{}) is valid.", profile.name, profile.version);
    println!("  Categories: {}", profile.categories.join(", "));
    println!("  Fields: {}", profile.fields.len());

    let mut warnings = Vec::new();
    for category in &profile.categories {
        if !profile.fields.iter().any(|f| &f.category == category) {
            warnings.push(format!("category '{category}' has no fields"));
        }
    }
    for field in &profile.fields {
        if field.strategy.is_none() && strategy_for_label(&field.label) == StrategyDef::Text {
            warnings.push(format!(
                "field '{}' has no built-in strategy; plain text containment is used",
                field.label
            ));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
