use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{COMPILED_CUSTOMER_ADDRESS, COMPILED_PROJECT_ADDRESS};
use crate::parsing::address::AddressFields;
use crate::parsing::aliases::AliasTable;

/// A check profile: which record fields to reconcile against the plan set,
/// and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// 1-based pages appended to page 1 to form the relevant search text.
    #[serde(default = "default_supplementary_pages")]
    pub supplementary_pages: Vec<usize>,
    #[serde(default)]
    pub address_mode: AddressMode,
    /// Record key holding the contractor name used to locate the cover-sheet line.
    #[serde(default = "default_contractor_key")]
    pub contractor_key: String,
    /// Structured addresses compiled into the record before reconciliation.
    #[serde(default = "default_addresses")]
    pub addresses: Vec<AddressDef>,
    #[serde(default)]
    pub derived: DerivedDef,
    /// Display groups, in presentation order.
    pub categories: Vec<String>,
    pub fields: Vec<FieldSpec>,
}

/// One reconciled field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Human-readable label, unique within a profile. Selects the matcher
    /// unless `strategy` is given.
    pub label: String,
    /// Record key the value is read from.
    pub key: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyDef>,
}

/// Explicit matching strategy for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyDef {
    /// Integer comparison against a parenthesised cover-sheet count.
    Quantity { source: QuantitySource },
    /// Containment in the cover-sheet contractor line.
    ContractorName,
    /// Digit-only containment in the whole document.
    Phone,
    /// Value written after `keyword:` on a labelled line.
    KeywordLine { keyword: String },
    /// Lumber size or spacing, compared as digits and `x`.
    Dimension {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyword: Option<String>,
    },
    /// Manufacturer or model resolved through an alias table. Without a
    /// keyword the whole document is searched.
    Aliased {
        table: AliasTable,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyword: Option<String>,
    },
    /// Any `/`, `|` or `,` separated term found on the roof surface line.
    Roofing {
        #[serde(default = "default_roofing_keyword")]
        keyword: String,
    },
    /// Structured address located in a 1-3 line block.
    Address,
    /// Normalized containment, or literal search for numeric values.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantitySource {
    Module,
    Inverter,
}

/// How strictly addresses are located in the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    /// Street, city, state and postal code must all appear in one 1-3 line block.
    #[default]
    Strict,
    /// The state's full name or abbreviation anywhere in the document suffices.
    StateOnly,
}

/// A structured address compiled into a single record entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressDef {
    /// Reserved record key the compiled address is written to.
    pub target_key: String,
    pub fields: AddressFields,
}

/// Record keys and limits for the derived-metric checks.
///
/// Keys left out of a profile keep their default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedDef {
    pub module_part_number_key: String,
    pub module_quantity_key: String,
    pub inverter_manufacturer_key: String,
    /// Maximum module operating current for Tesla inverters.
    pub imp_limit_amps: Decimal,
    pub dc_size_tolerance_kw: Decimal,
}

impl Default for DerivedDef {
    fn default() -> Self {
        Self {
            module_part_number_key: "Engineering_Project__c.Module_Part_Number__c".into(),
            module_quantity_key: "Engineering_Project__c.Module_Quantity__c".into(),
            inverter_manufacturer_key: "Engineering_Project__c.Inverter_Manufacturer__c".into(),
            imp_limit_amps: Decimal::from(13),
            dc_size_tolerance_kw: Decimal::new(1, 2),
        }
    }
}

fn default_supplementary_pages() -> Vec<usize> {
    vec![3, 4]
}

fn default_contractor_key() -> String {
    "Engineering_Project__c.Customer__r.Name".into()
}

pub(crate) fn default_roofing_keyword() -> String {
    "ROOF SURFACE TYPE:".into()
}

fn default_addresses() -> Vec<AddressDef> {
    vec![
        AddressDef {
            target_key: COMPILED_PROJECT_ADDRESS.into(),
            fields: AddressFields {
                street_1: "Engineering_Project__c.Installation_Street_Address_1__c".into(),
                street_2: "Engineering_Project__c.Installation_Street_Address_2__c".into(),
                city: "Engineering_Project__c.Installation_City__c".into(),
                state: "Engineering_Project__c.Installation_State__c".into(),
                postal_code: "Engineering_Project__c.Installation_Zip_Code__c".into(),
            },
        },
        AddressDef {
            target_key: COMPILED_CUSTOMER_ADDRESS.into(),
            fields: AddressFields {
                street_1: "Engineering_Project__c.Customer__r.GRDS_Customer_Address_Line_1__c".into(),
                street_2: "Engineering_Project__c.Customer__r.GRDS_Customer_Address_Line_2__c".into(),
                city: "Engineering_Project__c.Customer__r.GRDS_Customer_Address_City__c".into(),
                state: "Engineering_Project__c.Customer__r.GRDS_Customer_Address_State__c".into(),
                postal_code: "Engineering_Project__c.Customer__r.GRDS_Customer_Address_Zip__c".into(),
            },
        },
    ]
}
