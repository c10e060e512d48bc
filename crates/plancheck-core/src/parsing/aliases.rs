use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Manufacturer class whose shorthand names are resolved before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasTable {
    Racking,
    Attachment,
    Inverter,
}

impl fmt::Display for AliasTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasTable::Racking => write!(f, "racking"),
            AliasTable::Attachment => write!(f, "attachment"),
            AliasTable::Inverter => write!(f, "inverter"),
        }
    }
}

impl AliasTable {
    fn entries(self) -> &'static HashMap<&'static str, &'static str> {
        match self {
            AliasTable::Racking => &RACKING_ALIASES,
            AliasTable::Attachment => &ATTACHMENT_ALIASES,
            AliasTable::Inverter => &INVERTER_ALIASES,
        }
    }

    /// Resolve an already-normalized value to its canonical manufacturer name.
    ///
    /// Values not in the table are returned unchanged.
    pub fn resolve(self, normalized: &str) -> String {
        match self.entries().get(normalized) {
            Some(canonical) => canonical.to_string(),
            None => normalized.to_string(),
        }
    }
}

// Keys and values are in normalize_text() form: lowercase, no spaces or periods.

static RACKING_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert("ironridge", "ironridge");
    m.insert("iridg", "ironridge");
    m.insert("ir", "ironridge");
    m.insert("iron-ridge", "ironridge");
    m.insert("unirac", "unirac");
    m.insert("uni", "unirac");
    m.insert("unr", "unirac");
    m.insert("snapnrack", "snapnrack");
    m.insert("snr", "snapnrack");
    m.insert("snap-n-rack", "snapnrack");
    m.insert("k2", "k2systems");
    m.insert("k2systems", "k2systems");
    m.insert("ecofasten", "ecofasten");
    m.insert("ef", "ecofasten");
    m.insert("quickmount", "quickmountpv");
    m.insert("quickmountpv", "quickmountpv");
    m.insert("qm", "quickmountpv");
    m.insert("roof-tech", "rooftech");
    m.insert("rooftech", "rooftech");
    m.insert("rt", "rooftech");
    m.insert("s-5!", "s-5!");
    m.insert("s5", "s-5!");

    m
});

static ATTACHMENT_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert("ironridge", "ironridge");
    m.insert("iridg", "ironridge");
    m.insert("ir", "ironridge");
    m.insert("quickmount", "quickmountpv");
    m.insert("quickmountpv", "quickmountpv");
    m.insert("qm", "quickmountpv");
    m.insert("qmpv", "quickmountpv");
    m.insert("ecofasten", "ecofasten");
    m.insert("ef", "ecofasten");
    m.insert("unirac", "unirac");
    m.insert("uni", "unirac");
    m.insert("snapnrack", "snapnrack");
    m.insert("snr", "snapnrack");
    m.insert("roof-tech", "rooftech");
    m.insert("rooftech", "rooftech");
    m.insert("rt", "rooftech");
    m.insert("s-5!", "s-5!");
    m.insert("s5", "s-5!");
    m.insert("pegasus", "pegasussolar");
    m.insert("pegasussolar", "pegasussolar");

    m
});

static INVERTER_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert("enphase", "enphase");
    m.insert("enph", "enphase");
    m.insert("enphaseenergy", "enphase");
    m.insert("solaredge", "solaredge");
    m.insert("se", "solaredge");
    m.insert("solaredgetechnologies", "solaredge");
    m.insert("tesla", "tesla");
    m.insert("tsla", "tesla");
    m.insert("teslainc", "tesla");
    m.insert("sma", "sma");
    m.insert("smaamerica", "sma");
    m.insert("apsystems", "apsystems");
    m.insert("aps", "apsystems");
    m.insert("generac", "generac");
    m.insert("gen", "generac");
    m.insert("fronius", "fronius");
    m.insert("hoymiles", "hoymiles");

    m
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_racking_shorthand() {
        assert_eq!(AliasTable::Racking.resolve("iridg"), "ironridge");
        assert_eq!(AliasTable::Racking.resolve("snr"), "snapnrack");
    }

    #[test]
    fn test_inverter_shorthand() {
        assert_eq!(AliasTable::Inverter.resolve("tsla"), "tesla");
        assert_eq!(AliasTable::Inverter.resolve("enphaseenergy"), "enphase");
    }

    #[test]
    fn test_unknown_passthrough() {
        assert_eq!(AliasTable::Attachment.resolve("flashfoot2"), "flashfoot2");
    }

    #[test]
    fn test_tables_are_separate() {
        assert_eq!(AliasTable::Attachment.resolve("qmpv"), "quickmountpv");
        assert_eq!(AliasTable::Racking.resolve("qmpv"), "qmpv");
    }

    #[test]
    fn test_canonical_names_resolve_to_themselves() {
        for table in [AliasTable::Racking, AliasTable::Attachment, AliasTable::Inverter] {
            for canonical in table.entries().values() {
                assert_eq!(table.resolve(canonical), *canonical, "{table}: {canonical}");
            }
        }
    }
}
