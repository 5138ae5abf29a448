//! Constituent Registry: reference toxicological values for known constituents.
//!
//! Names are joined case- and accent-insensitively, so `Limonene`, `limonène`
//! and `LIMONENE` all resolve to the same entry. Greek letter prefixes are
//! spelled out (`α-pinène` matches `alpha-pinene`).

use crate::model::Constituent;

/// One row of the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryEntry {
    /// Reference spelling.
    pub name: &'static str,
    /// Alternative spellings, usually English.
    pub aliases: &'static [&'static str],
    /// NOAEL in mg/kg/day.
    pub noael: Option<f64>,
    /// IFRA limit in the finished product (%).
    pub ifra_limit: Option<f64>,
    /// CIR limit (%).
    pub cir_limit: Option<f64>,
    /// Suspected carcinogen, mutagen or reprotoxic.
    pub cmr: bool,
}

const fn entry(
    name: &'static str,
    aliases: &'static [&'static str],
    noael: Option<f64>,
    ifra_limit: Option<f64>,
    cir_limit: Option<f64>,
) -> RegistryEntry {
    RegistryEntry {
        name,
        aliases,
        noael,
        ifra_limit,
        cir_limit,
        cmr: false,
    }
}

static ENTRIES: &[RegistryEntry] = &[
    entry("eugénol", &[], Some(450.0), Some(0.5), None),
    entry("cinnamaldéhyde", &["cinnamaldehyde", "cinnamic aldehyde"], Some(220.0), Some(0.05), None),
    entry("1,8-cinéole", &["eucalyptol", "cineole"], Some(500.0), None, None),
    entry("menthol", &[], Some(200.0), None, Some(5.4)),
    entry("citral", &[], Some(100.0), Some(0.6), None),
    entry("linalool", &["linalol"], Some(500.0), Some(2.0), None),
    entry("limonène", &["d-limonene"], Some(600.0), None, None),
    entry("α-pinène", &[], Some(650.0), None, None),
    entry("β-pinène", &[], Some(600.0), None, None),
    entry("camphre", &["camphor"], Some(300.0), None, None),
    entry("menthone", &[], Some(400.0), None, None),
    entry("pulegone", &["pulegon"], Some(20.0), None, None),
    entry("menthofurane", &["menthofuran"], Some(15.0), None, None),
    entry("thuyone", &["thujone"], Some(10.0), None, None),
    RegistryEntry {
        cmr: true,
        ..entry("estragole", &["methyl chavicol"], Some(50.0), None, None)
    },
    entry("anéthole", &["anethole", "trans-anethole"], Some(300.0), None, None),
    entry("géraniol", &[], Some(400.0), None, None),
    entry("nérol", &[], Some(400.0), None, None),
    entry("isoeugénol", &[], None, Some(0.02), None),
];

/// Returns the full registry in reference order.
pub fn entries() -> &'static [RegistryEntry] {
    ENTRIES
}

/// Folds a constituent name into its join key.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        match ch {
            'à' | 'á' | 'â' | 'ä' | 'ã' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'í' | 'ì' | 'î' | 'ï' => out.push('i'),
            'ó' | 'ò' | 'ô' | 'ö' => out.push('o'),
            'ú' | 'ù' | 'û' | 'ü' => out.push('u'),
            'ç' => out.push('c'),
            'α' => out.push_str("alpha"),
            'β' => out.push_str("beta"),
            'γ' => out.push_str("gamma"),
            c if c.is_whitespace() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Finds the registry entry for `name`, if any.
pub fn lookup(name: &str) -> Option<&'static RegistryEntry> {
    let key = normalize_name(name);
    if key.is_empty() {
        return None;
    }
    ENTRIES.iter().find(|e| {
        normalize_name(e.name) == key || e.aliases.iter().any(|a| normalize_name(a) == key)
    })
}

/// Fills missing reference values of `constituent` from the registry.
///
/// Values already present on the constituent are kept. The CMR flag is only
/// ever raised, never cleared.
pub fn enrich(constituent: &Constituent) -> Constituent {
    let mut enriched = constituent.clone();
    if let Some(reference) = lookup(&constituent.name) {
        enriched.noael = enriched.noael.or(reference.noael);
        enriched.ifra_limit = enriched.ifra_limit.or(reference.ifra_limit);
        enriched.cir_limit = enriched.cir_limit.or(reference.cir_limit);
        enriched.cmr |= reference.cmr;
    }
    enriched
}

/// Enriches every constituent of a list.
pub fn enrich_all(constituents: &[Constituent]) -> Vec<Constituent> {
    constituents.iter().map(enrich).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_ignores_case_and_accents() {
        let entry = lookup("Limonene").unwrap();
        assert_eq!(entry.name, "limonène");
        assert_eq!(lookup("LIMONÈNE").unwrap().name, "limonène");
        assert_eq!(lookup("  eugenol ").unwrap().noael, Some(450.0));
    }

    #[test]
    fn lookup_spells_out_greek_prefixes() {
        assert_eq!(lookup("alpha-pinene").unwrap().noael, Some(650.0));
        assert_eq!(lookup("β-Pinène").unwrap().noael, Some(600.0));
    }

    #[test]
    fn lookup_uses_aliases() {
        assert_eq!(lookup("Eucalyptol").unwrap().name, "1,8-cinéole");
        assert_eq!(lookup("thujone").unwrap().noael, Some(10.0));
        assert!(lookup("patchoulol").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn enrich_fills_only_missing_values() {
        let mut menthol = Constituent::new("Menthol", 0.4);
        menthol.noael = Some(150.0);
        let enriched = enrich(&menthol);
        assert_eq!(enriched.noael, Some(150.0));
        assert_eq!(enriched.cir_limit, Some(5.4));
        assert_eq!(enriched.ifra_limit, None);
        assert_eq!(enriched.name, "Menthol");
    }

    #[test]
    fn enrich_raises_cmr_flag() {
        let enriched = enrich(&Constituent::new("Estragole", 0.8));
        assert!(enriched.cmr);
        assert_eq!(enriched.noael, Some(50.0));
    }

    #[test]
    fn isoeugenol_has_only_an_ifra_limit() {
        let entry = lookup("isoeugenol").unwrap();
        assert_eq!(entry.noael, None);
        assert_eq!(entry.ifra_limit, Some(0.02));
        assert_eq!(entries().len(), 19);
    }
}
