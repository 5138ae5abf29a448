//! GC-MS lab report import.
//!
//! A report is comma-delimited text: one header line, then one
//! `name,percentage[,...]` line per constituent. Percentages are plain numbers
//! and become fractions by dividing by 100.

use std::collections::BTreeMap;

use essence_core::forms::OilDraft;
use essence_core::model::Constituent;
use tracing::{debug, warn};

use crate::types::ImportError;

/// Parses one data line into `(name, percentage)`.
fn parse_row(line: &str) -> Option<(&str, f64)> {
    let mut tokens = line.split(',').map(str::trim);
    let name = tokens.next().filter(|n| !n.is_empty())?;
    let percentage = tokens
        .next()?
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())?;
    Some((name, percentage))
}

/// Scans the data lines of a report into `(name, percentage)` rows.
fn scan(text: &str) -> Result<Vec<(&str, f64)>, ImportError> {
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed GC-MS rows");
    }
    if rows.is_empty() {
        warn!("GC-MS import produced no constituents");
        return Err(ImportError::NoRows);
    }
    Ok(rows)
}

/// Parses a report into constituents, in file order.
///
/// Malformed lines are skipped. Fails only when no line is usable.
pub fn parse_gcms(text: &str) -> Result<Vec<Constituent>, ImportError> {
    Ok(scan(text)?
        .into_iter()
        .map(|(name, percentage)| Constituent::new(name, percentage / 100.0))
        .collect())
}

/// Replaces the constituents of `draft` with the rows of a report.
///
/// Also records the raw `name -> percentage` map, where a repeated name keeps
/// its last value. The input draft is never modified.
pub fn apply_import(draft: &OilDraft, text: &str) -> Result<OilDraft, ImportError> {
    let rows = scan(text)?;
    debug!(oil = %draft.name, rows = rows.len(), "applied GC-MS import");

    let raw: BTreeMap<String, f64> = rows
        .iter()
        .map(|(name, percentage)| ((*name).to_owned(), *percentage))
        .collect();
    let constituents = rows
        .into_iter()
        .map(|(name, percentage)| Constituent::new(name, percentage / 100.0))
        .collect();

    Ok(OilDraft {
        constituents,
        gc_ms_data: Some(raw),
        ..draft.clone()
    })
}

/// Parses a fraction typed into a form field.
///
/// Unparsable or non-finite input reads as 0; anything else is clamped
/// to [0, 1].
pub fn parse_fraction_input(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = "name,pct\nLinalool,35.5\nLimonene,20\nbad_row\nGeraniol,12.25";

    #[test]
    fn parses_reference_report() {
        let constituents = parse_gcms(REPORT).unwrap();
        let got: Vec<(&str, f64)> = constituents
            .iter()
            .map(|c| (c.name.as_str(), c.fraction))
            .collect();
        assert_eq!(got, vec![("Linalool", 0.355), ("Limonene", 0.20), ("Geraniol", 0.1225)]);
    }

    #[test]
    fn skips_rows_with_bad_numbers_or_names() {
        let text = "header\n,12\nCamphor,abc\nCamphor,NaN\nCamphor,inf\n\n  \nMenthol , 40 , extra\n";
        let constituents = parse_gcms(text).unwrap();
        assert_eq!(constituents.len(), 1);
        assert_eq!(constituents[0].name, "Menthol");
        assert_eq!(constituents[0].fraction, 0.4);
    }

    #[test]
    fn header_only_report_fails() {
        assert_eq!(parse_gcms("name,pct\n"), Err(ImportError::NoRows));
        assert_eq!(parse_gcms(""), Err(ImportError::NoRows));
        // The first line is always the header, even when it looks like data.
        assert_eq!(parse_gcms("Linalool,35"), Err(ImportError::NoRows));
    }

    #[test]
    fn import_replaces_constituents_and_records_raw_map() {
        let draft = OilDraft {
            name: "Lavender".into(),
            constituents: vec![Constituent::new("old", 0.5)],
            ..OilDraft::default()
        };
        let imported = apply_import(&draft, REPORT).unwrap();
        assert_eq!(imported.name, "Lavender");
        assert_eq!(imported.constituents.len(), 3);
        let raw = imported.gc_ms_data.unwrap();
        assert_eq!(raw["Geraniol"], 12.25);
    }

    #[test]
    fn duplicate_names_stay_in_list() {
        let imported = apply_import(&OilDraft::default(), "h\nLinalool,10\nLinalool,20").unwrap();
        assert_eq!(imported.constituents.len(), 2);
        let raw = imported.gc_ms_data.unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw["Linalool"], 20.0);
    }

    #[test]
    fn failed_import_leaves_draft_alone() {
        let draft = OilDraft {
            constituents: vec![Constituent::new("kept", 0.5)],
            ..OilDraft::default()
        };
        assert!(apply_import(&draft, "h\nnothing here").is_err());
        assert_eq!(draft.constituents[0].name, "kept");
    }

    #[test]
    fn fraction_input_clamps() {
        assert_eq!(parse_fraction_input("0.35"), 0.35);
        assert_eq!(parse_fraction_input("1.7"), 1.0);
        assert_eq!(parse_fraction_input("-0.2"), 0.0);
        assert_eq!(parse_fraction_input("abc"), 0.0);
        assert_eq!(parse_fraction_input(""), 0.0);
        assert_eq!(parse_fraction_input("NaN"), 0.0);
    }
}
