//! Parse session documents (TOML and JSON).

use std::path::Path;

use crate::types::{FormulaError, SessionDocument};

/// Parse a session document from a TOML string.
pub fn parse_toml(content: &str) -> Result<SessionDocument, FormulaError> {
    toml::from_str(content).map_err(|e| FormulaError::Parse(e.to_string()))
}

/// Parse a session document from a JSON string.
pub fn parse_json(content: &str) -> Result<SessionDocument, FormulaError> {
    serde_json::from_str(content).map_err(|e| FormulaError::Parse(e.to_string()))
}

/// Load a session document from a file path (auto-detect TOML vs JSON by extension).
pub fn load_document(path: &Path) -> Result<SessionDocument, FormulaError> {
    let content = std::fs::read_to_string(path)?;
    let mut document = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml(&content)?,
        Some("json") => parse_json(&content)?,
        _ => parse_json(&content).or_else(|_| parse_toml(&content))?,
    };
    if document.oil.is_some() && document.is_formula() {
        return Err(FormulaError::Parse(format!(
            "{}: a document describes either one oil or a formula, not both",
            path.display()
        )));
    }
    document.source = path.display().to_string();
    Ok(document)
}

/// Write a session document: TOML for `.toml` paths, pretty JSON otherwise.
pub fn save_document(path: &Path, document: &SessionDocument) -> Result<(), FormulaError> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            toml::to_string_pretty(document).map_err(|e| FormulaError::Serialize(e.to_string()))?
        }
        _ => {
            let mut json = serde_json::to_string_pretty(document)
                .map_err(|e| FormulaError::Serialize(e.to_string()))?;
            json.push('\n');
            json
        }
    };
    std::fs::write(path, content)?;
    Ok(())
}
