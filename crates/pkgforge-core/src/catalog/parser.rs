//! TOML catalog parser with helpful error messages

use super::schema::CatalogFile;
use crate::error::{DeriveError, Result};
use std::path::Path;

/// Parse a catalog file from disk
pub fn parse_catalog(path: &Path) -> Result<CatalogFile> {
    let content = std::fs::read_to_string(path).map_err(|source| DeriveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_catalog_str(&content).map_err(|e| match e {
        DeriveError::Catalog { reason } => DeriveError::Catalog {
            reason: format!("{}: {}", path.display(), reason),
        },
        other => other,
    })
}

/// Parse catalog content from string
pub fn parse_catalog_str(content: &str) -> Result<CatalogFile> {
    let catalog: CatalogFile =
        toml::from_str(content).map_err(|e| enhance_toml_error(&e, content))?;

    for definition in &catalog.types {
        definition
            .validate()
            .map_err(|reason| DeriveError::Catalog { reason })?;
    }

    Ok(catalog)
}

/// Attach the offending lines to a TOML parse error
fn enhance_toml_error(error: &toml::de::Error, content: &str) -> DeriveError {
    let message = error.message().to_string();

    let reason = match error.span() {
        Some(span) => {
            let offset = span.start.min(content.len());
            let line_num = content[..offset].matches('\n').count() + 1;
            format!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                get_line_context(content, line_num),
                message
            )
        }
        None => format!("TOML parsing error: {}", message),
    };

    DeriveError::Catalog { reason }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
