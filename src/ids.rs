use regex::Regex;
use std::io::Read;
use std::path::Path;

use crate::errors::{AppError, ResultExt};
use crate::models::Identifier;

/// Read the identifier column of a CSV file.
///
/// Numeric cells coerce to the numeric identifier variant, everything else
/// stays textual. Blank cells are skipped.
pub fn read_ids_from_csv(
    path: impl AsRef<Path>,
    column: &str,
) -> Result<Vec<Identifier>, AppError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(AppError::Io)
        .context(format!("opening id file {}", path.display()))?;
    let ids = read_ids(file, column)?;
    tracing::info!("Read {} identifiers from {}", ids.len(), path.display());
    Ok(ids)
}

/// Reader-based variant of [`read_ids_from_csv`].
pub fn read_ids<R: Read>(reader: R, column: &str) -> Result<Vec<Identifier>, AppError> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader.headers()?.clone();
    let column_index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| {
            AppError::BadInput(format!(
                "id column '{}' not found in CSV header [{}]",
                column,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(raw) = record.get(column_index) {
            if !raw.trim().is_empty() {
                ids.push(Identifier::parse(raw));
            }
        }
    }

    Ok(ids)
}

/// Validate a domain-name identifier.
///
/// Checks for:
/// - Minimum length and at least one dot
/// - No scheme/path noise (the API expects a bare registered domain)
/// - Valid label structure per hostname rules
pub fn is_valid_domain(domain: &str) -> bool {
    // Basic checks
    if domain.len() < 4 || !domain.contains('.') {
        return false;
    }

    if domain.contains("://") || domain.contains('/') || domain.contains('@') {
        tracing::warn!("Invalid domain identifier (URL noise): {}", domain);
        return false;
    }

    // Hostname labels: alphanumeric with inner hyphens, dot separated,
    // alphabetic TLD of at least two characters
    let domain_regex = Regex::new(
        r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*\.[a-zA-Z]{2,}$",
    )
    .unwrap();

    if !domain_regex.is_match(domain) {
        tracing::warn!("Invalid domain identifier format: {}", domain);
        return false;
    }

    true
}

/// Keep only identifiers usable for a domain-name lookup.
///
/// Numeric identifiers and malformed domains are dropped with a warning;
/// the caller fetches the remainder.
pub fn retain_valid_domains(ids: Vec<Identifier>) -> Vec<Identifier> {
    let total = ids.len();
    let kept: Vec<Identifier> = ids
        .into_iter()
        .filter(|id| match id.as_text() {
            Some(text) => is_valid_domain(text),
            None => {
                tracing::warn!("Dropping numeric identifier {} for domain lookup", id);
                false
            }
        })
        .collect();

    if kept.len() < total {
        tracing::warn!(
            "Dropped {} of {} identifiers not usable as domains",
            total - kept.len(),
            total
        );
    }

    kept
}
