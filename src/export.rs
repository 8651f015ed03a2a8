use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::errors::AppError;
use crate::models::{CompanyRecord, Identifier};

/// Schema-stable flat projection of a [`CompanyRecord`].
///
/// Nested lists are folded into scalar columns: dataset codes join into one
/// delimited cell, the rating history collapses to its latest grade/date plus
/// a count, and ratio snapshots ship as one JSON cell. Every record produces
/// the same column set, which is the point.
#[derive(Debug, Serialize)]
pub struct FlatProfileRow {
    pub id: Identifier,
    pub duns: String,
    pub display_name: String,
    pub country_of_registration: String,
    pub homepage: String,
    pub short_description: String,
    pub company_type: String,
    pub credit_rating_value: String,
    pub credit_rating_description: String,
    pub datasets: String,
    pub compliance_flag_adverse_media: bool,
    pub compliance_flag_enforcements: bool,
    pub compliance_flag_state_owned: bool,
    pub compliance_flag_persons_of_interest: bool,
    pub compliance_flag_current_sanctions: bool,
    pub compliance_flag_former_sanctions: bool,
    pub compliance_flag_current_peps: bool,
    pub compliance_flag_former_peps: bool,
    pub security_rating_count: usize,
    pub latest_security_grade: String,
    pub latest_security_date: String,
    pub financial_ratios: String,
}

impl FlatProfileRow {
    pub fn from_record(record: &CompanyRecord) -> Result<Self, AppError> {
        let financial_ratios = serde_json::to_string(&record.financial_ratios)
            .map_err(|e| AppError::Export(format!("serializing ratio snapshots: {}", e)))?;
        let flags = record.compliance.flags;

        Ok(Self {
            id: record.id.clone(),
            duns: record.duns.clone(),
            display_name: record.display_name.clone(),
            country_of_registration: record.country_of_registration.clone(),
            homepage: record.homepage.clone(),
            short_description: record.short_description.clone(),
            company_type: record.company_type.clone(),
            credit_rating_value: record.credit_score.current_rating.value.clone(),
            credit_rating_description: record.credit_score.current_rating.description.clone(),
            datasets: record.compliance.datasets.join("|"),
            compliance_flag_adverse_media: flags.adverse_media,
            compliance_flag_enforcements: flags.enforcements,
            compliance_flag_state_owned: flags.state_owned,
            compliance_flag_persons_of_interest: flags.persons_of_interest,
            compliance_flag_current_sanctions: flags.current_sanctions,
            compliance_flag_former_sanctions: flags.former_sanctions,
            compliance_flag_current_peps: flags.current_peps,
            compliance_flag_former_peps: flags.former_peps,
            security_rating_count: record.security_ratings.len(),
            latest_security_grade: record.latest_security_grade.clone(),
            latest_security_date: record.latest_security_date.clone(),
            financial_ratios,
        })
    }
}

/// Write flattened records to a CSV file. Returns the number of rows written.
pub fn write_csv(records: &[CompanyRecord], path: impl AsRef<Path>) -> Result<usize, AppError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let written = write_records(records, file)?;
    tracing::info!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}

/// Writer-based variant of [`write_csv`].
pub fn write_records<W: Write>(records: &[CompanyRecord], writer: W) -> Result<usize, AppError> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut written = 0;

    for record in records {
        writer.serialize(FlatProfileRow::from_record(record)?)?;
        written += 1;
    }

    writer
        .flush()
        .map_err(|e| AppError::Export(format!("flushing CSV output: {}", e)))?;

    Ok(written)
}
