use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::CompanyRecord;

/// Result of persisting one run.
#[derive(Debug)]
pub struct StoredRun {
    pub run_id: Uuid,
    pub rows: usize,
}

/// Postgres sink for flattened company profiles.
///
/// Rows are append-only and tagged with a per-run UUID, so repeated runs for
/// the same identifiers coexist and can be compared over time.
pub struct ProfileStorage {
    pool: PgPool,
}

impl ProfileStorage {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        // Fail fast on an unusable connection string
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    #[allow(dead_code)]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the target table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS company_profiles (
                run_id UUID NOT NULL,
                fetched_at TIMESTAMPTZ NOT NULL,
                company_id TEXT NOT NULL,
                duns TEXT NOT NULL,
                display_name TEXT NOT NULL,
                country_of_registration TEXT NOT NULL,
                homepage TEXT NOT NULL,
                short_description TEXT NOT NULL,
                company_type TEXT NOT NULL,
                credit_rating_value TEXT NOT NULL,
                credit_rating_description TEXT NOT NULL,
                datasets JSONB NOT NULL,
                compliance_flag_adverse_media BOOLEAN NOT NULL,
                compliance_flag_enforcements BOOLEAN NOT NULL,
                compliance_flag_state_owned BOOLEAN NOT NULL,
                compliance_flag_persons_of_interest BOOLEAN NOT NULL,
                compliance_flag_current_sanctions BOOLEAN NOT NULL,
                compliance_flag_former_sanctions BOOLEAN NOT NULL,
                compliance_flag_current_peps BOOLEAN NOT NULL,
                compliance_flag_former_peps BOOLEAN NOT NULL,
                security_ratings JSONB NOT NULL,
                latest_security_grade TEXT NOT NULL,
                latest_security_date TEXT NOT NULL,
                financial_ratios JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating company_profiles table")?;

        Ok(())
    }

    /// Insert one row per record, all tagged with a fresh run id.
    ///
    /// Uses sequential inserts instead of a bulk statement for better sqlx
    /// compatibility; runs are batch-sized, not streaming.
    pub async fn store_run(&self, records: &[CompanyRecord]) -> Result<StoredRun, AppError> {
        let run_id = Uuid::new_v4();
        let fetched_at = Utc::now();

        for record in records {
            let flags = record.compliance.flags;
            sqlx::query(
                r#"
                INSERT INTO company_profiles (
                    run_id, fetched_at, company_id, duns, display_name,
                    country_of_registration, homepage, short_description,
                    company_type, credit_rating_value, credit_rating_description,
                    datasets,
                    compliance_flag_adverse_media, compliance_flag_enforcements,
                    compliance_flag_state_owned, compliance_flag_persons_of_interest,
                    compliance_flag_current_sanctions, compliance_flag_former_sanctions,
                    compliance_flag_current_peps, compliance_flag_former_peps,
                    security_ratings, latest_security_grade, latest_security_date,
                    financial_ratios
                )
                VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
                )
                "#,
            )
            .bind(run_id)
            .bind(fetched_at)
            .bind(record.id.to_string())
            .bind(&record.duns)
            .bind(&record.display_name)
            .bind(&record.country_of_registration)
            .bind(&record.homepage)
            .bind(&record.short_description)
            .bind(&record.company_type)
            .bind(&record.credit_score.current_rating.value)
            .bind(&record.credit_score.current_rating.description)
            .bind(Json(&record.compliance.datasets))
            .bind(flags.adverse_media)
            .bind(flags.enforcements)
            .bind(flags.state_owned)
            .bind(flags.persons_of_interest)
            .bind(flags.current_sanctions)
            .bind(flags.former_sanctions)
            .bind(flags.current_peps)
            .bind(flags.former_peps)
            .bind(Json(&record.security_ratings))
            .bind(&record.latest_security_grade)
            .bind(&record.latest_security_date)
            .bind(Json(&record.financial_ratios))
            .execute(&self.pool)
            .await
            .with_context(|| format!("inserting profile row for {}", record.id))?;
        }

        tracing::info!(
            "Stored {} profile rows under run {}",
            records.len(),
            run_id
        );

        Ok(StoredRun {
            run_id,
            rows: records.len(),
        })
    }
}
