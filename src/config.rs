use crate::query::IdentifierBinding;

/// Runtime configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
    pub batch_size: usize,
    pub id_binding: IdentifierBinding,
    pub ids_file: String,
    pub id_column: String,
    pub csv_output: String,
    pub database_url: Option<String>, // Optional Postgres sink
    pub fragments_file: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_base_url: std::env::var("PROFILE_API_URL")
                .map_err(|_| anyhow::anyhow!("PROFILE_API_URL environment variable required"))
                .and_then(|raw| {
                    if raw.trim().is_empty() {
                        anyhow::bail!("PROFILE_API_URL cannot be empty");
                    }
                    let parsed = url::Url::parse(&raw)
                        .map_err(|e| anyhow::anyhow!("PROFILE_API_URL is not a valid URL: {}", e))?;
                    if parsed.scheme() != "http" && parsed.scheme() != "https" {
                        anyhow::bail!("PROFILE_API_URL must start with http:// or https://");
                    }
                    Ok(raw)
                })?,
            api_key: std::env::var("PROFILE_API_KEY")
                .map_err(|_| anyhow::anyhow!("PROFILE_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("PROFILE_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            request_timeout_secs: std::env::var("PROFILE_API_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("PROFILE_API_TIMEOUT_SECS must be a number of seconds")
                })?,
            batch_size: std::env::var("BATCH_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("BATCH_SIZE must be a number"))
                .and_then(|size| {
                    if !(1..=500).contains(&size) {
                        anyhow::bail!("BATCH_SIZE must be between 1 and 500");
                    }
                    Ok(size)
                })?,
            id_binding: IdentifierBinding::parse(
                &std::env::var("ID_BINDING").unwrap_or_else(|_| "id".to_string()),
            )
            .map_err(|e| anyhow::anyhow!("{}", e))?,
            ids_file: std::env::var("IDS_FILE")
                .map_err(|_| anyhow::anyhow!("IDS_FILE environment variable required"))
                .and_then(|path| {
                    if path.trim().is_empty() {
                        anyhow::bail!("IDS_FILE cannot be empty");
                    }
                    Ok(path)
                })?,
            id_column: std::env::var("ID_COLUMN").unwrap_or_else(|_| "id".to_string()),
            csv_output: std::env::var("CSV_OUTPUT")
                .unwrap_or_else(|_| "company_profiles.csv".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|raw| {
                    if !raw.starts_with("postgresql://") && !raw.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(raw)
                })
                .transpose()?,
            fragments_file: std::env::var("FRAGMENTS_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Profile API URL: {}", config.api_base_url);
        tracing::debug!(
            "Batch size: {}, timeout: {}s, binding: {}",
            config.batch_size,
            config.request_timeout_secs,
            config.id_binding
        );
        tracing::debug!("Id file: {} (column '{}')", config.ids_file, config.id_column);
        if config.database_url.is_some() {
            tracing::info!("Postgres sink enabled");
        }
        if let Some(ref fragments) = config.fragments_file {
            tracing::debug!("Fragment file: {}", fragments);
        }

        Ok(config)
    }
}
