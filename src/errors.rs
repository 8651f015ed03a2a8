use std::fmt;

/// Run-level error types.
///
/// Everything that can stop the pipeline itself (bad configuration, missing
/// input file, database failure). Per-identifier fetch problems are *not*
/// modeled here; those are [`FetchFailure`] values recorded in the output
/// sequence and never abort a run.
#[derive(Debug)]
pub enum AppError {
    /// Invalid or missing configuration.
    Config(String),
    /// Filesystem error (id file, fragment file, export target).
    Io(std::io::Error),
    /// Database-related errors.
    Database(sqlx::Error),
    /// Malformed input data (id CSV, fragment JSON).
    BadInput(String),
    /// Error writing the export file.
    Export(String),
    /// Error interacting with the remote profile API outside the per-item
    /// fetch path (e.g. building the shared client).
    ExternalApi(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(e) => write!(f, "I/O error: {}", e),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::BadInput(msg) => write!(f, "Bad input: {}", msg),
            AppError::Export(msg) => write!(f, "Export error: {}", msg),
            AppError::ExternalApi(msg) => write!(f, "External API error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApi(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::BadInput(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Database(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Database(e)),
            context: f(),
        })
    }
}

// ============ Per-identifier fetch errors ============

/// Classification of a failed fetch for one identifier.
///
/// Every variant is recoverable at the item level: it terminates processing
/// of one identifier only and is recorded in the output sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// DNS/connection/timeout failure before a usable response arrived.
    Transport,
    /// The endpoint answered with a non-2xx status.
    HttpStatus,
    /// The response body could not be decoded into a company record.
    Decode,
    /// Anything uncategorized (e.g. a panicked fetch task).
    Unexpected,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FetchErrorKind::Transport => "transport",
            FetchErrorKind::HttpStatus => "http_status",
            FetchErrorKind::Decode => "decode",
            FetchErrorKind::Unexpected => "unexpected",
        };
        write!(f, "{}", label)
    }
}

/// A failed fetch for one identifier, before the identifier is attached.
///
/// [`crate::client::ProfileApiClient`] produces these internally and wraps
/// them into `FetchOutcome::Failure` together with the identifier.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchFailure {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Structural decode failure: the response carried no company object at all.
///
/// Sparse-but-present entities never produce this, since every optional
/// field has a default. Only a missing or null `data.company` wrapper does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decode error: {}", self.message)
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for FetchFailure {
    fn from(err: DecodeError) -> Self {
        FetchFailure::new(FetchErrorKind::Decode, err.message)
    }
}
