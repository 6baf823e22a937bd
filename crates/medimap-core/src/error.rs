use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents every failure the MediMap crates report. It uses the
/// `thiserror` crate for ergonomic error handling and automatic conversion
/// from underlying library errors.
///
/// # Error Conversion
///
/// Most errors automatically convert from their source types using the `#[from]` attribute:
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `csv::Error` → `AppError::CsvError`
/// - `std::io::Error` → `AppError::IoError`
///
/// # Examples
///
/// ```no_run
/// use medimap_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::RegionNotFound(94))
/// }
/// ```
///
/// An undefined percentage (zero national mean) is deliberately absent from
/// this enum: it is a result value, see [`crate::models::Ratio`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// Wraps every error from SQLx: unreachable server, pool exhaustion,
    /// malformed rows. Propagated unchanged to the caller.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// No region carries the requested stable code.
    #[error("Region not found: {0}")]
    RegionNotFound(i32),

    /// No region carries the requested internal id.
    #[error("Region not found (id {0})")]
    RegionIdNotFound(i32),

    /// No drug carries the requested internal id.
    #[error("Drug not found (id {0})")]
    DrugNotFound(i32),

    /// Caller input violates a documented precondition.
    ///
    /// Examples: a search term shorter than three characters, a year outside
    /// the accepted range, a CSV with negative totals.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Region-level aggregates for the year are already present in the store.
    #[error("Consumption facts for {0} are already loaded")]
    AlreadyLoaded(i32),

    /// CSV input could not be read or decoded.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// File system failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file error.
    ///
    /// This error occurs when reading or parsing the configuration file fails,
    /// such as when sources.toml is malformed or points nowhere.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic application error for cases not covered by specific variants.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") {
                    "Cannot connect to database. Is PostgreSQL running?\n   Check DATABASE_URL."
                        .to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::RegionNotFound(code) => {
                format!(
                    "Unknown region code: {}\n   List known regions with: medimap regions",
                    code
                )
            }
            AppError::ValidationError(msg) => format!("Invalid input: {}", msg),
            AppError::AlreadyLoaded(year) => {
                format!(
                    "Data for {} is already loaded.\n   Re-run with --replace to reload it.",
                    year
                )
            }
            AppError::CsvError(e) => {
                format!("Could not read CSV input: {}\n   Check the source file format.", e)
            }
            AppError::ConfigError(msg) => {
                format!(
                    "Configuration error: {}\n   Check your sources.toml file.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is a transient store failure.
    ///
    /// Nothing in MediMap retries on its own; this only classifies errors for
    /// callers and logs.
    ///
    /// # Examples
    ///
    /// ```
    /// use medimap_core::error::AppError;
    ///
    /// let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
    /// assert!(err.is_retryable());
    ///
    /// // Unknown region codes never become valid by retrying
    /// let err = AppError::RegionNotFound(99);
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::DatabaseError(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }

    /// Returns true if the error was caused by the caller rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::RegionNotFound(_)
                | AppError::RegionIdNotFound(_)
                | AppError::DrugNotFound(_)
                | AppError::ValidationError(_)
        )
    }
}
