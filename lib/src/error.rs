//! Error types for chain construction, schema propagation and persistence.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Error type for every chain, transform and container operation.
///
/// None of these are retried internally: a failure at stage *k* aborts the
/// whole propagation, application or load.
#[derive(Debug, Error)]
pub enum ChainError {
    // ── Construction ─────────────────────────────────────────────────

    /// A structural invariant was broken by the caller.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    // ── Schema ───────────────────────────────────────────────────────

    /// A stage rejected the type of a column flowing into it.
    #[error(
        "schema mismatch{}: column '{column}' expected {expected}, got {actual}",
        stage_suffix(.stage, .transform)
    )]
    SchemaMismatch {
        /// Chain position of the rejecting stage, when known.
        stage: Option<usize>,
        /// Loader key of the rejecting transform, when known.
        transform: Option<String>,
        column: String,
        expected: String,
        actual: String,
    },

    /// A stage required a column that the incoming schema does not have.
    #[error(
        "missing column '{column}'{}",
        stage_suffix(.stage, .transform)
    )]
    MissingColumn {
        stage: Option<usize>,
        transform: Option<String>,
        column: String,
    },

    // ── Capability ───────────────────────────────────────────────────

    /// A row mapper was requested from something that cannot map rows.
    #[error("capability violation: {0}")]
    CapabilityViolation(String),

    // ── Format / version ─────────────────────────────────────────────

    /// The stream ended before an entity finished reading its payload.
    #[error("unexpected end of stream: {0}")]
    UnexpectedEndOfStream(String),

    /// The persisted entity is not of the kind the caller asked for.
    #[error("wrong entity kind: expected '{expected}', found '{found}'")]
    WrongEntityKind { expected: String, found: String },

    /// No factory is registered for the persisted loader key.
    #[error("unknown format: no loader registered for '{0}'")]
    UnknownFormat(String),

    /// The persisted entity needs a format version this build cannot read.
    #[error(
        "unsupported format version for '{signature}': file {found:#010x}, supported {supported:#010x} ({reason})"
    )]
    UnsupportedFormatVersion {
        signature: String,
        found: u32,
        supported: u32,
        reason: String,
    },

    /// An entity left unread bytes in its section.
    #[error("framing error in section '{section}': {remaining} trailing bytes")]
    Framing { section: String, remaining: usize },

    /// A named section does not exist in the container.
    #[error("missing section '{0}'")]
    MissingSection(String),

    /// A named section was written twice.
    #[error("duplicate section '{0}'")]
    DuplicateSection(String),

    /// Encoding or decoding of a payload failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading or writing a container file.
    #[error("I/O error: {0}")]
    Io(String),

    // ── Data ─────────────────────────────────────────────────────────

    /// A row value did not match its declared column type.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Empty data provided where rows were required.
    #[error("empty data: {0}")]
    EmptyData(String),
}

fn stage_suffix(stage: &Option<usize>, transform: &Option<String>) -> String {
    match (stage, transform) {
        (Some(stage), Some(name)) => format!(" at stage {stage} ({name})"),
        (Some(stage), None) => format!(" at stage {stage}"),
        (None, Some(name)) => format!(" in {name}"),
        (None, None) => String::new(),
    }
}

impl ChainError {
    /// Build a schema mismatch without stage context.
    pub fn schema_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl std::fmt::Display,
    ) -> Self {
        ChainError::SchemaMismatch {
            stage: None,
            transform: None,
            column: column.into(),
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }

    /// Build a missing-column error without stage context.
    pub fn missing_column(column: impl Into<String>) -> Self {
        ChainError::MissingColumn {
            stage: None,
            transform: None,
            column: column.into(),
        }
    }

    /// Attach the chain position and transform name to a schema error.
    ///
    /// Context already set by a nested chain is kept, so the innermost
    /// failing stage is the one reported.
    pub fn at_stage(self, index: usize, name: &str) -> Self {
        match self {
            ChainError::SchemaMismatch {
                stage: None,
                transform: None,
                column,
                expected,
                actual,
            } => ChainError::SchemaMismatch {
                stage: Some(index),
                transform: Some(name.to_string()),
                column,
                expected,
                actual,
            },
            ChainError::MissingColumn {
                stage: None,
                transform: None,
                column,
            } => ChainError::MissingColumn {
                stage: Some(index),
                transform: Some(name.to_string()),
                column,
            },
            other => other,
        }
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<bincode::Error> for ChainError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                ChainError::UnexpectedEndOfStream(io.to_string())
            }
            ref other => ChainError::Serialization(other.to_string()),
        }
    }
}
