//! Error taxonomy for the cleaning and recommendation stages.
//!
//! All fallible library operations return [`Result`].

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecError>;

#[derive(Debug, Error)]
pub enum RecError {
    /// A required column is absent from a source table. Fatal for the
    /// cleaning stage; no partial output is written.
    #[error("missing required column '{column}' in the {table} source")]
    MissingColumn {
        column: &'static str,
        table: &'static str,
    },

    /// A value could not be coerced to an item id.
    #[error("cannot coerce '{value}' to an item id")]
    BadItemId { value: String },

    /// A clean artifact could not be read. Points back at the cleaning
    /// stage, since there is no fallback once it hasn't run.
    #[error("cannot read artifact at {path} (run the cleaning stage first): {source}")]
    MissingArtifact {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The persisted matrix artifact does not parse back into a
    /// user-item matrix.
    #[error("malformed matrix artifact: {0}")]
    MalformedMatrix(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("identity mapping serialization error: {0}")]
    Mapping(#[from] serde_json::Error),
}
