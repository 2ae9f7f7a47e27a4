use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdequacyError {
    /// An input table is missing one or more required columns.
    /// Reported before any computation, with every missing column at once.
    #[error("{table} is missing required columns: {}", .columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Degenerate AFE factor, unresolved join key, missing group label,
    /// or a group-key mismatch between intermediate summaries.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
