//! Error types raised while building predicates and their collaborators.
//!
//! Evaluation itself never fails: every contract that could break on the hot
//! path is checked once, when the predicate or its column block is built.

use arrow::datatypes::DataType;
use thiserror::Error;

/// Construction-time contract violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No field with this name exists in the schema.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    /// Column ordinal does not address a column of the batch.
    #[error("Column ordinal {column_id} out of range for batch with {num_columns} columns")]
    ColumnOutOfRange {
        /// Requested ordinal.
        column_id: usize,
        /// Number of columns available.
        num_columns: usize,
    },
    /// The column exists but the operator cannot be applied to its type.
    #[error("Unsupported operator {op} for column '{column}' of type {data_type:?}")]
    UnsupportedOperator {
        /// Column name.
        column: String,
        /// Column data type.
        data_type: DataType,
        /// Operator name.
        op: &'static str,
    },
    /// The array handed to a column block does not hold string or binary cells.
    #[error("Unsupported column type {0:?}; expected string, binary or a dictionary of them")]
    UnsupportedType(DataType),
}

/// Failure to compile a LIKE pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern was translated to a regex that the engine rejected.
    #[error("invalid LIKE pattern '{pattern}': {source}")]
    Regex {
        /// Original LIKE pattern.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Errors surfaced by secondary index iterators.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index could not be read.
    #[error("index read failed: {0}")]
    Read(String),
}

impl IndexError {
    /// Construct a read error from a message.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }
}
