//! Error types for the genefold library.

use thiserror::Error;

/// Errors that can occur while normalizing rows or loading side tables.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The row's column count maps to no known table dialect.
    #[error("unrecognized column count: {0}")]
    UnrecognizedColumnCount(usize),

    /// One or more row fields failed validation. Carries every offending
    /// field name, not just the first.
    #[error("invalid fields: {}", .0.join(", "))]
    InvalidField(Vec<String>),

    /// A parse error occurred while reading a cross-reference table.
    #[error("{0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_lists_all_names() {
        let err = Error::InvalidField(vec!["txStart".to_string(), "exonCount".to_string()]);
        assert_eq!(err.to_string(), "invalid fields: txStart, exonCount");
    }

    #[test]
    fn unrecognized_column_count_message() {
        let err = Error::UnrecognizedColumnCount(13);
        assert_eq!(err.to_string(), "unrecognized column count: 13");
    }
}
