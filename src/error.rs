use std::fmt;

#[derive(Debug)]
pub enum QuoteError {
    /// A category partition (or the side tables) could not be loaded or
    /// decoded. Distinct from "no results" so callers can offer a retry.
    DatasetLoad { category: String, reason: String },
    Io(std::io::Error),
    InvalidCategory(String),
}

impl QuoteError {
    pub(crate) fn dataset_load(category: impl Into<String>, reason: impl fmt::Display) -> Self {
        QuoteError::DatasetLoad {
            category: category.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures a caller may retry; false for bad input.
    pub fn is_transient(&self) -> bool {
        matches!(self, QuoteError::DatasetLoad { .. } | QuoteError::Io(_))
    }
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteError::DatasetLoad { category, reason } => {
                write!(f, "failed to load {category} quotes: {reason}")
            }
            QuoteError::Io(err) => write!(f, "io error: {err}"),
            QuoteError::InvalidCategory(name) => write!(f, "unknown category type {name:?}"),
        }
    }
}

impl std::error::Error for QuoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuoteError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for QuoteError {
    fn from(value: std::io::Error) -> Self {
        QuoteError::Io(value)
    }
}
