//! Errors raised while loading a topic model or configuring inference.
//!
//! Any of these aborts the load: no partially built model is handed out.

use thiserror::Error;

/// Failure to build a [`crate::topic_model::TopicModel`] or to set up
/// inference against it.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model file could not be opened or read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be split into a topic id and `term:count` pairs
    #[error("malformed model line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A count field is not a non-negative number
    #[error("invalid count on model line {line}: {value:?}")]
    InvalidCount {
        /// 1-based line number
        line: usize,
        /// The offending field
        value: String,
    },

    /// A topic id does not fit a pre-sized topic table
    #[error("topic {topic} on model line {line} is out of range (num_topics = {num_topics})")]
    TopicOutOfRange {
        /// 1-based line number
        line: usize,
        /// Topic id found on the line
        topic: usize,
        /// Size of the pre-sized table
        num_topics: usize,
    },

    /// A hyperparameter or option is outside its domain
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ModelError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        ModelError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}
