//! Topic inference and query expansion with a pretrained LDA model.
//!
//! A [`TopicModel`] is loaded once and shared read-only. Each document
//! gets its own [`InferenceSession`], driven sweep by sweep by one of the
//! [`UpdateStrategy`] updaters. The resulting topic distribution feeds a
//! [`QueryExpander`], which turns a short query into a weighted bag of
//! related terms.

/// Gzip-aware line readers and writers
pub mod common_io;

/// Load-time and configuration errors
pub mod error;

/// Term string <-> dense word id bijection
pub mod vocabulary;

/// Word-topic counts and topic totals of a pretrained model
pub mod topic_model;

/// Collapsed Gibbs sampler and categorical draws
pub mod gibbs;

/// Precomputed R-values and the greedy real-time predictor
pub mod realtime;

/// Per-document inference state machine
pub mod session;

/// Strategy selection and the per-document driver
pub mod inference;

/// Topic-term table and weighted query expansion
pub mod expansion;

pub use error::ModelError;
pub use expansion::{ExpandedQuery, ExpansionConfig, QueryExpander, TopicTermTable};
pub use inference::{InferenceConfig, LdaInference, UpdateStrategy};
pub use session::{InferenceResult, InferenceSession, SessionState};
pub use topic_model::{ModelLoadOptions, TermKind, TopicModel};
