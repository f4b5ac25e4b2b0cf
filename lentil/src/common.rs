#![allow(unused)]

pub use lda_util::common_io as io;
pub use lda_util::*;

pub use clap::{Args, Parser, Subcommand};

pub use log::info;
pub use std::time::Instant;

/// Model, sampler and expansion options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    #[arg(
        required = true,
        help = "Pretrained topic model file",
        long_help = "Pretrained topic model, one topic per line: \n\
		     `topic term:count term:count ...` \n\
		     Either plain text or gzipped (`.gz`)."
    )]
    pub model_file: Box<str>,

    #[arg(
        required = true,
        help = "Dirichlet smoothing parameter (> 0)",
        long_help = "Smoothing added to document-local topic counts. \n\
		     Must be a positive number. Example: 0.1"
    )]
    pub alpha: f64,

    #[arg(
        long,
        value_enum,
        default_value = "exact",
        help = "Topic update strategy",
        long_help = "How each word picks its next topic: \n\
		     exact: collapsed Gibbs sampling \n\
		     sparse: Gibbs sampling with the own-count floored at zero \n\
		     realtime: greedy choice against precomputed R-values (approximate)"
    )]
    pub strategy: UpdateStrategy,

    #[arg(
        long = "burn-in",
        default_value_t = 10,
        help = "Sweeps discarded before accumulation"
    )]
    pub burn_in: usize,

    #[arg(
        long = "max-iter",
        default_value_t = 100,
        help = "Total number of sweeps",
        long_help = "Total number of sweeps per query. \n\
		     With `--burn-in` >= `--max-iter` the raw topic counts \n\
		     of the last sweep are reported instead of an average."
    )]
    pub max_iter: usize,

    #[arg(long, help = "Random seed (default: seeded from the OS)")]
    pub seed: Option<u64>,

    #[arg(
        long = "num-topics",
        help = "Pre-size the topic table",
        long_help = "Pre-size the topic table to this many topics. \n\
		     Topic ids at or beyond it are rejected while loading."
    )]
    pub num_topics: Option<usize>,

    #[arg(
        long = "word-ids",
        default_value_t = false,
        help = "Model terms are integer word ids"
    )]
    pub word_ids: bool,

    #[arg(
        long = "topic-weight",
        default_value_t = 0.5,
        help = "Share of weight given to topical terms",
        long_help = "Share of the expanded weight taken by topical terms, in [0, 1]. \n\
		     The rest is split evenly over the literal query terms."
    )]
    pub topic_weight: f64,

    #[arg(
        long = "min-topic-prob",
        default_value_t = 1e-4,
        help = "Topics at or below this probability are not expanded"
    )]
    pub min_topic_prob: f64,
}

impl ModelArgs {
    pub fn load_options(&self) -> ModelLoadOptions {
        ModelLoadOptions {
            term_kind: if self.word_ids {
                TermKind::WordId
            } else {
                TermKind::Literal
            },
            num_topics: self.num_topics,
        }
    }

    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            alpha: self.alpha,
            burn_in: self.burn_in,
            max_iter: self.max_iter,
            strategy: self.strategy,
            seed: self.seed,
        }
    }

    pub fn expansion_config(&self) -> ExpansionConfig {
        ExpansionConfig {
            topic_weight: self.topic_weight,
            min_topic_prob: self.min_topic_prob,
        }
    }

    pub fn load_model(&self) -> anyhow::Result<TopicModel> {
        let model = TopicModel::load(&self.model_file, &self.load_options())?;
        Ok(model)
    }
}

/// Whitespace tokens of the positional query words, quoted or not.
pub fn query_tokens(query: &[Box<str>]) -> Vec<Box<str>> {
    query.iter().flat_map(|q| io::split_words(q.as_ref())).collect()
}
