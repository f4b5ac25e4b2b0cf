//! Approximate real-time topic predictor.
//!
//! Instead of sampling, each position greedily takes the better of two
//! candidates:
//!
//! 1. the arg-max of `p(w|t) * (n_t - [t == old] + alpha)` over topics
//!    whose adjusted document-local count `n_t - [t == old]` is positive;
//! 2. the word's precomputed R-value `(argmax_t p(w|t), alpha * max_t p(w|t))`,
//!    which stands in for the smoothing term of topics absent from the
//!    document.
//!
//! The R-value wins only when its score is strictly larger. This is an
//! approximation of the collapsed Gibbs posterior, not a sampler.

use crate::gibbs::TopicUpdater;
use crate::session::{local_count, TopicHistogram};
use crate::topic_model::TopicModel;
use log::{debug, info, log_enabled, Level};
use rand::rngs::SmallRng;
use rayon::prelude::*;

/// Best topic of a word and its alpha-scaled probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RValue {
    pub topic: usize,
    pub score: f64,
}

/// Per-word R-values, precomputed once per model and alpha.
#[derive(Debug, Clone)]
pub struct RValueTable {
    alpha: f64,
    rvalues: Vec<Option<RValue>>,
}

impl RValueTable {
    /// Scan every word's nonzero topics for the one maximizing
    /// `count(w, t) / total(t)`. Ties go to the lowest topic id.
    pub fn new(model: &TopicModel, alpha: f64) -> Self {
        let rvalues: Vec<Option<RValue>> = (0..model.vocabulary_size())
            .into_par_iter()
            .map(|w| {
                let mut best: Option<RValue> = None;
                for &(topic, count) in model.word_topic_distribution(w) {
                    let p = model.word_given_topic(count, topic);
                    if best.is_none_or(|b| p > b.score) {
                        best = Some(RValue { topic, score: p });
                    }
                }
                best.map(|b| RValue {
                    topic: b.topic,
                    score: b.score * alpha,
                })
            })
            .collect();

        info!(
            "precomputed R-values for {} of {} words (alpha={})",
            rvalues.iter().filter(|r| r.is_some()).count(),
            rvalues.len(),
            alpha
        );

        if log_enabled!(Level::Debug) {
            for (w, r) in rvalues.iter().enumerate() {
                if let Some(r) = r {
                    debug!(
                        "word:{} topic:{} R={}",
                        model.vocabulary().term(w).unwrap_or("?"),
                        r.topic,
                        r.score
                    );
                }
            }
        }

        RValueTable { alpha, rvalues }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn get(&self, word_id: usize) -> Option<RValue> {
        self.rvalues.get(word_id).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.rvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rvalues.is_empty()
    }
}

/// Greedy updater backed by an [`RValueTable`].
pub struct RealtimePredictor<'m> {
    model: &'m TopicModel,
    rvalues: &'m RValueTable,
}

impl<'m> RealtimePredictor<'m> {
    pub fn new(model: &'m TopicModel, rvalues: &'m RValueTable) -> Self {
        RealtimePredictor { model, rvalues }
    }

    /// Arg-max over the word's topics that are present in the document
    /// after removing the word's own assignment.
    ///
    /// Topics with no local count are skipped (their smoothing mass is
    /// covered by the R-value), and so are topics whose only local count
    /// is the word itself. Ties go to the lowest topic id.
    pub fn local_argmax(
        &self,
        word_id: usize,
        old_topic: usize,
        histogram: &TopicHistogram,
    ) -> Option<(usize, f64)> {
        let alpha = self.rvalues.alpha();
        let mut best: Option<(usize, f64)> = None;

        for &(topic, count) in self.model.word_topic_distribution(word_id) {
            let local = local_count(histogram, topic);
            if local == 0 {
                continue;
            }
            let theta = if topic == old_topic { local - 1 } else { local };
            if theta == 0 {
                continue;
            }
            let score = self.model.word_given_topic(count, topic) * (theta as f64 + alpha);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((topic, score));
            }
        }

        best
    }

    /// Pick between the local arg-max and the R-value.
    pub fn choose(&self, word_id: usize, old_topic: usize, histogram: &TopicHistogram) -> usize {
        let local = self.local_argmax(word_id, old_topic, histogram);
        match (local, self.rvalues.get(word_id)) {
            (Some((_, score)), Some(r)) if r.score > score => r.topic,
            (Some((topic, _)), _) => topic,
            (None, Some(r)) => r.topic,
            (None, None) => old_topic,
        }
    }
}

impl TopicUpdater for RealtimePredictor<'_> {
    fn update(
        &mut self,
        word_id: usize,
        old_topic: usize,
        histogram: &TopicHistogram,
        _rng: &mut SmallRng,
    ) -> usize {
        self.choose(word_id, old_topic, histogram)
    }
}
