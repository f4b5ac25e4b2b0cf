//! Collapsed Gibbs sampler for topic assignment in an unseen document.
//!
//! For position `i` holding word `w` currently assigned topic `old`, the
//! unnormalized posterior over candidate topic `t` is
//!
//! ```text
//! posterior(t) = count(w, t) / total(t) * (n_t - [t == old] + alpha)
//! ```
//!
//! where `n_t` is the document-local count of topic `t`. Only topics with
//! `count(w, t) > 0` are candidates; all others have zero mass and are
//! never enumerated.

use crate::session::{local_count, TopicHistogram};
use crate::topic_model::TopicModel;
use rand::rngs::SmallRng;
use rand::Rng;

/// One position update: choose a new topic for a word given the current
/// document-local topic counts (which still include the word itself).
pub trait TopicUpdater {
    /// Return the new topic of `word_id`, currently assigned `old_topic`.
    fn update(
        &mut self,
        word_id: usize,
        old_topic: usize,
        histogram: &TopicHistogram,
        rng: &mut SmallRng,
    ) -> usize;
}

/// How a word's own assignment is removed from the local count of its
/// current topic before resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionPolicy {
    /// Always subtract one from the old topic's count
    Exact,
    /// Subtract one only while the old topic's count is positive, so the
    /// adjusted count never goes below zero
    Sparse,
}

/// Collapsed Gibbs sampler bound to a read-only [`TopicModel`].
pub struct GibbsSampler<'m> {
    model: &'m TopicModel,
    alpha: f64,
    policy: ExclusionPolicy,
    /// Scratch space for the candidate `(topic, mass)` pairs
    posterior: Vec<(usize, f64)>,
}

impl<'m> GibbsSampler<'m> {
    /// `alpha` must be positive; [`crate::inference::InferenceConfig`]
    /// checks this before a sampler is built.
    pub fn new(model: &'m TopicModel, alpha: f64, policy: ExclusionPolicy) -> Self {
        debug_assert!(alpha > 0.0);
        GibbsSampler {
            model,
            alpha,
            policy,
            posterior: Vec::new(),
        }
    }

    pub fn exact(model: &'m TopicModel, alpha: f64) -> Self {
        Self::new(model, alpha, ExclusionPolicy::Exact)
    }

    pub fn sparse(model: &'m TopicModel, alpha: f64) -> Self {
        Self::new(model, alpha, ExclusionPolicy::Sparse)
    }

    pub fn policy(&self) -> ExclusionPolicy {
        self.policy
    }

    /// Fill `out` with the unnormalized posterior over the word's topics,
    /// in ascending topic order.
    pub fn topic_posterior(
        &self,
        word_id: usize,
        old_topic: usize,
        histogram: &TopicHistogram,
        out: &mut Vec<(usize, f64)>,
    ) {
        out.clear();
        for &(topic, count) in self.model.word_topic_distribution(word_id) {
            let p_w_t = self.model.word_given_topic(count, topic);
            let local = local_count(histogram, topic) as f64;

            let adjusted = match self.policy {
                ExclusionPolicy::Exact => {
                    if topic == old_topic {
                        local - 1.0
                    } else {
                        local
                    }
                }
                ExclusionPolicy::Sparse => {
                    if topic == old_topic && local > 0.0 {
                        local - 1.0
                    } else {
                        local
                    }
                }
            };

            out.push((topic, p_w_t * (adjusted + self.alpha)));
        }
    }
}

impl TopicUpdater for GibbsSampler<'_> {
    fn update(
        &mut self,
        word_id: usize,
        old_topic: usize,
        histogram: &TopicHistogram,
        rng: &mut SmallRng,
    ) -> usize {
        let mut posterior = std::mem::take(&mut self.posterior);
        self.topic_posterior(word_id, old_topic, histogram, &mut posterior);
        let sampled = sample_categorical(&mut posterior, rng).unwrap_or(old_topic);
        self.posterior = posterior;
        sampled
    }
}

/// Draw one category from unnormalized `(category, mass)` pairs.
///
/// The masses are overwritten with their running cumulative sum; the
/// first category whose cumulative sum reaches a uniform draw in
/// `[0, total)` wins. Falls back to a uniform pick among the categories
/// when the total mass is not positive. Returns `None` only for an empty
/// slice.
pub fn sample_categorical(masses: &mut [(usize, f64)], rng: &mut impl Rng) -> Option<usize> {
    let last = masses.last()?.0;

    let mut cum = 0.0;
    for (_, mass) in masses.iter_mut() {
        cum += *mass;
        *mass = cum;
    }

    if cum <= 0.0 || !cum.is_finite() {
        let i = rng.random_range(0..masses.len());
        return Some(masses[i].0);
    }

    let u: f64 = rng.random::<f64>() * cum;
    Some(
        masses
            .iter()
            .find(|&&(_, c)| c >= u)
            .map(|&(k, _)| k)
            .unwrap_or(last),
    )
}
