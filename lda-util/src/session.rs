//! Per-document inference state.
//!
//! ```text
//! Initialized --> Sampling --> Accumulating --> Done
//!      |                                        ^
//!      +----------------------------------------+  (no known words)
//! ```
//!
//! Known words start with a topic drawn uniformly from `[0, num_topics)`.
//! Each sweep revisits every position once. After `burn_in` sweeps the
//! histogram of every further sweep, divided by
//! `(max_iter - burn_in) * num_words`, is added to the accumulated
//! distribution.

use crate::gibbs::TopicUpdater;
use crate::topic_model::TopicModel;
use fnv::FnvHashMap as HashMap;
use log::warn;
use rand::rngs::SmallRng;
use rand::Rng;

/// Document-local topic counts; topics with zero count are absent.
pub type TopicHistogram = HashMap<usize, usize>;

/// Topic id to probability mass.
pub type TopicDistribution = HashMap<usize, f64>;

#[inline]
pub fn local_count(histogram: &TopicHistogram, topic: usize) -> usize {
    histogram.get(&topic).copied().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initialized,
    Sampling,
    Accumulating,
    Done,
}

/// Mutable state of one document while its topics are inferred.
pub struct InferenceSession<'m> {
    model: &'m TopicModel,
    terms: Vec<Box<str>>,
    words: Vec<usize>,
    assignment: Vec<usize>,
    histogram: TopicHistogram,
    unknown: Vec<Box<str>>,
    accumulated: TopicDistribution,
    burn_in: usize,
    max_iter: usize,
    sweeps: usize,
    state: SessionState,
}

impl<'m> InferenceSession<'m> {
    /// Split `tokens` into known and unknown terms, and give each known
    /// word a uniformly random initial topic.
    pub fn new<S: AsRef<str>>(
        model: &'m TopicModel,
        tokens: &[S],
        burn_in: usize,
        max_iter: usize,
        rng: &mut SmallRng,
    ) -> Self {
        let num_topics = model.num_topics();
        let mut terms = vec![];
        let mut words = vec![];
        let mut assignment = vec![];
        let mut histogram = TopicHistogram::default();
        let mut unknown = vec![];

        for token in tokens {
            let token = token.as_ref();
            match model.lookup_word_id(token) {
                Some(w) if model.is_modeled(w) => {
                    let topic = rng.random_range(0..num_topics);
                    terms.push(token.into());
                    words.push(w);
                    assignment.push(topic);
                    *histogram.entry(topic).or_insert(0) += 1;
                }
                _ => {
                    warn!("unknown term: {}", token);
                    unknown.push(token.into());
                }
            }
        }

        let state = if words.is_empty() || max_iter == 0 {
            SessionState::Done
        } else {
            SessionState::Initialized
        };

        InferenceSession {
            model,
            terms,
            words,
            assignment,
            histogram,
            unknown,
            accumulated: TopicDistribution::default(),
            burn_in,
            max_iter,
            sweeps: 0,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn model(&self) -> &TopicModel {
        self.model
    }

    pub fn words(&self) -> &[usize] {
        &self.words
    }

    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    pub fn histogram(&self) -> &TopicHistogram {
        &self.histogram
    }

    pub fn unknown_terms(&self) -> &[Box<str>] {
        &self.unknown
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    fn accumulates(&self) -> bool {
        self.burn_in < self.max_iter
    }

    /// Run one full sweep and advance the state machine.
    pub fn step<U: TopicUpdater + ?Sized>(
        &mut self,
        updater: &mut U,
        rng: &mut SmallRng,
    ) -> SessionState {
        if self.state == SessionState::Done {
            return self.state;
        }

        self.sweep(updater, rng);
        let n = self.sweeps;
        self.sweeps += 1;

        if n >= self.burn_in {
            let denom = ((self.max_iter - self.burn_in) * self.words.len()) as f64;
            for (&topic, &count) in self.histogram.iter() {
                *self.accumulated.entry(topic).or_insert(0.0) += count as f64 / denom;
            }
        }

        self.state = if self.sweeps >= self.max_iter {
            SessionState::Done
        } else if n >= self.burn_in {
            SessionState::Accumulating
        } else {
            SessionState::Sampling
        };

        self.state
    }

    /// Sweep until `max_iter` sweeps are done.
    pub fn run<U: TopicUpdater + ?Sized>(&mut self, updater: &mut U, rng: &mut SmallRng) {
        while self.step(updater, rng) != SessionState::Done {}
    }

    fn sweep<U: TopicUpdater + ?Sized>(&mut self, updater: &mut U, rng: &mut SmallRng) {
        for i in 0..self.words.len() {
            let old_topic = self.assignment[i];
            let new_topic = updater.update(self.words[i], old_topic, &self.histogram, rng);
            if new_topic != old_topic {
                self.move_position(i, old_topic, new_topic);
            }
        }
    }

    fn move_position(&mut self, i: usize, old_topic: usize, new_topic: usize) {
        if let Some(count) = self.histogram.get_mut(&old_topic) {
            *count -= 1;
            if *count == 0 {
                self.histogram.remove(&old_topic);
            }
        }
        *self.histogram.entry(new_topic).or_insert(0) += 1;
        self.assignment[i] = new_topic;
    }

    /// Consume the session. The distribution is the accumulated one, or
    /// the raw terminal histogram when no sweep was past burn-in.
    pub fn finish(self) -> InferenceResult {
        let distribution = if self.accumulates() {
            self.accumulated
        } else {
            self.histogram
                .iter()
                .map(|(&t, &c)| (t, c as f64))
                .collect()
        };

        InferenceResult {
            terms: self.terms,
            words: self.words,
            assignment: self.assignment,
            unknown: self.unknown,
            histogram: self.histogram,
            distribution,
            sweeps: self.sweeps,
        }
    }
}

/// What a finished session hands back to the caller.
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Known terms, in input order
    pub terms: Vec<Box<str>>,
    /// Word ids of the known terms
    pub words: Vec<usize>,
    /// Final topic of each known term
    pub assignment: Vec<usize>,
    /// Terms absent from the model, in input order
    pub unknown: Vec<Box<str>>,
    /// Final document-local topic counts
    pub histogram: TopicHistogram,
    /// Final topic distribution
    pub distribution: TopicDistribution,
    /// Number of sweeps performed
    pub sweeps: usize,
}

impl InferenceResult {
    /// Number of input terms, known and unknown.
    pub fn doc_len(&self) -> usize {
        self.terms.len() + self.unknown.len()
    }

    /// All input terms: known ones first, then unknown ones.
    pub fn all_terms(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .chain(self.unknown.iter())
            .map(|x| x.as_ref())
    }

    /// Distribution entries above `min_prob`, by ascending topic id.
    pub fn sorted_distribution(&self, min_prob: f64) -> Vec<(usize, f64)> {
        let mut ret: Vec<(usize, f64)> = self
            .distribution
            .iter()
            .filter(|&(_, &p)| p > min_prob)
            .map(|(&t, &p)| (t, p))
            .collect();
        ret.sort_by_key(|&(t, _)| t);
        ret
    }
}
