//! Query expansion from an inferred topic distribution.
//!
//! ```text
//! weight(term) += p(topic) * p(term|topic) * W_topic       for p(topic) > threshold
//! weight(term) += (1 - W_topic) / doc_len                  for each input term
//! ```

use crate::error::ModelError;
use crate::session::{InferenceResult, TopicDistribution};
use crate::topic_model::TopicModel;
use fnv::FnvHashMap as HashMap;

/// Per-topic term probabilities, each row normalized to sum to one.
#[derive(Debug, Clone, Default)]
pub struct TopicTermTable {
    rows: Vec<Vec<(Box<str>, f64)>>,
}

impl TopicTermTable {
    /// Column-normalize the model's word-topic counts.
    ///
    /// Terms within a row follow vocabulary order. Topics with a zero
    /// total get an empty row.
    pub fn from_model(model: &TopicModel) -> Self {
        let mut rows: Vec<Vec<(Box<str>, f64)>> = vec![vec![]; model.num_topics()];
        for (w, term) in model.vocabulary().terms().iter().enumerate() {
            for &(topic, count) in model.word_topic_distribution(w) {
                let p = model.word_given_topic(count, topic);
                if p > 0.0 {
                    rows[topic].push((term.clone(), p));
                }
            }
        }
        TopicTermTable { rows }
    }

    /// Build from raw weights; each row is normalized by its sum.
    pub fn from_rows(rows: Vec<Vec<(Box<str>, f64)>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| {
                let total: f64 = row.iter().map(|(_, w)| w).sum();
                if total > 0.0 {
                    row.into_iter().map(|(t, w)| (t, w / total)).collect()
                } else {
                    vec![]
                }
            })
            .collect();
        TopicTermTable { rows }
    }

    pub fn topic_terms(&self, topic: usize) -> &[(Box<str>, f64)] {
        self.rows.get(topic).map(|x| x.as_slice()).unwrap_or(&[])
    }

    pub fn num_topics(&self) -> usize {
        self.rows.len()
    }
}

/// Options for query expansion.
#[derive(Debug, Clone)]
pub struct ExpansionConfig {
    /// Share of mass taken from topical expansion, in `[0, 1]`. Default: 0.5
    pub topic_weight: f64,
    /// Topics at or below this probability are skipped. Default: 1e-4
    pub min_topic_prob: f64,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        ExpansionConfig {
            topic_weight: 0.5,
            min_topic_prob: 1e-4,
        }
    }
}

impl ExpansionConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(0.0..=1.0).contains(&self.topic_weight) {
            return Err(ModelError::InvalidParameter(format!(
                "topic weight must be in [0, 1], got {}",
                self.topic_weight
            )));
        }
        if self.min_topic_prob.is_nan() || self.min_topic_prob < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "minimum topic probability must be non-negative, got {}",
                self.min_topic_prob
            )));
        }
        Ok(())
    }
}

/// Blends topical terms with the literal input terms.
pub struct QueryExpander {
    table: TopicTermTable,
    config: ExpansionConfig,
}

impl QueryExpander {
    pub fn new(table: TopicTermTable, config: ExpansionConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(QueryExpander { table, config })
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    pub fn table(&self) -> &TopicTermTable {
        &self.table
    }

    /// Expand the terms of a finished inference.
    pub fn expand(&self, result: &InferenceResult) -> ExpandedQuery {
        let terms: Vec<&str> = result.all_terms().collect();
        self.expand_distribution(&result.distribution, &terms)
    }

    /// Expand `terms` (known and unknown alike) given a topic distribution.
    pub fn expand_distribution<S: AsRef<str>>(
        &self,
        distribution: &TopicDistribution,
        terms: &[S],
    ) -> ExpandedQuery {
        let w_topic = self.config.topic_weight;
        let mut weights: HashMap<Box<str>, f64> = HashMap::default();

        let mut topics: Vec<(usize, f64)> = distribution
            .iter()
            .filter(|&(_, &p)| p > self.config.min_topic_prob)
            .map(|(&t, &p)| (t, p))
            .collect();
        topics.sort_by_key(|&(t, _)| t);

        for (topic, p_topic) in topics {
            for (term, p_term) in self.table.topic_terms(topic) {
                *weights.entry(term.clone()).or_insert(0.0) += p_topic * p_term * w_topic;
            }
        }

        if !terms.is_empty() {
            let literal = (1.0 - w_topic) / terms.len() as f64;
            for term in terms {
                *weights.entry(term.as_ref().into()).or_insert(0.0) += literal;
            }
        }

        ExpandedQuery { weights }
    }
}

/// Weighted bag of terms; unordered until [`ExpandedQuery::sorted`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandedQuery {
    weights: HashMap<Box<str>, f64>,
}

impl ExpandedQuery {
    pub fn get(&self, term: &str) -> Option<f64> {
        self.weights.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Descending weight, ties broken by term.
    pub fn sorted(&self) -> Vec<(Box<str>, f64)> {
        let mut ret: Vec<(Box<str>, f64)> = self
            .weights
            .iter()
            .map(|(t, &w)| (t.clone(), w))
            .collect();
        ret.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ret
    }

    pub fn into_map(self) -> HashMap<Box<str>, f64> {
        self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic_model::ModelLoadOptions;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    fn row(items: &[(&str, f64)]) -> Vec<(Box<str>, f64)> {
        items.iter().map(|&(t, w)| (t.into(), w)).collect()
    }

    #[test]
    fn test_single_term_blend() {
        let table = TopicTermTable::from_rows(vec![row(&[("cat", 0.6), ("dog", 0.4)])]);
        let expander = QueryExpander::new(table, ExpansionConfig::default()).unwrap();

        let distribution: TopicDistribution = HashMap::from_iter([(0, 1.0)]);
        let expanded = expander.expand_distribution(&distribution, &["cat"]);

        assert_eq!(expanded.len(), 2);
        assert_abs_diff_eq!(expanded.get("cat").unwrap(), 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(expanded.get("dog").unwrap(), 0.2, epsilon = 1e-12);

        let sorted = expanded.sorted();
        assert_eq!(sorted[0].0.as_ref(), "cat");
        assert_eq!(sorted[1].0.as_ref(), "dog");
    }

    #[test]
    fn test_unknown_only_document() {
        let table = TopicTermTable::from_rows(vec![row(&[("cat", 1.0)])]);
        let expander = QueryExpander::new(table, ExpansionConfig::default()).unwrap();

        let expanded =
            expander.expand_distribution(&TopicDistribution::default(), &["yak", "zebra"]);
        assert_eq!(expanded.len(), 2);
        assert_abs_diff_eq!(expanded.get("yak").unwrap(), 0.25);
        assert_abs_diff_eq!(expanded.get("zebra").unwrap(), 0.25);
        assert!(expanded.get("cat").is_none());
    }

    #[test]
    fn test_threshold_skips_unlikely_topics() {
        let table = TopicTermTable::from_rows(vec![row(&[("cat", 1.0)]), row(&[("car", 1.0)])]);
        let config = ExpansionConfig {
            topic_weight: 1.0,
            min_topic_prob: 0.01,
        };
        let expander = QueryExpander::new(table, config).unwrap();

        let distribution: TopicDistribution = HashMap::from_iter([(0, 0.995), (1, 0.005)]);
        let expanded = expander.expand_distribution(&distribution, &["cat"]);
        assert!(expanded.get("car").is_none());
        assert_abs_diff_eq!(expanded.get("cat").unwrap(), 0.995);
    }

    #[test]
    fn test_ties_sorted_by_term() {
        let table = TopicTermTable::default();
        let expander = QueryExpander::new(table, ExpansionConfig::default()).unwrap();
        let expanded =
            expander.expand_distribution(&TopicDistribution::default(), &["b", "c", "a"]);
        let sorted = expanded.sorted();
        let terms: Vec<&str> = sorted.iter().map(|(t, _)| t.as_ref()).collect();
        assert_eq!(terms, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_table_from_model_is_normalized() {
        let model = TopicModel::from_reader(
            Cursor::new("0 cat:10 dog:5\n2 car:1 bus:3\n"),
            &ModelLoadOptions::default(),
        )
        .unwrap();
        let table = TopicTermTable::from_model(&model);

        assert_eq!(table.num_topics(), 3);
        assert!(table.topic_terms(1).is_empty());
        assert!(table.topic_terms(7).is_empty());
        for t in [0, 2] {
            let total: f64 = table.topic_terms(t).iter().map(|(_, p)| p).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }
        assert_eq!(table.topic_terms(2)[1].0.as_ref(), "bus");
        assert_abs_diff_eq!(table.topic_terms(2)[1].1, 0.75);
    }

    #[test]
    fn test_rejects_bad_topic_weight() {
        let config = ExpansionConfig {
            topic_weight: 1.5,
            ..Default::default()
        };
        assert!(QueryExpander::new(TopicTermTable::default(), config).is_err());
    }
}
