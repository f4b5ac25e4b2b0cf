//! Sufficient statistics of a pretrained LDA model.
//!
//! # File format
//!
//! One topic per line, fields separated by tabs or spaces:
//!
//! ```text
//! topic_id  term:count  term:count ...
//! ```
//!
//! Depending on [`TermKind`], `term` is a literal vocabulary string or an
//! integer word id. Counts are non-negative floating-point numbers.
//!
//! # Layout
//!
//! Word-topic counts are stored as a flattened arena: the `(topic, count)`
//! entries of word `w` sit at `entries[offsets[w]..offsets[w + 1]]`,
//! sorted by topic id. A missing `(word, topic)` pair has count zero.

use crate::common_io::open_buf_reader;
use crate::error::ModelError;
use crate::vocabulary::Vocabulary;
use fnv::FnvHashMap as HashMap;
use log::info;
use std::io::BufRead;

/// Largest topic table a growable load will allocate; pass
/// [`ModelLoadOptions::num_topics`] to go beyond it.
pub const MAX_GROWABLE_TOPICS: usize = 1 << 20;

/// How the `term` half of a `term:count` pair is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermKind {
    /// Literal vocabulary strings
    #[default]
    Literal,
    /// Non-negative integer word ids
    WordId,
}

/// Options for [`TopicModel::load`].
#[derive(Debug, Clone, Default)]
pub struct ModelLoadOptions {
    /// Interpretation of the term fields. Default: literal strings
    pub term_kind: TermKind,
    /// Pre-size the topic table to this many topics and reject larger
    /// ids. `None` grows the table as larger ids appear. Default: `None`
    pub num_topics: Option<usize>,
}

/// Immutable word-topic count table plus per-topic totals.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicModel {
    vocab: Vocabulary,
    offsets: Vec<usize>,
    entries: Vec<(usize, f64)>,
    topic_totals: Vec<f64>,
}

impl TopicModel {
    /// Load a model file (optionally gzipped).
    pub fn load(model_file: &str, options: &ModelLoadOptions) -> Result<Self, ModelError> {
        info!("loading topic model: {}", model_file);
        Self::from_reader(open_buf_reader(model_file)?, options)
    }

    /// Parse a model from any buffered reader.
    pub fn from_reader<R: BufRead>(
        reader: R,
        options: &ModelLoadOptions,
    ) -> Result<Self, ModelError> {
        let mut builder = ModelBuilder::new(options);

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            builder.add_line(i + 1, &line)?;
        }

        let model = builder.build();

        info!(
            "loaded topic model: num_topics={}, vocabulary={}, entries={}",
            model.num_topics(),
            model.vocabulary_size(),
            model.num_entries()
        );

        Ok(model)
    }

    /// Nonzero `(topic, count)` pairs of a word, sorted by topic id.
    ///
    /// Empty for an unknown word id.
    #[inline]
    pub fn word_topic_distribution(&self, word_id: usize) -> &[(usize, f64)] {
        if word_id + 1 >= self.offsets.len() {
            return &[];
        }
        &self.entries[self.offsets[word_id]..self.offsets[word_id + 1]]
    }

    /// Count of `word_id` in `topic`; zero when absent.
    pub fn word_topic_count(&self, word_id: usize, topic: usize) -> f64 {
        let dist = self.word_topic_distribution(word_id);
        dist.binary_search_by_key(&topic, |&(t, _)| t)
            .map(|i| dist[i].1)
            .unwrap_or(0.0)
    }

    /// Sum of all word counts assigned to `topic`; zero when absent.
    #[inline]
    pub fn topic_total(&self, topic: usize) -> f64 {
        self.topic_totals.get(topic).copied().unwrap_or(0.0)
    }

    /// `p(w|t) = count(w, t) / total(t)`, given a count already looked up.
    #[inline]
    pub fn word_given_topic(&self, count: f64, topic: usize) -> f64 {
        let total = self.topic_total(topic);
        if total > 0.0 {
            count / total
        } else {
            0.0
        }
    }

    /// Size of the topic table.
    pub fn num_topics(&self) -> usize {
        self.topic_totals.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocab.len()
    }

    /// Number of nonzero `(word, topic)` entries.
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn lookup_word_id(&self, term: &str) -> Option<usize> {
        self.vocab.lookup(term)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// A word can be assigned a topic only if some topic holds a
    /// positive count for it.
    pub fn is_modeled(&self, word_id: usize) -> bool {
        self.word_topic_distribution(word_id)
            .iter()
            .any(|&(_, c)| c > 0.0)
    }
}

/// Accumulates parsed lines before the arena is laid out.
struct ModelBuilder<'a> {
    options: &'a ModelLoadOptions,
    vocab: Vocabulary,
    word_topics: Vec<HashMap<usize, f64>>,
    topic_totals: Vec<f64>,
}

impl<'a> ModelBuilder<'a> {
    fn new(options: &'a ModelLoadOptions) -> Self {
        ModelBuilder {
            options,
            vocab: Vocabulary::new(),
            word_topics: vec![],
            topic_totals: vec![0.0; options.num_topics.unwrap_or(0)],
        }
    }

    fn add_line(&mut self, line_no: usize, line: &str) -> Result<(), ModelError> {
        let mut fields = line.split_whitespace();

        let Some(topic_field) = fields.next() else {
            return Ok(());
        };

        let topic: usize = topic_field.parse().map_err(|_| {
            ModelError::malformed(
                line_no,
                format!("topic id {:?} is not a non-negative integer", topic_field),
            )
        })?;

        self.reserve_topic(line_no, topic)?;

        for item in fields {
            let (term, count) = parse_pair(line_no, item, self.options.term_kind)?;
            let word_id = self.vocab.get_or_insert(term);
            if word_id == self.word_topics.len() {
                self.word_topics.push(HashMap::default());
            }
            *self.word_topics[word_id].entry(topic).or_insert(0.0) += count;
            self.topic_totals[topic] += count;
        }

        Ok(())
    }

    fn reserve_topic(&mut self, line_no: usize, topic: usize) -> Result<(), ModelError> {
        match self.options.num_topics {
            Some(num_topics) if topic >= num_topics => Err(ModelError::TopicOutOfRange {
                line: line_no,
                topic,
                num_topics,
            }),
            Some(_) => Ok(()),
            None => {
                let needed = topic
                    .checked_add(1)
                    .filter(|&n| n <= MAX_GROWABLE_TOPICS)
                    .ok_or(ModelError::TopicOutOfRange {
                        line: line_no,
                        topic,
                        num_topics: MAX_GROWABLE_TOPICS,
                    })?;
                if needed > self.topic_totals.len() {
                    self.topic_totals.resize(needed, 0.0);
                }
                Ok(())
            }
        }
    }

    fn build(self) -> TopicModel {
        let mut offsets = Vec::with_capacity(self.word_topics.len() + 1);
        let mut entries = Vec::with_capacity(self.word_topics.iter().map(|x| x.len()).sum());

        offsets.push(0);
        for topics in self.word_topics {
            let mut row: Vec<(usize, f64)> = topics.into_iter().filter(|&(_, c)| c > 0.0).collect();
            row.sort_by_key(|&(t, _)| t);
            entries.extend(row);
            offsets.push(entries.len());
        }

        TopicModel {
            vocab: self.vocab,
            offsets,
            entries,
            topic_totals: self.topic_totals,
        }
    }
}

/// Split `term:count` at its last colon and validate both halves.
fn parse_pair(line_no: usize, item: &str, term_kind: TermKind) -> Result<(&str, f64), ModelError> {
    let (term, count_field) = item.rsplit_once(':').ok_or_else(|| {
        ModelError::malformed(line_no, format!("pair {:?} has no ':' separator", item))
    })?;

    if term.is_empty() {
        return Err(ModelError::malformed(
            line_no,
            format!("pair {:?} has an empty term", item),
        ));
    }

    if term_kind == TermKind::WordId && term.parse::<usize>().is_err() {
        return Err(ModelError::malformed(
            line_no,
            format!("word id {:?} is not a non-negative integer", term),
        ));
    }

    let count: f64 = count_field
        .parse()
        .ok()
        .filter(|c: &f64| c.is_finite() && *c >= 0.0)
        .ok_or_else(|| ModelError::InvalidCount {
            line: line_no,
            value: count_field.to_string(),
        })?;

    Ok((term, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    fn load_str(text: &str, options: &ModelLoadOptions) -> Result<TopicModel, ModelError> {
        TopicModel::from_reader(Cursor::new(text), options)
    }

    #[test]
    fn test_load_literal_terms() -> anyhow::Result<()> {
        let model = load_str(
            "0\tcat:10 dog:5\n1 car:10\tbus:5\n",
            &ModelLoadOptions::default(),
        )?;

        assert_eq!(model.num_topics(), 2);
        assert_eq!(model.vocabulary_size(), 4);
        assert_eq!(model.lookup_word_id("cat"), Some(0));
        assert_eq!(model.lookup_word_id("bus"), Some(3));
        assert_eq!(model.lookup_word_id("tree"), None);

        let cat = model.word_topic_distribution(0);
        assert_eq!(cat, &[(0, 10.0)]);
        assert_abs_diff_eq!(model.topic_total(0), 15.0);
        assert_abs_diff_eq!(model.topic_total(1), 15.0);
        assert_abs_diff_eq!(model.word_topic_count(0, 1), 0.0);
        assert_abs_diff_eq!(model.word_given_topic(10.0, 0), 10.0 / 15.0);
        Ok(())
    }

    #[test]
    fn test_unknown_word_has_empty_distribution() -> anyhow::Result<()> {
        let model = load_str("0 cat:1\n", &ModelLoadOptions::default())?;
        assert!(model.word_topic_distribution(7).is_empty());
        assert!(!model.is_modeled(7));
        assert_abs_diff_eq!(model.topic_total(9), 0.0);
        Ok(())
    }

    #[test]
    fn test_growable_topic_table_and_gaps() -> anyhow::Result<()> {
        let model = load_str("3 cat:2\n\n   \n0 cat:1 dog:1\n", &ModelLoadOptions::default())?;
        assert_eq!(model.num_topics(), 4);
        assert_abs_diff_eq!(model.topic_total(1), 0.0);
        assert_eq!(model.word_topic_distribution(0), &[(0, 1.0), (3, 2.0)]);
        Ok(())
    }

    #[test]
    fn test_duplicates_accumulate() -> anyhow::Result<()> {
        let model = load_str("0 cat:1 cat:2\n0 cat:3 dog:1\n", &ModelLoadOptions::default())?;
        assert_abs_diff_eq!(model.word_topic_count(0, 0), 6.0);
        assert_abs_diff_eq!(model.topic_total(0), 7.0);
        Ok(())
    }

    #[test]
    fn test_zero_counts_are_not_modeled() -> anyhow::Result<()> {
        let model = load_str("0 cat:0 dog:2\n", &ModelLoadOptions::default())?;
        let cat = model.lookup_word_id("cat").ok_or(anyhow::anyhow!("cat"))?;
        assert!(!model.is_modeled(cat));
        assert!(model.word_topic_distribution(cat).is_empty());
        Ok(())
    }

    #[test]
    fn test_word_id_terms() -> anyhow::Result<()> {
        let options = ModelLoadOptions {
            term_kind: TermKind::WordId,
            num_topics: Some(3),
        };
        let model = load_str("0 17:4 3:1\n2 3:5\n", &options)?;
        assert_eq!(model.num_topics(), 3);
        let w = model.lookup_word_id("3").ok_or(anyhow::anyhow!("3"))?;
        assert_eq!(model.word_topic_distribution(w), &[(0, 1.0), (2, 5.0)]);

        let err = load_str("0 cat:4\n", &options);
        assert!(matches!(err, Err(ModelError::Malformed { line: 1, .. })));
        Ok(())
    }

    #[test]
    fn test_presized_table_rejects_large_topic() {
        let options = ModelLoadOptions {
            num_topics: Some(2),
            ..Default::default()
        };
        let err = load_str("0 cat:1\n2 dog:1\n", &options);
        assert!(matches!(
            err,
            Err(ModelError::TopicOutOfRange {
                line: 2,
                topic: 2,
                num_topics: 2
            })
        ));
    }

    #[test]
    fn test_growable_table_rejects_huge_topic() {
        let options = ModelLoadOptions::default();
        for line in ["18446744073709551615 cat:1\n", "1000000000000 cat:1\n"] {
            assert!(matches!(
                load_str(line, &options),
                Err(ModelError::TopicOutOfRange {
                    line: 1,
                    num_topics: MAX_GROWABLE_TOPICS,
                    ..
                })
            ));
        }

        let last = format!("0 cat:1\n{} dog:1\n", MAX_GROWABLE_TOPICS - 1);
        assert!(load_str(&last, &options).is_ok());
    }

    #[test]
    fn test_malformed_lines() {
        let options = ModelLoadOptions::default();
        assert!(matches!(
            load_str("cat:1 dog:2\n", &options),
            Err(ModelError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            load_str("0 cat:1\n1 dog\n", &options),
            Err(ModelError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            load_str("0 :3\n", &options),
            Err(ModelError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_counts() {
        let options = ModelLoadOptions::default();
        for text in ["0 cat:abc\n", "0 cat:-1\n", "0 cat:\n", "0 cat:inf\n"] {
            assert!(
                matches!(load_str(text, &options), Err(ModelError::InvalidCount { line: 1, .. })),
                "{:?} should fail",
                text
            );
        }
    }
}
