use fnv::FnvHashMap as HashMap;

/// Bijection between term strings and dense word ids.
///
/// Ids are handed out in insertion order, so the `i`-th distinct term
/// registered gets id `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    term_to_id: HashMap<Box<str>, usize>,
    terms: Vec<Box<str>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `term`, registering it first if it is new.
    pub fn get_or_insert(&mut self, term: &str) -> usize {
        if let Some(&id) = self.term_to_id.get(term) {
            return id;
        }
        let id = self.terms.len();
        let term: Box<str> = term.into();
        self.term_to_id.insert(term.clone(), id);
        self.terms.push(term);
        id
    }

    pub fn lookup(&self, term: &str) -> Option<usize> {
        self.term_to_id.get(term).copied()
    }

    pub fn term(&self, word_id: usize) -> Option<&str> {
        self.terms.get(word_id).map(|x| x.as_ref())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[Box<str>] {
        &self.terms
    }
}
