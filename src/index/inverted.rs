use std::collections::{BTreeMap, HashMap};
use fst::{Automaton, IntoStreamer, Set, Streamer};
use crate::analysis::token::Token;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{IndexStatistics, TermStats};
use crate::core::types::{DocId, StoredDocument};
use crate::index::posting::{Posting, PostingList};

/// Inverted index for one field namespace.
///
/// The builder fills one of these per commit batch; the reader merges the
/// committed batches back into a single instance.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    pub postings: BTreeMap<String, PostingList>,
    pub field_lengths: BTreeMap<DocId, u32>,
    pub stored: BTreeMap<DocId, StoredDocument>,
    pub total_field_length: u64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, doc_id: DocId, tokens: &[Token], original: Option<String>) -> Result<()> {
        if self.field_lengths.contains_key(&doc_id) {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("document {} indexed twice", doc_id),
            ));
        }

        // Group token positions by term
        let mut term_positions: HashMap<&str, Vec<u32>> = HashMap::new();
        for token in tokens {
            term_positions.entry(token.text.as_str())
                .or_default()
                .push(token.position);
        }

        for (term, mut positions) in term_positions {
            positions.sort_unstable();
            self.postings.entry(term.to_string())
                .or_default()
                .add_posting(Posting::new(doc_id, positions));
        }

        self.field_lengths.insert(doc_id, tokens.len() as u32);
        self.total_field_length += tokens.len() as u64;
        self.stored.insert(doc_id, StoredDocument::new(doc_id, original));

        Ok(())
    }

    /// Absorbs another index over a disjoint document set.
    pub fn merge(&mut self, other: InvertedIndex) -> Result<()> {
        if let Some(dup) = other.field_lengths.keys().find(|id| self.field_lengths.contains_key(id)) {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("document {} present in more than one segment", dup),
            ));
        }

        for (term, list) in other.postings {
            self.postings.entry(term).or_default().merge(list);
        }
        self.field_lengths.extend(other.field_lengths);
        self.stored.extend(other.stored);
        self.total_field_length += other.total_field_length;
        Ok(())
    }

    pub fn doc_count(&self) -> usize {
        self.field_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_lengths.is_empty()
    }

    pub fn search_term(&self, term: &str) -> Option<&PostingList> {
        self.postings.get(term)
    }

    pub fn term_stats(&self, term: &str) -> Option<TermStats> {
        self.postings.get(term).map(|list| TermStats {
            doc_freq: list.doc_freq(),
            total_freq: list.total_freq(),
        })
    }

    pub fn field_length(&self, doc_id: DocId) -> Option<u32> {
        self.field_lengths.get(&doc_id).copied()
    }

    pub fn statistics(&self) -> IndexStatistics {
        IndexStatistics {
            total_docs: self.field_lengths.len() as u64,
            total_field_length: self.total_field_length,
            unique_terms: self.postings.len() as u64,
        }
    }

    /// Get an iterator over all terms in byte order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.postings.clear();
        self.field_lengths.clear();
        self.stored.clear();
        self.total_field_length = 0;
    }
}

/// Term dictionary using FST
///
/// Immutable set of every term in an index, searchable with any
/// [`fst::Automaton`] (Levenshtein, prefix, or their intersection).
pub struct TermDictionary {
    set: Set<Vec<u8>>,
}

impl TermDictionary {
    pub fn build<'a, I>(sorted_terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let set = Set::from_iter(sorted_terms)?;
        Ok(TermDictionary { set })
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Terms accepted by the automaton, in byte order.
    pub fn search<A: Automaton>(&self, automaton: A) -> Vec<String> {
        let mut stream = self.set.search(automaton).into_stream();
        let mut matches = Vec::new();
        while let Some(bytes) = stream.next() {
            if let Ok(term) = std::str::from_utf8(bytes) {
                matches.push(term.to_string());
            }
        }
        matches
    }

    /// First `max_terms` terms in byte order, or all of them.
    pub fn terms(&self, max_terms: Option<usize>) -> Vec<String> {
        let limit = max_terms.unwrap_or(usize::MAX);
        let mut stream = self.set.stream();
        let mut terms = Vec::new();
        while terms.len() < limit {
            match stream.next() {
                Some(bytes) => terms.push(String::from_utf8_lossy(bytes).into_owned()),
                None => break,
            }
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fst::automaton::Str;

    fn tokens(words: &[&str]) -> Vec<Token> {
        words.iter()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
            .collect()
    }

    fn sample() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.add_document(DocId(2), &tokens(&["dog", "sat", "log", "dog"]), None).unwrap();
        index.add_document(DocId(1), &tokens(&["cat", "sat", "mat"]), Some("cat sat mat".into())).unwrap();
        index
    }

    #[test]
    fn postings_and_statistics() {
        let index = sample();
        let sat = index.search_term("sat").unwrap();
        let ids: Vec<u64> = sat.iter().map(|p| p.doc_id.0).collect();
        assert_eq!(ids, vec![1, 2]);

        let dog = index.search_term("dog").unwrap().get(DocId(2)).unwrap();
        assert_eq!(dog.term_freq, 2);
        assert_eq!(dog.positions, vec![0, 3]);

        let stats = index.statistics();
        assert_eq!(stats.total_docs, 2);
        assert_eq!(stats.total_field_length, 7);
        assert!((stats.avg_field_length() - 3.5).abs() < 1e-6);
        assert_eq!(index.term_stats("sat").unwrap().doc_freq, 2);
        assert_eq!(index.field_length(DocId(2)), Some(4));
    }

    #[test]
    fn duplicate_document_is_rejected() {
        let mut index = sample();
        assert!(index.add_document(DocId(1), &tokens(&["again"]), None).is_err());
    }

    #[test]
    fn merge_keeps_postings_sorted() {
        let mut left = InvertedIndex::new();
        left.add_document(DocId(10), &tokens(&["cat"]), None).unwrap();
        left.merge(sample()).unwrap();
        let ids: Vec<u64> = left.search_term("cat").unwrap().iter().map(|p| p.doc_id.0).collect();
        assert_eq!(ids, vec![1, 10]);
        assert_eq!(left.doc_count(), 3);
        assert!(left.merge(sample()).is_err());
    }

    #[test]
    fn dictionary_prefix_search() {
        let index = sample();
        let dict = TermDictionary::build(index.terms()).unwrap();
        assert_eq!(dict.len(), 5);
        assert!(!dict.is_empty());
        assert_eq!(dict.search(Str::new("d").starts_with()), vec!["dog"]);
        assert_eq!(dict.terms(Some(2)), vec!["cat", "dog"]);
    }
}
