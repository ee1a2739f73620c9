use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Instant;
use roaring::RoaringTreemap;
use tracing::{debug, warn};
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::TermStats;
use crate::core::types::DocId;
use crate::index::index_reader::IndexReader;
use crate::index::posting::PostingList;
use crate::query::ast::{BoolQuery, FuzzyQuery, PhraseQuery, Query};
use crate::query::builder::QueryBuilder;
use crate::query::parser::{sanitize_query, BooleanOperator, QueryParser};
use crate::scoring::scorer::{Scorer, Similarity};
use crate::search::fuzzy::{FuzzyConfig, FuzzyMatcher, MAX_EDITS};
use crate::search::results::{SearchResults, TopKCollector};

type DocScores = HashMap<DocId, f32>;

/// Executes queries against one opened index.
///
/// Holds no mutable state; share it between threads or build one per query.
pub struct Searcher<'a> {
    reader: &'a IndexReader,
    analyzer: Cow<'a, Analyzer>,
    similarity: Similarity,
    scorer: Box<dyn Scorer>,
    parser: QueryParser,
    fuzzy: FuzzyConfig,
}

impl<'a> Searcher<'a> {
    pub fn new(reader: &'a IndexReader, analyzer: &'a Analyzer, similarity: Similarity) -> Self {
        Self::with_analyzer(reader, Cow::Borrowed(analyzer), similarity)
    }

    /// Searcher using the analyzer and similarity recorded in the manifest.
    pub fn for_index(reader: &'a IndexReader) -> Result<Self> {
        Ok(Self::with_analyzer(reader, Cow::Owned(reader.analyzer()?), reader.similarity()))
    }

    fn with_analyzer(reader: &'a IndexReader, analyzer: Cow<'a, Analyzer>, similarity: Similarity) -> Self {
        if similarity != reader.similarity() {
            warn!(
                built_with = %reader.similarity(),
                requested = %similarity,
                "searching with a different similarity than the index was built with"
            );
        }
        if analyzer.config() != reader.analyzer_config() {
            warn!(
                built_with = reader.analyzer_config().name.as_str(),
                requested = analyzer.name(),
                "searching with a different analyzer than the index was built with"
            );
        }

        Searcher {
            reader,
            analyzer,
            similarity,
            scorer: similarity.scorer(),
            parser: QueryParser::default(),
            fuzzy: FuzzyConfig::default(),
        }
    }

    pub fn with_fuzzy(mut self, config: FuzzyConfig) -> Result<Self> {
        config.validate()?;
        self.fuzzy = config;
        Ok(self)
    }

    pub fn with_default_operator(mut self, operator: BooleanOperator) -> Self {
        self.parser.default_operator = operator;
        self
    }

    pub fn similarity(&self) -> Similarity {
        self.similarity
    }

    /// Parses and runs a classic query string.
    ///
    /// A string that does not parse is not an error: the result is empty and
    /// `skipped` holds the parse diagnostic.
    pub fn search(&self, query_str: &str, top_k: usize) -> Result<SearchResults> {
        check_top_k(top_k)?;
        let start = Instant::now();

        let sanitized = sanitize_query(query_str);
        let parsed = match self.parser.parse(&sanitized) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(query = query_str, error = %e, "query skipped");
                return Ok(SearchResults::skipped(e));
            }
        };

        let query = QueryBuilder::new(&self.analyzer, self.reader.field_name()).build(&parsed);
        let mut results = self.execute(&query, top_k)?;
        results.took_ms = start.elapsed().as_millis() as u64;
        Ok(results)
    }

    /// OR of one fuzzy clause per analyzed query term.
    pub fn fuzzy_search(&self, query_str: &str, top_k: usize, max_edits: i32) -> Result<SearchResults> {
        check_top_k(top_k)?;
        if max_edits < 0 {
            return Err(Error::invalid_argument(format!("max_edits must not be negative, got {}", max_edits)));
        }
        if max_edits > MAX_EDITS as i32 {
            return Err(Error::config(format!(
                "max_edits {} exceeds the supported maximum of {}", max_edits, MAX_EDITS
            )));
        }
        let start = Instant::now();

        let clauses = self.analyzer.terms(self.reader.field_name(), query_str)
            .into_iter()
            .map(|term| Query::fuzzy(term, max_edits as u8))
            .collect();

        let mut results = self.execute(&Query::any(clauses), top_k)?;
        results.took_ms = start.elapsed().as_millis() as u64;
        Ok(results)
    }

    /// Scores an already analyzed query.
    pub fn execute(&self, query: &Query, top_k: usize) -> Result<SearchResults> {
        check_top_k(top_k)?;

        let mut evaluation = Evaluation {
            searcher: self,
            idfs: Vec::new(),
            matchers: HashMap::new(),
        };
        let scores = evaluation.evaluate(query)?;
        let norm = self.scorer.query_norm(&evaluation.idfs);

        let mut collector = TopKCollector::new(top_k);
        for (doc_id, score) in &scores {
            collector.collect(*doc_id, score * norm);
        }
        let hits = collector.into_results();

        debug!(matched = scores.len(), returned = hits.len(), scorer = self.scorer.name(), "query executed");
        Ok(SearchResults {
            max_score: hits.first().map(|hit| hit.score).unwrap_or(0.0),
            total_hits: scores.len(),
            hits,
            took_ms: 0,
            skipped: None,
        })
    }
}

fn check_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(Error::new(ErrorKind::InvalidArgument, "top_k must be at least 1"));
    }
    Ok(())
}

// Per-execution state: idfs feed the query norm, matchers are cached per distance
struct Evaluation<'s, 'a> {
    searcher: &'s Searcher<'a>,
    idfs: Vec<f32>,
    matchers: HashMap<u8, FuzzyMatcher>,
}

impl Evaluation<'_, '_> {
    fn evaluate(&mut self, query: &Query) -> Result<DocScores> {
        match query {
            Query::Term(term) => Ok(self.term(&term.term)),
            Query::Phrase(phrase) => Ok(self.phrase(phrase)),
            Query::Bool(query) => self.boolean(query),
            Query::Fuzzy(fuzzy) => self.fuzzy(fuzzy),
            Query::MatchNone => Ok(DocScores::new()),
        }
    }

    fn idf(&self, postings: &PostingList) -> f32 {
        let stats = TermStats {
            doc_freq: postings.doc_freq(),
            total_freq: postings.total_freq(),
        };
        self.searcher.scorer.idf(&stats, self.searcher.reader.doc_count())
    }

    fn score(&self, doc_id: DocId, term_freq: f32, idf: f32) -> Option<f32> {
        let stats = self.searcher.reader.doc_stats(doc_id)?;
        Some(self.searcher.scorer.score(term_freq, idf, &stats))
    }

    fn term(&mut self, term: &str) -> DocScores {
        let reader = self.searcher.reader;
        let Some(postings) = reader.postings(term) else {
            return DocScores::new();
        };
        let idf = self.idf(postings);
        self.idfs.push(idf);

        postings.iter()
            .filter_map(|p| self.score(p.doc_id, p.term_freq as f32, idf).map(|s| (p.doc_id, s)))
            .collect()
    }

    fn phrase(&mut self, phrase: &PhraseQuery) -> DocScores {
        let reader = self.searcher.reader;
        let mut lists: Vec<(u32, &PostingList)> = Vec::with_capacity(phrase.terms.len());
        for (offset, term) in &phrase.terms {
            match reader.postings(term) {
                Some(list) => lists.push((*offset, list)),
                None => return DocScores::new(),
            }
        }
        let Some(&(lead_offset, lead)) = lists.iter().min_by_key(|(_, list)| list.len()) else {
            return DocScores::new();
        };

        let idf: f32 = lists.iter().map(|(_, list)| self.idf(list)).sum();
        self.idfs.push(idf);

        let mut scores = DocScores::new();
        'docs: for posting in lead.iter() {
            let mut members = Vec::with_capacity(lists.len());
            for (offset, list) in &lists {
                match list.get(posting.doc_id) {
                    Some(member) => members.push((*offset, member)),
                    None => continue 'docs,
                }
            }

            let freq = posting.positions.iter()
                .filter_map(|&position| position.checked_sub(lead_offset))
                .filter(|start| {
                    members.iter().all(|(offset, member)| member.positions.binary_search(&(start + offset)).is_ok())
                })
                .count();

            if freq > 0 {
                if let Some(score) = self.score(posting.doc_id, freq as f32, idf) {
                    scores.insert(posting.doc_id, score);
                }
            }
        }
        scores
    }

    fn boolean(&mut self, query: &BoolQuery) -> Result<DocScores> {
        if query.must.is_empty() && query.should.is_empty() {
            return Ok(DocScores::new());
        }

        let mut required: Option<DocScores> = None;
        for clause in &query.must {
            let scores = self.evaluate(clause)?;
            required = Some(match required {
                None => scores,
                Some(acc) => acc.into_iter()
                    .filter_map(|(doc, score)| scores.get(&doc).map(|s| (doc, score + s)))
                    .collect(),
            });
        }

        let mut optional = Vec::with_capacity(query.should.len());
        for clause in &query.should {
            optional.push(self.evaluate(clause)?);
        }

        let mut scores = match required {
            Some(mut acc) => {
                for clause_scores in optional {
                    for (doc, score) in clause_scores {
                        if let Some(total) = acc.get_mut(&doc) {
                            *total += score;
                        }
                    }
                }
                acc
            }
            None => {
                let mut acc = DocScores::new();
                for clause_scores in optional {
                    for (doc, score) in clause_scores {
                        *acc.entry(doc).or_insert(0.0) += score;
                    }
                }
                acc
            }
        };

        if !query.must_not.is_empty() {
            // Excluded terms do not take part in the query norm
            let scoring_idfs = self.idfs.len();
            let mut excluded = RoaringTreemap::new();
            for clause in &query.must_not {
                excluded.extend(self.evaluate(clause)?.into_keys().map(|doc| doc.0));
            }
            self.idfs.truncate(scoring_idfs);
            scores.retain(|doc, _| !excluded.contains(doc.0));
        }

        Ok(scores)
    }

    fn fuzzy(&mut self, query: &FuzzyQuery) -> Result<DocScores> {
        let matcher = match self.matchers.entry(query.max_edits) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(FuzzyMatcher::new(FuzzyConfig {
                max_edits: query.max_edits,
                ..self.searcher.fuzzy.clone()
            })?),
        };
        let expansions = matcher.expand(self.searcher.reader.dictionary(), &query.term);

        // Best contribution among the expanded terms, per document
        let mut scores = DocScores::new();
        for expansion in expansions {
            for (doc, score) in self.term(&expansion.term) {
                let best = scores.entry(doc).or_insert(score);
                if score > *best {
                    *best = score;
                }
            }
        }
        Ok(scores)
    }
}
