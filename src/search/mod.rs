pub mod executor;
pub mod fuzzy;
pub mod results;

use crate::analysis::analyzer::Analyzer;
use crate::core::error::Result;
use crate::index::index_reader::IndexReader;
use crate::scoring::scorer::Similarity;

pub use executor::Searcher;
pub use fuzzy::FuzzyConfig;
pub use results::{ScoredResult, SearchResults};

/// Runs a classic query against `index`, best `top_k` first.
pub fn search(
    index: &IndexReader,
    query_str: &str,
    top_k: usize,
    similarity: Similarity,
    analyzer: &Analyzer,
) -> Result<SearchResults> {
    Searcher::new(index, analyzer, similarity).search(query_str, top_k)
}

/// Matches every analyzed query term within `max_edits` edits (at most 2).
pub fn fuzzy_search(
    index: &IndexReader,
    query_str: &str,
    top_k: usize,
    similarity: Similarity,
    analyzer: &Analyzer,
    max_edits: i32,
) -> Result<SearchResults> {
    Searcher::new(index, analyzer, similarity).fuzzy_search(query_str, top_k, max_edits)
}
