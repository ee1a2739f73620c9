pub mod core;
pub mod analysis;
pub mod compression;
pub mod index;
pub mod storage;
pub mod scoring;
pub mod query;
pub mod search;
pub mod writer;
pub mod parallel;
pub mod eval;

/*
┌──────────────────────────────────────── TROVEX ─────────────────────────────────────────┐
│                                                                                          │
│  documents ──► Analyzer ──► ParallelIndexer ──► IndexWriter ──► segments + manifest     │
│               (tokenizer,   (rayon pool,        (batches,        (bincode, crc32,       │
│                filters)      per-doc analysis)   checkpoints)     lz4/zstd/snappy)      │
│                                                                                          │
│  query str ──► sanitize ──► QueryParser ──► QueryBuilder ──► Searcher ──► SearchResults │
│                (regex)      (nom lexer)     (analyzed AST)   (BM25 / TF-IDF,            │
│                                                               fst + levenshtein fuzzy)  │
│                                                                                          │
│  IndexReader: memmap2 segment reads, merged InvertedIndex, fst TermDictionary           │
│  eval: precision@k, recall@k, MAP@k, MAR@k over a search closure (rayon)                │
│                                                                                          │
└──────────────────────────────────────────────────────────────────────────────────────────┘
*/

pub use crate::core::config::Config;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::logging::initialize;
pub use crate::core::types::{DocId, QueryId};
pub use crate::analysis::analyzer::{Analyzer, AnalyzerConfig};
pub use crate::index::index_reader::IndexReader;
pub use crate::scoring::scorer::Similarity;
pub use crate::search::{fuzzy_search, search, FuzzyConfig, ScoredResult, SearchResults, Searcher};
pub use crate::writer::{build_index, BuildOptions, BuildReport, IndexWriter, SkippedDocument};
pub use crate::eval::{
    evaluate, map_at_k, mar_at_k, precision_at_k, recall_at_k, retrieve_top_k,
    EvaluationReport, RelevanceJudgments,
};
