pub mod indexer;

pub use indexer::{AnalyzedDoc, ParallelIndexer};
