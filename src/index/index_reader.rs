use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use crate::analysis::analyzer::{Analyzer, AnalyzerConfig};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{DocStats, IndexStatistics, TermStats};
use crate::core::types::DocId;
use crate::index::inverted::{InvertedIndex, TermDictionary};
use crate::index::posting::PostingList;
use crate::scoring::scorer::Similarity;
use crate::storage::checkpoint::{Checkpoint, IndexMetadata};
use crate::storage::layout::StorageLayout;
use crate::storage::segment_reader::SegmentReader;

/// Read-only view of a built index.
///
/// All committed segments are decoded and merged on open; afterwards the
/// reader never touches the disk and can be shared freely between threads.
pub struct IndexReader {
    path: PathBuf,
    checkpoint: Checkpoint,
    index: InvertedIndex,
    dictionary: TermDictionary,
    statistics: IndexStatistics,
}

impl IndexReader {
    /// Opens an index whose build ran to completion.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = Self::load(path.as_ref())?;
        if !reader.checkpoint.complete {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("index {} was not built to completion", reader.path.display()),
            ));
        }
        Ok(reader)
    }

    /// Opens whatever batches the last checkpoint committed, complete or not.
    pub fn open_last_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = Self::load(path.as_ref())?;
        if !reader.checkpoint.complete {
            warn!(
                path = %reader.path.display(),
                docs = reader.checkpoint.doc_count,
                "opening an incomplete build from its last checkpoint"
            );
        }
        Ok(reader)
    }

    fn load(path: &Path) -> Result<Self> {
        let start = Instant::now();
        let storage = StorageLayout::open(path)?;
        let checkpoint = Checkpoint::load(&storage)?;

        let mut index = InvertedIndex::new();
        for segment in &checkpoint.segments {
            index.merge(SegmentReader::load_segment(&storage, segment)?)?;
        }

        let statistics = index.statistics();
        if statistics.total_docs != checkpoint.doc_count {
            return Err(Error::new(ErrorKind::InvalidState, format!(
                "manifest lists {} documents, segments hold {}",
                checkpoint.doc_count, statistics.total_docs
            )));
        }
        if let Some(recorded) = checkpoint.statistics.filter(|s| *s != statistics) {
            return Err(Error::new(ErrorKind::InvalidState, format!(
                "manifest statistics {:?} disagree with segments {:?}",
                recorded, statistics
            )));
        }

        let dictionary = TermDictionary::build(index.terms())?;

        info!(
            path = %path.display(),
            segments = checkpoint.segments.len(),
            docs = statistics.total_docs,
            terms = statistics.unique_terms,
            took_ms = start.elapsed().as_millis() as u64,
            "index opened"
        );

        Ok(IndexReader {
            path: path.to_path_buf(),
            checkpoint,
            index,
            dictionary,
            statistics,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_complete(&self) -> bool {
        self.checkpoint.complete
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.checkpoint.metadata
    }

    /// Similarity the index was built with.
    pub fn similarity(&self) -> Similarity {
        self.checkpoint.metadata.similarity
    }

    pub fn field_name(&self) -> &str {
        &self.checkpoint.metadata.field_name
    }

    pub fn analyzer_config(&self) -> &AnalyzerConfig {
        &self.checkpoint.metadata.analyzer
    }

    /// Rebuilds the analyzer the index was built with.
    pub fn analyzer(&self) -> Result<Analyzer> {
        Analyzer::new(self.checkpoint.metadata.analyzer.clone())
    }

    pub fn statistics(&self) -> IndexStatistics {
        self.statistics
    }

    pub fn doc_count(&self) -> u64 {
        self.statistics.total_docs
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.index.search_term(term)
    }

    pub fn term_stats(&self, term: &str) -> Option<TermStats> {
        self.index.term_stats(term)
    }

    pub fn doc_stats(&self, doc_id: DocId) -> Option<DocStats> {
        self.index.field_length(doc_id).map(|field_length| DocStats {
            field_length,
            avg_field_length: self.statistics.avg_field_length(),
            total_docs: self.statistics.total_docs,
        })
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.index.field_lengths.contains_key(&doc_id)
    }

    /// Original text of a document, when the build retained it.
    pub fn stored_text(&self, doc_id: DocId) -> Option<&str> {
        self.index.stored.get(&doc_id).and_then(|doc| doc.text.as_deref())
    }

    /// Every indexed doc id, ascending.
    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.index.field_lengths.keys().copied()
    }

    /// Terms of the field in byte order, at most `max_terms` of them.
    pub fn vocabulary(&self, max_terms: Option<usize>) -> Vec<String> {
        self.dictionary.terms(max_terms)
    }
}
