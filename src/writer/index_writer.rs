use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use roaring::RoaringTreemap;
use tracing::{debug, info, warn};
use crate::analysis::analyzer::Analyzer;
use crate::compression::compress::CompressionType;
use crate::core::config::{Config, DEFAULT_FIELD};
use crate::core::error::{Error, Result};
use crate::core::stats::IndexStatistics;
use crate::core::types::DocId;
use crate::index::inverted::InvertedIndex;
use crate::parallel::indexer::ParallelIndexer;
use crate::scoring::scorer::Similarity;
use crate::storage::checkpoint::{Checkpoint, IndexMetadata};
use crate::storage::file_lock::IndexLock;
use crate::storage::layout::StorageLayout;
use crate::storage::segment_writer::SegmentWriter;

/// Settings of one index build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub field_name: String,
    pub similarity: Similarity,
    pub retain_original: bool,
    pub commit_batch_size: usize,
    pub compression: CompressionType,
    pub indexing_threads: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            field_name: DEFAULT_FIELD.to_string(),
            similarity: Similarity::Bm25,
            retain_original: true,
            commit_batch_size: 5000,
            compression: CompressionType::LZ4,
            indexing_threads: num_cpus::get(),
        }
    }
}

impl BuildOptions {
    pub fn from_config(config: &Config) -> Self {
        BuildOptions {
            field_name: config.field_name.clone(),
            similarity: config.similarity,
            retain_original: config.retain_original,
            commit_batch_size: config.commit_batch_size,
            compression: config.compression,
            indexing_threads: config.indexing_threads,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.commit_batch_size == 0 {
            return Err(Error::config("commit_batch_size must be at least 1"));
        }
        if self.indexing_threads == 0 {
            return Err(Error::config("indexing_threads must be at least 1"));
        }
        if self.field_name.is_empty() {
            return Err(Error::config("field_name must not be empty"));
        }
        Ok(())
    }
}

/// A document the build left out, and why.
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub doc_id: DocId,
    pub error: Error,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub indexed: u64,
    pub skipped: Vec<SkippedDocument>,
    pub segments: usize,
    pub took_ms: u64,
}

/// Single writer for one index directory.
///
/// Accepted documents accumulate in an in-memory batch that is committed as
/// a segment every `commit_batch_size` documents. The manifest is replaced
/// after each commit and only marked complete by [`IndexWriter::finish`].
pub struct IndexWriter {
    storage: StorageLayout,
    analyzer: Analyzer,
    options: BuildOptions,
    indexer: ParallelIndexer,
    checkpoint: Checkpoint,
    batch: InvertedIndex,
    seen: RoaringTreemap,
    vocabulary: HashSet<String>,
    total_field_length: u64,
    report: BuildReport,
    started: Instant,
    _lock: IndexLock,
}

impl IndexWriter {
    /// Validates the settings, then wipes and re-creates `destination`.
    pub fn create<P: AsRef<Path>>(destination: P, analyzer: Analyzer, options: BuildOptions) -> Result<Self> {
        options.validate()?;
        analyzer.config().validate()?;

        let lock = IndexLock::acquire(destination.as_ref())?;
        let storage = StorageLayout::reset(destination.as_ref()).map_err(Error::into_build_error)?;
        let indexer = ParallelIndexer::new(options.indexing_threads)?;

        let checkpoint = Checkpoint::new(IndexMetadata {
            field_name: options.field_name.clone(),
            similarity: options.similarity,
            analyzer: analyzer.config().clone(),
            retain_original: options.retain_original,
            compression: options.compression,
        });
        checkpoint.save(&storage).map_err(Error::into_build_error)?;

        info!(
            path = %storage.base_dir.display(),
            analyzer = analyzer.name(),
            similarity = %options.similarity,
            batch = options.commit_batch_size,
            threads = indexer.workers(),
            "index build started"
        );

        Ok(IndexWriter {
            storage,
            analyzer,
            options,
            indexer,
            checkpoint,
            batch: InvertedIndex::new(),
            seen: RoaringTreemap::new(),
            vocabulary: HashSet::new(),
            total_field_length: 0,
            report: BuildReport::default(),
            started: Instant::now(),
            _lock: lock,
        })
    }

    pub fn from_config(config: &Config, analyzer: Analyzer) -> Result<Self> {
        config.validate()?;
        Self::create(&config.storage_path, analyzer, BuildOptions::from_config(config))
    }

    /// Indexes every document, then finishes the build.
    pub fn build<I, B>(mut self, documents: I) -> Result<BuildReport>
    where
        I: IntoIterator<Item = (DocId, B)>,
        B: AsRef<[u8]> + Sync,
    {
        let mut documents = documents.into_iter().peekable();
        let mut pending: Vec<(DocId, B)> = Vec::new();

        while documents.peek().is_some() {
            // Only as many as the open batch can still take
            let room = self.options.commit_batch_size - self.batch.doc_count();
            pending.extend(documents.by_ref().take(room));
            self.add_documents(&pending)?;
            pending.clear();
        }

        self.finish()
    }

    /// Analyzes and adds documents in order, committing whenever the batch fills.
    pub fn add_documents<B>(&mut self, documents: &[(DocId, B)]) -> Result<()>
    where
        B: AsRef<[u8]> + Sync,
    {
        let analyzed = self.indexer.analyze_batch(
            documents,
            &self.analyzer,
            &self.options.field_name,
            self.options.retain_original,
        );

        for (result, (doc_id, _)) in analyzed.into_iter().zip(documents) {
            if !self.seen.insert(doc_id.0) {
                self.skip(*doc_id, Error::invalid_argument(format!("document {} appears more than once", doc_id)));
                continue;
            }
            let doc = match result {
                Ok(doc) => doc,
                Err(e) => {
                    self.skip(*doc_id, e);
                    continue;
                }
            };

            if let Err(e) = self.batch.add_document(doc.doc_id, &doc.tokens, doc.original) {
                self.skip(doc.doc_id, e);
                continue;
            }
            self.report.indexed += 1;

            if self.batch.doc_count() >= self.options.commit_batch_size {
                self.commit()?;
            }
        }
        Ok(())
    }

    fn skip(&mut self, doc_id: DocId, error: Error) {
        warn!(doc_id = doc_id.0, error = %error, "document skipped");
        self.report.skipped.push(SkippedDocument { doc_id, error });
    }

    /// Writes the open batch as a segment and checkpoints the manifest.
    pub fn commit(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let segment = SegmentWriter::new(&self.storage, self.options.compression)
            .write(&self.batch)
            .map_err(Error::into_build_error)?;

        self.checkpoint.push_segment(segment);
        self.checkpoint.save(&self.storage).map_err(Error::into_build_error)?;

        self.total_field_length += self.batch.total_field_length;
        self.vocabulary.extend(self.batch.terms().map(str::to_string));
        self.batch.clear();

        debug!(
            segments = self.checkpoint.segments.len(),
            docs = self.checkpoint.doc_count,
            "checkpoint committed"
        );
        Ok(())
    }

    /// Commits the remainder and marks the index complete.
    pub fn finish(mut self) -> Result<BuildReport> {
        self.commit()?;

        let statistics = IndexStatistics {
            total_docs: self.checkpoint.doc_count,
            total_field_length: self.total_field_length,
            unique_terms: self.vocabulary.len() as u64,
        };
        self.checkpoint.finish(statistics);
        self.checkpoint.save(&self.storage).map_err(Error::into_build_error)?;

        let mut report = std::mem::take(&mut self.report);
        report.segments = self.checkpoint.segments.len();
        report.took_ms = self.started.elapsed().as_millis() as u64;

        info!(
            path = %self.storage.base_dir.display(),
            indexed = report.indexed,
            skipped = report.skipped.len(),
            segments = report.segments,
            terms = statistics.unique_terms,
            took_ms = report.took_ms,
            "index build finished"
        );
        Ok(report)
    }
}

/// Builds a fresh index at `destination` from `(doc id, bytes)` pairs.
///
/// Anything already at `destination` is deleted first. Documents that are
/// not valid UTF-8, or whose id was already seen, are skipped and listed in
/// the report.
pub fn build_index<I, B, P>(
    documents: I,
    destination: P,
    analyzer: &Analyzer,
    similarity: Similarity,
    retain_original: bool,
    commit_batch_size: usize,
) -> Result<BuildReport>
where
    I: IntoIterator<Item = (DocId, B)>,
    B: AsRef<[u8]> + Sync,
    P: AsRef<Path>,
{
    let options = BuildOptions {
        similarity,
        retain_original,
        commit_batch_size,
        ..BuildOptions::default()
    };
    IndexWriter::create(destination, analyzer.clone(), options)?.build(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::core::error::ErrorKind;
    use crate::index::index_reader::IndexReader;
    use tempfile::TempDir;

    fn corpus() -> BTreeMap<DocId, String> {
        BTreeMap::from([
            (DocId(1), "the cat sat on the mat".to_string()),
            (DocId(2), "the dog sat on the log".to_string()),
            (DocId(3), "cats and dogs".to_string()),
        ])
    }

    #[test]
    fn batches_become_segments() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("idx");
        let report = build_index(corpus(), &dest, &Analyzer::stemming(), Similarity::Bm25, true, 2).unwrap();

        assert_eq!(report.indexed, 3);
        assert_eq!(report.segments, 2);
        assert!(report.skipped.is_empty());

        let reader = IndexReader::open(&dest).unwrap();
        assert_eq!(reader.doc_count(), 3);
        assert_eq!(reader.postings("cat").unwrap().doc_freq(), 2);
        // The lock file stays behind, unlocked
        assert!(dest.with_file_name("idx.lock").exists());
        assert!(IndexLock::acquire(&dest).is_ok());
    }

    #[test]
    fn zero_batch_size_fails_before_touching_disk() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("idx");
        let err = build_index(corpus(), &dest, &Analyzer::standard(), Similarity::Bm25, true, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(!dest.exists());

        let config = Config { commit_batch_size: 0, ..Config::default() };
        assert_eq!(config.validate().unwrap_err().kind, err.kind);
        assert_eq!(BuildOptions::from_config(&config).validate().unwrap_err().kind, err.kind);
    }

    #[test]
    fn undecodable_and_repeated_documents_are_skipped() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("idx");
        let docs: Vec<(DocId, Vec<u8>)> = vec![
            (DocId(1), b"good text".to_vec()),
            (DocId(2), vec![0xc3, 0x28]),
            (DocId(1), b"again".to_vec()),
            (DocId(3), b"more text".to_vec()),
        ];
        let report = build_index(docs, &dest, &Analyzer::standard(), Similarity::Bm25, false, 10).unwrap();

        assert_eq!(report.indexed, 2);
        let kinds: Vec<(u64, ErrorKind)> = report.skipped.iter().map(|s| (s.doc_id.0, s.error.kind)).collect();
        assert_eq!(kinds, vec![(2, ErrorKind::Decode), (1, ErrorKind::InvalidArgument)]);

        let reader = IndexReader::open(&dest).unwrap();
        assert!(!reader.contains(DocId(2)));
        assert_eq!(reader.stored_text(DocId(1)), None);
    }

    #[test]
    fn interrupted_build_is_not_complete() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("idx");
        let options = BuildOptions { commit_batch_size: 1, ..BuildOptions::default() };

        let mut writer = IndexWriter::create(&dest, Analyzer::standard(), options).unwrap();
        writer.add_documents(&[(DocId(1), "first"), (DocId(2), "second")]).unwrap();
        drop(writer);

        assert_eq!(IndexReader::open(&dest).err().unwrap().kind, ErrorKind::InvalidState);
        let recovered = IndexReader::open_last_checkpoint(&dest).unwrap();
        assert!(!recovered.is_complete());
        assert_eq!(recovered.doc_count(), 2);
    }
}
