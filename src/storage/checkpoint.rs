use std::fs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::analysis::analyzer::AnalyzerConfig;
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::IndexStatistics;
use crate::scoring::scorer::Similarity;
use crate::storage::layout::{write_atomic, StorageLayout};
use crate::storage::segment::Segment;

/// Settings an index was built with. Queries re-use them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub field_name: String,
    pub similarity: Similarity,
    pub analyzer: AnalyzerConfig,
    pub retain_original: bool,
    pub compression: CompressionType,
}

/// Index manifest, replaced atomically after every committed batch.
///
/// A checkpoint with `complete == false` describes the documents committed
/// so far by a build that has not finished (or was interrupted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub segments: Vec<Segment>,
    pub doc_count: u64,
    pub timestamp: DateTime<Utc>,
    pub complete: bool,
    pub metadata: IndexMetadata,
    pub statistics: Option<IndexStatistics>,
}

impl Checkpoint {
    pub const VERSION: u32 = 1;

    pub fn new(metadata: IndexMetadata) -> Self {
        Checkpoint {
            version: Self::VERSION,
            segments: Vec::new(),
            doc_count: 0,
            timestamp: Utc::now(),
            complete: false,
            metadata,
            statistics: None,
        }
    }

    /// Records a freshly written segment.
    pub fn push_segment(&mut self, segment: Segment) {
        self.doc_count += segment.doc_count as u64;
        self.segments.push(segment);
        self.timestamp = Utc::now();
    }

    pub fn finish(&mut self, statistics: IndexStatistics) {
        self.complete = true;
        self.statistics = Some(statistics);
        self.timestamp = Utc::now();
    }

    /// Load checkpoint from disk
    pub fn load(storage: &StorageLayout) -> Result<Self> {
        let data = fs::read(storage.manifest_path())?;
        let checkpoint: Checkpoint = bincode::deserialize(&data)?;
        if checkpoint.version != Self::VERSION {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("incompatible manifest version {}", checkpoint.version),
            ));
        }
        Ok(checkpoint)
    }

    /// Save checkpoint to disk
    pub fn save(&self, storage: &StorageLayout) -> Result<()> {
        let data = bincode::serialize(self)?;
        write_atomic(&storage.manifest_path(), &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocId;
    use crate::storage::segment::{SegmentId, SegmentMetadata};
    use tempfile::TempDir;

    fn metadata() -> IndexMetadata {
        IndexMetadata {
            field_name: "text_content".into(),
            similarity: Similarity::TfIdf,
            analyzer: AnalyzerConfig::stemming(None),
            retain_original: false,
            compression: CompressionType::Snappy,
        }
    }

    #[test]
    fn manifest_survives_save_and_load() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::reset(dir.path().join("idx")).unwrap();

        let mut checkpoint = Checkpoint::new(metadata());
        checkpoint.push_segment(Segment {
            id: SegmentId::new(),
            doc_count: 3,
            metadata: SegmentMetadata {
                created_at: Utc::now(),
                size_bytes: 64,
                min_doc_id: DocId(1),
                max_doc_id: DocId(3),
            },
        });
        checkpoint.save(&layout).unwrap();

        let loaded = Checkpoint::load(&layout).unwrap();
        assert!(!loaded.complete);
        assert_eq!(loaded.doc_count, 3);
        assert_eq!(loaded.metadata.similarity, Similarity::TfIdf);
        assert_eq!(loaded.metadata.analyzer, AnalyzerConfig::stemming(None));

        checkpoint.finish(IndexStatistics { total_docs: 3, total_field_length: 9, unique_terms: 4 });
        checkpoint.save(&layout).unwrap();
        let loaded = Checkpoint::load(&layout).unwrap();
        assert!(loaded.complete);
        assert_eq!(loaded.statistics.unwrap().unique_terms, 4);
    }
}
