use std::cmp;
use chrono::Utc;
use crc32fast::Hasher;
use tracing::debug;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::inverted::InvertedIndex;
use crate::storage::layout::{write_atomic, StorageLayout};
use crate::storage::segment::{Segment, SegmentData, SegmentHeader, SegmentId, SegmentMetadata};

/// Serializes one commit batch into an immutable segment file.
pub struct SegmentWriter<'a> {
    storage: &'a StorageLayout,
    compression: CompressionType,
}

impl<'a> SegmentWriter<'a> {
    pub fn new(storage: &'a StorageLayout, compression: CompressionType) -> Self {
        SegmentWriter { storage, compression }
    }

    // [ HEADER (magic, version, doc_count, crc32, payload_len) ]
    // [ bincode(CompressedBlock(bincode(SegmentData))) ]
    pub fn write(&self, batch: &InvertedIndex) -> Result<Segment> {
        if batch.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument, "refusing to write an empty segment"));
        }

        let data = bincode::serialize(&SegmentData::from_index(batch)?)?;
        let block = CompressedBlock::compress(&data, self.compression)?;
        let payload = bincode::serialize(&block)?;

        let mut hasher = Hasher::new();
        hasher.update(&payload);

        let doc_count = batch.doc_count() as u32;
        let header = SegmentHeader::new(doc_count, hasher.finalize(), payload.len() as u64);

        let mut bytes = Vec::with_capacity(SegmentHeader::SIZE + payload.len());
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(&payload);

        let id = SegmentId::new();
        write_atomic(&self.storage.segment_path(&id), &bytes)?;

        let (min_doc_id, max_doc_id) = batch.field_lengths.keys().fold(
            (DocId(u64::MAX), DocId(0)),
            |(lo, hi), id| (cmp::min(lo, *id), cmp::max(hi, *id)),
        );

        debug!(
            segment = %id.0,
            docs = doc_count,
            raw = data.len(),
            stored = bytes.len(),
            "segment written"
        );

        Ok(Segment {
            id,
            doc_count,
            metadata: SegmentMetadata {
                created_at: Utc::now(),
                size_bytes: bytes.len() as u64,
                min_doc_id,
                max_doc_id,
            },
        })
    }
}
