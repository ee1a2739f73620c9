use std::fs::File;
use memmap2::Mmap;
use crate::compression::compress::CompressedBlock;
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::inverted::InvertedIndex;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{Segment, SegmentData, SegmentHeader, SegmentId};

/// Memory-mapped view of one segment file.
pub struct SegmentReader {
    pub segment_id: SegmentId,
    pub header: SegmentHeader,
    mmap: Mmap,
}

impl SegmentReader {
    pub fn open(storage: &StorageLayout, segment_id: SegmentId) -> Result<Self> {
        let path = storage.segment_path(&segment_id);
        let file = File::open(&path).map_err(|e| {
            Error::new(ErrorKind::NotFound, format!("segment {}: {}", path.display(), e))
        })?;

        // Safety: segments are written once and renamed into place, never modified.
        let mmap = unsafe { Mmap::map(&file)? };
        let header = SegmentHeader::from_bytes(&mmap)?;

        let actual = (mmap.len() - SegmentHeader::SIZE) as u64;
        if actual != header.payload_len {
            return Err(Error::new(ErrorKind::Parse, format!(
                "segment {} truncated: {} of {} payload bytes",
                segment_id.0, actual, header.payload_len
            )));
        }

        Ok(SegmentReader { segment_id, header, mmap })
    }

    fn payload(&self) -> &[u8] {
        &self.mmap[SegmentHeader::SIZE..]
    }

    pub fn verify(&self) -> Result<()> {
        let checksum = crc32fast::hash(self.payload());
        if checksum != self.header.checksum {
            return Err(Error::new(ErrorKind::Parse, format!(
                "segment {} checksum mismatch", self.segment_id.0
            )));
        }
        Ok(())
    }

    /// Decodes the whole segment back into an in-memory index.
    pub fn load(&self) -> Result<InvertedIndex> {
        self.verify()?;

        let block: CompressedBlock = bincode::deserialize(self.payload())?;
        let data: SegmentData = bincode::deserialize(&block.decompress()?)?;
        let index = data.into_index()?;

        if index.doc_count() != self.header.doc_count as usize {
            return Err(Error::new(ErrorKind::Parse, format!(
                "segment {} holds {} documents, header says {}",
                self.segment_id.0, index.doc_count(), self.header.doc_count
            )));
        }
        Ok(index)
    }

    /// Opens and decodes the segment a manifest entry points to.
    pub fn load_segment(storage: &StorageLayout, segment: &Segment) -> Result<InvertedIndex> {
        Self::open(storage, segment.id)?.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;
    use crate::compression::compress::CompressionType;
    use crate::core::types::DocId;
    use crate::storage::segment_writer::SegmentWriter;
    use tempfile::TempDir;

    fn batch() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        let tokens: Vec<Token> = ["cat", "sat", "mat"].iter()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
            .collect();
        index.add_document(DocId(4), &tokens, Some("cat sat mat".into())).unwrap();
        index.add_document(DocId(9), &tokens[..1], None).unwrap();
        index
    }

    #[test]
    fn written_segment_loads_back() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::reset(dir.path().join("idx")).unwrap();

        for compression in [CompressionType::LZ4, CompressionType::Zstd, CompressionType::None] {
            let segment = SegmentWriter::new(&layout, compression).write(&batch()).unwrap();
            assert_eq!(segment.doc_count, 2);
            assert_eq!(segment.metadata.min_doc_id, DocId(4));
            assert_eq!(segment.metadata.max_doc_id, DocId(9));

            let index = SegmentReader::load_segment(&layout, &segment).unwrap();
            assert_eq!(index.search_term("cat").unwrap().doc_freq(), 2);
            assert_eq!(index.stored[&DocId(4)].text.as_deref(), Some("cat sat mat"));
            assert_eq!(index.stored[&DocId(9)].text, None);
            assert_eq!(index.statistics(), batch().statistics());
        }
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::reset(dir.path().join("idx")).unwrap();
        let segment = SegmentWriter::new(&layout, CompressionType::LZ4).write(&batch()).unwrap();

        let path = layout.segment_path(&segment.id);
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        let err = SegmentReader::load_segment(&layout, &segment).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn missing_segment_is_not_found() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::reset(dir.path().join("idx")).unwrap();
        let err = SegmentReader::open(&layout, SegmentId::new()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
