use chrono::{DateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, StoredDocument};
use crate::index::inverted::InvertedIndex;
use crate::index::posting::PostingList;

/// Unique segment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub Uuid);

impl SegmentId {
    pub fn new() -> Self {
        SegmentId(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

/// One committed batch of documents, as listed in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub doc_count: u32,
    pub metadata: SegmentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub min_doc_id: DocId,
    pub max_doc_id: DocId,
}

/// Segment file header
//
// [ magic: 4 ][ version: u32 ][ doc_count: u32 ][ crc32: u32 ][ payload_len: u64 ]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub version: u32,
    pub doc_count: u32,
    pub checksum: u32,
    pub payload_len: u64,
}

impl SegmentHeader {
    pub const MAGIC: [u8; 4] = *b"TRVX";
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 24;

    pub fn new(doc_count: u32, checksum: u32, payload_len: u64) -> Self {
        SegmentHeader {
            version: Self::VERSION,
            doc_count,
            checksum,
            payload_len,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&Self::MAGIC);
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..12].copy_from_slice(&self.doc_count.to_le_bytes());
        out[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        out[16..24].copy_from_slice(&self.payload_len.to_le_bytes());
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::new(ErrorKind::Parse, "segment shorter than its header"));
        }
        if data[0..4] != Self::MAGIC {
            return Err(Error::new(ErrorKind::Parse, "not a segment file"));
        }

        let u32_at = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        let mut len = [0u8; 8];
        len.copy_from_slice(&data[16..24]);

        let header = SegmentHeader {
            version: u32_at(4),
            doc_count: u32_at(8),
            checksum: u32_at(12),
            payload_len: u64::from_le_bytes(len),
        };
        if header.version != Self::VERSION {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("incompatible segment version {}", header.version),
            ));
        }
        Ok(header)
    }
}

/// Serialized body of a segment. Posting lists are kept in their
/// delta/VByte encoding inside the (compressed) payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct SegmentData {
    pub terms: Vec<(String, Vec<u8>)>,
    pub field_lengths: Vec<(DocId, u32)>,
    pub stored: Vec<StoredDocument>,
}

impl SegmentData {
    pub fn from_index(index: &InvertedIndex) -> Result<Self> {
        let terms = index.postings.iter()
            .map(|(term, list)| Ok((term.clone(), list.encode()?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(SegmentData {
            terms,
            field_lengths: index.field_lengths.iter().map(|(id, len)| (*id, *len)).collect(),
            stored: index.stored.values().cloned().collect(),
        })
    }

    pub fn into_index(self) -> Result<InvertedIndex> {
        let mut index = InvertedIndex::new();
        for (term, bytes) in self.terms {
            index.postings.insert(term, PostingList::decode(&bytes)?);
        }
        for (doc_id, len) in self.field_lengths {
            index.total_field_length += len as u64;
            index.field_lengths.insert(doc_id, len);
        }
        for doc in self.stored {
            index.stored.insert(doc.id, doc);
        }
        Ok(index)
    }
}
