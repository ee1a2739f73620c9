use serde::{Serialize, Deserialize};
use crate::compression::delta::DeltaEncoder;
use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,       // Term frequency in document
    pub positions: Vec<u32>,  // Token positions, ascending
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Vec<u32>) -> Self {
        Posting {
            doc_id,
            term_freq: positions.len() as u32,
            positions,
        }
    }
}

/// Posting list for a term
/// Invariant: doc ids strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    pub postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    pub fn add_posting(&mut self, posting: Posting) {
        // Appends are the common case: documents mostly arrive in id order
        if self.postings.last().is_none_or(|last| last.doc_id < posting.doc_id) {
            self.postings.push(posting);
            return;
        }
        match self.postings.binary_search_by_key(&posting.doc_id, |p| p.doc_id) {
            Ok(pos) => self.postings[pos] = posting,
            Err(pos) => self.postings.insert(pos, posting),
        }
    }

    /// Merges a list covering a disjoint set of documents.
    pub fn merge(&mut self, other: PostingList) {
        if self.postings.last().is_none_or(|last| {
            other.postings.first().is_none_or(|first| last.doc_id < first.doc_id)
        }) {
            self.postings.extend(other.postings);
            return;
        }
        for posting in other.postings {
            self.add_posting(posting);
        }
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|pos| &self.postings[pos])
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.term_freq as u64).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    // [ count ][ doc id gaps ][ per posting: tf, position gaps ]
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(self.postings.len() * 4);
        VByteEncoder::encode_u64(&mut output, self.postings.len() as u64);

        let doc_ids: Vec<u64> = self.postings.iter().map(|p| p.doc_id.0).collect();
        DeltaEncoder::encode_sorted_u64(&mut output, &doc_ids)?;

        for posting in &self.postings {
            VByteEncoder::encode_u32(&mut output, posting.term_freq);
            DeltaEncoder::encode_sorted_u32(&mut output, &posting.positions)?;
        }
        Ok(output)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = VByteReader::new(data);
        let count = reader.read_u64()? as usize;
        let doc_ids = DeltaEncoder::decode_sorted_u64(&mut reader, count)?;

        let mut postings = Vec::with_capacity(count);
        for doc_id in doc_ids {
            let term_freq = reader.read_u32()?;
            let positions = DeltaEncoder::decode_sorted_u32(&mut reader, term_freq as usize)?;
            postings.push(Posting { doc_id: DocId(doc_id), term_freq, positions });
        }

        if !reader.is_empty() {
            return Err(Error::new(ErrorKind::Parse, "trailing bytes after posting list"));
        }
        Ok(PostingList { postings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc: u64, positions: &[u32]) -> Posting {
        Posting::new(DocId(doc), positions.to_vec())
    }

    #[test]
    fn out_of_order_adds_stay_sorted() {
        let mut list = PostingList::new();
        list.add_posting(posting(7, &[0]));
        list.add_posting(posting(2, &[1, 4]));
        list.add_posting(posting(9, &[3]));
        let ids: Vec<u64> = list.iter().map(|p| p.doc_id.0).collect();
        assert_eq!(ids, vec![2, 7, 9]);
        assert_eq!(list.doc_freq(), 3);
        assert_eq!(list.total_freq(), 4);
        assert_eq!(list.get(DocId(2)).unwrap().term_freq, 2);
        assert!(list.get(DocId(3)).is_none());
    }

    #[test]
    fn merge_interleaves_disjoint_lists() {
        let mut a = PostingList { postings: vec![posting(1, &[0]), posting(5, &[0])] };
        let b = PostingList { postings: vec![posting(3, &[2])] };
        a.merge(b);
        let ids: Vec<u64> = a.iter().map(|p| p.doc_id.0).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn encoded_list_decodes_identically() {
        let list = PostingList {
            postings: vec![posting(3, &[0, 2, 9]), posting(40, &[5]), posting(41, &[0, 1])],
        };
        let bytes = list.encode().unwrap();
        assert_eq!(PostingList::decode(&bytes).unwrap(), list);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let mut bytes = PostingList { postings: vec![posting(1, &[0])] }.encode().unwrap();
        bytes.push(0);
        assert!(PostingList::decode(&bytes).is_err());
    }
}
