use serde::{Serialize, Deserialize};

/// Collection-level statistics required by the similarity models.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub total_docs: u64,
    pub total_field_length: u64,
    pub unique_terms: u64,
}

impl IndexStatistics {
    pub fn avg_field_length(&self) -> f32 {
        if self.total_docs == 0 {
            return 0.0;
        }
        self.total_field_length as f32 / self.total_docs as f32
    }
}

/// Statistics of a single term, taken from its postings list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStats {
    pub doc_freq: u32,
    pub total_freq: u64,
}

/// Per-document inputs to a scorer.
#[derive(Debug, Clone, Copy)]
pub struct DocStats {
    pub field_length: u32,
    pub avg_field_length: f32,
    pub total_docs: u64,
}
