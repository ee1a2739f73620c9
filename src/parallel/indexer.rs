use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;

/// Parallel document analysis for the index builder.
///
/// Owns a private rayon pool so the build never reconfigures the global one.
pub struct ParallelIndexer {
    pool: ThreadPool,
    workers: usize,
}

/// One document after decoding and analysis.
#[derive(Debug)]
pub struct AnalyzedDoc {
    pub doc_id: DocId,
    pub tokens: Vec<Token>,
    pub original: Option<String>,
}

impl ParallelIndexer {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("trovex-analyze-{}", i))
            .build()
            .map_err(|e| Error::new(ErrorKind::Internal, format!("analysis pool: {}", e)))?;

        Ok(ParallelIndexer { pool, workers: workers.max(1) })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Decodes and analyzes a batch. Output order matches input order;
    /// a document whose bytes are not UTF-8 yields a `Decode` error in its slot.
    pub fn analyze_batch<B>(
        &self,
        documents: &[(DocId, B)],
        analyzer: &Analyzer,
        field: &str,
        retain_original: bool,
    ) -> Vec<Result<AnalyzedDoc>>
    where
        B: AsRef<[u8]> + Sync,
    {
        if self.workers == 1 || documents.len() < 2 {
            return documents.iter()
                .map(|(doc_id, bytes)| analyze_document(*doc_id, bytes.as_ref(), analyzer, field, retain_original))
                .collect();
        }

        self.pool.install(|| {
            documents.par_iter()
                .map(|(doc_id, bytes)| analyze_document(*doc_id, bytes.as_ref(), analyzer, field, retain_original))
                .collect()
        })
    }
}

fn analyze_document(
    doc_id: DocId,
    bytes: &[u8],
    analyzer: &Analyzer,
    field: &str,
    retain_original: bool,
) -> Result<AnalyzedDoc> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        Error::new(ErrorKind::Decode, format!("document {} is not valid UTF-8: {}", doc_id, e))
    })?;

    Ok(AnalyzedDoc {
        doc_id,
        tokens: analyzer.analyze(field, text).collect(),
        original: retain_original.then(|| text.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_input_order_and_flags_bad_bytes() {
        let indexer = ParallelIndexer::new(4).unwrap();
        let analyzer = Analyzer::standard();
        let docs: Vec<(DocId, Vec<u8>)> = (0..64u64)
            .map(|i| {
                let bytes = if i == 17 { vec![0xff, 0xfe] } else { format!("doc number {}", i).into_bytes() };
                (DocId(i), bytes)
            })
            .collect();

        let analyzed = indexer.analyze_batch(&docs, &analyzer, "text_content", true);
        assert_eq!(analyzed.len(), 64);
        for (i, result) in analyzed.iter().enumerate() {
            match result {
                Ok(doc) => {
                    assert_eq!(doc.doc_id, DocId(i as u64));
                    assert_eq!(doc.tokens.len(), 3);
                    assert_eq!(doc.original.as_deref(), Some(format!("doc number {}", i).as_str()));
                }
                Err(e) => {
                    assert_eq!(i, 17);
                    assert_eq!(e.kind, ErrorKind::Decode);
                }
            }
        }
    }

    #[test]
    fn original_text_is_dropped_unless_retained() {
        let indexer = ParallelIndexer::new(1).unwrap();
        let docs = [(DocId(1), "the cat")];
        let analyzed = indexer.analyze_batch(&docs, &Analyzer::standard(), "text_content", false);
        assert_eq!(analyzed[0].as_ref().unwrap().original, None);
    }
}
