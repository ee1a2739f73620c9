use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::core::error::Error;
use crate::core::stats::{DocStats, TermStats};

/// Scoring model, recorded in the index manifest at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    #[default]
    Bm25,
    TfIdf,
}

impl Similarity {
    pub fn scorer(&self) -> Box<dyn Scorer> {
        match self {
            Similarity::Bm25 => Box::new(BM25Scorer::default()),
            Similarity::TfIdf => Box::new(TfIdfScorer),
        }
    }
}

impl FromStr for Similarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bm25" => Ok(Similarity::Bm25),
            "tf-idf" | "tfidf" | "tf_idf" | "classic" => Ok(Similarity::TfIdf),
            other => Err(Error::config(format!("{} similarity not implemented", other))),
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Similarity::Bm25 => write!(f, "BM25"),
            Similarity::TfIdf => write!(f, "tf-idf"),
        }
    }
}

/// Scorer trait
pub trait Scorer: Send + Sync {
    fn idf(&self, term: &TermStats, total_docs: u64) -> f32;

    /// Contribution of one matched term (or phrase, with `idf` summed over its
    /// members) to one document's score.
    fn score(&self, term_freq: f32, idf: f32, doc_stats: &DocStats) -> f32;

    /// Factor applied to a document's summed score, given the idf of every
    /// scoring term in the query.
    fn query_norm(&self, _idfs: &[f32]) -> f32 {
        1.0
    }

    fn name(&self) -> &str;
}

/// BM25 Scorer
#[derive(Debug, Clone, Copy)]
pub struct BM25Scorer {
    pub k1: f32,  // Term frequency saturation (default: 1.2)
    pub b: f32,   // Length normalization strength (default: 0.75)
}

impl Default for BM25Scorer {
    fn default() -> Self {
        BM25Scorer {
            k1: 1.2,
            b: 0.75,
        }
    }
}

impl Scorer for BM25Scorer {
    fn idf(&self, term: &TermStats, total_docs: u64) -> f32 {
        let n = total_docs as f32;
        let df = term.doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn score(&self, term_freq: f32, idf: f32, doc_stats: &DocStats) -> f32 {
        let doc_len = doc_stats.field_length as f32;
        // An empty collection never gets here; guard against 0/0 anyway
        let avg_doc_len = if doc_stats.avg_field_length > 0.0 { doc_stats.avg_field_length } else { 1.0 };

        let numerator = idf * term_freq * (self.k1 + 1.0);
        let denominator = term_freq + self.k1 * (1.0 - self.b + self.b * (doc_len / avg_doc_len));

        numerator / denominator
    }

    fn name(&self) -> &str {
        "bm25"
    }
}

/// Classic TF-IDF: `sqrt(tf) * idf^2 * 1/sqrt(|d|)`, query-normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl Scorer for TfIdfScorer {
    fn idf(&self, term: &TermStats, total_docs: u64) -> f32 {
        1.0 + ((total_docs as f32 + 1.0) / (term.doc_freq as f32 + 1.0)).ln()
    }

    fn score(&self, term_freq: f32, idf: f32, doc_stats: &DocStats) -> f32 {
        let length_norm = if doc_stats.field_length > 0 {
            1.0 / (doc_stats.field_length as f32).sqrt()
        } else {
            1.0
        };
        term_freq.sqrt() * idf * idf * length_norm
    }

    fn query_norm(&self, idfs: &[f32]) -> f32 {
        let sum_of_squares: f32 = idfs.iter().map(|idf| idf * idf).sum();
        if sum_of_squares > 0.0 {
            1.0 / sum_of_squares.sqrt()
        } else {
            1.0
        }
    }

    fn name(&self) -> &str {
        "tfidf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use proptest::prelude::*;

    fn doc(field_length: u32) -> DocStats {
        DocStats { field_length, avg_field_length: 6.0, total_docs: 100 }
    }

    fn stats(doc_freq: u32) -> TermStats {
        TermStats { doc_freq, total_freq: doc_freq as u64 }
    }

    #[test]
    fn parses_similarity_names() {
        assert_eq!("BM25".parse::<Similarity>().unwrap(), Similarity::Bm25);
        assert_eq!("tf-idf".parse::<Similarity>().unwrap(), Similarity::TfIdf);
        assert_eq!("dfr".parse::<Similarity>().unwrap_err().kind, ErrorKind::Config);
    }

    #[test]
    fn bm25_matches_the_closed_form() {
        let scorer = BM25Scorer::default();
        let idf = scorer.idf(&stats(1), 2);
        assert!((idf - (1.0f32 + 1.5 / 1.5).ln()).abs() < 1e-6);

        // tf = 1, |d| = avgdl  =>  idf * 2.2 / 2.2
        let score = scorer.score(1.0, idf, &DocStats { field_length: 6, avg_field_length: 6.0, total_docs: 2 });
        assert!((score - idf).abs() < 1e-6);
    }

    #[test]
    fn tfidf_prefers_rare_and_frequent_terms() {
        let scorer = TfIdfScorer;
        let rare = scorer.idf(&stats(1), 100);
        let common = scorer.idf(&stats(50), 100);
        assert!(scorer.score(1.0, rare, &doc(6)) > scorer.score(1.0, common, &doc(6)));
        assert!(scorer.score(4.0, rare, &doc(6)) > scorer.score(1.0, rare, &doc(6)));
        assert!((scorer.query_norm(&[3.0, 4.0]) - 0.2).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn bm25_non_decreasing_in_tf(tf in 1u32..200, len in 1u32..500, df in 1u32..100) {
            let scorer = BM25Scorer::default();
            let idf = scorer.idf(&stats(df), 100);
            let lower = scorer.score(tf as f32, idf, &doc(len.max(tf)));
            let higher = scorer.score(tf as f32 + 1.0, idf, &doc(len.max(tf)));
            prop_assert!(higher >= lower);
        }

        #[test]
        fn bm25_non_increasing_in_df(df in 1u32..99, tf in 1u32..20) {
            let scorer = BM25Scorer::default();
            let rarer = scorer.score(tf as f32, scorer.idf(&stats(df), 100), &doc(20));
            let commoner = scorer.score(tf as f32, scorer.idf(&stats(df + 1), 100), &doc(20));
            prop_assert!(commoner <= rarer);
        }
    }
}
