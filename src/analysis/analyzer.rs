use serde::{Serialize, Deserialize};
use tracing::trace;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::ngram::NGramFilter;
use crate::analysis::filters::pattern::{PatternStripFilter, NON_LETTERS};
use crate::analysis::filters::shingle::ShingleFilter;
use crate::analysis::filters::stemmer::{StemAlgorithm, StemmerFilter};
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::core::error::{Error, Result};

/// Serializable description of one pipeline stage.
///
/// `words: None` selects the built-in English stop-word list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageConfig {
    PatternStrip { pattern: String },
    Lowercase,
    StopWords { words: Option<Vec<String>> },
    Stem {
        #[serde(default)]
        algorithm: StemAlgorithm,
    },
    Shingle { min_gram: usize, max_gram: usize, output_unigrams: bool },
    CharNGram { min_gram: usize, max_gram: usize },
}

/// Analyzer configuration: a name plus the ordered filter stages applied
/// after the standard tokenizer. Stored with the index so searchers can
/// rebuild the exact pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub name: String,
    pub stages: Vec<StageConfig>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig::standard()
    }
}

impl AnalyzerConfig {
    /// Tokenize and lowercase.
    pub fn standard() -> Self {
        AnalyzerConfig {
            name: "standard".to_string(),
            stages: vec![StageConfig::Lowercase],
        }
    }

    /// Letters only, lowercase, stop words, classic Porter stemming.
    pub fn stemming(stop_words: Option<Vec<String>>) -> Self {
        AnalyzerConfig {
            name: "stemming".to_string(),
            stages: vec![
                StageConfig::PatternStrip { pattern: NON_LETTERS.to_string() },
                StageConfig::Lowercase,
                StageConfig::StopWords { words: stop_words },
                StageConfig::Stem { algorithm: StemAlgorithm::Porter },
            ],
        }
    }

    pub fn word_ngram(stop_words: Option<Vec<String>>, min_gram: usize, max_gram: usize) -> Self {
        AnalyzerConfig {
            name: "word_ngram".to_string(),
            stages: vec![
                StageConfig::Lowercase,
                StageConfig::StopWords { words: stop_words },
                StageConfig::Shingle { min_gram, max_gram, output_unigrams: false },
            ],
        }
    }

    pub fn char_ngram(stop_words: Option<Vec<String>>, min_gram: usize, max_gram: usize) -> Self {
        AnalyzerConfig {
            name: "char_ngram".to_string(),
            stages: vec![
                StageConfig::Lowercase,
                StageConfig::StopWords { words: stop_words },
                StageConfig::CharNGram { min_gram, max_gram },
            ],
        }
    }

    pub fn validate(&self) -> Result<()> {
        for stage in &self.stages {
            match stage {
                StageConfig::Shingle { min_gram, max_gram, .. }
                | StageConfig::CharNGram { min_gram, max_gram } => {
                    validate_gram_bounds(*min_gram, *max_gram)?;
                }
                StageConfig::PatternStrip { pattern } => {
                    PatternStripFilter::new(pattern)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn validate_gram_bounds(min_gram: usize, max_gram: usize) -> Result<()> {
    if min_gram == 0 || max_gram == 0 {
        return Err(Error::config(format!(
            "gram bounds must be at least 1 (min_gram={}, max_gram={})", min_gram, max_gram
        )));
    }
    if min_gram > max_gram {
        return Err(Error::config(format!(
            "min_gram ({}) must not exceed max_gram ({})", min_gram, max_gram
        )));
    }
    Ok(())
}

/// Built pipeline stage; the tag selects the filter, no trait objects.
#[derive(Debug, Clone)]
pub enum FilterStage {
    PatternStrip(PatternStripFilter),
    Lowercase(LowercaseFilter),
    StopWords(StopWordFilter),
    Stem(StemmerFilter),
    Shingle(ShingleFilter),
    CharNGram(NGramFilter),
}

impl FilterStage {
    fn from_config(config: &StageConfig) -> Result<Self> {
        Ok(match config {
            StageConfig::PatternStrip { pattern } => {
                FilterStage::PatternStrip(PatternStripFilter::new(pattern)?)
            }
            StageConfig::Lowercase => FilterStage::Lowercase(LowercaseFilter),
            StageConfig::StopWords { words: None } => FilterStage::StopWords(StopWordFilter::english()),
            StageConfig::StopWords { words: Some(words) } => {
                FilterStage::StopWords(StopWordFilter::new(words.clone()))
            }
            StageConfig::Stem { algorithm } => FilterStage::Stem(StemmerFilter::new(*algorithm)),
            StageConfig::Shingle { min_gram, max_gram, output_unigrams } => {
                validate_gram_bounds(*min_gram, *max_gram)?;
                FilterStage::Shingle(ShingleFilter::new(*min_gram, *max_gram, *output_unigrams))
            }
            StageConfig::CharNGram { min_gram, max_gram } => {
                validate_gram_bounds(*min_gram, *max_gram)?;
                FilterStage::CharNGram(NGramFilter::new(*min_gram, *max_gram))
            }
        })
    }

    fn as_filter(&self) -> &dyn TokenFilter {
        match self {
            FilterStage::PatternStrip(f) => f,
            FilterStage::Lowercase(f) => f,
            FilterStage::StopWords(f) => f,
            FilterStage::Stem(f) => f,
            FilterStage::Shingle(f) => f,
            FilterStage::CharNGram(f) => f,
        }
    }
}

/// Text analysis pipeline
#[derive(Debug, Clone)]
pub struct Analyzer {
    pub tokenizer: StandardTokenizer,
    pub stages: Vec<FilterStage>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let stages = config.stages.iter()
            .map(FilterStage::from_config)
            .collect::<Result<Vec<_>>>()?;

        Ok(Analyzer {
            tokenizer: StandardTokenizer::default(),
            stages,
            config,
        })
    }

    pub fn standard() -> Self {
        Self::new(AnalyzerConfig::standard()).expect("standard analyzer config is valid")
    }

    pub fn stemming() -> Self {
        Self::new(AnalyzerConfig::stemming(None)).expect("stemming analyzer config is valid")
    }

    pub fn word_ngram(min_gram: usize, max_gram: usize) -> Result<Self> {
        Self::new(AnalyzerConfig::word_ngram(None, min_gram, max_gram))
    }

    pub fn char_ngram(min_gram: usize, max_gram: usize) -> Result<Self> {
        Self::new(AnalyzerConfig::char_ngram(None, min_gram, max_gram))
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs the pipeline over one field value.
    pub fn analyze(&self, field: &str, text: &str) -> TokenStream {
        let mut tokens = self.tokenizer.tokenize(text);

        for stage in &self.stages {
            tokens = stage.as_filter().filter(tokens);
        }

        trace!(analyzer = %self.config.name, field, terms = tokens.len(), "analyzed field");
        TokenStream { inner: tokens.into_iter() }
    }

    /// Convenience: only the term strings, in stream order.
    pub fn terms(&self, field: &str, text: &str) -> Vec<String> {
        self.analyze(field, text).map(|token| token.text).collect()
    }
}

/// Single-pass stream of analyzed tokens for one field value.
#[derive(Debug)]
pub struct TokenStream {
    inner: std::vec::IntoIter<Token>,
}

impl Iterator for TokenStream {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for TokenStream {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    const FIELD: &str = "text_content";

    #[test]
    fn stemming_pipeline_conflates_inflections() {
        let analyzer = Analyzer::stemming();
        assert_eq!(analyzer.terms(FIELD, "running"), vec!["run"]);
        assert_eq!(analyzer.terms(FIELD, "Runs"), vec!["run"]);
        assert_eq!(analyzer.terms(FIELD, "run"), vec!["run"]);
        assert_ne!(analyzer.terms(FIELD, "runner"), vec!["run"]);
    }

    #[test]
    fn stemming_pipeline_is_classic_porter() {
        let analyzer = Analyzer::stemming();
        assert_eq!(
            analyzer.terms(FIELD, "skies dying generously news hopefully"),
            vec!["ski", "dy", "gener", "new", "hopefulli"]
        );
    }

    #[test]
    fn snowball_stage_from_json() {
        let config: AnalyzerConfig = serde_json::from_str(
            r#"{"name": "snowball", "stages": ["lowercase", {"stem": {"algorithm": "snowball"}}]}"#,
        ).unwrap();
        let analyzer = Analyzer::new(config).unwrap();
        assert_eq!(analyzer.terms(FIELD, "Skies generously"), vec!["sky", "generous"]);

        let default: StageConfig = serde_json::from_str(r#"{"stem": {}}"#).unwrap();
        assert_eq!(default, StageConfig::Stem { algorithm: StemAlgorithm::Porter });
    }

    #[test]
    fn stemming_pipeline_strips_and_drops() {
        let analyzer = Analyzer::stemming();
        assert_eq!(analyzer.terms(FIELD, "The cat's 42 mats!"), vec!["cat", "mat"]);
        assert!(analyzer.terms(FIELD, "").is_empty());
        assert!(analyzer.terms(FIELD, "1234 5678").is_empty());
    }

    #[test]
    fn word_ngram_pipeline_respects_stop_word_gaps() {
        let analyzer = Analyzer::word_ngram(2, 2).unwrap();
        assert_eq!(
            analyzer.terms(FIELD, "The quick brown fox sat on the mat"),
            vec!["quick brown", "brown fox", "fox sat"]
        );
    }

    #[test]
    fn char_ngram_pipeline() {
        let analyzer = Analyzer::char_ngram(3, 3).unwrap();
        assert_eq!(analyzer.terms(FIELD, "The Cats"), vec!["cat", "ats"]);
    }

    #[test]
    fn invalid_gram_bounds_are_config_errors() {
        assert_eq!(Analyzer::word_ngram(3, 2).unwrap_err().kind, ErrorKind::Config);
        assert_eq!(Analyzer::char_ngram(0, 2).unwrap_err().kind, ErrorKind::Config);
        assert!(AnalyzerConfig::char_ngram(None, 2, 1).validate().is_err());
    }

    #[test]
    fn analysis_is_restartable() {
        let analyzer = Analyzer::stemming();
        let first: Vec<_> = analyzer.analyze(FIELD, "cats and dogs").collect();
        let second: Vec<_> = analyzer.analyze(FIELD, "cats and dogs").collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn custom_stop_words() {
        let config = AnalyzerConfig::stemming(Some(vec!["cat".to_string()]));
        let analyzer = Analyzer::new(config).unwrap();
        assert_eq!(analyzer.terms(FIELD, "the cat"), vec!["the"]);
    }
}
