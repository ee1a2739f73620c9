use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::porter;
use crate::analysis::token::Token;

/// Stemming algorithm of a `stem` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StemAlgorithm {
    /// Classic Porter (1980).
    #[default]
    Porter,
    /// Snowball English, also known as Porter2.
    Snowball,
}

#[derive(Debug, Clone, Copy)]
pub struct StemmerFilter {
    pub algorithm: StemAlgorithm,
}

impl StemmerFilter {
    pub fn new(algorithm: StemAlgorithm) -> Self {
        StemmerFilter { algorithm }
    }

    pub fn porter() -> Self {
        StemmerFilter::new(StemAlgorithm::Porter)
    }
}

impl TokenFilter for StemmerFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        match self.algorithm {
            StemAlgorithm::Porter => tokens.into_iter()
                .map(|mut token| {
                    token.text = porter::stem(&token.text);
                    token
                })
                .collect(),
            StemAlgorithm::Snowball => {
                let stemmer = Stemmer::create(Algorithm::English);
                tokens.into_iter()
                    .map(|mut token| {
                        token.text = stemmer.stem(&token.text).into_owned();
                        token
                    })
                    .collect()
            }
        }
    }

    fn name(&self) -> &str {
        match self.algorithm {
            StemAlgorithm::Porter => "porter_stem",
            StemAlgorithm::Snowball => "snowball_stem",
        }
    }
}
