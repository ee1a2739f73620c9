use regex::Regex;
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;
use crate::core::error::{Error, Result};

/// Default pattern: everything outside the ASCII letter alphabet.
pub const NON_LETTERS: &str = "[^A-Za-z]+";

/// Removes every match of a pattern from each token.
///
/// Tokens left empty are dropped; their position stays unused.
#[derive(Debug, Clone)]
pub struct PatternStripFilter {
    pub pattern: Regex,
}

impl PatternStripFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::config(format!("invalid strip pattern '{}': {}", pattern, e)))?;
        Ok(PatternStripFilter { pattern })
    }

    pub fn non_letters() -> Self {
        PatternStripFilter {
            pattern: Regex::new(NON_LETTERS).expect("static pattern compiles"),
        }
    }
}

impl TokenFilter for PatternStripFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .filter_map(|mut token| {
                let stripped = self.pattern.replace_all(&token.text, "");
                if stripped.is_empty() {
                    return None;
                }
                token.text = stripped.into_owned();
                Some(token)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "pattern_strip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_non_letters_and_drops_empty_tokens() {
        let tokens = vec![
            Token::new("don't".to_string(), 0, 0),
            Token::new("1984".to_string(), 1, 6),
            Token::new("x-ray".to_string(), 2, 11),
        ];
        let out = PatternStripFilter::non_letters().filter(tokens);
        let texts: Vec<_> = out.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["dont", "xray"]);
        assert_eq!(out[1].position, 2);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(PatternStripFilter::new("[unclosed").is_err());
    }
}
