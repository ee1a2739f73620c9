use crate::analysis::token::Token;
use unicode_segmentation::UnicodeSegmentation;

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;
}

/// Standard Unicode tokenizer
///
/// Splits on UAX #29 word boundaries, so punctuation and whitespace never
/// reach the filters. Case is preserved; lowercasing is a separate stage.
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0u32;

        for (offset, word) in text.unicode_word_indices() {
            if word.len() <= self.max_token_length {
                tokens.push(Token::new(word.to_string(), position, offset));
                position += 1;
            }
        }

        tokens
    }

    fn name(&self) -> &str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_on_whitespace_and_punctuation() {
        let tokens = StandardTokenizer::default().tokenize("Hello, world! It's 2024.");
        assert_eq!(texts(&tokens), vec!["Hello", "world", "It's", "2024"]);
        assert_eq!(tokens[1].offset, 7);
        assert_eq!(tokens[3].position, 3);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(StandardTokenizer::default().tokenize("").is_empty());
        assert!(StandardTokenizer::default().tokenize("  ...  ").is_empty());
    }

    #[test]
    fn overlong_tokens_are_dropped() {
        let tokenizer = StandardTokenizer { max_token_length: 4 };
        let tokens = tokenizer.tokenize("tiny enormous cat");
        assert_eq!(texts(&tokens), vec!["tiny", "cat"]);
    }
}
