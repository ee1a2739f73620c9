use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Character n-grams of every token.
#[derive(Debug, Clone)]
pub struct NGramFilter {
    pub min_gram: usize,
    pub max_gram: usize,
}

impl NGramFilter {
    pub fn new(min_gram: usize, max_gram: usize) -> Self {
        NGramFilter { min_gram, max_gram }
    }
}

impl TokenFilter for NGramFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut result = Vec::new();

        for token in tokens {
            // byte offset of every char boundary, including the end
            let mut bounds: Vec<usize> = token.text.char_indices().map(|(i, _)| i).collect();
            let char_len = bounds.len();
            bounds.push(token.text.len());

            for n in self.min_gram..=self.max_gram.min(char_len) {
                for i in 0..=char_len - n {
                    let (start, end) = (bounds[i], bounds[i + n]);
                    result.push(Token {
                        text: token.text[start..end].to_string(),
                        position: token.position,
                        offset: token.offset + start,
                        length: end - start,
                    });
                }
            }
        }

        result
    }

    fn name(&self) -> &str {
        "ngram"
    }
}
