use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

pub const TOKEN_SEPARATOR: &str = " ";

/// Word-level n-grams over runs of adjacent tokens.
///
/// Two tokens are adjacent only if their positions differ by exactly one, so a
/// window never bridges a token removed by an earlier stage.
#[derive(Debug, Clone)]
pub struct ShingleFilter {
    pub min_gram: usize,
    pub max_gram: usize,
    pub output_unigrams: bool,
}

impl ShingleFilter {
    pub fn new(min_gram: usize, max_gram: usize, output_unigrams: bool) -> Self {
        ShingleFilter { min_gram, max_gram, output_unigrams }
    }

    fn emit_run(&self, run: &[Token], out: &mut Vec<Token>) {
        for start in 0..run.len() {
            if self.output_unigrams && self.min_gram > 1 {
                out.push(run[start].clone());
            }
            for n in self.min_gram..=self.max_gram {
                if start + n > run.len() {
                    break;
                }
                let window = &run[start..start + n];
                let text = window.iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(TOKEN_SEPARATOR);
                let last = &window[n - 1];
                out.push(Token {
                    text,
                    position: window[0].position,
                    offset: window[0].offset,
                    length: last.offset + last.length - window[0].offset,
                });
            }
        }
    }
}

impl TokenFilter for ShingleFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut result = Vec::new();
        let mut run: Vec<Token> = Vec::new();

        for token in tokens {
            let contiguous = run.last()
                .map(|prev| token.position == prev.position + 1)
                .unwrap_or(true);
            if !contiguous {
                self.emit_run(&run, &mut result);
                run.clear();
            }
            run.push(token);
        }
        self.emit_run(&run, &mut result);

        result
    }

    fn name(&self) -> &str {
        "shingle"
    }
}
