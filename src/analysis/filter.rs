use crate::analysis::token::Token;

/// One stage of an analysis pipeline.
///
/// Filters consume the whole token batch of a field so that stages which look
/// across neighbouring tokens (shingles) share the interface with per-token ones.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    fn name(&self) -> &str;
}
