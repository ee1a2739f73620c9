use std::collections::HashSet;
use tracing::debug;
use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;
use crate::query::ast::{BoolQuery, PhraseQuery, Query};
use crate::query::parser::{ClauseKind, ParsedQuery};

/// Turns parsed clauses into executable queries by running their text
/// through the index analyzer.
pub struct QueryBuilder<'a> {
    analyzer: &'a Analyzer,
    field: &'a str,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(analyzer: &'a Analyzer, field: &'a str) -> Self {
        QueryBuilder { analyzer, field }
    }

    pub fn build(&self, parsed: &ParsedQuery) -> Query {
        let mut query = BoolQuery::new();
        for clause in &parsed.clauses {
            let built = match &clause.kind {
                ClauseKind::Text(text) => self.text(text),
                ClauseKind::Phrase(text) => self.phrase(text),
                ClauseKind::Fuzzy { term, max_edits } => self.fuzzy(term, *max_edits),
            };
            // Clauses made only of stop words vanish, as in the analyzed text
            if let Some(built) = built {
                query.add(clause.occur, built);
            }
        }

        let query = if query.must.is_empty() && query.must_not.is_empty() {
            Query::any(query.should)
        } else {
            Query::Bool(query)
        };
        debug!(?query, "query rewritten");
        query
    }

    /// Several analyzed terms become a nested OR.
    pub fn text(&self, text: &str) -> Option<Query> {
        let terms: Vec<Query> = self.analyzer.terms(self.field, text)
            .into_iter()
            .map(Query::term)
            .collect();
        (!terms.is_empty()).then(|| Query::any(terms))
    }

    pub fn phrase(&self, text: &str) -> Option<Query> {
        let tokens: Vec<Token> = self.analyzer.analyze(self.field, text).collect();
        match tokens.len() {
            0 => return None,
            1 => return Some(Query::term(tokens[0].text.clone())),
            _ => {}
        }

        // Terms stacked on one position (n-gram output) cannot be placed
        // relative to each other; require all of them instead.
        let mut positions = HashSet::with_capacity(tokens.len());
        if !tokens.iter().all(|token| positions.insert(token.position)) {
            return Some(Query::all(tokens.into_iter().map(|t| Query::term(t.text)).collect()));
        }

        let first = tokens.iter().map(|t| t.position).min().unwrap_or(0);
        Some(Query::Phrase(PhraseQuery {
            terms: tokens.into_iter().map(|t| (t.position - first, t.text)).collect(),
        }))
    }

    pub fn fuzzy(&self, text: &str, max_edits: u8) -> Option<Query> {
        let clauses: Vec<Query> = self.analyzer.terms(self.field, text)
            .into_iter()
            .map(|term| Query::fuzzy(term, max_edits))
            .collect();
        (!clauses.is_empty()).then(|| Query::any(clauses))
    }
}
