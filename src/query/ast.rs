/// Main query enum representing all query types
///
/// Terms here are already analyzed: they are matched against the index
/// dictionary verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Term(TermQuery),         // Single term search
    Phrase(PhraseQuery),     // Terms at fixed relative positions
    Bool(BoolQuery),         // Boolean combinations
    Fuzzy(FuzzyQuery),       // Edit-distance expansion of one term
    MatchNone,
}

/// Single term query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermQuery {
    pub term: String,
}

/// Phrase query for exact phrase matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseQuery {
    /// `(offset, term)` with offsets relative to the first term.
    pub terms: Vec<(u32, String)>,
}

/// Boolean query with must/should/must_not clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Query>,      // All must match (AND)
    pub should: Vec<Query>,    // At least one must match when `must` is empty
    pub must_not: Vec<Query>,  // None must match (NOT)
}

/// Fuzzy query implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyQuery {
    pub term: String,
    pub max_edits: u8,
}

/// How a clause takes part in a boolean query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

impl Query {
    pub fn term(term: impl Into<String>) -> Self {
        Query::Term(TermQuery { term: term.into() })
    }

    pub fn fuzzy(term: impl Into<String>, max_edits: u8) -> Self {
        Query::Fuzzy(FuzzyQuery { term: term.into(), max_edits })
    }

    /// OR of the given clauses, collapsing the trivial cases.
    pub fn any(mut clauses: Vec<Query>) -> Self {
        match clauses.len() {
            0 => Query::MatchNone,
            1 => clauses.remove(0),
            _ => Query::Bool(BoolQuery { should: clauses, ..BoolQuery::default() }),
        }
    }

    /// AND of the given clauses, collapsing the trivial cases.
    pub fn all(mut clauses: Vec<Query>) -> Self {
        match clauses.len() {
            0 => Query::MatchNone,
            1 => clauses.remove(0),
            _ => Query::Bool(BoolQuery { must: clauses, ..BoolQuery::default() }),
        }
    }
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, occur: Occur, query: Query) {
        match occur {
            Occur::Must => self.must.push(query),
            Occur::Should => self.should.push(query),
            Occur::MustNot => self.must_not.push(query),
        }
    }
}
