use std::sync::LazyLock;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, digit1, satisfy};
use nom::combinator::{map, not, opt, value};
use nom::sequence::{delimited, preceded, terminated};
use nom::{IResult, Parser};
use regex::Regex;
use tracing::debug;
use crate::core::error::{Error, Result};
use crate::query::ast::Occur;
use crate::search::fuzzy::MAX_EDITS;

static RESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[*?\[\]{}/:()^]+").expect("reserved character pattern is valid")
});

/// Removes the characters the grammar reserves for syntax it does not
/// support (wildcards, ranges, fields, grouping, boosts).
pub fn sanitize_query(input: &str) -> String {
    RESERVED.replace_all(input, "").into_owned()
}

/// One lexical unit of a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme<'a> {
    Word(&'a str),
    Fuzzy(&'a str, Option<&'a str>),
    Phrase(&'a str),
    Plus,
    Minus,
    Not,
    And,
    Or,
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && c != '"' && c != '~'
}

fn phrase(input: &str) -> IResult<&str, Lexeme<'_>> {
    map(delimited(char('"'), take_while(|c: char| c != '"'), char('"')), Lexeme::Phrase).parse(input)
}

// word, word~ or word~N; the suffix must end the word
fn word(input: &str) -> IResult<&str, Lexeme<'_>> {
    let fuzzy_suffix = preceded(char('~'), terminated(opt(digit1), not(satisfy(is_word_char))));

    map((take_while1(is_word_char), opt(fuzzy_suffix)), |(text, fuzzy)| match (text, fuzzy) {
        (text, Some(distance)) => Lexeme::Fuzzy(text, distance),
        ("AND", None) => Lexeme::And,
        ("OR", None) => Lexeme::Or,
        ("NOT", None) => Lexeme::Not,
        (text, None) => Lexeme::Word(text),
    }).parse(input)
}

fn lexeme(input: &str) -> IResult<&str, Lexeme<'_>> {
    alt((
        value(Lexeme::And, tag("&&")),
        value(Lexeme::Or, tag("||")),
        value(Lexeme::Plus, char('+')),
        value(Lexeme::Minus, char('-')),
        value(Lexeme::Not, char('!')),
        phrase,
        word,
    )).parse(input)
}

/// Splits a query string into lexemes.
pub fn tokenize(input: &str) -> Result<Vec<Lexeme<'_>>> {
    let mut lexemes = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        match lexeme(rest) {
            Ok((next, lexeme)) => {
                lexemes.push(lexeme);
                rest = next.trim_start();
            }
            Err(_) if rest.starts_with('"') => {
                return Err(Error::query_parse(format!("unterminated phrase: {}", rest)));
            }
            Err(_) => {
                return Err(Error::query_parse(format!("cannot parse query at '{}'", rest)));
            }
        }
    }
    Ok(lexemes)
}

/// Unanalyzed clause of a parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseKind {
    /// One or more bare words, analyzed together.
    Text(String),
    Phrase(String),
    Fuzzy { term: String, max_edits: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub occur: Occur,
    pub kind: ClauseKind,
    // Follows the previous clause with no operator in between
    adjacent: bool,
}

impl Clause {
    pub fn new(occur: Occur, kind: ClauseKind) -> Self {
        Clause { occur, kind, adjacent: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperator {
    And,
    Or,
}

/// Query parser for the classic single-field grammar
#[derive(Debug, Clone)]
pub struct QueryParser {
    pub default_operator: BooleanOperator,
}

impl Default for QueryParser {
    fn default() -> Self {
        QueryParser { default_operator: BooleanOperator::Or }
    }
}

impl QueryParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string into clauses
    /// Examples:
    /// - `rust programming` -> one SHOULD clause over both words
    /// - `rust AND programming` -> two MUST clauses
    /// - `+rust -java` -> MUST rust, MUST_NOT java
    /// - `"exact phrase"` -> phrase clause
    /// - `rust~1` -> fuzzy clause
    pub fn parse(&self, input: &str) -> Result<ParsedQuery> {
        let lexemes = tokenize(input)?;
        if lexemes.is_empty() {
            return Err(Error::query_parse("empty query"));
        }

        let default_occur = match self.default_operator {
            BooleanOperator::And => Occur::Must,
            BooleanOperator::Or => Occur::Should,
        };

        let mut clauses: Vec<Clause> = Vec::new();
        let mut prefix: Option<Occur> = None;
        let mut conjunction: Option<BooleanOperator> = None;
        let mut after_clause = false;

        for lexeme in lexemes {
            let kind = match lexeme {
                Lexeme::Plus | Lexeme::Minus | Lexeme::Not => {
                    if prefix.is_some() {
                        return Err(Error::query_parse("operator follows another operator"));
                    }
                    prefix = Some(if lexeme == Lexeme::Plus { Occur::Must } else { Occur::MustNot });
                    after_clause = false;
                    continue;
                }
                Lexeme::And | Lexeme::Or => {
                    if clauses.is_empty() || prefix.is_some() || conjunction.is_some() {
                        return Err(Error::query_parse("boolean operator without a left operand"));
                    }
                    conjunction = Some(if lexeme == Lexeme::And { BooleanOperator::And } else { BooleanOperator::Or });
                    after_clause = false;
                    continue;
                }
                Lexeme::Word(text) => ClauseKind::Text(text.to_string()),
                Lexeme::Phrase(text) => ClauseKind::Phrase(text.to_string()),
                Lexeme::Fuzzy(term, distance) => ClauseKind::Fuzzy {
                    term: term.to_string(),
                    max_edits: parse_edit_distance(term, distance)?,
                },
            };

            let mut occur = prefix.take().unwrap_or(default_occur);
            if conjunction == Some(BooleanOperator::And) {
                if let Some(previous) = clauses.last_mut().filter(|c| c.occur == Occur::Should) {
                    previous.occur = Occur::Must;
                }
                if occur == Occur::Should {
                    occur = Occur::Must;
                }
            }

            clauses.push(Clause { occur, kind, adjacent: after_clause });
            conjunction = None;
            after_clause = true;
        }

        if prefix.is_some() || conjunction.is_some() {
            return Err(Error::query_parse("query ends with an operator"));
        }

        let parsed = ParsedQuery { clauses: join_adjacent_words(clauses) };
        debug!(query = input, clauses = parsed.clauses.len(), "query parsed");
        Ok(parsed)
    }
}

fn parse_edit_distance(term: &str, distance: Option<&str>) -> Result<u8> {
    let Some(digits) = distance else {
        return Ok(MAX_EDITS);
    };
    match digits.parse::<u8>() {
        Ok(edits) if edits <= MAX_EDITS => Ok(edits),
        _ => Err(Error::query_parse(format!(
            "fuzzy distance {} on '{}' must be between 0 and {}", digits, term, MAX_EDITS
        ))),
    }
}

// Runs of bare SHOULD words form a single text clause
fn join_adjacent_words(clauses: Vec<Clause>) -> Vec<Clause> {
    let mut joined: Vec<Clause> = Vec::with_capacity(clauses.len());

    for clause in clauses {
        if clause.adjacent && clause.occur == Occur::Should {
            if let (
                Some(Clause { occur: Occur::Should, kind: ClauseKind::Text(previous), .. }),
                ClauseKind::Text(text),
            ) = (joined.last_mut(), &clause.kind) {
                previous.push(' ');
                previous.push_str(text);
                continue;
            }
        }
        joined.push(clause);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    fn parse(input: &str) -> Result<Vec<(Occur, ClauseKind)>> {
        QueryParser::new()
            .parse(input)
            .map(|q| q.clauses.into_iter().map(|c| (c.occur, c.kind)).collect())
    }

    fn text(s: &str) -> ClauseKind {
        ClauseKind::Text(s.to_string())
    }

    #[test]
    fn sanitizer_strips_reserved_characters() {
        assert_eq!(sanitize_query("title:(cat* OR d?g)^2 [a TO b] {x}/y"), "titlecat OR dg2 a TO b xy");
        assert_eq!(sanitize_query("plain words"), "plain words");
    }

    #[test]
    fn lexer_recognizes_operators() {
        assert_eq!(
            tokenize(r#"+cat -dog !fox a && b || "big red" c~ d~1 NOT e"#).unwrap(),
            vec![
                Lexeme::Plus, Lexeme::Word("cat"),
                Lexeme::Minus, Lexeme::Word("dog"),
                Lexeme::Not, Lexeme::Word("fox"),
                Lexeme::Word("a"), Lexeme::And, Lexeme::Word("b"),
                Lexeme::Or, Lexeme::Phrase("big red"),
                Lexeme::Fuzzy("c", None), Lexeme::Fuzzy("d", Some("1")),
                Lexeme::Not, Lexeme::Word("e"),
            ]
        );
    }

    #[test]
    fn bare_words_join_into_one_clause() {
        assert_eq!(parse("quick brown fox").unwrap(), vec![(Occur::Should, text("quick brown fox"))]);
        assert_eq!(
            parse("quick brown OR fox").unwrap(),
            vec![(Occur::Should, text("quick brown")), (Occur::Should, text("fox"))]
        );
    }

    #[test]
    fn and_promotes_both_operands() {
        assert_eq!(
            parse("cat AND dog bird").unwrap(),
            vec![(Occur::Must, text("cat")), (Occur::Must, text("dog")), (Occur::Should, text("bird"))]
        );
        assert_eq!(
            parse("cat && -dog").unwrap(),
            vec![(Occur::Must, text("cat")), (Occur::MustNot, text("dog"))]
        );
    }

    #[test]
    fn prefixes_phrases_and_fuzzy() {
        assert_eq!(
            parse(r#"+"cat sat" -mat teh~1 dgo~"#).unwrap(),
            vec![
                (Occur::Must, ClauseKind::Phrase("cat sat".to_string())),
                (Occur::MustNot, text("mat")),
                (Occur::Should, ClauseKind::Fuzzy { term: "teh".to_string(), max_edits: 1 }),
                (Occur::Should, ClauseKind::Fuzzy { term: "dgo".to_string(), max_edits: 2 }),
            ]
        );
    }

    #[test]
    fn default_and_operator() {
        let parser = QueryParser { default_operator: BooleanOperator::And };
        let clauses: Vec<Occur> = parser.parse("cat dog").unwrap().clauses.iter().map(|c| c.occur).collect();
        assert_eq!(clauses, vec![Occur::Must, Occur::Must]);
    }

    #[test]
    fn malformed_queries_are_parse_errors() {
        for input in ["", "   ", "\"open phrase", "AND cat", "cat OR", "cat -", "cat~3", "cat~x", "cat AND OR dog", "+ -cat"] {
            let err = parse(input).unwrap_err();
            assert_eq!(err.kind, ErrorKind::QueryParse, "{:?}", input);
        }
    }
}
