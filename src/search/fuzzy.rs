use fst::automaton::{Automaton, Str};
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, DFA, SINK_STATE};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::core::error::{Error, Result};
use crate::index::inverted::TermDictionary;

/// Largest edit distance the automaton builder supports here.
pub const MAX_EDITS: u8 = 2;

/// Fuzzy matching settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    pub max_edits: u8,
    /// Leading characters a candidate must share with the query term.
    pub prefix_length: usize,
    /// Count an adjacent swap (teh -> the) as one edit instead of two.
    pub transpositions: bool,
    /// Upper bound on the terms one fuzzy clause expands to.
    pub max_expansions: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        FuzzyConfig {
            max_edits: MAX_EDITS,
            prefix_length: 0,
            transpositions: false,
            max_expansions: 50,
        }
    }
}

impl FuzzyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_edits > MAX_EDITS {
            return Err(Error::config(format!(
                "max_edits {} exceeds the supported maximum of {}", self.max_edits, MAX_EDITS
            )));
        }
        if self.max_expansions == 0 {
            return Err(Error::config("max_expansions must be at least 1"));
        }
        Ok(())
    }
}

/// Adapts a Levenshtein DFA to the `fst` automaton interface.
struct LevenshteinDfa<'a>(&'a DFA);

impl Automaton for LevenshteinDfa<'_> {
    type State = u32;

    fn start(&self) -> u32 {
        self.0.initial_state()
    }

    fn is_match(&self, state: &u32) -> bool {
        matches!(self.0.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &u32) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &u32, byte: u8) -> u32 {
        self.0.transition(*state, byte)
    }
}

/// A dictionary term within reach of the query term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub term: String,
    pub distance: u8,
}

/// Expands query terms to the dictionary terms within `max_edits`.
pub struct FuzzyMatcher {
    builder: LevenshteinAutomatonBuilder,
    config: FuzzyConfig,
}

impl FuzzyMatcher {
    pub fn new(config: FuzzyConfig) -> Result<Self> {
        config.validate()?;
        Ok(FuzzyMatcher {
            builder: LevenshteinAutomatonBuilder::new(config.max_edits, config.transpositions),
            config,
        })
    }

    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    /// Closest terms first, ties in byte order, at most `max_expansions`.
    pub fn expand(&self, dictionary: &TermDictionary, term: &str) -> Vec<FuzzyMatch> {
        let dfa = self.builder.build_dfa(term);

        let candidates = if self.config.prefix_length > 0 {
            let end = term.char_indices()
                .nth(self.config.prefix_length)
                .map(|(at, _)| at)
                .unwrap_or(term.len());
            let prefix = Str::new(&term[..end]).starts_with();
            dictionary.search(prefix.intersection(LevenshteinDfa(&dfa)))
        } else {
            dictionary.search(LevenshteinDfa(&dfa))
        };

        let mut matches: Vec<FuzzyMatch> = candidates.into_iter()
            .filter_map(|candidate| match dfa.eval(&candidate) {
                Distance::Exact(distance) => Some(FuzzyMatch { term: candidate, distance }),
                Distance::AtLeast(_) => None,
            })
            .collect();

        matches.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.term.cmp(&b.term)));
        matches.truncate(self.config.max_expansions);

        debug!(term, expansions = matches.len(), "fuzzy term expanded");
        matches
    }
}
