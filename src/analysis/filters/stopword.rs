use std::collections::HashSet;
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Built-in English stop-word list, the same words spaCy ships.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything",
    "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "becomes", "becoming", "been", "before", "beforehand",
    "behind", "being", "below", "beside", "besides", "between", "beyond", "both",
    "bottom", "but", "by", "ca", "call", "can", "cannot", "could", "did", "do", "does",
    "doing", "done", "down", "due", "during", "each", "eight", "either", "eleven",
    "else", "elsewhere", "empty", "enough", "even", "ever", "every", "everyone",
    "everything", "everywhere", "except", "few", "fifteen", "fifty", "first", "five",
    "for", "former", "formerly", "forty", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself",
    "his", "how", "however", "hundred", "i", "if", "in", "indeed", "into", "is", "it",
    "its", "itself", "just", "keep", "last", "latter", "latterly", "least", "less",
    "made", "make", "many", "may", "me", "meanwhile", "might", "mine", "more",
    "moreover", "most", "mostly", "move", "much", "must", "my", "myself", "name",
    "namely", "neither", "never", "nevertheless", "next", "nine", "no", "nobody",
    "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often",
    "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our",
    "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please",
    "put", "quite", "rather", "re", "really", "regarding", "same", "say", "see", "seem",
    "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "take", "ten", "than",
    "that", "the", "their", "them", "themselves", "then", "thence", "there",
    "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they",
    "third", "this", "those", "though", "three", "through", "throughout", "thru",
    "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty",
    "two", "under", "unless", "until", "up", "upon", "us", "used", "using", "various",
    "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole",
    "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you",
    "your", "yours", "yourself", "yourselves",
    // Clitics split off by tokenizers that separate contractions
    "'d", "’d", "‘d", "'ll", "’ll", "‘ll", "'m", "’m", "‘m", "'re", "’re",
    "‘re", "'s", "’s", "‘s", "'ve", "’ve", "‘ve", "n't", "n’t", "n‘t",
];

#[derive(Debug, Clone)]
pub struct StopWordFilter {
    pub stop_words: HashSet<String>,
}

impl StopWordFilter {
    /// Words are matched case-insensitively.
    pub fn new(stop_words: Vec<String>) -> Self {
        StopWordFilter {
            stop_words: stop_words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn english() -> Self {
        let words = ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect();
        StopWordFilter::new(words)
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word) || self.stop_words.contains(&word.to_lowercase())
    }
}

impl TokenFilter for StopWordFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .filter(|token| !self.is_stop_word(&token.text))
            .collect()
    }

    fn name(&self) -> &str {
        "stop_words"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_stop_words_keeping_positions() {
        let tokens = ["the", "cat", "sat", "on", "The", "mat"]
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
            .collect();
        let out = StopWordFilter::english().filter(tokens);
        let kept: Vec<_> = out.iter().map(|t| (t.text.as_str(), t.position)).collect();
        assert_eq!(kept, vec![("cat", 1), ("sat", 2), ("mat", 5)]);
    }

    #[test]
    fn english_list_covers_common_verbs_and_clitics() {
        let filter = StopWordFilter::english();
        let words = [
            "back", "first", "last", "get", "give", "go", "made", "say", "see", "top", "using",
            "various", "'s", "n't", "’ll", "'re",
        ];
        for word in words {
            assert!(filter.is_stop_word(word), "{}", word);
        }
        assert!(!filter.is_stop_word("cat"));
    }

    #[test]
    fn custom_list_replaces_the_default() {
        let filter = StopWordFilter::new(vec!["Cat".to_string()]);
        assert!(filter.is_stop_word("cat"));
        assert!(!filter.is_stop_word("the"));
    }
}
