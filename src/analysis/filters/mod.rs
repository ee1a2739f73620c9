pub mod lowercase;
pub mod ngram;
pub mod pattern;
pub mod porter;
pub mod shingle;
pub mod stemmer;
pub mod stopword;
