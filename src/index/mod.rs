pub mod inverted;
pub mod posting;
pub mod index_reader;
