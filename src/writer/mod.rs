pub mod index_writer;

pub use index_writer::{build_index, BuildOptions, BuildReport, IndexWriter, SkippedDocument};
