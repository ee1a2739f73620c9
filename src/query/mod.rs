pub mod ast;
pub mod builder;
pub mod parser;

pub use ast::{BoolQuery, Occur, Query};
pub use parser::{sanitize_query, QueryParser};
