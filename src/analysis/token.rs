use serde::{Serialize, Deserialize};

/// Token representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,      // The token text, an index term once analysis is done
    pub position: u32,     // Position in the field (gaps survive removed tokens)
    pub offset: usize,     // Byte offset in original text
    pub length: usize,     // Source span length in bytes
}

impl Token {
    pub fn new(text: String, position: u32, offset: usize) -> Self {
        let length = text.len();
        Token {
            text,
            position,
            offset,
            length,
        }
    }
}
