use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Compressed block storage for general purpose data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedBlock {
    pub data: Vec<u8>,
    pub original_size: usize,
    pub compression: CompressionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionType {
    #[serde(rename = "none")]
    None,
    #[default]
    #[serde(rename = "lz4")]
    LZ4,      // Fast compression, ratio 2-3x
    #[serde(rename = "zstd")]
    Zstd,     // Better ratio (3-5x), slower
    #[serde(rename = "snappy")]
    Snappy,   // Balanced
}

impl CompressedBlock {
    pub fn compress(data: &[u8], compression: CompressionType) -> Result<Self> {
        let compressed = match compression {
            CompressionType::None => data.to_vec(),

            CompressionType::LZ4 => lz4_flex::compress_prepend_size(data),

            CompressionType::Zstd => {
                zstd::encode_all(data, 3)?  // Level 3 is balanced
            }

            CompressionType::Snappy => {
                let mut encoder = snap::raw::Encoder::new();
                encoder.compress_vec(data)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))?
            }
        };

        Ok(CompressedBlock {
            data: compressed,
            original_size: data.len(),
            compression,
        })
    }

    pub fn decompress(&self) -> Result<Vec<u8>> {
        let data = match self.compression {
            CompressionType::None => self.data.clone(),

            CompressionType::LZ4 => {
                lz4_flex::decompress_size_prepended(&self.data)
                    .map_err(|e| Error::new(ErrorKind::Parse, e.to_string()))?
            }

            CompressionType::Zstd => {
                zstd::decode_all(&self.data[..])
                    .map_err(|e| Error::new(ErrorKind::Parse, e.to_string()))?
            }

            CompressionType::Snappy => {
                let mut decoder = snap::raw::Decoder::new();
                decoder.decompress_vec(&self.data)
                    .map_err(|e| Error::new(ErrorKind::Parse, e.to_string()))?
            }
        };

        if data.len() != self.original_size {
            return Err(Error::new(ErrorKind::Parse, format!(
                "decompressed {} bytes, expected {}", data.len(), self.original_size
            )));
        }
        Ok(data)
    }
}
