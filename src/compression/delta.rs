use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, ErrorKind, Result};

/// Delta encoding for sorted integers
pub struct DeltaEncoder;

impl DeltaEncoder {
    /// Appends `nums` (strictly increasing) as VByte gaps; the first gap is
    /// taken against zero. The count is not written.
    pub fn encode_sorted_u64(output: &mut Vec<u8>, nums: &[u64]) -> Result<()> {
        let mut prev = 0u64;
        for (i, &num) in nums.iter().enumerate() {
            if i > 0 && num <= prev {
                return Err(Error::new(ErrorKind::Internal, format!(
                    "delta input not strictly increasing: {} after {}", num, prev
                )));
            }
            VByteEncoder::encode_u64(output, num - prev);
            prev = num;
        }
        Ok(())
    }

    /// Same as [`encode_sorted_u64`](Self::encode_sorted_u64) for positions;
    /// repeated values are allowed.
    pub fn encode_sorted_u32(output: &mut Vec<u8>, nums: &[u32]) -> Result<()> {
        let mut prev = 0u32;
        for &num in nums {
            if num < prev {
                return Err(Error::new(ErrorKind::Internal, "delta input not sorted"));
            }
            VByteEncoder::encode_u32(output, num - prev);
            prev = num;
        }
        Ok(())
    }

    pub fn decode_sorted_u32(reader: &mut VByteReader<'_>, count: usize) -> Result<Vec<u32>> {
        let mut nums = Vec::with_capacity(count);
        let mut prev = 0u32;
        for _ in 0..count {
            let delta = reader.read_u32()?;
            prev = prev.checked_add(delta)
                .ok_or_else(|| Error::new(ErrorKind::Parse, "delta overflow"))?;
            nums.push(prev);
        }
        Ok(nums)
    }

    pub fn decode_sorted_u64(reader: &mut VByteReader<'_>, count: usize) -> Result<Vec<u64>> {
        let mut nums = Vec::with_capacity(count);
        let mut prev = 0u64;
        for _ in 0..count {
            let delta = reader.read_u64()?;
            prev = prev.checked_add(delta)
                .ok_or_else(|| Error::new(ErrorKind::Parse, "delta overflow"))?;
            nums.push(prev);
        }
        Ok(nums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_are_small() {
        let mut out = Vec::new();
        DeltaEncoder::encode_sorted_u64(&mut out, &[1_000_000, 1_000_001, 1_000_005]).unwrap();
        assert_eq!(out.len(), 3 + 1 + 1);

        let mut reader = VByteReader::new(&out);
        let decoded = DeltaEncoder::decode_sorted_u64(&mut reader, 3).unwrap();
        assert_eq!(decoded, vec![1_000_000, 1_000_001, 1_000_005]);
    }

    #[test]
    fn unsorted_doc_ids_are_rejected() {
        let mut out = Vec::new();
        assert!(DeltaEncoder::encode_sorted_u64(&mut out, &[5, 5]).is_err());
        assert!(DeltaEncoder::encode_sorted_u64(&mut out, &[5, 2]).is_err());
    }
}
