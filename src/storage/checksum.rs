//! CRC32 (IEEE) checksums for storage frames.

use crc32fast::Hasher;

/// Computes the CRC32 of `data`.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_deterministic() {
        let data = b"{\"_id\":\"0102030405060708\"}";
        assert_eq!(compute_checksum(data), compute_checksum(data));
    }

    #[test]
    fn test_checksum_detects_bit_flip() {
        let mut data = b"norimdb frame".to_vec();
        let before = compute_checksum(&data);
        data[3] ^= 0x01;
        assert_ne!(before, compute_checksum(&data));
    }
}
