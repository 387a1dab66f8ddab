//! On-disk frame shared by the data log and the system file
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, includes itself and the checksum)
//! +------------------+
//! | Body             | (codec bytes)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over length + body)
//! +------------------+
//! ```

use std::io;

use super::checksum::compute_checksum;

/// Length prefix plus trailing checksum.
pub const FRAME_OVERHEAD: usize = 8;

/// One framed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Codec output, opaque to the storage layer
    pub body: Vec<u8>,
}

impl Frame {
    /// Wraps codec bytes in a frame.
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }

    /// Total number of bytes the frame occupies on disk.
    fn encoded_len(&self) -> usize {
        self.body.len() + FRAME_OVERHEAD
    }

    /// Serializes the frame.
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let total = u32::try_from(self.encoded_len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Frame body too large: {} bytes", self.body.len()),
            )
        })?;

        let mut out = Vec::with_capacity(total as usize);
        out.extend_from_slice(&total.to_le_bytes());
        out.extend_from_slice(&self.body);
        let checksum = compute_checksum(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
        Ok(out)
    }

    /// Reads the length prefix of a frame.
    pub fn declared_len(header: [u8; 4]) -> usize {
        u32::from_le_bytes(header) as usize
    }

    /// Parses a frame from the front of `data`.
    ///
    /// Returns the frame and the number of bytes consumed. With `verify` set
    /// the checksum must match; otherwise only the length is validated.
    pub fn deserialize(data: &[u8], verify: bool) -> io::Result<(Self, usize)> {
        if data.len() < FRAME_OVERHEAD {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Frame too short: {} bytes", data.len()),
            ));
        }

        let total = Self::declared_len([data[0], data[1], data[2], data[3]]);
        if total < FRAME_OVERHEAD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid frame length: {}", total),
            ));
        }
        if data.len() < total {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Frame truncated: expected {} bytes, got {}", total, data.len()),
            ));
        }

        let checksum_at = total - 4;
        if verify {
            let stored = u32::from_le_bytes([
                data[checksum_at],
                data[checksum_at + 1],
                data[checksum_at + 2],
                data[checksum_at + 3],
            ]);
            let computed = compute_checksum(&data[..checksum_at]);
            if stored != computed {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Checksum mismatch: computed {:08x}, stored {:08x}",
                        computed, stored
                    ),
                ));
            }
        }

        Ok((Self::new(data[4..checksum_at].to_vec()), total))
    }
}
