//! Transfer selection: one atomic request or ordered chunks

use crate::registry::UploadMethod;

/// Contiguous byte range of the source file; `index` is 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: u32,
    pub offset: u64,
    pub len: u64,
}

/// How a file of a given size is sent, chosen once per upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    /// Whole file in one request (size <= chunk size)
    Atomic { size: u64 },
    /// Ordered, non-overlapping ranges covering the file
    Chunked(Vec<ChunkRange>),
}

impl Transfer {
    pub fn plan(size: u64, chunk_size: u64) -> Self {
        // chunk_size == 0 would never terminate; treat it as "no chunking"
        if chunk_size == 0 || size <= chunk_size {
            return Transfer::Atomic { size };
        }

        let count = size.div_ceil(chunk_size);
        let ranges = (0..count)
            .map(|i| {
                let offset = i * chunk_size;
                ChunkRange {
                    index: (i + 1) as u32,
                    offset,
                    len: chunk_size.min(size - offset),
                }
            })
            .collect();

        Transfer::Chunked(ranges)
    }

    pub fn method(&self) -> UploadMethod {
        match self {
            Transfer::Atomic { .. } => UploadMethod::Post,
            Transfer::Chunked(_) => UploadMethod::PutParts,
        }
    }

    pub fn chunk_count(&self) -> u32 {
        match self {
            Transfer::Atomic { .. } => 1,
            Transfer::Chunked(ranges) => ranges.len() as u32,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transfer::Atomic { .. } => "Atomic",
            Transfer::Chunked(_) => "Chunked",
        }
    }
}
