// wave-edit -- Trimming, reversing and amplifying PCM wave files.
// Copyright (c) 2016 Kevin Brothaler and the riff-wave project authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The in-memory wave file.

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use super::chunk::{scan_chunks, ChunkRef, CHUNK_HEADER_LEN, RIFF_HEADER_LEN, RIFF_SIZE_OFFSET};
use super::{EditResult, FormatErrorKind};

pub const FORMAT_UNCOMPRESSED_PCM: u16 = 1;

// The fmt chunk has to reach the block align field for trimming to work.
const FMT_MIN_LEN: usize = 14;
const FMT_STANDARD_LEN: usize = 16;

/// The fields of the "fmt " chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtChunk {
    /// The compression code; 1 for uncompressed PCM.
    pub compression: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    /// Bytes in one frame: one sample for every channel.
    pub block_align: u16,
    /// Missing when the chunk stops right after the block align field.
    pub bits_per_sample: Option<u16>,
}

impl FmtChunk {
    /// Parses the payload of a "fmt " chunk.
    pub fn parse(payload: &[u8]) -> EditResult<FmtChunk> {
        if payload.len() < FMT_MIN_LEN {
            return Err(FormatErrorKind::FmtChunkTooShort(payload.len() as u32).into());
        }

        let bits_per_sample = if payload.len() >= FMT_STANDARD_LEN {
            Some(LittleEndian::read_u16(&payload[14..16]))
        } else {
            None
        };

        Ok(FmtChunk {
            compression: LittleEndian::read_u16(&payload[0..2]),
            num_channels: LittleEndian::read_u16(&payload[2..4]),
            sample_rate: LittleEndian::read_u32(&payload[4..8]),
            byte_rate: LittleEndian::read_u32(&payload[8..12]),
            block_align: LittleEndian::read_u16(&payload[12..14]),
            bits_per_sample,
        })
    }

    pub fn is_pcm(&self) -> bool {
        self.compression == FORMAT_UNCOMPRESSED_PCM
    }
}

/// A wave file held in memory, together with the location of its "fmt " and
/// "data" chunks.
///
/// The buffer is the single owner of the file's bytes. Chunks are tracked as
/// offsets into it, so the buffer can shrink during an edit without leaving
/// anything dangling. After every edit the RIFF size field equals the buffer
/// length minus 8, and the "data" size field equals the length of the sample
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveDocument {
    buffer: Vec<u8>,
    fmt_chunk: ChunkRef,
    data_chunk: ChunkRef,
    format: FmtChunk,
}

impl WaveDocument {
    /// Scans the buffer and takes ownership of it.
    pub fn from_bytes(buffer: Vec<u8>) -> EditResult<WaveDocument> {
        let scan = scan_chunks(&buffer)?;
        let format = FmtChunk::parse(&buffer[scan.fmt.payload_range()])?;

        if !format.is_pcm() {
            warn!(compression = format.compression,
                  "Input is not a PCM wave file; edits may not be sample accurate");
        }

        Ok(WaveDocument {
            buffer,
            fmt_chunk: scan.fmt,
            data_chunk: scan.data,
            format,
        })
    }

    pub fn format(&self) -> &FmtChunk {
        &self.format
    }

    pub fn fmt_chunk(&self) -> ChunkRef {
        self.fmt_chunk
    }

    pub fn data_chunk(&self) -> ChunkRef {
        self.data_chunk
    }

    /// The length of the whole file.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// The RIFF chunk size, as stored in the buffer.
    pub fn riff_size(&self) -> u32 {
        self.read_u32_at(RIFF_SIZE_OFFSET).unwrap_or(0)
    }

    /// The "data" chunk size, as stored in the buffer.
    pub fn data_size(&self) -> u32 {
        self.read_u32_at(self.data_chunk.size_field_offset()).unwrap_or(0)
    }

    /// The sample payload of the "data" chunk.
    pub fn samples(&self) -> &[u8] {
        &self.buffer[self.data_chunk.payload_range()]
    }

    /// The parts of the file that describe it: the RIFF header, the whole
    /// "fmt " chunk and the "data" chunk header.
    pub fn header_regions(&self) -> [(&'static str, &[u8]); 3] {
        let data_header = self.data_chunk.offset..self.data_chunk.payload_start();
        [
            ("RIFF", &self.buffer[..RIFF_HEADER_LEN]),
            ("fmt ", &self.buffer[self.fmt_chunk.range()]),
            ("data", &self.buffer[data_header]),
        ]
    }

    /// Confirms that the "fmt " and "data" chunks still sit where the scan
    /// found them.
    pub fn check(&self) -> EditResult<()> {
        let chunks = [
            (self.fmt_chunk, FormatErrorKind::MissingFmtChunk),
            (self.data_chunk, FormatErrorKind::MissingDataChunk),
        ];
        for (chunk, missing) in chunks {
            match self.buffer.get(chunk.range()) {
                Some(bytes) if bytes[..4] == chunk.tag => {}
                _ => return Err(missing.into()),
            }
        }
        Ok(())
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [u8] {
        let range = self.data_chunk.payload_range();
        &mut self.buffer[range]
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    /// Records the new length of the sample payload, after `shift` bytes were
    /// removed from behind it, and brings the size fields back in line with
    /// the buffer.
    pub(crate) fn set_data_len(&mut self, len: usize, shift: usize) {
        // A "fmt " chunk may follow the data, in which case it moved too.
        if self.fmt_chunk.offset > self.data_chunk.offset {
            self.fmt_chunk.offset -= shift;
        }
        self.data_chunk.size = len;
        self.sync_sizes();
    }

    /// Rewrites the RIFF and "data" size fields from the buffer length and the
    /// tracked payload length.
    pub(crate) fn sync_sizes(&mut self) {
        let riff_size = self.buffer.len().saturating_sub(CHUNK_HEADER_LEN);
        let data_size = self.data_chunk.size;
        let data_size_offset = self.data_chunk.size_field_offset();

        self.write_u32_at(RIFF_SIZE_OFFSET, clamp_to_u32(riff_size));
        self.write_u32_at(data_size_offset, clamp_to_u32(data_size));
    }

    fn read_u32_at(&self, offset: usize) -> Option<u32> {
        self.buffer.get(offset..offset + 4).map(LittleEndian::read_u32)
    }

    fn write_u32_at(&mut self, offset: usize, value: u32) {
        if let Some(field) = self.buffer.get_mut(offset..offset + 4) {
            LittleEndian::write_u32(field, value);
        }
    }
}

fn clamp_to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

// MARK: Tests
