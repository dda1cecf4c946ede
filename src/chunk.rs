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

//! Walking the RIFF chunk list of an in-memory wave file.

use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};

use super::{EditResult, FormatErrorKind};

pub const RIFF_TAG: &[u8; 4] = b"RIFF";
pub const WAVE_TAG: &[u8; 4] = b"WAVE";
pub const FMT_TAG: &[u8; 4] = b"fmt ";
pub const DATA_TAG: &[u8; 4] = b"data";

/// Length of a chunk header: a 4 byte tag followed by a 4 byte size.
pub const CHUNK_HEADER_LEN: usize = 8;

/// Length of the RIFF header, including the "WAVE" form type.
pub const RIFF_HEADER_LEN: usize = 12;

/// Offset of the RIFF chunk size field.
pub const RIFF_SIZE_OFFSET: usize = 4;

/// Rounds an offset up to the next word boundary. RIFF chunks start on even
/// offsets, and the padding byte isn't counted in the chunk size.
pub fn word_align(offset: usize) -> usize {
    offset + (offset & 1)
}

/// The location of a chunk inside a wave buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRef {
    /// The four byte chunk tag.
    pub tag: [u8; 4],
    /// Offset of the chunk header from the start of the buffer.
    pub offset: usize,
    /// Length of the payload, excluding the header and any padding byte.
    pub size: usize,
}

impl ChunkRef {
    pub fn size_field_offset(&self) -> usize {
        self.offset + 4
    }

    pub fn payload_start(&self) -> usize {
        self.offset + CHUNK_HEADER_LEN
    }

    pub fn payload_end(&self) -> usize {
        self.payload_start() + self.size
    }

    pub fn payload_range(&self) -> Range<usize> {
        self.payload_start()..self.payload_end()
    }

    /// The offset where the next chunk would start.
    pub fn padded_end(&self) -> usize {
        word_align(self.payload_end())
    }

    /// The header and payload of this chunk.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.payload_end()
    }
}

/// The chunks found by `scan_chunks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkScan {
    pub fmt: ChunkRef,
    pub data: ChunkRef,
}

/// Walks the chunk list of a wave file and finds the "fmt " and "data" chunks.
///
/// Other chunks are skipped with a warning. Only the first "fmt " and "data"
/// chunks count; any later duplicates are skipped the same way.
pub fn scan_chunks(buffer: &[u8]) -> EditResult<ChunkScan> {
    validate_is_riff_file(buffer)?;
    validate_is_wave_file(buffer)?;

    let mut fmt = None;
    let mut data = None;
    let mut cursor = RIFF_HEADER_LEN;

    while cursor < buffer.len() {
        let remaining = buffer.len() - cursor;
        if remaining < CHUNK_HEADER_LEN {
            warn!(offset = cursor, remaining, "Ignoring trailing bytes too short for a chunk header");
            break;
        }

        let chunk = read_chunk_header(buffer, cursor)?;
        let overruns = chunk.size > remaining - CHUNK_HEADER_LEN;

        let slot = match &chunk.tag {
            FMT_TAG if fmt.is_none() => Some(&mut fmt),
            DATA_TAG if data.is_none() => Some(&mut data),
            _ => None,
        };

        match slot {
            Some(slot) => {
                if overruns {
                    return Err(FormatErrorKind::TruncatedChunk {
                        tag: chunk.tag,
                        offset: chunk.offset,
                    }.into());
                }
                debug!(tag = %chunk.tag.escape_ascii(), offset = chunk.offset, size = chunk.size,
                       "Found chunk");
                *slot = Some(chunk);
            }
            None => {
                warn!(tag = %chunk.tag.escape_ascii(), offset = chunk.offset, size = chunk.size,
                      "Unhandled chunk");
                if overruns {
                    warn!(tag = %chunk.tag.escape_ascii(), "Chunk runs past the end of the file");
                    break;
                }
            }
        }

        cursor = chunk.padded_end();
    }

    let data = data.ok_or(FormatErrorKind::MissingDataChunk)?;
    let fmt = fmt.ok_or(FormatErrorKind::MissingFmtChunk)?;

    Ok(ChunkScan { fmt, data })
}

fn validate_is_riff_file(buffer: &[u8]) -> EditResult<()> {
    // The RIFF chunk size isn't validated, so that files with an incorrect
    // size can still be loaded. It is rewritten on save.
    validate_tag(buffer, 0, RIFF_TAG)
}

fn validate_is_wave_file(buffer: &[u8]) -> EditResult<()> {
    validate_tag(buffer, RIFF_SIZE_OFFSET + 4, WAVE_TAG)
}

fn validate_tag(buffer: &[u8], offset: usize, expected_tag: &[u8; 4]) -> EditResult<()> {
    match buffer.get(offset..offset + 4) {
        Some(tag) if tag == expected_tag => Ok(()),
        _ => Err(FormatErrorKind::NotWaveFile.into()),
    }
}

/// Reads the chunk header at `offset`. The caller guarantees that at least
/// `CHUNK_HEADER_LEN` bytes remain.
fn read_chunk_header(buffer: &[u8], offset: usize) -> EditResult<ChunkRef> {
    let mut tag = [0u8; 4];
    tag.copy_from_slice(&buffer[offset..offset + 4]);
    let size = LittleEndian::read_u32(&buffer[offset + 4..offset + CHUNK_HEADER_LEN]);

    if size as i32 <= 0 {
        return Err(FormatErrorKind::UnusualChunkSize { tag, size }.into());
    }

    Ok(ChunkRef {
        tag,
        offset,
        size: size as usize,
    })
}

// MARK: Tests
