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

//! In-place editing of PCM wave files.
//!
//! A wave file is read into memory as a single buffer. The RIFF chunk list is
//! walked once to find the "fmt " and "data" chunks, and every edit after that
//! works directly on the bytes of the "data" payload. When an edit changes the
//! length of the payload, the size fields in the RIFF header and in the "data"
//! chunk header are rewritten so that the buffer can be saved as-is.
//!
//! Three edits are supported, always applied in this order:
//!
//! 1. Trim: drop sample frames from the beginning and the end of the data.
//! 2. Amplify: scale every 16-bit sample by a factor, saturating at the
//!    limits of the sample range.
//! 3. Reverse: reverse the bytes of the data payload.
//!
//! # The wave file format
//!
//! A wave file starts with the RIFF file header:
//!
//! Offset | Size | Data       |    Description
//! -----: | ---: | ---------- | ----------------------------------------------
//!      0 |    4 | "RIFF"     | Identifies the main chunk.
//!      4 |    4 | chunk size | Size of the rest of the file: the file length minus 8 bytes.
//!      8 |    4 | "WAVE"     | The form type. Other RIFF forms such as "AVI " are rejected.
//!
//! After the header comes a list of subchunks. Each one has an 8 byte header
//! followed by its payload:
//!
//! Offset | Size | Data       | Description
//! -----: | ---: | ---------- | -----------------------------------------------
//!      0 |    4 | tag        | Four ASCII bytes, compared byte for byte.
//!      4 |    4 | size       | Length of the payload, not counting the header or padding.
//!      8 |  ... | payload    | Exactly `size` bytes.
//!    ... |    1 | padding    | Present when `size` is odd, so that the next chunk starts on an even offset.
//!
//! Two subchunks are required. The "fmt " payload describes the samples:
//!
//! Offset | Size | Data            | Description
//! -----: | ---: | --------------- | -----------------------------------------
//!      0 |    2 | format (1)      | 1 for uncompressed PCM. Other codes load with a warning.
//!      2 |    2 | num channels    | Mono, stereo, or more.
//!      4 |    4 | sample rate     | Frames per second.
//!      8 |    4 | byte rate       | Bytes per second.
//!     12 |    2 | block align     | Bytes in one frame, i.e. one sample for every channel.
//!     14 |    2 | bits per sample | 16 for 16-bit audio. Optional in very old files.
//!
//! The "data" payload holds the interleaved samples. Any other chunk, such as
//! `LIST`, is skipped over when scanning and carried through edits untouched.
//!
//! # Example
//!
//! ```no_run
//! use wave_edit::{EditPipeline, EditRequest};
//!
//! let mut request = EditRequest::verify("in.wav");
//! request.output = Some("out.wav".into());
//! request.trim_begin = 100;
//! request.amplify = Some(0.5);
//!
//! let mut pipeline = EditPipeline::new(request);
//! pipeline.run().unwrap();
//! ```

use std::io;
use std::result;

use thiserror::Error;

// This is a helper macro that helps us validate results in our tests.
// Thank you bluss and durka42!
#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat $(if $guard:expr)*, $value:expr) => {
        match $value {
            $expected $(if $guard)* => {},
            ref actual => {
                panic!("assertion failed: `(left matches right)` (left: `{}`, right: `{:?}`",
                    stringify!($expected), actual);
            },
        }
    };
}

#[cfg(test)]
mod testing;

pub mod chunk;
pub mod document;
pub mod editor;
pub mod pipeline;
pub mod reader;
pub mod writer;

pub use chunk::{ChunkRef, ChunkScan};
pub use document::{FmtChunk, WaveDocument};
pub use editor::AmplifyStats;
pub use pipeline::{EditPipeline, EditRequest, PipelineState};
pub use reader::{load, read_document};
pub use writer::{save, write_document};

// MARK: Error types

/// Represents an error that occurred while loading, editing or saving a wave file.
#[derive(Debug, Error)]
pub enum EditError {
    /// The input is not a well-formed wave file.
    #[error("Format error: {0}")]
    Format(FormatErrorKind),
    /// The requested edit can't be applied to this file.
    #[error("Edit error: {0}")]
    Edit(EditErrorKind),
    /// An IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The output stopped accepting bytes before the whole file was written.
    #[error("Could not write data to output file: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
    /// A pipeline step was invoked from the wrong state.
    #[error("Pipeline step out of order: expected {expected:?}, found {actual:?}")]
    OutOfOrder {
        expected: PipelineState,
        actual: PipelineState,
    },
}

/// Represents a result when editing a wave file.
pub type EditResult<T> = result::Result<T, EditError>;

impl EditError {
    /// Returns true if the pipeline may carry on after this error, treating the
    /// failed step as a no-op.
    pub fn is_recoverable(&self) -> bool {
        matches!(*self, EditError::Edit(EditErrorKind::UnsupportedBitDepth(_)))
    }
}

impl From<FormatErrorKind> for EditError {
    fn from(kind: FormatErrorKind) -> EditError {
        EditError::Format(kind)
    }
}

impl From<EditErrorKind> for EditError {
    fn from(kind: EditErrorKind) -> EditError {
        EditError::Edit(kind)
    }
}

/// Represents a file format error, when the wave file is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatErrorKind {
    /// The file doesn't start with "RIFF", or the form type isn't "WAVE".
    #[error("Input file is not a WAVE audio file")]
    NotWaveFile,
    /// No "fmt " chunk was found.
    #[error("Input file does not contain a fmt chunk")]
    MissingFmtChunk,
    /// No "data" chunk was found.
    #[error("Input file does not contain a data chunk")]
    MissingDataChunk,
    /// A chunk declared a size of zero, or one that is negative when read as a
    /// signed 32-bit value.
    #[error("Chunk '{}' has an unusual size of {size} bytes", .tag.escape_ascii())]
    UnusualChunkSize { tag: [u8; 4], size: u32 },
    /// The "fmt " chunk is too short to hold the block align field.
    #[error("fmt chunk is too short ({0} bytes)")]
    FmtChunkTooShort(u32),
    /// A required chunk claims more bytes than the file holds.
    #[error("Chunk '{}' at offset {offset} runs past the end of the file", .tag.escape_ascii())]
    TruncatedChunk { tag: [u8; 4], offset: usize },
}

/// Represents an edit that can't be carried out with the given parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditErrorKind {
    /// Trimming would remove every byte of sample data, or more.
    #[error("Too many samples were specified: trimming {requested} bytes from {available} bytes of data")]
    TrimExceedsData { requested: u64, available: u64 },
    /// The amplification factor is zero, negative, or not a finite number.
    #[error("Amplification factor must be greater than zero, got {0}")]
    InvalidAmplificationFactor(f64),
    /// Amplify only understands 16-bit samples.
    #[error("Amplify only supports 16-bit samples, input has {}", describe_bits(.0))]
    UnsupportedBitDepth(Option<u16>),
}

fn describe_bits(bits_per_sample: &Option<u16>) -> String {
    match *bits_per_sample {
        Some(bits) => format!("{}-bit samples", bits),
        None => "no bits per sample field".to_string(),
    }
}

// MARK: Tests
