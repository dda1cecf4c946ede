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

use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use super::document::WaveDocument;
use super::{EditError, EditResult};

// MARK: Writing functions

/// Writes `document` to a new file at `path`, replacing any existing file.
///
/// If the write fails part way through, the partial file is removed.
pub fn save<P: AsRef<Path>>(document: WaveDocument, path: P) -> EditResult<usize> {
    let path = path.as_ref();
    let file = File::create(path)?;

    match write_document(document, file) {
        Ok(written) => {
            debug!(path = %path.display(), written, "Saved wave file");
            Ok(written)
        }
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %remove_err, "Could not remove partial output");
            }
            Err(err)
        }
    }
}

/// Writes the whole buffer of `document` to `writer`, after bringing its size
/// fields in line with the buffer. Returns the number of bytes written.
pub fn write_document<W: Write>(mut document: WaveDocument, mut writer: W) -> EditResult<usize> {
    document.sync_sizes();

    let bytes = document.as_bytes();
    let written = write_counted(&mut writer, bytes)?;
    if written != bytes.len() {
        return Err(EditError::ShortWrite {
            written,
            expected: bytes.len(),
        });
    }
    writer.flush()?;

    Ok(written)
}

/// Writes as much of `buf` as the writer accepts, stopping early if it
/// reports that it wrote nothing.
fn write_counted<W: Write>(writer: &mut W, mut buf: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => break,
            Ok(n) => {
                written += n;
                buf = &buf[n..];
            }
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(written)
}

// MARK: Tests
