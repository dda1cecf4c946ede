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

use std::fs::File;
use std::io;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use super::document::WaveDocument;
use super::EditResult;

// MARK: Reading functions

trait ReadWholeExt: Read + Seek {
    /// Finds the length of the stream and rewinds to the start.
    fn stream_len_and_rewind(&mut self) -> io::Result<u64> {
        let len = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(0))?;
        Ok(len)
    }

    fn read_whole(&mut self) -> io::Result<Vec<u8>> {
        let len = self.stream_len_and_rewind()?;
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "file is too large to load"))?;

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len)
            .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))?;
        buffer.resize(len, 0);
        // A short read comes back as an UnexpectedEof error.
        self.read_exact(&mut buffer)?;

        Ok(buffer)
    }
}

impl<T> ReadWholeExt for T where T: Read + Seek {}

/// Reads the whole wave file at `path` into memory.
pub fn load<P: AsRef<Path>>(path: P) -> EditResult<WaveDocument> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let document = read_document(file)?;
    debug!(path = %path.display(), len = document.buffer_len(), "Loaded wave file");
    Ok(document)
}

/// Reads a whole wave file from `reader` and locates its chunks.
pub fn read_document<R: Read + Seek>(mut reader: R) -> EditResult<WaveDocument> {
    let buffer = reader.read_whole()?;
    WaveDocument::from_bytes(buffer)
}

// MARK: Tests
