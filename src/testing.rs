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

//! In-memory wave files for unit tests.

use byteorder::{LittleEndian, WriteBytesExt};

/// Builds a canonical PCM wave file in memory, with optional extra chunks
/// before and after the "data" chunk.
pub struct WaveBuilder {
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    samples: Vec<u8>,
    before_data: Vec<u8>,
    after_data: Vec<u8>,
}

impl WaveBuilder {
    pub fn new(num_channels: u16, bits_per_sample: u16) -> WaveBuilder {
        WaveBuilder {
            num_channels,
            sample_rate: 44100,
            bits_per_sample,
            samples: Vec::new(),
            before_data: Vec::new(),
            after_data: Vec::new(),
        }
    }

    pub fn samples(mut self, samples: &[u8]) -> WaveBuilder {
        self.samples = samples.to_vec();
        self
    }

    pub fn samples_i16(mut self, samples: &[i16]) -> WaveBuilder {
        self.samples.clear();
        for &sample in samples {
            self.samples.write_i16::<LittleEndian>(sample).unwrap();
        }
        self
    }

    pub fn chunk_before_data(mut self, tag: &[u8; 4], payload: &[u8]) -> WaveBuilder {
        write_chunk(&mut self.before_data, tag, payload);
        self
    }

    pub fn chunk_after_data(mut self, tag: &[u8; 4], payload: &[u8]) -> WaveBuilder {
        write_chunk(&mut self.after_data, tag, payload);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let block_align = self.num_channels * (self.bits_per_sample / 8);

        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");
        body.extend_from_slice(b"fmt ");
        body.write_u32::<LittleEndian>(16).unwrap();
        body.write_u16::<LittleEndian>(1).unwrap();
        body.write_u16::<LittleEndian>(self.num_channels).unwrap();
        body.write_u32::<LittleEndian>(self.sample_rate).unwrap();
        body.write_u32::<LittleEndian>(self.sample_rate * block_align as u32).unwrap();
        body.write_u16::<LittleEndian>(block_align).unwrap();
        body.write_u16::<LittleEndian>(self.bits_per_sample).unwrap();
        body.extend_from_slice(&self.before_data);
        write_chunk(&mut body, b"data", &self.samples);
        body.extend_from_slice(&self.after_data);

        let mut file = Vec::new();
        file.extend_from_slice(b"RIFF");
        file.write_u32::<LittleEndian>(body.len() as u32).unwrap();
        file.extend_from_slice(&body);
        file
    }
}

/// Appends a chunk with its pad byte, if one is needed.
pub fn write_chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}
