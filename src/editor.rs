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

//! Edits that work directly on the sample payload of a `WaveDocument`.

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};

use super::document::WaveDocument;
use super::{EditErrorKind, EditResult};

/// What an amplify pass did to the samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmplifyStats {
    /// The number of 16-bit samples scaled.
    pub samples: usize,
    /// How many of them had to be clamped to the 16-bit range.
    pub clipped: usize,
}

impl WaveDocument {
    /// Removes `trim_begin` frames from the start of the sample data and
    /// `trim_end` frames from the end. A frame is `block_align` bytes.
    ///
    /// Chunks that follow the "data" chunk are moved down so that the buffer
    /// stays contiguous. At least one byte of sample data has to remain.
    /// Returns the number of sample bytes removed.
    ///
    /// When the kept payload changes between odd and even length, a padding
    /// byte is added or dropped, so the RIFF size can shrink by one byte more
    /// or less than the number of sample bytes removed.
    pub fn trim(&mut self, trim_begin: u32, trim_end: u32) -> EditResult<usize> {
        let block_align = u64::from(self.format().block_align);
        let data = self.data_chunk();

        let head = u64::from(trim_begin) * block_align;
        let tail = u64::from(trim_end) * block_align;
        let requested = head + tail;
        let available = data.size as u64;

        if requested >= available {
            return Err(EditErrorKind::TrimExceedsData { requested, available }.into());
        }
        if requested == 0 {
            if trim_begin > 0 || trim_end > 0 {
                warn!(trim_begin, trim_end, "Block align is zero; nothing was trimmed");
            }
            return Ok(0);
        }

        let head = head as usize;
        let removed = requested as usize;
        let kept = data.size - removed;
        let start = data.payload_start();

        // The old end includes the padding byte, if the file has one.
        let old_end = data.padded_end().min(self.buffer_len());
        let has_trailer = old_end > data.payload_end() || old_end < self.buffer_len();

        let buffer = self.buffer_mut();
        buffer.copy_within(start + head..start + head + kept, start);

        let mut new_end = start + kept;
        if kept % 2 == 1 && has_trailer {
            buffer[new_end] = 0;
            new_end += 1;
        }
        buffer.drain(new_end..old_end);

        self.set_data_len(kept, old_end - new_end);
        debug!(trim_begin, trim_end, removed, remaining = kept, "Trimmed sample data");

        Ok(removed)
    }

    /// Multiplies every sample by `factor`, rounding to the nearest integer and
    /// saturating at the limits of a signed 16-bit sample.
    ///
    /// Only 16-bit samples are supported; for any other bit depth the samples
    /// are left alone and `UnsupportedBitDepth` is returned.
    pub fn amplify(&mut self, factor: f64) -> EditResult<AmplifyStats> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(EditErrorKind::InvalidAmplificationFactor(factor).into());
        }
        match self.format().bits_per_sample {
            Some(16) => {}
            other => return Err(EditErrorKind::UnsupportedBitDepth(other).into()),
        }

        let mut stats = AmplifyStats::default();
        for sample in self.samples_mut().chunks_exact_mut(2) {
            let (value, clipped) = scale_sample(LittleEndian::read_i16(sample), factor);
            LittleEndian::write_i16(sample, value);
            stats.samples += 1;
            if clipped {
                stats.clipped += 1;
            }
        }

        self.sync_sizes();
        debug!(factor, samples = stats.samples, clipped = stats.clipped, "Amplified sample data");

        Ok(stats)
    }

    /// Reverses the sample data byte by byte.
    ///
    /// This reverses the order of samples only for 8-bit mono data. For wider
    /// samples, or more than one channel, the bytes inside each frame end up
    /// reversed too.
    pub fn reverse(&mut self) {
        self.samples_mut().reverse();
        self.sync_sizes();
        debug!("Reversed sample data");
    }
}

fn scale_sample(sample: i16, factor: f64) -> (i16, bool) {
    let scaled = (f64::from(sample) * factor).round();
    let clamped = scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX));
    (clamped as i16, clamped != scaled)
}

// MARK: Tests

#[cfg(test)]
mod tests {
    use crate::chunk::scan_chunks;
    use crate::testing::{write_chunk, WaveBuilder};
    use crate::{EditError, EditErrorKind, WaveDocument};

    use super::{scale_sample, AmplifyStats};

    fn document(wave: Vec<u8>) -> WaveDocument {
        WaveDocument::from_bytes(wave).unwrap()
    }

    fn samples_i16(document: &WaveDocument) -> Vec<i16> {
        document.samples()
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    // Trim tests

    #[test]
    fn test_trim_16bit_mono() {
        let samples: Vec<u8> = (0..100).collect();
        let mut document = document(WaveBuilder::new(1, 16).samples(&samples).build());
        let riff_size = document.riff_size();

        assert_eq!(4, document.trim(1, 1).unwrap());
        assert_eq!(96, document.data_size());
        assert_eq!(riff_size - 4, document.riff_size());
        assert_eq!(140, document.buffer_len());
        assert_eq!(&samples[2..98], document.samples());
    }

    #[test]
    fn test_trim_uses_block_align_for_stereo() {
        let samples: Vec<u8> = (0..32).collect();
        let mut document = document(WaveBuilder::new(2, 16).samples(&samples).build());

        assert_eq!(12, document.trim(2, 1).unwrap());
        assert_eq!(&samples[8..28], document.samples());
        assert_eq!(20, document.data_size());
    }

    #[test]
    fn test_trim_moves_trailing_chunks() {
        let mut document = document(WaveBuilder::new(1, 8)
            .samples(&[1, 2, 3, 4, 5, 6])
            .chunk_after_data(b"LIST", b"INFOtest")
            .build());

        document.trim(1, 1).unwrap();

        let bytes = document.as_bytes();
        assert_eq!(&[2u8, 3, 4, 5][..], document.samples());
        assert_eq!(b"LIST\x08\x00\x00\x00INFOtest", &bytes[48..]);
        assert_eq!(bytes.len() as u32 - 8, document.riff_size());
    }

    #[test]
    fn test_trim_to_odd_length_adds_padding_before_trailing_chunk() {
        let mut document = document(WaveBuilder::new(1, 8)
            .samples(&[1, 2, 3, 4, 5, 6])
            .chunk_after_data(b"LIST", b"INFOtest")
            .build());

        document.trim(1, 0).unwrap();

        let bytes = document.as_bytes().to_vec();
        assert_eq!(5, document.data_size());
        assert_eq!(&[2u8, 3, 4, 5, 6, 0][..], &bytes[44..50]);
        assert_eq!(b"LIST", &bytes[50..54]);
        // The result still scans, with the trailing chunk on an even offset.
        assert_matches!(Ok(_), WaveDocument::from_bytes(bytes));
    }

    #[test]
    fn test_trim_to_even_length_drops_padding() {
        let mut document = document(WaveBuilder::new(1, 8)
            .samples(&[1, 2, 3, 4, 5])
            .chunk_after_data(b"LIST", b"INFOtest")
            .build());

        document.trim(0, 1).unwrap();

        let bytes = document.as_bytes();
        assert_eq!(&[1u8, 2, 3, 4][..], document.samples());
        assert_eq!(b"LIST", &bytes[48..52]);
    }

    #[test]
    fn test_trim_without_trailing_data_adds_no_padding() {
        let mut document = document(WaveBuilder::new(1, 8).samples(&[1, 2, 3, 4]).build());
        document.trim(1, 0).unwrap();
        assert_eq!(47, document.buffer_len());
        assert_eq!(39, document.riff_size());
    }

    #[test]
    fn test_trim_of_nothing_is_a_no_op() {
        let wave = WaveBuilder::new(1, 16).samples(&[1, 2, 3, 4]).build();
        let mut document = document(wave.clone());
        assert_eq!(0, document.trim(0, 0).unwrap());
        assert_eq!(&wave[..], document.as_bytes());
    }

    #[test]
    fn test_trim_moves_fmt_chunk_after_data() {
        let mut body = b"WAVE".to_vec();
        write_chunk(&mut body, b"data", &[1, 2, 3, 4, 5, 6, 7, 8]);
        write_chunk(&mut body, b"fmt ", b"\x01\x00\x01\x00\x44\xAC\x00\x00\
                                          \x88\x58\x01\x00\x02\x00\x10\x00");
        let mut wave = b"RIFF".to_vec();
        wave.extend_from_slice(&(body.len() as u32).to_le_bytes());
        wave.extend_from_slice(&body);

        let mut document = document(wave);
        assert_eq!(28, document.fmt_chunk().offset);

        assert_eq!(4, document.trim(1, 1).unwrap());

        let rescan = scan_chunks(document.as_bytes()).unwrap();
        assert_eq!(24, document.fmt_chunk().offset);
        assert_eq!(rescan.fmt, document.fmt_chunk());
        assert_eq!(rescan.data, document.data_chunk());
        assert_matches!(Ok(()), document.check());
        assert_eq!(b"fmt ", &document.header_regions()[1].1[..4]);
        assert_eq!(&[3u8, 4, 5, 6][..], document.samples());
    }

    #[test]
    fn test_trim_with_zero_block_align_removes_nothing() {
        let wave = WaveBuilder::new(0, 16).samples(&[1, 2, 3, 4]).build();
        let mut document = document(wave.clone());
        assert_eq!(0, document.format().block_align);
        assert_eq!(0, document.trim(1, 1).unwrap());
        assert_eq!(&wave[..], document.as_bytes());
    }

    #[test]
    fn test_trim_everything_fails() {
        let mut document = document(WaveBuilder::new(1, 16).samples(&[0; 100]).build());
        assert_matches!(Err(EditError::Edit(EditErrorKind::TrimExceedsData {
                            requested: 100,
                            available: 100,
                        })),
                        document.trim(25, 25));
        assert_eq!(100, document.data_size());
    }

    #[test]
    fn test_trim_more_than_everything_fails() {
        let mut document = document(WaveBuilder::new(1, 16).samples(&[0; 100]).build());
        assert_matches!(Err(EditError::Edit(EditErrorKind::TrimExceedsData { .. })),
                        document.trim(u32::MAX, u32::MAX));
    }

    // Amplify tests

    #[test]
    fn test_scale_sample_rounds_and_clamps() {
        assert_eq!((150, false), scale_sample(100, 1.5));
        assert_eq!((-150, false), scale_sample(-100, 1.5));
        assert_eq!((2, false), scale_sample(3, 0.5));
        assert_eq!((-2, false), scale_sample(-3, 0.5));
        assert_eq!((32767, true), scale_sample(20000, 2.0));
        assert_eq!((-32768, true), scale_sample(-20000, 2.0));
        assert_eq!((-32768, false), scale_sample(-32768, 1.0));
    }

    #[test]
    fn test_amplify_16bit() {
        let mut document = document(WaveBuilder::new(1, 16)
            .samples_i16(&[0, 1000, -1000, 30000, -30000])
            .build());

        let stats = document.amplify(2.0).unwrap();

        assert_eq!(AmplifyStats { samples: 5, clipped: 2 }, stats);
        assert_eq!(vec![0, 2000, -2000, 32767, -32768], samples_i16(&document));
    }

    #[test]
    fn test_amplify_attenuates() {
        let mut document = document(WaveBuilder::new(2, 16).samples_i16(&[101, -101]).build());
        document.amplify(0.5).unwrap();
        assert_eq!(vec![51, -51], samples_i16(&document));
    }

    #[test]
    fn test_amplify_rejects_non_positive_factor() {
        let mut document = document(WaveBuilder::new(1, 16).samples_i16(&[1, 2]).build());
        assert_matches!(Err(EditError::Edit(EditErrorKind::InvalidAmplificationFactor(_))),
                        document.amplify(0.0));
        assert_matches!(Err(EditError::Edit(EditErrorKind::InvalidAmplificationFactor(_))),
                        document.amplify(-1.0));
        assert_matches!(Err(EditError::Edit(EditErrorKind::InvalidAmplificationFactor(_))),
                        document.amplify(f64::NAN));
        assert_eq!(vec![1, 2], samples_i16(&document));
    }

    #[test]
    fn test_amplify_leaves_8bit_alone() {
        let wave = WaveBuilder::new(1, 8).samples(&[10, 20, 30, 40]).build();
        let mut document = document(wave.clone());
        assert_matches!(Err(EditError::Edit(EditErrorKind::UnsupportedBitDepth(Some(8)))),
                        document.amplify(2.0));
        assert_eq!(&wave[..], document.as_bytes());
    }

    // Reverse tests

    #[test]
    fn test_reverse_bytes() {
        let mut document = document(WaveBuilder::new(1, 8).samples(&[1, 2, 3, 4, 5]).build());
        document.reverse();
        assert_eq!(&[5u8, 4, 3, 2, 1][..], document.samples());
    }

    #[test]
    fn test_reverse_twice_restores_samples() {
        let wave = WaveBuilder::new(2, 16).samples_i16(&[1, -2, 3, -4, 5, -6]).build();
        let mut document = document(wave.clone());
        document.reverse();
        assert_ne!(&wave[..], document.as_bytes());
        document.reverse();
        assert_eq!(&wave[..], document.as_bytes());
    }

    #[test]
    fn test_reverse_leaves_trailing_chunks_alone() {
        let mut document = document(WaveBuilder::new(1, 8)
            .samples(&[1, 2])
            .chunk_after_data(b"LIST", b"INFO")
            .build());
        document.reverse();
        assert_eq!(&[2u8, 1][..], document.samples());
        assert_eq!(b"LIST\x04\x00\x00\x00INFO", &document.as_bytes()[46..]);
    }
}
