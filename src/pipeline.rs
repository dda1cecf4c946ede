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

//! Load, validate, edit and save, as one run.

use std::path::PathBuf;

use tracing::{info, warn};

use super::document::WaveDocument;
use super::{reader, writer};
use super::{EditError, EditErrorKind, EditResult};

/// Everything needed for one run of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub input: PathBuf,
    /// Where to write the edited file. Without one, the input is only verified.
    pub output: Option<PathBuf>,
    /// Frames to remove from the beginning.
    pub trim_begin: u32,
    /// Frames to remove from the end.
    pub trim_end: u32,
    pub reverse: bool,
    /// Factor to multiply every sample by. Must be greater than zero.
    pub amplify: Option<f64>,
}

impl EditRequest {
    /// A request that only checks that `input` is a well-formed wave file.
    pub fn verify<P: Into<PathBuf>>(input: P) -> EditRequest {
        EditRequest {
            input: input.into(),
            output: None,
            trim_begin: 0,
            trim_end: 0,
            reverse: false,
            amplify: None,
        }
    }

    /// Checks the parameters that don't depend on the file.
    pub fn validate(&self) -> EditResult<()> {
        match self.amplify {
            Some(factor) if !(factor.is_finite() && factor > 0.0) => {
                Err(EditErrorKind::InvalidAmplificationFactor(factor).into())
            }
            _ => Ok(()),
        }
    }
}

/// The stages of a pipeline run. A run moves forward one stage at a time, and
/// any failure moves it to `Failed` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loaded,
    Validated,
    Edited,
    Saved,
    Failed,
}

/// Runs an `EditRequest` against a single file.
#[derive(Debug)]
pub struct EditPipeline {
    request: EditRequest,
    state: PipelineState,
    document: Option<WaveDocument>,
}

impl EditPipeline {
    pub fn new(request: EditRequest) -> EditPipeline {
        EditPipeline {
            request,
            state: PipelineState::Idle,
            document: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn request(&self) -> &EditRequest {
        &self.request
    }

    /// The loaded document, until it is handed over to be saved.
    pub fn document(&self) -> Option<&WaveDocument> {
        self.document.as_ref()
    }

    /// Runs every remaining stage. Returns the final state: `Validated` when
    /// there is no output path, `Saved` otherwise.
    pub fn run(&mut self) -> EditResult<PipelineState> {
        self.verify()?;
        self.finish()
    }

    /// Loads and validates the input file.
    pub fn verify(&mut self) -> EditResult<&WaveDocument> {
        self.step(PipelineState::Idle, PipelineState::Loaded, EditPipeline::load)?;
        self.step(PipelineState::Loaded, PipelineState::Validated, EditPipeline::validate)?;
        let state = self.state;
        self.document.as_ref().ok_or_else(|| no_document(state))
    }

    /// Applies the edits and saves the result, if an output path was given.
    pub fn finish(&mut self) -> EditResult<PipelineState> {
        if self.request.output.is_none() {
            self.expect_state(PipelineState::Validated)?;
            info!(input = %self.request.input.display(), "Verified input; no output requested");
            return Ok(self.state);
        }

        self.step(PipelineState::Validated, PipelineState::Edited, EditPipeline::edit)?;
        self.step(PipelineState::Edited, PipelineState::Saved, EditPipeline::save)?;
        Ok(self.state)
    }

    fn step<F>(&mut self, from: PipelineState, to: PipelineState, stage: F) -> EditResult<()>
        where F: FnOnce(&mut EditPipeline) -> EditResult<()>
    {
        self.expect_state(from)?;
        match stage(self) {
            Ok(()) => {
                self.state = to;
                Ok(())
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                self.document = None;
                Err(err)
            }
        }
    }

    /// A call made in the wrong state fails the run like any other error.
    fn expect_state(&mut self, expected: PipelineState) -> EditResult<()> {
        if self.state == expected {
            return Ok(());
        }
        let actual = self.state;
        self.state = PipelineState::Failed;
        self.document = None;
        Err(EditError::OutOfOrder { expected, actual })
    }

    fn load(&mut self) -> EditResult<()> {
        self.request.validate()?;
        self.document = Some(reader::load(&self.request.input)?);
        Ok(())
    }

    fn validate(&mut self) -> EditResult<()> {
        let document = self.document.as_ref().ok_or_else(|| no_document(self.state))?;
        document.check()?;
        info!(input = %self.request.input.display(), "Input is OK");
        Ok(())
    }

    fn edit(&mut self) -> EditResult<()> {
        let state = self.state;
        let request = &self.request;
        let document = self.document.as_mut().ok_or_else(|| no_document(state))?;

        if request.trim_begin > 0 || request.trim_end > 0 {
            document.trim(request.trim_begin, request.trim_end)?;
        }

        if let Some(factor) = request.amplify {
            match document.amplify(factor) {
                Ok(stats) if stats.clipped > 0 => {
                    warn!(clipped = stats.clipped, samples = stats.samples, "Some samples were clipped");
                }
                Ok(_) => {}
                Err(ref err) if err.is_recoverable() => {
                    warn!(error = %err, "Skipping amplify");
                }
                Err(err) => return Err(err),
            }
        }

        if request.reverse {
            document.reverse();
        }

        Ok(())
    }

    fn save(&mut self) -> EditResult<()> {
        let document = self.document.take().ok_or_else(|| no_document(self.state))?;
        if let Some(ref output) = self.request.output {
            writer::save(document, output)?;
            info!(output = %output.display(), "Saved edited file");
        }
        Ok(())
    }
}

fn no_document(actual: PipelineState) -> EditError {
    EditError::OutOfOrder {
        expected: PipelineState::Loaded,
        actual,
    }
}

// MARK: Tests
