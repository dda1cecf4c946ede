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

//! Command-line front end for editing wave files.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wave_edit::{EditPipeline, EditRequest, EditResult, PipelineState, WaveDocument};

/// Trim, reverse and amplify PCM wave files.
#[derive(Debug, Parser)]
#[command(name = "wave-edit", version)]
#[command(about = "Basic editing of PCM wave audio files", long_about = None)]
struct Cli {
    /// Input wave file
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Output wave file, overwritten if it exists. Without one, the input is only verified.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Trim N sample frames from the beginning
    #[arg(long = "tb", visible_alias = "trim-begin", value_name = "N", default_value_t = 0)]
    trim_begin: u32,

    /// Trim N sample frames from the end
    #[arg(long = "te", visible_alias = "trim-end", value_name = "N", default_value_t = 0)]
    trim_end: u32,

    /// Reverse the sample data
    #[arg(short, long)]
    reverse: bool,

    /// Multiply every 16-bit sample by FACTOR
    #[arg(short, long, value_name = "FACTOR", allow_negative_numbers = true)]
    amplify: Option<f64>,

    /// Print the wave file header as hex
    #[arg(long)]
    header: bool,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn to_request(&self) -> EditRequest {
        EditRequest {
            input: self.input.clone(),
            output: self.output.clone(),
            trim_begin: self.trim_begin,
            trim_end: self.trim_end,
            reverse: self.reverse,
            amplify: self.amplify,
        }
    }
}

// Long options are also accepted with a single dash, e.g. `-tb 10`.
const LEGACY_FLAGS: [(&str, &str); 5] = [
    ("-tb", "--tb"),
    ("-te", "--te"),
    ("-header", "--header"),
    ("-help", "--help"),
    ("-version", "--version"),
];

fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
    where I: IntoIterator<Item = OsString>
{
    args.into_iter()
        .map(|arg| {
            match LEGACY_FLAGS.iter().find(|&&(legacy, _)| arg == legacy) {
                Some(&(_, modern)) => OsString::from(modern),
                None => arg,
            }
        })
        .collect()
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn format_header(document: &WaveDocument) -> String {
    let mut out = String::new();
    for (label, bytes) in document.header_regions() {
        out.push_str(&format!("{}:\n", label));
        for row in bytes.chunks(16) {
            let hex: Vec<String> = row.iter().map(|byte| format!("{:02x}", byte)).collect();
            out.push_str(&format!("  {}\n", hex.join(" ")));
        }
    }
    out
}

fn run(cli: &Cli) -> EditResult<()> {
    let mut pipeline = EditPipeline::new(cli.to_request());

    let document = pipeline.verify()?;
    println!("'{}' is OK.", cli.input.display());
    if cli.header {
        print!("{}", format_header(document));
    }

    if pipeline.finish()? == PipelineState::Saved {
        if let Some(ref output) = cli.output {
            println!("Saved new audio as '{}'.", output.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_legacy_flags(std::env::args_os()));
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            ExitCode::FAILURE
        }
    }
}
