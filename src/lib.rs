//! Shared plumbing for the `aotprof-tools` CLI.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};

/// Flags shared by every subcommand.
#[derive(clap::Args)]
pub struct GeneralOpts {
    /// Use verbose output (-v info, -vv debug, -vvv trace).
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl GeneralOpts {
    /// Initializes the logger based on the verbosity level requested.
    pub fn init_logger(&self) {
        let default = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
            .init();
    }
}

/// Shared input/output options for subcommands that read one profile log
/// and write one result.
#[derive(clap::Args)]
pub struct InputOutput {
    /// Input AOT profile log.
    input: PathBuf,

    #[clap(flatten)]
    general: GeneralOpts,

    /// Where to place the output of this command; stdout when not given.
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl InputOutput {
    /// The general options flattened into these ones.
    pub fn general_opts(&self) -> &GeneralOpts {
        &self.general
    }

    /// The path the input is read from.
    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// Reads the input profile log into memory.
    pub fn read_input(&self) -> Result<Vec<u8>> {
        log::debug!("reading input from {:?}", self.input);
        fs::read(&self.input).with_context(|| format!("failed to read input {:?}", self.input))
    }

    /// Returns a writer for textual output, colored when it goes to an
    /// interactive terminal.
    pub fn output_writer(&self) -> Result<Box<dyn WriteColor>> {
        match &self.output {
            Some(path) => {
                let file = fs::File::create(path)
                    .with_context(|| format!("failed to create output {path:?}"))?;
                Ok(Box::new(NoColor::new(io::BufWriter::new(file))))
            }
            None => {
                let color = if io::stdout().is_terminal() {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                };
                Ok(Box::new(StandardStream::stdout(color)))
            }
        }
    }

    /// Writes binary output to the configured destination.
    pub fn output_bytes(&self, bytes: &[u8]) -> Result<()> {
        match &self.output {
            Some(path) => fs::write(path, bytes)
                .with_context(|| format!("failed to write output {path:?}")),
            None => io::stdout()
                .write_all(bytes)
                .context("failed to write output to stdout"),
        }
    }
}
