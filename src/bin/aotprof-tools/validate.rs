use anyhow::{Context, Result};
use aotprofparser::ProfileData;
use std::io::Write;

/// Validate an AOT profile log.
///
/// This subcommand decodes the whole log, resolving every cross-reference,
/// and prints per-kind record counts. The process exits with 0 if the log
/// is valid, or nonzero and an error message on stderr if it is not.
#[derive(clap::Parser)]
pub struct Opts {
    #[clap(flatten)]
    io: aotprof_tools::InputOutput,
}

impl Opts {
    pub fn run(&self) -> Result<()> {
        self.io.general_opts().init_logger();
        let input = self.io.read_input()?;
        let profile = ProfileData::parse(&input)
            .with_context(|| format!("failed to validate {:?}", self.io.input_path()))?;
        let mut output = self.io.output_writer()?;
        writeln!(
            output,
            "{}: valid AOT profile, version {}",
            self.io.input_path().display(),
            profile.version
        )?;
        writeln!(output, "  modules:           {}", profile.modules.len())?;
        writeln!(output, "  types:             {}", profile.types.len())?;
        writeln!(
            output,
            "  generic instances: {}",
            profile.generic_instances.len()
        )?;
        writeln!(output, "  methods:           {}", profile.methods.len())?;
        Ok(())
    }
}
