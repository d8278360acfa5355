use anyhow::{Context, Result};
use aotprofparser::ProfileData;
use regex::Regex;
use std::collections::HashSet;

/// Remove methods from an AOT profile log.
///
/// Some methods recorded during a profiled run must not be AOT-compiled —
/// methods relying on runtime features the AOT target does not support, or
/// methods from assemblies kept interpreted. This command decodes a log,
/// drops every method matching an exclusion, and writes the re-encoded
/// result. Modules, types and generic instances pass through untouched.
///
/// Examples:
///
/// ```sh
/// # Drop exception-filter heavy helpers before feeding the profile to the
/// # AOT compiler.
/// $ aotprof-tools filter app.aotprofile -e 'HttpContent\.LoadIntoBufferAsync' -o filtered.aotprofile
///
/// # Drop every method of an assembly that stays interpreted.
/// $ aotprof-tools filter app.aotprofile --exclude-module Newtonsoft.Json.dll -o filtered.aotprofile
/// ```
#[derive(clap::Parser)]
pub struct Opts {
    #[clap(flatten)]
    io: aotprof_tools::InputOutput,

    /// Drop methods whose `Type.FullName.MethodName` matches this regex;
    /// may be repeated.
    #[clap(short = 'e', long = "exclude", value_name = "REGEX")]
    exclude: Vec<String>,

    /// Drop every method owned by a type of this module; may be repeated.
    #[clap(long = "exclude-module", value_name = "NAME")]
    exclude_module: Vec<String>,
}

impl Opts {
    pub fn run(&self) -> Result<()> {
        self.io.general_opts().init_logger();
        let exclude = self
            .exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("invalid exclusion pattern `{pattern}`"))
            })
            .collect::<Result<Vec<_>>>()?;
        let exclude_modules: HashSet<&str> =
            self.exclude_module.iter().map(|name| name.as_str()).collect();

        let input = self.io.read_input()?;
        let profile = ProfileData::parse(&input)
            .with_context(|| format!("failed to decode {:?}", self.io.input_path()))?;

        let mut filtered = profile.clone();
        filtered.methods.retain(|method| {
            let name = profile.qualified_method_name(method);
            let module = &profile[profile[method.owner].module].name;
            let drop =
                exclude.iter().any(|re| re.is_match(&name)) || exclude_modules.contains(module.as_str());
            if drop {
                log::debug!("dropping {module};{name}");
            }
            !drop
        });
        log::info!(
            "kept {} of {} methods",
            filtered.methods.len(),
            profile.methods.len()
        );

        self.io.output_bytes(&aotprof_encoder::reencode_profile(&filtered))
    }
}
