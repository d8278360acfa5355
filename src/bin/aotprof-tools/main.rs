use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;

macro_rules! subcommands {
    ($(
        $(#[$attr:meta])*
        $name:ident
    )*) => {
        $(
            mod $name;
        )*

        #[derive(Parser)]
        #[clap(version)]
        #[allow(non_camel_case_types)]
        enum AotprofTools {
            $(
                $(#[$attr])*
                $name($name::Opts),
            )*
        }

        impl AotprofTools {
            fn run(self) -> Result<()> {
                match self {
                    $(
                        Self::$name(opts) => opts.run(),
                    )*
                }
            }
        }
    }
}

subcommands! {
    dump
    validate
    filter
}

fn main() -> ExitCode {
    let err = match <AotprofTools as Parser>::parse().run() {
        Ok(()) => return ExitCode::SUCCESS,
        Err(e) => e,
    };
    // If an error happened and it's connected to something like `EPIPE` then
    // don't print out an error and instead just silently exit with a failure.
    // This prevents stray panic messages when the stdout pipe is closed, for
    // example.
    if let Some(io) = err.downcast_ref::<io::Error>() {
        match io.kind() {
            io::ErrorKind::BrokenPipe => return ExitCode::FAILURE,
            _ => {}
        }
    }
    eprintln!("Error: {err:?}");
    ExitCode::FAILURE
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    AotprofTools::command().debug_assert()
}
