use anyhow::Result;
use aotprofparser::{ProfileData, Record, RecordReader, TypeArg, TypeArgRef};
use std::io::Write;
use termcolor::{Color, ColorSpec, WriteColor};

/// Print a listing of the records in an AOT profile log.
///
/// Each record is shown with the byte offset of its tag, its index within
/// its own record kind, and its fields with raw (unresolved) indices.
#[derive(clap::Parser)]
pub struct Opts {
    #[clap(flatten)]
    io: aotprof_tools::InputOutput,

    /// Print only the resolved method list, one
    /// `module;type.method;instance;arguments` line per method.
    #[clap(long)]
    methods_only: bool,
}

impl Opts {
    pub fn run(&self) -> Result<()> {
        self.io.general_opts().init_logger();
        let input = self.io.read_input()?;
        let output = self.io.output_writer()?;
        if self.methods_only {
            let profile = ProfileData::parse(&input)?;
            dump_methods(&profile, output)
        } else {
            Dump::new(&input, output).run()
        }
    }
}

#[derive(Default)]
struct Indices {
    modules: u32,
    types: u32,
    generic_instances: u32,
    methods: u32,
}

struct Dump<'a> {
    bytes: &'a [u8],
    dst: Box<dyn WriteColor>,
    indices: Indices,
    offset_width: usize,
}

impl<'a> Dump<'a> {
    fn new(bytes: &'a [u8], dst: Box<dyn WriteColor>) -> Dump<'a> {
        Dump {
            bytes,
            dst,
            indices: Indices::default(),
            offset_width: format!("{:x}", bytes.len()).len() + 1,
        }
    }

    fn run(&mut self) -> Result<()> {
        let reader = RecordReader::new(self.bytes)?;
        writeln!(self.dst, "version {}", reader.version())?;
        for item in reader {
            let (offset, record) = item?;
            match record {
                Record::Module(module) => {
                    let index = self.indices.modules;
                    self.indices.modules += 1;
                    self.record_header(offset, Color::Blue, "module", index)?;
                    writeln!(self.dst, "name = {:?}", module.name)?;
                }
                Record::Type(ty) => {
                    let index = self.indices.types;
                    self.indices.types += 1;
                    self.record_header(offset, Color::Green, "type", index)?;
                    write!(self.dst, "module = {}, name = {:?}", ty.module, ty.name)?;
                    if !ty.args.is_empty() {
                        write!(self.dst, ", args = [{}]", args_list(&ty.args))?;
                    }
                    writeln!(self.dst)?;
                }
                Record::GenericInst(inst) => {
                    let index = self.indices.generic_instances;
                    self.indices.generic_instances += 1;
                    self.record_header(offset, Color::Magenta, "generic instance", index)?;
                    writeln!(
                        self.dst,
                        "definition = {}, args = [{}]",
                        inst.definition,
                        args_list(&inst.args)
                    )?;
                }
                Record::Method(method) => {
                    let index = self.indices.methods;
                    self.indices.methods += 1;
                    self.record_header(offset, Color::Yellow, "method", index)?;
                    write!(
                        self.dst,
                        "owner = {}, name = {:?}, signature = {:?}",
                        method.owner, method.name, method.signature
                    )?;
                    if let Some(instance) = method.instance {
                        write!(self.dst, ", instance = {instance}")?;
                    }
                    writeln!(self.dst)?;
                }
            }
        }
        Ok(())
    }

    fn record_header(&mut self, offset: usize, color: Color, kind: &str, index: u32) -> Result<()> {
        write!(self.dst, "0x{offset:0width$x} ", width = self.offset_width)?;
        self.dst.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(self.dst, "{kind}[{index}]")?;
        self.dst.reset()?;
        write!(self.dst, " ")?;
        Ok(())
    }
}

fn args_list(args: &[TypeArgRef]) -> String {
    args.iter()
        .map(|arg| match arg {
            TypeArgRef::Type(index) => index.to_string(),
            TypeArgRef::Param(position) => format!("!{position}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// The `module;type.method;instance;arguments` listing historically used to
/// eyeball which methods a profile will cause to be AOT-compiled.
fn dump_methods(profile: &ProfileData, mut dst: Box<dyn WriteColor>) -> Result<()> {
    for method in &profile.methods {
        let ty = &profile[method.owner];
        let module = &profile[ty.module];
        let instance = match method.instance {
            Some(index) => index.to_string(),
            None => String::new(),
        };
        let args = match method.instance {
            Some(index) => profile[index]
                .args
                .iter()
                .map(|arg| match *arg {
                    TypeArg::Type(index) => profile[index].name.clone(),
                    TypeArg::Param(position) => format!("!{position}"),
                })
                .collect::<Vec<_>>()
                .join("|"),
            None => String::new(),
        };
        writeln!(
            dst,
            "{};{}.{};{};{}",
            module.name, ty.name, method.name, instance, args
        )?;
    }
    Ok(())
}
