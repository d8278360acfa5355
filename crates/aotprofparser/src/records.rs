use crate::limits::MAX_GENERIC_ARITY;
use crate::{BinaryReader, ErrorKind, FromReader, ProfileError, Result};
use core::fmt;

/// The ASCII magic token every profile log starts with.
///
/// Producers locate this prefix when they splice profile data into build
/// output; it is deliberately exported rather than kept private.
pub const MAGIC: &[u8; 10] = b"AOTPROFILE";

/// The major format version this crate understands.
pub const MAJOR_VERSION: u32 = 1;

/// The minor format version written by current producers.
pub const MINOR_VERSION: u32 = 0;

/// The type-kind byte for a class, the only kind defined by version 1 of
/// the format. Other values are reserved.
pub const TYPE_KIND_CLASS: u8 = 0x12;

/// The format version stamped in a profile log's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileVersion {
    /// Major version; incompatible layout changes bump this.
    pub major: u32,
    /// Minor version; may vary freely within one major version.
    pub minor: u32,
}

impl fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The kinds of records a profile log can contain.
///
/// Cross-references in the format are always "kind plus index", where each
/// kind numbers its own records independently in encounter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A loaded assembly/module.
    Module,
    /// A concrete type referenced during execution.
    Type,
    /// A generic instantiation with concrete type arguments.
    GenericInst,
    /// A method observed as called or compiled during the profiled run.
    Method,
}

impl RecordKind {
    /// Maps a record tag byte to its kind, if recognized.
    pub fn from_tag(tag: u8) -> Option<RecordKind> {
        match tag {
            1 => Some(RecordKind::Module),
            2 => Some(RecordKind::Type),
            3 => Some(RecordKind::GenericInst),
            4 => Some(RecordKind::Method),
            _ => None,
        }
    }

    /// The tag byte that introduces records of this kind.
    pub fn tag(&self) -> u8 {
        match self {
            RecordKind::Module => 1,
            RecordKind::Type => 2,
            RecordKind::GenericInst => 3,
            RecordKind::Method => 4,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Module => "module",
            RecordKind::Type => "type",
            RecordKind::GenericInst => "generic instance",
            RecordKind::Method => "method",
        })
    }
}

/// An unresolved type-argument reference as encoded in the stream.
///
/// Arguments are signed varints: a non-negative value is a type index,
/// while the negative range encodes generic-parameter placeholders
/// (`-1 - position`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeArgRef {
    /// A reference to an already-decoded type record.
    Type(u32),
    /// A placeholder for the generic parameter at the given position.
    Param(u32),
}

impl<'a> FromReader<'a> for TypeArgRef {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let value = reader.read_var_i32()?;
        if value >= 0 {
            Ok(TypeArgRef::Type(value as u32))
        } else {
            Ok(TypeArgRef::Param((-(value + 1)) as u32))
        }
    }
}

fn read_type_args<'a>(reader: &mut BinaryReader<'a>) -> Result<Vec<TypeArgRef>> {
    let count = reader.read_size(MAX_GENERIC_ARITY, "generic argument")?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        args.push(reader.read()?);
    }
    Ok(args)
}

/// A MODULE record before reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModule<'a> {
    /// Assembly name or GUID identifying the module.
    pub name: &'a str,
}

impl<'a> FromReader<'a> for RawModule<'a> {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        Ok(RawModule {
            name: reader.read()?,
        })
    }
}

/// A TYPE record before reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawType<'a> {
    /// Index of the owning module record.
    pub module: u32,
    /// Fully qualified type name.
    pub name: &'a str,
    /// Generic arguments, empty for a non-generic type.
    pub args: Vec<TypeArgRef>,
}

impl<'a> FromReader<'a> for RawType<'a> {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let kind = reader.read_u8()?;
        if kind != TYPE_KIND_CLASS {
            return reader.invalid_leading_byte(kind, "type kind");
        }
        Ok(RawType {
            module: reader.read()?,
            name: reader.read()?,
            args: read_type_args(reader)?,
        })
    }
}

/// A GENERIC_INSTANCE record before reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGenericInst {
    /// Index of the type record serving as the generic definition.
    pub definition: u32,
    /// The concrete type arguments, in declaration order.
    pub args: Vec<TypeArgRef>,
}

impl<'a> FromReader<'a> for RawGenericInst {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        Ok(RawGenericInst {
            definition: reader.read()?,
            args: read_type_args(reader)?,
        })
    }
}

/// A METHOD record before reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMethod<'a> {
    /// Index of the owning type record.
    pub owner: u32,
    /// The method's name.
    pub name: &'a str,
    /// Signature descriptor, possibly empty.
    pub signature: &'a str,
    /// Index of the generic-instance record for a generic method, encoded
    /// as a signed varint with `-1` meaning "not generic".
    pub instance: Option<u32>,
}

impl<'a> FromReader<'a> for RawMethod<'a> {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let owner = reader.read()?;
        let name = reader.read()?;
        let signature = reader.read()?;
        let pos = reader.position();
        let instance = match reader.read_var_i32()? {
            -1 => None,
            index if index >= 0 => Some(index as u32),
            index => bail!(pos, "invalid generic instance reference {index}"),
        };
        Ok(RawMethod {
            owner,
            name,
            signature,
            instance,
        })
    }
}

/// One record read from the stream, fields still carrying raw indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record<'a> {
    /// A MODULE record.
    Module(RawModule<'a>),
    /// A TYPE record.
    Type(RawType<'a>),
    /// A GENERIC_INSTANCE record.
    GenericInst(RawGenericInst),
    /// A METHOD record.
    Method(RawMethod<'a>),
}

impl Record<'_> {
    /// The kind of this record.
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Module(_) => RecordKind::Module,
            Record::Type(_) => RecordKind::Type,
            Record::GenericInst(_) => RecordKind::GenericInst,
            Record::Method(_) => RecordKind::Method,
        }
    }
}

/// A streaming reader over the records of a profile log.
///
/// Constructing the reader validates the magic token and version header;
/// iterating yields each record along with the byte offset of its tag.
/// Records come out in encounter order, which downstream consumers treat as
/// compilation priority, so the reader never reorders or skips anything.
/// The first error ends iteration for good.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    reader: BinaryReader<'a>,
    version: ProfileVersion,
    done: bool,
}

impl<'a> RecordReader<'a> {
    /// Validates the header of `data` and returns a reader positioned at
    /// the first record.
    ///
    /// Fails if the magic token is absent, the major version is not
    /// [`MAJOR_VERSION`], or the header itself is cut short. Minor version
    /// differences are accepted.
    pub fn new(data: &'a [u8]) -> Result<RecordReader<'a>> {
        let mut reader = BinaryReader::new(data);
        let magic = reader.read_bytes(MAGIC.len())?;
        if magic != MAGIC {
            return Err(ProfileError::new(ErrorKind::Format, 0));
        }
        let major_pos = reader.position();
        let major = reader.read_var_u32()?;
        if major != MAJOR_VERSION {
            return Err(ProfileError::new(ErrorKind::Version { major }, major_pos));
        }
        let minor = reader.read_var_u32()?;
        Ok(RecordReader {
            reader,
            version: ProfileVersion { major, minor },
            done: false,
        })
    }

    /// The version stamped in the header.
    pub fn version(&self) -> ProfileVersion {
        self.version
    }

    /// The byte offset the next record would be read from.
    pub fn offset(&self) -> usize {
        self.reader.position()
    }

    fn read_record(&mut self) -> Result<(usize, Record<'a>)> {
        let offset = self.reader.position();
        let tag = self.reader.read_u8()?;
        let record = match RecordKind::from_tag(tag) {
            Some(RecordKind::Module) => Record::Module(self.reader.read()?),
            Some(RecordKind::Type) => Record::Type(self.reader.read()?),
            Some(RecordKind::GenericInst) => Record::GenericInst(self.reader.read()?),
            Some(RecordKind::Method) => Record::Method(self.reader.read()?),
            None => {
                return Err(ProfileError::new(
                    ErrorKind::UnknownRecordType { tag },
                    offset,
                ));
            }
        };
        Ok((offset, record))
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = Result<(usize, Record<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.eof() {
            return None;
        }
        let result = self.read_record();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
