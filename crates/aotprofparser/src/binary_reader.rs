use crate::limits::MAX_STRING_SIZE;
use crate::RecordKind;
use core::fmt;
use core::str;

/// An error produced while decoding a profile log.
#[derive(Debug, Clone)]
pub struct ProfileError {
    // Wrap the actual error data in a `Box` so that the error is just one
    // word. This means that we can continue returning small `Result`s in
    // registers.
    inner: Box<ProfileErrorInner>,
}

#[derive(Debug, Clone)]
struct ProfileErrorInner {
    kind: ErrorKind,
    offset: usize,
}

/// The different ways decoding a profile log can fail.
///
/// Every error is terminal for the decode that produced it: a corrupt or
/// truncated log cannot be trusted even in part, so no partial model is ever
/// returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The stream does not begin with the `AOTPROFILE` magic token.
    Format,
    /// The stream's major format version is not understood by this crate.
    Version {
        /// The major version found in the stream.
        major: u32,
    },
    /// A read ran past the end of the stream.
    Truncated {
        /// How many bytes the failed read asked for.
        requested: usize,
        /// How many bytes were actually left in the stream.
        available: usize,
    },
    /// A record began with a tag byte this crate does not recognize.
    UnknownRecordType {
        /// The unrecognized tag byte.
        tag: u8,
    },
    /// A record referenced another record that had not been decoded yet.
    DanglingReference {
        /// The kind of record holding the bad reference.
        referrer: RecordKind,
        /// The per-kind index of the record holding the bad reference.
        referrer_index: u32,
        /// The kind of record the reference points at.
        target: RecordKind,
        /// The out-of-range index the reference carried.
        target_index: u32,
    },
    /// A generic instantiation whose argument count disagrees with the
    /// arity its definition declares.
    ArityMismatch {
        /// The arity declared by the generic definition's name.
        declared: u32,
        /// The number of type arguments the instantiation supplied.
        supplied: u32,
    },
    /// A malformed primitive: invalid UTF-8, an over-long varint, a length
    /// past the accepted maximum, or a reserved type-kind byte.
    Invalid {
        /// Human-readable description of what was malformed.
        message: String,
    },
}

/// The result of a profile decoding operation.
pub type Result<T, E = ProfileError> = core::result::Result<T, E>;

impl std::error::Error for ProfileError {}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            ErrorKind::Format => {
                write!(f, "magic header not detected: bad magic number")?;
            }
            ErrorKind::Version { major } => {
                write!(f, "unsupported profile format major version {major}")?;
            }
            ErrorKind::Truncated {
                requested,
                available,
            } => {
                write!(
                    f,
                    "unexpected end-of-file: {requested} bytes requested with {available} remaining"
                )?;
            }
            ErrorKind::UnknownRecordType { tag } => {
                write!(f, "unknown record tag (0x{tag:x})")?;
            }
            ErrorKind::DanglingReference {
                referrer,
                referrer_index,
                target,
                target_index,
            } => {
                write!(
                    f,
                    "{referrer} record {referrer_index} references {target} index {target_index} which is out of range"
                )?;
            }
            ErrorKind::ArityMismatch { declared, supplied } => {
                write!(
                    f,
                    "generic instantiation supplies {supplied} type arguments but its definition declares {declared}"
                )?;
            }
            ErrorKind::Invalid { message } => f.write_str(message)?,
        }
        write!(f, " (at offset 0x{:x})", self.inner.offset)
    }
}

impl ProfileError {
    #[cold]
    pub(crate) fn new(kind: ErrorKind, offset: usize) -> Self {
        ProfileError {
            inner: Box::new(ProfileErrorInner { kind, offset }),
        }
    }

    #[cold]
    pub(crate) fn invalid(message: impl Into<String>, offset: usize) -> Self {
        Self::new(
            ErrorKind::Invalid {
                message: message.into(),
            },
            offset,
        )
    }

    #[cold]
    pub(crate) fn fmt(args: fmt::Arguments<'_>, offset: usize) -> Self {
        ProfileError::invalid(args.to_string(), offset)
    }

    #[cold]
    pub(crate) fn eof(offset: usize, requested: usize, available: usize) -> Self {
        Self::new(
            ErrorKind::Truncated {
                requested,
                available,
            },
            offset,
        )
    }

    /// What went wrong.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    /// The byte offset within the profile log where the error occurred.
    pub fn offset(&self) -> usize {
        self.inner.offset
    }
}

/// A trait for types that deserialize themselves from a [`BinaryReader`].
pub trait FromReader<'a>: Sized {
    /// Parses `Self` out of the given reader.
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self>;
}

impl<'a> FromReader<'a> for u32 {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        reader.read_var_u32()
    }
}

impl<'a> FromReader<'a> for &'a str {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        reader.read_string()
    }
}

/// A binary reader over the primitives of a profile log.
///
/// The reader tracks its position so that every error it produces carries
/// the byte offset at which decoding went wrong. A failed read is terminal:
/// record boundaries are not self-delimiting, so no resynchronization is
/// attempted and the cursor is left where the failure happened.
#[derive(Clone, Debug)]
pub struct BinaryReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Creates a new binary reader over the `data` provided.
    pub fn new(data: &'a [u8]) -> BinaryReader<'a> {
        BinaryReader {
            buffer: data,
            position: 0,
        }
    }

    /// Returns the reader's current byte offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns whether the reader has consumed the whole buffer.
    #[inline]
    pub fn eof(&self) -> bool {
        self.position >= self.buffer.len()
    }

    /// Returns the number of bytes left to read.
    #[inline]
    pub fn bytes_remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub(crate) fn ensure_has_bytes(&self, len: usize) -> Result<()> {
        if self.position + len <= self.buffer.len() {
            Ok(())
        } else {
            Err(ProfileError::eof(
                self.position,
                len,
                self.buffer.len() - self.position,
            ))
        }
    }

    /// Reads a value of type `T` from this reader, advancing the position as
    /// data is read.
    #[inline]
    pub fn read<T>(&mut self) -> Result<T>
    where
        T: FromReader<'a>,
    {
        T::from_reader(self)
    }

    /// Advances the reader a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let b = match self.buffer.get(self.position) {
            Some(b) => *b,
            None => return Err(self.eof_err()),
        };
        self.position += 1;
        Ok(b)
    }

    #[cold]
    fn eof_err(&self) -> ProfileError {
        ProfileError::eof(self.position, 1, 0)
    }

    /// Advances the reader `size` bytes and returns a slice of that length.
    pub fn read_bytes(&mut self, size: usize) -> Result<&'a [u8]> {
        self.ensure_has_bytes(size)?;
        let start = self.position;
        self.position += size;
        Ok(&self.buffer[start..self.position])
    }

    /// Advances the reader up to five bytes to parse a variable-length
    /// integer as a `u32`.
    #[inline]
    pub fn read_var_u32(&mut self) -> Result<u32> {
        // Optimization for the single byte case, which indices in a profile
        // log almost always hit.
        let byte = self.read_u8()?;
        if (byte & 0x80) == 0 {
            Ok(u32::from(byte))
        } else {
            self.read_var_u32_big(byte)
        }
    }

    fn read_var_u32_big(&mut self, byte: u8) -> Result<u32> {
        let mut result = (byte & 0x7F) as u32;
        let mut shift = 7;
        loop {
            let byte = self.read_u8()?;
            result |= ((byte & 0x7F) as u32) << shift;
            if shift >= 25 && (byte >> (32 - shift)) != 0 {
                let msg = if byte & 0x80 != 0 {
                    "invalid var_u32: integer representation too long"
                } else {
                    "invalid var_u32: integer too large"
                };
                // The continuation bit or unused bits are set.
                return Err(ProfileError::invalid(msg, self.position - 1));
            }
            shift += 7;
            if (byte & 0x80) == 0 {
                break;
            }
        }
        Ok(result)
    }

    /// Advances the reader up to five bytes to parse a variable-length
    /// integer as an `i32`.
    #[inline]
    pub fn read_var_i32(&mut self) -> Result<i32> {
        // Optimization for the single byte case.
        let byte = self.read_u8()?;
        if (byte & 0x80) == 0 {
            Ok(((byte as i32) << 25) >> 25)
        } else {
            self.read_var_i32_big(byte)
        }
    }

    fn read_var_i32_big(&mut self, byte: u8) -> Result<i32> {
        let mut result = (byte & 0x7F) as i32;
        let mut shift = 7;
        loop {
            let byte = self.read_u8()?;
            result |= ((byte & 0x7F) as i32) << shift;
            if shift >= 25 {
                let continuation_bit = (byte & 0x80) != 0;
                let sign_and_unused_bit = (byte << 1) as i8 >> (32 - shift);
                if continuation_bit || (sign_and_unused_bit != 0 && sign_and_unused_bit != -1) {
                    let msg = if continuation_bit {
                        "invalid var_i32: integer representation too long"
                    } else {
                        "invalid var_i32: integer too large"
                    };
                    return Err(ProfileError::invalid(msg, self.position - 1));
                }
                return Ok(result);
            }
            shift += 7;
            if (byte & 0x80) == 0 {
                break;
            }
        }
        let ashift = 32 - shift;
        Ok((result << ashift) >> ashift)
    }

    /// Reads a variable-length count from the stream while checking it
    /// against a limit.
    pub fn read_size(&mut self, limit: usize, desc: &str) -> Result<usize> {
        let pos = self.position;
        let size = self.read_var_u32()? as usize;
        if size > limit {
            bail!(pos, "{desc} count is out of bounds");
        }
        Ok(size)
    }

    /// Reads a length-prefixed UTF-8 string from the stream.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let pos = self.position;
        let len = self.read_var_u32()? as usize;
        if len > MAX_STRING_SIZE {
            return Err(ProfileError::invalid("string length is out of bounds", pos));
        }
        let bytes = self.read_bytes(len)?;
        str::from_utf8(bytes).map_err(|_| ProfileError::invalid("malformed UTF-8 encoding", pos))
    }

    #[cold]
    pub(crate) fn invalid_leading_byte<T>(&self, byte: u8, desc: &str) -> Result<T> {
        Err(format_err!(
            self.position - 1,
            "invalid leading byte (0x{byte:x}) for {desc}"
        ))
    }
}
