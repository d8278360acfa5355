//! A low-level encoder for Mono AOT profile logs.
//!
//! The main builder is the [`Profile`]. Each record method appends one
//! record to the log and returns the index that record was assigned within
//! its own kind, which later records use to reference it. When you are
//! finished, call [`Profile::finish`] to take ownership of the encoded
//! bytes, or [`Profile::as_slice`] to borrow them.
//!
//! # Example
//!
//! ```
//! use aotprof_encoder::Profile;
//!
//! let mut profile = Profile::new();
//! let module = profile.module("App.dll");
//! let program = profile.ty(module, "App.Program", &[]);
//! profile.method(program, "Main", "(string[])void", None);
//!
//! let bytes = profile.finish();
//! assert!(bytes.starts_with(b"AOTPROFILE"));
//! ```
//!
//! The builder deliberately performs no cross-reference validation: indices
//! are written exactly as given. While this is a potential footgun, it also
//! allows the crate to construct test cases for corrupt log encodings.

#![deny(missing_docs, missing_debug_implementations)]

pub mod encoders;
#[cfg(feature = "reencode")]
mod reencode;

#[cfg(feature = "reencode")]
pub use reencode::reencode_profile;

/// The ASCII magic token every profile log starts with.
pub const MAGIC: &[u8; 10] = b"AOTPROFILE";

/// The major format version this crate writes.
pub const MAJOR_VERSION: u32 = 1;

/// The minor format version this crate writes by default.
pub const MINOR_VERSION: u32 = 0;

/// The type-kind byte for a class, the only kind defined by version 1 of
/// the format.
pub const TYPE_KIND_CLASS: u8 = 0x12;

/// Record tag bytes understood by profile consumers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum RecordId {
    /// A loaded assembly/module.
    Module = 1,
    /// A concrete type.
    Type = 2,
    /// A generic instantiation.
    GenericInstance = 3,
    /// An observed method.
    Method = 4,
}

impl From<RecordId> for u8 {
    fn from(id: RecordId) -> u8 {
        id as u8
    }
}

/// A type argument on a type record or generic instantiation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeArg {
    /// A reference to an earlier type record.
    Type(u32),
    /// The generic parameter at the given position, left open.
    Param(u32),
}

impl Encode for TypeArg {
    fn encode(&self, sink: &mut Vec<u8>) {
        match *self {
            TypeArg::Type(index) => encoders::s32(sink, i32::try_from(index).unwrap()),
            TypeArg::Param(position) => {
                encoders::s32(sink, -1 - i32::try_from(position).unwrap())
            }
        }
    }
}

/// A type which can be encoded into the profile log's binary form.
pub trait Encode {
    /// Encode `self` into the given byte sink.
    fn encode(&self, sink: &mut Vec<u8>);
}

/// An AOT profile log that is being encoded.
#[derive(Clone, Debug)]
pub struct Profile {
    bytes: Vec<u8>,
    modules: u32,
    types: u32,
    generic_instances: u32,
    methods: u32,
}

impl Profile {
    /// Begin writing a new `Profile` with the current format version.
    pub fn new() -> Self {
        Self::with_version(MAJOR_VERSION, MINOR_VERSION)
    }

    /// Begin writing a new `Profile` with an explicit header version.
    pub fn with_version(major: u32, minor: u32) -> Self {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        encoders::u32(&mut bytes, major);
        encoders::u32(&mut bytes, minor);
        Profile {
            bytes,
            modules: 0,
            types: 0,
            generic_instances: 0,
            methods: 0,
        }
    }

    /// Write a module record and return its index.
    pub fn module(&mut self, name: &str) -> u32 {
        self.bytes.push(RecordId::Module.into());
        encoders::str(&mut self.bytes, name);
        let index = self.modules;
        self.modules += 1;
        index
    }

    /// Write a type record owned by `module` and return its index.
    pub fn ty(&mut self, module: u32, name: &str, args: &[TypeArg]) -> u32 {
        self.bytes.push(RecordId::Type.into());
        self.bytes.push(TYPE_KIND_CLASS);
        encoders::u32(&mut self.bytes, module);
        encoders::str(&mut self.bytes, name);
        self.type_args(args);
        let index = self.types;
        self.types += 1;
        index
    }

    /// Write a generic-instance record for the generic definition at type
    /// index `definition` and return its index.
    pub fn generic_instance(&mut self, definition: u32, args: &[TypeArg]) -> u32 {
        self.bytes.push(RecordId::GenericInstance.into());
        encoders::u32(&mut self.bytes, definition);
        self.type_args(args);
        let index = self.generic_instances;
        self.generic_instances += 1;
        index
    }

    /// Write a method record owned by the type at index `owner` and return
    /// its index.
    ///
    /// `instance` names the generic-instance record of a generic method;
    /// `None` is encoded as the `-1` sentinel.
    pub fn method(
        &mut self,
        owner: u32,
        name: &str,
        signature: &str,
        instance: Option<u32>,
    ) -> u32 {
        self.bytes.push(RecordId::Method.into());
        encoders::u32(&mut self.bytes, owner);
        encoders::str(&mut self.bytes, name);
        encoders::str(&mut self.bytes, signature);
        match instance {
            Some(index) => encoders::s32(&mut self.bytes, i32::try_from(index).unwrap()),
            None => encoders::s32(&mut self.bytes, -1),
        }
        let index = self.methods;
        self.methods += 1;
        index
    }

    fn type_args(&mut self, args: &[TypeArg]) {
        encoders::u32(&mut self.bytes, u32::try_from(args.len()).unwrap());
        for arg in args {
            arg.encode(&mut self.bytes);
        }
    }

    /// Get the encoded profile log as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Finish writing this profile log and extract ownership of the
    /// encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
