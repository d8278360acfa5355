use crate::records::{ProfileVersion, RecordReader, MAJOR_VERSION, MINOR_VERSION};
use crate::resolver;
use crate::Result;
use core::fmt;
use core::ops;

macro_rules! indices {
    ($($(#[$attr:meta])* $name:ident => $field:ident: $record:ty;)*) => ($(
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl ops::Index<$name> for ProfileData {
            type Output = $record;

            fn index(&self, index: $name) -> &$record {
                &self.$field[index.0 as usize]
            }
        }
    )*)
}

indices! {
    /// Encounter-order index of a module record.
    ModuleIndex => modules: ModuleRecord;
    /// Encounter-order index of a type record.
    TypeIndex => types: TypeRecord;
    /// Encounter-order index of a generic-instance record.
    GenericInstIndex => generic_instances: GenericInstRecord;
    /// Encounter-order index of a method record.
    MethodIndex => methods: MethodRecord;
}

/// One loaded assembly/module encountered during profiling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRecord {
    /// Assembly name or GUID identifying the module.
    pub name: String,
}

/// The kind of a type record.
///
/// Version 1 of the format only ever writes classes; the byte is reserved
/// for future kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TypeKind {
    /// A class type.
    Class,
}

/// A resolved type-argument reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeArg {
    /// A concrete type.
    Type(TypeIndex),
    /// The generic parameter at the given position, left open by shared
    /// generic code.
    Param(u32),
}

/// One concrete type referenced during execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRecord {
    /// What kind of type this is.
    pub kind: TypeKind,
    /// The module the type lives in; always an earlier record.
    pub module: ModuleIndex,
    /// Fully qualified type name.
    pub name: String,
    /// Generic arguments, empty for a non-generic type.
    pub args: Vec<TypeArg>,
}

/// One generic instantiation with concrete type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericInstRecord {
    /// The type record serving as the generic definition.
    pub definition: TypeIndex,
    /// The type arguments, matching the definition's declared arity.
    pub args: Vec<TypeArg>,
}

/// One method observed as called or compiled during the profiled run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRecord {
    /// The type the method is declared on.
    pub owner: TypeIndex,
    /// The method's name.
    pub name: String,
    /// Signature descriptor, possibly empty.
    pub signature: String,
    /// The instantiation of a generic method, `None` otherwise.
    pub instance: Option<GenericInstIndex>,
}

/// A fully decoded, fully resolved profile log.
///
/// All four record sequences keep their encounter order. That order is the
/// priority signal an AOT compiler consumes, so nothing here reorders,
/// deduplicates or sorts; indices assigned during decoding are simply
/// positions in these vectors.
///
/// A `ProfileData` is only ever produced from a complete, validated stream.
/// There is no way to obtain a partially decoded one: every decoding error
/// is terminal and yields no model at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileData {
    /// The version stamped in the log's header.
    pub version: ProfileVersion,
    /// All modules, in encounter order.
    pub modules: Vec<ModuleRecord>,
    /// All types, in encounter order.
    pub types: Vec<TypeRecord>,
    /// All generic instantiations, in encounter order.
    pub generic_instances: Vec<GenericInstRecord>,
    /// All methods, in encounter order. For the AOT consumer this doubles
    /// as the compilation priority list.
    pub methods: Vec<MethodRecord>,
}

impl ProfileData {
    /// Decodes a complete profile log.
    ///
    /// Validates the header, reads every record, and resolves every
    /// cross-reference. Any failure along the way aborts the whole decode;
    /// restarting from the beginning of the byte stream is the only way to
    /// retry.
    pub fn parse(data: &[u8]) -> Result<ProfileData> {
        resolver::resolve(RecordReader::new(data)?)
    }

    /// Looks up a module record by index.
    pub fn module(&self, index: ModuleIndex) -> Option<&ModuleRecord> {
        self.modules.get(index.0 as usize)
    }

    /// Looks up a type record by index.
    pub fn ty(&self, index: TypeIndex) -> Option<&TypeRecord> {
        self.types.get(index.0 as usize)
    }

    /// Looks up a generic-instance record by index.
    pub fn generic_instance(&self, index: GenericInstIndex) -> Option<&GenericInstRecord> {
        self.generic_instances.get(index.0 as usize)
    }

    /// Looks up a method record by index.
    pub fn method(&self, index: MethodIndex) -> Option<&MethodRecord> {
        self.methods.get(index.0 as usize)
    }

    /// Renders `method` as `Type.FullName.MethodName`, the shape exclusion
    /// patterns are matched against.
    pub fn qualified_method_name(&self, method: &MethodRecord) -> String {
        format!("{}.{}", self[method.owner].name, method.name)
    }
}

impl Default for ProfileData {
    fn default() -> ProfileData {
        ProfileData {
            version: ProfileVersion {
                major: MAJOR_VERSION,
                minor: MINOR_VERSION,
            },
            modules: Vec::new(),
            types: Vec::new(),
            generic_instances: Vec::new(),
            methods: Vec::new(),
        }
    }
}
