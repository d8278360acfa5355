//! Turns the raw record stream into a linked [`ProfileData`].
//!
//! The format is append-only and forward-reference-free: a record may only
//! reference records of the target kind that carry a strictly smaller
//! index. A single linear pass in encounter order therefore resolves
//! everything; by the time a reference is checked, every legal target has
//! already been materialized.

use crate::profile::{
    GenericInstIndex, GenericInstRecord, MethodRecord, ModuleIndex, ModuleRecord, ProfileData,
    TypeArg, TypeIndex, TypeKind, TypeRecord,
};
use crate::records::{Record, RecordKind, RecordReader, TypeArgRef};
use crate::{ErrorKind, ProfileError, Result};

struct Referrer {
    kind: RecordKind,
    index: usize,
    offset: usize,
}

fn check_index(target: RecordKind, index: u32, count: usize, referrer: &Referrer) -> Result<u32> {
    if (index as usize) < count {
        Ok(index)
    } else {
        Err(ProfileError::new(
            ErrorKind::DanglingReference {
                referrer: referrer.kind,
                referrer_index: referrer.index as u32,
                target,
                target_index: index,
            },
            referrer.offset,
        ))
    }
}

fn resolve_args(
    args: &[TypeArgRef],
    type_count: usize,
    referrer: &Referrer,
) -> Result<Vec<TypeArg>> {
    args.iter()
        .map(|arg| match *arg {
            TypeArgRef::Type(index) => Ok(TypeArg::Type(TypeIndex(check_index(
                RecordKind::Type,
                index,
                type_count,
                referrer,
            )?))),
            TypeArgRef::Param(position) => Ok(TypeArg::Param(position)),
        })
        .collect()
}

/// The arity a generic definition declares through the CLR backtick
/// convention: `List`1` declares one parameter, nested names such as
/// `Cache`1+Entry`2` sum to three, and a name with no marker declares zero.
fn declared_arity(name: &str) -> u32 {
    name.split('`')
        .skip(1)
        .filter_map(|rest| {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            rest[..digits].parse::<u32>().ok()
        })
        .sum()
}

pub(crate) fn resolve(reader: RecordReader<'_>) -> Result<ProfileData> {
    let version = reader.version();
    let mut modules: Vec<ModuleRecord> = Vec::new();
    let mut types: Vec<TypeRecord> = Vec::new();
    let mut generic_instances: Vec<GenericInstRecord> = Vec::new();
    let mut methods: Vec<MethodRecord> = Vec::new();

    for item in reader {
        let (offset, record) = item?;
        match record {
            Record::Module(raw) => {
                modules.push(ModuleRecord {
                    name: raw.name.to_string(),
                });
            }
            Record::Type(raw) => {
                let referrer = Referrer {
                    kind: RecordKind::Type,
                    index: types.len(),
                    offset,
                };
                let module = ModuleIndex(check_index(
                    RecordKind::Module,
                    raw.module,
                    modules.len(),
                    &referrer,
                )?);
                // `types.len()` excludes the record being resolved, so a
                // type can never use itself as one of its own arguments.
                let args = resolve_args(&raw.args, types.len(), &referrer)?;
                types.push(TypeRecord {
                    kind: TypeKind::Class,
                    module,
                    name: raw.name.to_string(),
                    args,
                });
            }
            Record::GenericInst(raw) => {
                let referrer = Referrer {
                    kind: RecordKind::GenericInst,
                    index: generic_instances.len(),
                    offset,
                };
                let definition = TypeIndex(check_index(
                    RecordKind::Type,
                    raw.definition,
                    types.len(),
                    &referrer,
                )?);
                let declared = declared_arity(&types[definition.0 as usize].name);
                if declared as usize != raw.args.len() {
                    return Err(ProfileError::new(
                        ErrorKind::ArityMismatch {
                            declared,
                            supplied: raw.args.len() as u32,
                        },
                        offset,
                    ));
                }
                let args = resolve_args(&raw.args, types.len(), &referrer)?;
                generic_instances.push(GenericInstRecord { definition, args });
            }
            Record::Method(raw) => {
                let referrer = Referrer {
                    kind: RecordKind::Method,
                    index: methods.len(),
                    offset,
                };
                let owner = TypeIndex(check_index(
                    RecordKind::Type,
                    raw.owner,
                    types.len(),
                    &referrer,
                )?);
                let instance = match raw.instance {
                    Some(index) => Some(GenericInstIndex(check_index(
                        RecordKind::GenericInst,
                        index,
                        generic_instances.len(),
                        &referrer,
                    )?)),
                    None => None,
                };
                methods.push(MethodRecord {
                    owner,
                    name: raw.name.to_string(),
                    signature: raw.signature.to_string(),
                    instance,
                });
            }
        }
    }

    Ok(ProfileData {
        version,
        modules,
        types,
        generic_instances,
        methods,
    })
}
