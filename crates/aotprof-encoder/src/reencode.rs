use crate::{Profile, TypeArg};
use aotprofparser as parser;

/// Serializes a decoded [`parser::ProfileData`] back to its binary form.
///
/// Records are emitted grouped by kind: all modules, then all types, then
/// generic instances, then methods. Grouping preserves every per-kind index
/// and the per-kind encounter order, so decoding the output yields a model
/// equal to the input, even though the byte-level interleaving of the
/// original log is not reproduced.
pub fn reencode_profile(profile: &parser::ProfileData) -> Vec<u8> {
    let mut out = Profile::with_version(profile.version.major, profile.version.minor);
    for module in &profile.modules {
        out.module(&module.name);
    }
    for ty in &profile.types {
        out.ty(ty.module.0, &ty.name, &type_args(&ty.args));
    }
    for inst in &profile.generic_instances {
        out.generic_instance(inst.definition.0, &type_args(&inst.args));
    }
    for method in &profile.methods {
        out.method(
            method.owner.0,
            &method.name,
            &method.signature,
            method.instance.map(|index| index.0),
        );
    }
    out.finish()
}

fn type_args(args: &[parser::TypeArg]) -> Vec<TypeArg> {
    args.iter()
        .map(|arg| match *arg {
            parser::TypeArg::Type(index) => TypeArg::Type(index.0),
            parser::TypeArg::Param(position) => TypeArg::Param(position),
        })
        .collect()
}
