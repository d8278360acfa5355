use aotprofparser::{
    ErrorKind, ProfileData, RecordKind, RecordReader, TypeArg, TypeIndex, MAGIC,
};
use std::collections::HashSet;

fn header() -> Vec<u8> {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&[1, 0]);
    bytes
}

fn push_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.push(u8::try_from(s.len()).unwrap());
    bytes.extend_from_slice(s.as_bytes());
}

/// Two modules, three types, one generic instantiation and two methods,
/// one of them generic.
fn sample() -> Vec<u8> {
    let mut bytes = header();
    bytes.push(1);
    push_str(&mut bytes, "App.dll");
    bytes.push(1);
    push_str(&mut bytes, "mscorlib.dll");
    bytes.extend_from_slice(&[2, 0x12, 1]);
    push_str(&mut bytes, "System.String");
    bytes.push(0);
    bytes.extend_from_slice(&[2, 0x12, 1]);
    push_str(&mut bytes, "System.Collections.Generic.List`1");
    bytes.push(0);
    bytes.extend_from_slice(&[2, 0x12, 0]);
    push_str(&mut bytes, "App.Program");
    bytes.push(0);
    // List`1 instantiated with System.String
    bytes.extend_from_slice(&[3, 1, 1, 0]);
    bytes.extend_from_slice(&[4, 2]);
    push_str(&mut bytes, "Main");
    push_str(&mut bytes, "");
    bytes.push(0x7f);
    bytes.extend_from_slice(&[4, 1]);
    push_str(&mut bytes, "Add");
    push_str(&mut bytes, "");
    bytes.push(0);
    bytes
}

#[test]
fn decodes_a_complete_profile() {
    let profile = ProfileData::parse(&sample()).unwrap();
    assert_eq!(profile.modules.len(), 2);
    assert_eq!(profile.types.len(), 3);
    assert_eq!(profile.generic_instances.len(), 1);
    assert_eq!(profile.methods.len(), 2);

    let inst = &profile.generic_instances[0];
    assert_eq!(profile[inst.definition].name, "System.Collections.Generic.List`1");
    assert_eq!(inst.args, [TypeArg::Type(TypeIndex(0))]);

    let add = &profile.methods[1];
    assert_eq!(profile.qualified_method_name(add), "System.Collections.Generic.List`1.Add");
    assert_eq!(profile[profile[add.owner].module].name, "mscorlib.dll");
}

#[test]
fn minimal_profile_links_method_to_type_and_module() {
    let mut bytes = header();
    bytes.push(1);
    push_str(&mut bytes, "App.dll");
    bytes.extend_from_slice(&[2, 0x12, 0]);
    push_str(&mut bytes, "App.Program");
    bytes.push(0);
    bytes.extend_from_slice(&[4, 0]);
    push_str(&mut bytes, "Main");
    push_str(&mut bytes, "");
    bytes.push(0x7f);

    let profile = ProfileData::parse(&bytes).unwrap();
    assert_eq!(profile.modules.len(), 1);
    assert_eq!(profile.types.len(), 1);
    assert_eq!(profile.methods.len(), 1);

    let main = &profile.methods[0];
    assert_eq!(main.owner, TypeIndex(0));
    assert_eq!(profile[main.owner], profile.types[0]);
    assert_eq!(main.name, "Main");
    assert_eq!(main.signature, "");
    assert_eq!(main.instance, None);
}

#[test]
fn decoding_is_deterministic() {
    let bytes = sample();
    assert_eq!(
        ProfileData::parse(&bytes).unwrap(),
        ProfileData::parse(&bytes).unwrap()
    );
}

#[test]
fn streaming_reader_reports_stable_offsets() {
    let bytes = sample();
    let walk = |bytes: &[u8]| -> Vec<(usize, RecordKind)> {
        RecordReader::new(bytes)
            .unwrap()
            .map(|item| {
                let (offset, record) = item.unwrap();
                (offset, record.kind())
            })
            .collect()
    };
    let first = walk(&bytes);
    assert_eq!(first, walk(&bytes));
    assert_eq!(first[0], (12, RecordKind::Module));
}

#[test]
fn truncation_strictly_before_the_end_never_yields_a_full_model() {
    let bytes = sample();
    // A prefix ending exactly where a record starts is a shorter, valid
    // log; every other cut has to surface as a truncation error.
    let record_starts: HashSet<usize> = RecordReader::new(&bytes)
        .unwrap()
        .map(|item| item.unwrap().0)
        .collect();
    let full = ProfileData::parse(&bytes).unwrap();
    let full_count = full.modules.len()
        + full.types.len()
        + full.generic_instances.len()
        + full.methods.len();

    for len in 0..bytes.len() {
        match ProfileData::parse(&bytes[..len]) {
            Ok(profile) => {
                assert!(
                    record_starts.contains(&len),
                    "prefix of {len} bytes decoded but does not end on a record boundary"
                );
                let count = profile.modules.len()
                    + profile.types.len()
                    + profile.generic_instances.len()
                    + profile.methods.len();
                assert!(count < full_count);
            }
            Err(err) => {
                assert!(
                    matches!(err.kind(), ErrorKind::Truncated { .. }),
                    "prefix of {len} bytes failed with {err} instead of a truncation error"
                );
                assert!(err.offset() <= len);
            }
        }
    }
}

#[test]
fn type_with_dangling_module_reference() {
    let mut bytes = header();
    bytes.push(1);
    push_str(&mut bytes, "App.dll");
    bytes.extend_from_slice(&[2, 0x12, 5]);
    push_str(&mut bytes, "App.Program");
    bytes.push(0);

    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(
        *err.kind(),
        ErrorKind::DanglingReference {
            referrer: RecordKind::Type,
            referrer_index: 0,
            target: RecordKind::Module,
            target_index: 5,
        }
    );
}

#[test]
fn method_with_dangling_owner() {
    let mut bytes = header();
    bytes.extend_from_slice(&[4, 0]);
    push_str(&mut bytes, "Main");
    push_str(&mut bytes, "");
    bytes.push(0x7f);

    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(
        *err.kind(),
        ErrorKind::DanglingReference {
            referrer: RecordKind::Method,
            referrer_index: 0,
            target: RecordKind::Type,
            target_index: 0,
        }
    );
}

#[test]
fn method_with_dangling_generic_instance() {
    let mut bytes = header();
    bytes.push(1);
    push_str(&mut bytes, "App.dll");
    bytes.extend_from_slice(&[2, 0x12, 0]);
    push_str(&mut bytes, "App.Program");
    bytes.push(0);
    bytes.extend_from_slice(&[4, 0]);
    push_str(&mut bytes, "Run");
    push_str(&mut bytes, "");
    bytes.push(0);

    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(
        *err.kind(),
        ErrorKind::DanglingReference {
            referrer: RecordKind::Method,
            referrer_index: 0,
            target: RecordKind::GenericInst,
            target_index: 0,
        }
    );
}

#[test]
fn generic_instance_with_dangling_definition() {
    let mut bytes = header();
    bytes.extend_from_slice(&[3, 0, 0]);

    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(
        *err.kind(),
        ErrorKind::DanglingReference {
            referrer: RecordKind::GenericInst,
            referrer_index: 0,
            target: RecordKind::Type,
            target_index: 0,
        }
    );
}

#[test]
fn type_argument_may_not_reference_the_type_itself() {
    let mut bytes = header();
    bytes.push(1);
    push_str(&mut bytes, "App.dll");
    bytes.extend_from_slice(&[2, 0x12, 0]);
    push_str(&mut bytes, "Pair`1");
    bytes.extend_from_slice(&[1, 0]);

    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(
        *err.kind(),
        ErrorKind::DanglingReference {
            referrer: RecordKind::Type,
            referrer_index: 0,
            target: RecordKind::Type,
            target_index: 0,
        }
    );
}

#[test]
fn generic_instance_arity_mismatch() {
    let mut bytes = header();
    bytes.push(1);
    push_str(&mut bytes, "mscorlib.dll");
    bytes.extend_from_slice(&[2, 0x12, 0]);
    push_str(&mut bytes, "System.Collections.Generic.Dictionary`2");
    bytes.push(0);
    bytes.extend_from_slice(&[3, 0, 1, 0]);

    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(
        *err.kind(),
        ErrorKind::ArityMismatch {
            declared: 2,
            supplied: 1,
        }
    );
}

#[test]
fn corrupted_magic_is_rejected_before_any_record() {
    let mut bytes = sample();
    bytes[3] ^= 0x20;
    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::Format);
    assert_eq!(err.offset(), 0);
}

#[test]
fn unsupported_major_version_is_rejected() {
    let mut bytes = sample();
    bytes[10] = 3;
    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::Version { major: 3 });
}

#[test]
fn minor_version_may_vary_freely() {
    let mut bytes = sample();
    bytes[11] = 42;
    let profile = ProfileData::parse(&bytes).unwrap();
    assert_eq!(profile.version.minor, 42);
    assert_eq!(profile.methods.len(), 2);
}

#[test]
fn errors_render_their_offset() {
    let mut bytes = header();
    bytes.push(9);
    let err = ProfileData::parse(&bytes).unwrap_err();
    assert_eq!(err.to_string(), "unknown record tag (0x9) (at offset 0xc)");
}
