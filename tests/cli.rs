use anyhow::Result;
use aotprof_encoder::{Profile, TypeArg};
use aotprofparser::ProfileData;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_aotprof-tools"))
}

fn sample_log(dir: &tempfile::TempDir) -> Result<PathBuf> {
    let mut profile = Profile::new();
    let mscorlib = profile.module("mscorlib.dll");
    let app = profile.module("App.dll");
    let string = profile.ty(mscorlib, "System.String", &[]);
    let list = profile.ty(mscorlib, "System.Collections.Generic.List`1", &[]);
    let program = profile.ty(app, "App.Program", &[]);
    let inst = profile.generic_instance(list, &[TypeArg::Type(string)]);
    profile.method(program, "Main", "(string[])void", None);
    profile.method(list, "Add", "(T)void", Some(inst));
    profile.method(string, "Concat", "(string,string)string", None);

    let path = dir.path().join("app.aotprofile");
    fs::write(&path, profile.finish())?;
    Ok(path)
}

#[test]
fn validate_reports_counts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = sample_log(&dir)?;
    let output = bin().arg("validate").arg(&log).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("valid AOT profile, version 1.0"));
    assert!(stdout.contains("modules:           2"));
    assert!(stdout.contains("methods:           3"));
    Ok(())
}

#[test]
fn validate_rejects_a_corrupt_log() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = sample_log(&dir)?;
    let mut bytes = fs::read(&log)?;
    bytes[0] = b'X';
    fs::write(&log, bytes)?;

    let output = bin().arg("validate").arg(&log).output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("magic header not detected"));
    Ok(())
}

#[test]
fn dump_methods_only_lists_each_method() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = sample_log(&dir)?;
    let output = bin()
        .arg("dump")
        .arg(&log)
        .arg("--methods-only")
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        [
            "App.dll;App.Program.Main;;",
            "mscorlib.dll;System.Collections.Generic.List`1.Add;0;System.String",
            "mscorlib.dll;System.String.Concat;;",
        ]
    );
    Ok(())
}

#[test]
fn dump_shows_offsets_and_indices() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = sample_log(&dir)?;
    let output = bin().arg("dump").arg(&log).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with("version 1.0\n"));
    assert!(stdout.contains("module[0] name = \"mscorlib.dll\""));
    assert!(stdout.contains("method[0] owner = 2, name = \"Main\""));
    Ok(())
}

#[test]
fn filter_drops_matching_methods_and_nothing_else() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = sample_log(&dir)?;
    let out = dir.path().join("filtered.aotprofile");
    let status = bin()
        .arg("filter")
        .arg(&log)
        .arg("-e")
        .arg(r"App\.Program\.Main")
        .arg("-o")
        .arg(&out)
        .status()?;
    assert!(status.success());

    let original = ProfileData::parse(&fs::read(&log)?)?;
    let filtered = ProfileData::parse(&fs::read(&out)?)?;
    assert_eq!(filtered.modules, original.modules);
    assert_eq!(filtered.types, original.types);
    assert_eq!(filtered.generic_instances, original.generic_instances);
    assert_eq!(filtered.methods.len(), 2);
    assert!(filtered
        .methods
        .iter()
        .all(|method| method.name != "Main"));
    Ok(())
}

#[test]
fn filter_by_module_name() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = sample_log(&dir)?;
    let out = dir.path().join("filtered.aotprofile");
    let status = bin()
        .arg("filter")
        .arg(&log)
        .arg("--exclude-module")
        .arg("mscorlib.dll")
        .arg("-o")
        .arg(&out)
        .status()?;
    assert!(status.success());

    let filtered = ProfileData::parse(&fs::read(&out)?)?;
    let names: Vec<&str> = filtered
        .methods
        .iter()
        .map(|method| method.name.as_str())
        .collect();
    assert_eq!(names, ["Main"]);
    Ok(())
}
