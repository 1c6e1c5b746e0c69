use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use runfiles_repo::config::*;
use runfiles_repo::RunfilesError;
use tempfile::TempDir;

fn env_from(vars: &[(&str, &Path)]) -> RunfilesEnv {
    let vars: HashMap<String, OsString> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.as_os_str().to_owned()))
        .collect();
    RunfilesEnv::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn test_from_lookup_reads_variables() {
    let env = RunfilesEnv::from_lookup(|name| match name {
        RUNFILES_MANIFEST_ONLY => Some("1".into()),
        RUNFILES_MANIFEST_FILE => Some("/tmp/bin.runfiles_manifest".into()),
        RUNFILES_DIR => Some("".into()),
        _ => None,
    });
    assert!(env.manifest_only);
    assert_eq!(env.manifest_file, Some(PathBuf::from("/tmp/bin.runfiles_manifest")));
    assert_eq!(env.runfiles_dir, None, "empty values count as unset");
    assert_eq!(env.executable, None);
}

#[test]
fn test_manifest_only_wins() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("MANIFEST");
    let env = RunfilesEnv {
        manifest_only: true,
        manifest_file: Some(manifest.clone()),
        runfiles_dir: Some(dir.path().to_path_buf()),
        ..RunfilesEnv::default()
    };
    assert_eq!(env.discover().unwrap(), RunfilesLocation::Manifest(manifest));
}

#[test]
fn test_manifest_only_without_manifest_is_unavailable() {
    let env = RunfilesEnv {
        manifest_only: true,
        ..RunfilesEnv::default()
    };
    assert!(matches!(env.discover(), Err(RunfilesError::Unavailable { .. })));
}

#[test]
fn test_directory_preferred_over_manifest() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("bin.runfiles_manifest");
    fs::write(&manifest, "").unwrap();

    let env = env_from(&[(RUNFILES_DIR, dir.path()), (RUNFILES_MANIFEST_FILE, &manifest)]);
    assert_eq!(
        env.discover().unwrap(),
        RunfilesLocation::Directory(dir.path().to_path_buf())
    );
}

#[test]
fn test_java_runfiles_fallback() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing");
    let env = env_from(&[(RUNFILES_DIR, &missing), (JAVA_RUNFILES, dir.path())]);
    assert_eq!(
        env.discover().unwrap(),
        RunfilesLocation::Directory(dir.path().to_path_buf())
    );
}

#[test]
fn test_manifest_used_when_no_directory() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("bin.runfiles_manifest");
    fs::write(&manifest, "").unwrap();

    let env = env_from(&[(RUNFILES_MANIFEST_FILE, &manifest)]);
    assert_eq!(env.discover().unwrap(), RunfilesLocation::Manifest(manifest));
}

#[test]
fn test_discovers_directory_beside_executable() {
    let dir = TempDir::new().unwrap();
    let exe = dir.path().join("tool");
    fs::create_dir(dir.path().join("tool.runfiles")).unwrap();

    let env = RunfilesEnv::default().with_executable(Some(exe));
    assert_eq!(
        env.discover().unwrap(),
        RunfilesLocation::Directory(dir.path().join("tool.runfiles"))
    );
}

#[test]
fn test_discovers_manifest_beside_executable() {
    let dir = TempDir::new().unwrap();
    let exe = dir.path().join("tool");
    let manifest = dir.path().join("tool.runfiles_manifest");
    fs::write(&manifest, "").unwrap();

    let env = RunfilesEnv::default().with_executable(Some(exe));
    assert_eq!(env.discover().unwrap(), RunfilesLocation::Manifest(manifest));
}

#[test]
fn test_test_srcdir_is_last_resort() {
    let dir = TempDir::new().unwrap();
    let env = env_from(&[(TEST_SRCDIR, dir.path())]);
    assert_eq!(
        env.discover().unwrap(),
        RunfilesLocation::Directory(dir.path().to_path_buf())
    );
}

#[test]
fn test_nothing_found_is_unavailable() {
    let err = RunfilesEnv::default().discover().unwrap_err();
    assert!(err.is_unavailable());
    assert!(err.to_string().contains(RUNFILES_MANIFEST_FILE));
}

#[test]
fn test_runfiles_dir_for_manifest() {
    assert_eq!(
        runfiles_dir_for_manifest(Path::new("/out/bin/tool.runfiles_manifest")),
        Some(PathBuf::from("/out/bin/tool.runfiles"))
    );
    assert_eq!(
        runfiles_dir_for_manifest(Path::new("/out/bin/tool.runfiles/MANIFEST")),
        Some(PathBuf::from("/out/bin/tool.runfiles"))
    );
    assert_eq!(runfiles_dir_for_manifest(Path::new("/out/bin/custom_manifest")), None);
    assert_eq!(runfiles_dir_for_manifest(Path::new("/out/other/MANIFEST")), None);
}
