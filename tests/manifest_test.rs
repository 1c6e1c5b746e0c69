use std::path::{Path, PathBuf};

use runfiles_repo::manifest::Manifest;
use runfiles_repo::RunfilesError;
use tempfile::TempDir;

fn parse(contents: &str) -> Manifest {
    Manifest::parse(Path::new("test.runfiles_manifest"), contents).expect("failed to parse manifest")
}

#[test]
fn test_parse_plain_entries() {
    let manifest = parse(
        "_main/data/config.json /abs/runfiles/_main/data/config.json\n\
         rules_foo/tool/bin /cache/rules_foo/tool/bin\n",
    );
    assert_eq!(manifest.len(), 2);
    assert_eq!(
        manifest.get("_main/data/config.json"),
        Some("/abs/runfiles/_main/data/config.json")
    );
}

#[test]
fn test_value_may_contain_spaces() {
    let manifest = parse("_main/a.txt /path with spaces/a.txt\n");
    assert_eq!(manifest.get("_main/a.txt"), Some("/path with spaces/a.txt"));
}

#[test]
fn test_escaped_entry() {
    let manifest = parse(" _main/with\\sspace\\bslash /real/with space\\bslash\\nnewline\n");
    assert_eq!(
        manifest.get("_main/with space\\slash"),
        Some("/real/with space\\slash\nnewline")
    );
}

#[test]
fn test_unknown_escape_reports_line() {
    let err = Manifest::parse(Path::new("m"), "_main/ok /ok\n _main/bad\\q /x\n").unwrap_err();
    match err {
        RunfilesError::Manifest { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_line_without_separator_maps_to_itself() {
    let manifest = parse("/abs/only/key\n");
    assert_eq!(manifest.get("/abs/only/key"), Some("/abs/only/key"));
}

#[test]
fn test_empty_value_is_placeholder_without_file() {
    let manifest = parse("_main/pkg/__init__.py \n");
    assert_eq!(manifest.get("_main/pkg/__init__.py"), Some(""));
    assert_eq!(manifest.lookup("_main/pkg/__init__.py"), None);
}

#[test]
fn test_crlf_and_blank_lines_are_ignored() {
    let manifest = parse("_main/a /real/a\r\n\r\n_main/b /real/b\r\n");
    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.get("_main/a"), Some("/real/a"));
}

#[test]
fn test_lookup_exact() {
    let manifest = parse("_main/data/config.json /abs/config.json\n");
    assert_eq!(
        manifest.lookup("_main/data/config.json"),
        Some(PathBuf::from("/abs/config.json"))
    );
    assert_eq!(manifest.lookup("_main/data/other.json"), None);
}

#[test]
fn test_lookup_uses_longest_directory_prefix() {
    let manifest = parse(
        "_main/tree /real/tree\n\
         _main/tree/nested /elsewhere/nested\n",
    );
    assert_eq!(
        manifest.lookup("_main/tree/nested/deep/file.txt"),
        Some(PathBuf::from("/elsewhere/nested/deep/file.txt"))
    );
    assert_eq!(
        manifest.lookup("_main/tree/other.txt"),
        Some(PathBuf::from("/real/tree/other.txt"))
    );
    assert_eq!(manifest.lookup("_main/treehouse/file.txt"), None);
}

#[test]
fn test_load_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bin.runfiles_manifest");
    std::fs::write(&path, "_main/data/file.txt /real/file.txt\n").unwrap();

    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.path(), path.as_path());
    assert_eq!(manifest.get("_main/data/file.txt"), Some("/real/file.txt"));
}

#[test]
fn test_load_missing_file_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = Manifest::load(&dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, RunfilesError::Unavailable { .. }));
}
