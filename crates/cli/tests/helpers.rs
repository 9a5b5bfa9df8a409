use std::fs;
use std::path::Path;

use clip_rename::{canonicalize_or_current, infer_project_name, parse_address, sha256_file};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_resolves_existing_relative_path() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current("nested").expect("canonicalize nested");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));

    let dot = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    assert_eq!(dot, tmp.path().canonicalize().expect("canon tmp"));

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("C:/work/router-fw")), "router-fw");
    assert_eq!(infer_project_name(Path::new("/tmp/project-root")), "project-root");
}

#[test]
fn infer_project_name_falls_back_when_missing() {
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

#[test]
fn parse_address_accepts_hex_and_decimal() {
    assert_eq!(parse_address("0x401000").unwrap(), 0x401000);
    assert_eq!(parse_address("0X1f").unwrap(), 0x1f);
    assert_eq!(parse_address("401000h").unwrap(), 0x401000);
    assert_eq!(parse_address("40_1000h").unwrap(), 0x401000);
    assert_eq!(parse_address("0x40_1000").unwrap(), 0x401000);
    assert_eq!(parse_address("4_096").unwrap(), 4096);
    assert_eq!(parse_address(" 4096 ").unwrap(), 4096);
    assert_eq!(parse_address("0x40_1000").unwrap(), 0x401000);
}

#[test]
fn parse_address_rejects_garbage() {
    let err = parse_address("main").unwrap_err();
    assert!(err.to_string().contains("Invalid address 'main'"), "{err}");
    assert!(parse_address("0x").is_err());
    assert!(parse_address("-5").is_err());
}

#[test]
fn sha256_file_errors_with_context() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("missing.bin");
    let err = sha256_file(&missing).unwrap_err();
    assert!(err.to_string().contains("Failed to open binary for hashing"));
}
