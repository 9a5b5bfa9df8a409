use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

use clip_rename_core::db::{load_project_config, ProjectLayout};
use clip_rename_core::services::rename::RenameMethod;

/// Project with one binary (`fw`) whose namespace holds two seeded names.
fn seeded_project(root: &Path) {
    cargo_bin_cmd!("clip-rename")
        .arg("init-project")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("RenameProject")
        .assert()
        .success();

    fs::write(root.join("fw.bin"), b"firmware").unwrap();
    cargo_bin_cmd!("clip-rename")
        .args(["add-binary", "--path", "fw.bin", "--name", "fw", "--skip-hash", "--root"])
        .arg(root)
        .assert()
        .success();

    fs::write(
        root.join("names.yaml"),
        "- address: \"0x100\"\n  name: sub_100\n- address: 512\n  name: sub_200\n",
    )
    .unwrap();
    cargo_bin_cmd!("clip-rename")
        .args(["import-symbols", "--binary", "fw", "--from-file", "names.yaml", "--root"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted: 2"));
}

fn write_clipboard(root: &Path, text: &str) -> std::path::PathBuf {
    let path = root.join("clipboard.txt");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn rename_requires_a_configured_method() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    seeded_project(root);
    let clip = write_clipboard(root, "login.cgi\n");

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0x100", "--root"])
        .arg(root)
        .env("CLIP_RENAME_FAKE_CLIPBOARD", &clip)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No rename method selected"));
}

#[test]
fn address_renames_use_clipboard_and_avoid_collisions() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    seeded_project(root);
    let clip = write_clipboard(root, "login.cgi\r\n");

    cargo_bin_cmd!("clip-rename")
        .args(["configure", "--method", "address", "--root"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Method: address-based"));

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0x100", "--root"])
        .arg(root)
        .env("CLIP_RENAME_FAKE_CLIPBOARD", &clip)
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 0x100 to loginCGI"))
        .stdout(predicate::str::contains("Previous name: sub_100"));

    let output = cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "512", "--json", "--root"])
        .arg(root)
        .env("CLIP_RENAME_FAKE_CLIPBOARD", &clip)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let outcome: serde_json::Value = serde_json::from_slice(&output).expect("rename json");
    assert_eq!(outcome["address"], 512);
    assert_eq!(outcome["new_name"], "loginCGI_1");
    assert_eq!(outcome["collided"], true);
    assert_eq!(outcome["clipboard_text"], "login.cgi");

    let output = cargo_bin_cmd!("clip-rename")
        .args(["list-symbols", "--binary", "fw", "--json", "--root"])
        .arg(root)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let symbols: serde_json::Value = serde_json::from_slice(&output).expect("symbols json");
    assert_eq!(symbols[0]["name"], "loginCGI");
    assert_eq!(symbols[0]["kind"], "user");
    assert_eq!(symbols[1]["name"], "loginCGI_1");

    let output = cargo_bin_cmd!("clip-rename")
        .args(["history", "--json", "--root"])
        .arg(root)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let history: serde_json::Value = serde_json::from_slice(&output).expect("history json");
    let entries = history.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["old_name"], "sub_100");
    assert_eq!(entries[0]["new_name"], "loginCGI");
    assert_eq!(entries[0]["method"], "address");
    assert_eq!(entries[1]["new_name"], "loginCGI_1");
}

#[test]
fn empty_clipboard_is_reported_and_nothing_changes() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    seeded_project(root);
    let clip = write_clipboard(root, "\n");

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0x100", "--method", "address", "--root"])
        .arg(root)
        .env("CLIP_RENAME_FAKE_CLIPBOARD", &clip)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No name copied. Please copy a function name first."));

    cargo_bin_cmd!("clip-rename")
        .args(["list-symbols", "--root"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("sub_100"));
}

#[test]
fn name_flag_replaces_clipboard() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    seeded_project(root);

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0x300", "--method", "address", "--name", "/admin/set.asp"])
        .arg("--root")
        .arg(root)
        .env("CLIP_RENAME_FAKE_CLIPBOARD", root.join("does-not-exist"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 0x300 to _admin_setASP"));
}

#[test]
fn operand_rename_decodes_the_binary() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    cargo_bin_cmd!("clip-rename").arg("init-project").arg("--root").arg(root).assert().success();

    // mov rax, 0x1234 ; ret
    let mut code = vec![0x48u8, 0xB8];
    code.extend_from_slice(&0x1234u64.to_le_bytes());
    code.push(0xC3);
    fs::write(root.join("blob.bin"), code).unwrap();
    cargo_bin_cmd!("clip-rename")
        .args(["add-binary", "--path", "blob.bin", "--arch", "x86_64", "--root"])
        .arg(root)
        .assert()
        .success();

    cargo_bin_cmd!("clip-rename")
        .args(["configure", "--method", "operand", "--operand-index", "", "--root"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("operand-based (operand 1)"));

    let clip = write_clipboard(root, "status.htm");
    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0", "--root"])
        .arg(root)
        .env("CLIP_RENAME_FAKE_CLIPBOARD", &clip)
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 0x1234 to statusHTM"));

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0", "--operand-index", "0", "--root"])
        .arg(root)
        .env("CLIP_RENAME_FAKE_CLIPBOARD", &clip)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No valid pointer found in the instruction at operand index 0.",
        ));
}

#[test]
fn configure_keeps_previous_index_on_invalid_input_and_persists() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    seeded_project(root);

    cargo_bin_cmd!("clip-rename")
        .args(["configure", "--method", "operand", "--operand-index", "2", "--root"])
        .arg(root)
        .assert()
        .success();
    cargo_bin_cmd!("clip-rename")
        .args(["configure", "--method", "operand", "--operand-index", "two", "--root"])
        .arg(root)
        .assert()
        .success();
    cargo_bin_cmd!("clip-rename")
        .args(["configure", "--method", "cancel", "--hotkey", "Ctrl+Alt+V", "--root"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Operation cancelled"));

    let config = load_project_config(&ProjectLayout::new(root)).expect("config");
    assert_eq!(config.rename.method, Some(RenameMethod::OperandBased { operand_index: 2 }));
    assert_eq!(config.hotkey, "Ctrl+Alt+V");

    let output = cargo_bin_cmd!("clip-rename")
        .args(["project-info", "--json", "--root"])
        .arg(root)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let info: serde_json::Value = serde_json::from_slice(&output).expect("project-info json");
    assert_eq!(info["rename_method"]["kind"], "operand_based");
    assert_eq!(info["rename_method"]["operand_index"], 2);
    assert_eq!(info["binaries"][0]["name"], "fw");
    assert_eq!(info["binaries"][0]["symbols"], 2);
}

#[test]
fn sanitize_previews_outside_a_project() {
    let dir = tempdir().expect("tempdir");
    cargo_bin_cmd!("clip-rename")
        .args(["sanitize", "index.HTML", "--root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout("indexHTML\n");
}

#[test]
fn list_sources_reports_object_source() {
    let output = cargo_bin_cmd!("clip-rename")
        .args(["list-sources", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let sources: serde_json::Value = serde_json::from_slice(&output).expect("sources json");
    assert!(
        sources.as_array().expect("array").iter().any(|s| s["name"] == "object"),
        "expected object source in {sources}"
    );
}

#[cfg(unix)]
#[test]
fn paste_command_override_feeds_the_rename() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    seeded_project(root);

    cargo_bin_cmd!("clip-rename")
        .args(["configure", "--method", "address", "--root"])
        .arg(root)
        .assert()
        .success();

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0x100", "--root"])
        .arg(root)
        .env_remove("CLIP_RENAME_FAKE_CLIPBOARD")
        .env("CLIP_RENAME_CLIPBOARD_CMD", "echo index.asp")
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 0x100 to indexASP"));
}

#[test]
fn operand_index_is_rejected_for_address_renames() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    seeded_project(root);

    cargo_bin_cmd!("clip-rename")
        .args(["configure", "--method", "address", "--root"])
        .arg(root)
        .assert()
        .success();

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0x100", "--operand-index", "2", "--name", "a.cgi", "--root"])
        .arg(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--operand-index requires --method operand"));

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0x100", "--method", "address", "--operand-index", "2"])
        .args(["--name", "a.cgi", "--root"])
        .arg(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--operand-index requires --method operand"));

    // Nothing was renamed.
    cargo_bin_cmd!("clip-rename")
        .args(["list-symbols", "--root"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("sub_100"));
}

#[test]
fn rename_is_kept_when_history_cannot_be_recorded() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    seeded_project(root);

    cargo_bin_cmd!("clip-rename")
        .args(["configure", "--method", "address", "--root"])
        .arg(root)
        .assert()
        .success();

    let conn = rusqlite::Connection::open(root.join(".cliprename").join("project.db")).unwrap();
    conn.execute_batch("DROP TABLE rename_history;").unwrap();
    drop(conn);

    cargo_bin_cmd!("clip-rename")
        .args(["rename", "--at", "0x100", "--name", "login.cgi", "--root"])
        .arg(root)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 0x100 to loginCGI"))
        .stderr(predicate::str::contains("rename history not recorded"));

    cargo_bin_cmd!("clip-rename")
        .args(["list-symbols", "--root"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("loginCGI"));
}
