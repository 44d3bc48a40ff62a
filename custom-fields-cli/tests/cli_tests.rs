//! End-to-end tests for the custom-fields binary against a temporary database.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

struct TestSite {
    dir: TempDir,
}

impl TestSite {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("custom-fields").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("CUSTOM_FIELDS_DATABASE__PATH")
            .env_remove("CUSTOM_FIELDS_DATABASE__TABLE_PREFIX")
            .arg("--database")
            .arg(self.dir.path().join("fields.db"));
        cmd
    }

    /// Run a command with `--json` and parse its output.
    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().arg("--json").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn panel_with_group(&self, panel: &str) -> (i64, i64) {
        let panel_id = self.json(&["panel", "create", panel])["id"].as_i64().unwrap();
        let group_id = self.json(&["group", "create", "--panel", &panel_id.to_string(), "Main"])
            ["id"]
            .as_i64()
            .unwrap();
        (panel_id, group_id)
    }
}

#[test]
fn types_lists_the_registry() {
    let site = TestSite::new();
    site.cmd()
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dropdown List"))
        .stdout(predicate::str::contains("Image (Media)"));

    let types = site.json(&["types"]);
    assert_eq!(types.as_array().unwrap().len(), 16);
}

#[test]
fn create_get_update_delete() {
    let site = TestSite::new();
    let (_, group) = site.panel_with_group("Products");
    let group = group.to_string();

    let id = site.json(&[
        "create", "--group", &group, "--name", "shirt size", "--label", "Size", "--type",
        "dropdown_list", "--option", " S", "--option", "M ", "--default", "M",
    ])["id"]
        .as_i64()
        .unwrap()
        .to_string();

    let field = site.json(&["get", &id]);
    assert_eq!(field["name"], "shirt_size");
    assert_eq!(field["options"]["options"], serde_json::json!(["S", "M"]));
    assert_eq!(field["options"]["default_values"], serde_json::json!(["M"]));

    site.json(&[
        "update", &id, "--group", &group, "--name", "size", "--label", "Size", "--type", "date",
        "--property", "format=d/m/Y",
    ]);
    let field = site.json(&["get", &id]);
    assert_eq!(field["name"], "size");
    assert!(field.get("options").is_none());
    assert_eq!(field["properties"]["format"], "d/m/Y");

    site.cmd().args(["delete", &id]).assert().success();
    site.cmd()
        .args(["get", &id])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("field not found"));
}

#[test]
fn unknown_type_fails() {
    let site = TestSite::new();
    site.cmd()
        .args([
            "create", "--group", "1", "--name", "x", "--label", "X", "--type", "spreadsheet",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown field type"));
}

#[test]
fn values_round_trip_through_the_cli() {
    let site = TestSite::new();
    let (panel, group) = site.panel_with_group("Products");
    site.json(&[
        "create", "--group", &group.to_string(), "--name", "sizes", "--label", "Sizes",
        "--type", "checkbox_list", "--option", "S", "--option", "M",
    ]);
    site.json(&["panel", "assign", "--post", "7", "--panel", &panel.to_string()]);

    site.json(&["value", "set", "--post", "7", "--field", "sizes", "S", "M"]);
    let value = site.json(&["value", "get", "--post", "7", "--field", "sizes", "--multiple"]);
    assert_eq!(value["value"], serde_json::json!(["S", "M"]));

    let data = site.json(&["value", "data", "--post", "7", "--field", "sizes"]);
    assert_eq!(data["data"]["label"], "Sizes");
    assert_eq!(data["data"]["value"], serde_json::json!(["S", "M"]));

    let order = site.json(&["value", "order", "--post", "7", "--field", "sizes"]);
    assert_eq!(order["group_count"], 1);
    assert_eq!(order["groups"][0]["group_index"], 1);
}

#[test]
fn missing_value_prints_empty_line() {
    let site = TestSite::new();
    site.cmd()
        .args(["value", "get", "--post", "1", "--field", "nothing"])
        .assert()
        .success()
        .stdout("\n");
}

#[test]
fn zero_group_index_is_rejected() {
    let site = TestSite::new();
    site.cmd()
        .args(["value", "get", "--post", "1", "--field", "f", "--group-index", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("indexes start at 1"));
}

#[test]
fn group_in_missing_panel_fails() {
    let site = TestSite::new();
    site.cmd()
        .args(["group", "create", "--panel", "99", "Orphans"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("panel not found"));
}

#[test]
fn upload_widget_markup() {
    let site = TestSite::new();
    site.cmd()
        .args(["upload-widget", "magicfields[photo][1][1]", "--type", "image"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "upload_iframe_magicfields_photo_1_1",
        ))
        .stdout(predicate::str::contains("height: 40, width: 380"))
        .stdout(predicate::str::contains("uploadurl('magicfields_photo_1_1','image')"));

    let widget = site.json(&["upload-widget", "song", "--type", "audio", "--canvas"]);
    assert_eq!(widget["id"], "song");
    assert!(widget["src"]
        .as_str()
        .unwrap()
        .ends_with("&canvas=1&inputSize=3"));
}
