//! End-to-end tests for the hilite binary.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn tokenizes_stdin_as_tag_output() {
    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.args(["-", "--language", "cocosql"])
        .write_stdin("SELECT TRIM(name) FROM t -- c");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("# CocoSQL relevance="))
        .stdout(predicate::str::contains("keyword 0..6 \"SELECT\""))
        .stdout(predicate::str::contains("built_in 7..17 \"TRIM(name)\""))
        .stdout(predicate::str::contains("comment 25..29 \"-- c\""));
}

#[test]
fn tokenizes_file_as_json() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("query.sql");
    fs::write(&input, "select 'it''s'").unwrap();

    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.arg(&input).args(["-l", "coco-sql-old", "--format", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["language"], "coco-sql-old");
    assert_eq!(value["tokens"][2]["kind"], "string");
    assert_eq!(value["tokens"][2]["text"], "'it''s'");
}

#[test]
fn config_file_drops_plain_tokens() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[tokenizer]\ninclude_plain = false\n").unwrap();

    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.args(["-", "-l", "cocosql", "--config"])
        .arg(&config)
        .write_stdin("SELECT a");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("keyword 0..6"))
        .stdout(predicate::str::contains("plain").not());
}

#[test]
fn loads_extra_grammar_files() {
    let dir = tempdir().unwrap();
    let grammar = dir.path().join("tiny.yaml");
    fs::write(
        &grammar,
        "name: tiny\nkeywords:\n  keyword: go\nrules:\n  - include: sql_line_comment\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.args(["-", "-l", "tiny", "--grammar"])
        .arg(&grammar)
        .write_stdin("go -- now");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("keyword 0..2 \"go\""))
        .stdout(predicate::str::contains("comment 3..9 \"-- now\""));
}

#[test]
fn strict_mode_flags_unterminated_input() {
    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.args(["-", "-l", "cocosql", "--strict"])
        .write_stdin("SELECT 'open");

    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("incomplete"))
        .stderr(predicate::str::contains("open construct"));
}

#[test]
fn unknown_language_fails() {
    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.args(["-", "-l", "cobol"]).write_stdin("x");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no grammar registered for language 'cobol'"));
}

#[test]
fn unknown_format_fails() {
    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.args(["-", "-l", "cocosql", "-f", "html"]).write_stdin("x");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown format 'html'"));
}

#[test]
fn lists_languages_and_formats() {
    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.arg("--list-languages");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CocoSQL"))
        .stdout(predicate::str::contains("aliases: cocosql-old"));

    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.arg("--list-formats");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("json"))
        .stdout(predicate::str::contains("tag"))
        .stdout(predicate::str::contains("yaml"));
}

#[test]
fn rejects_depth_above_limit() {
    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.args(["-", "-l", "cocosql", "--max-depth", "100000"])
        .write_stdin("$a$ $b$ x");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("tokenizer.max_depth is 100000, the limit is 256"));
}

#[test]
fn rejects_depth_above_limit_from_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("deep.toml");
    fs::write(&config, "[tokenizer]\nmax_depth = 5000\n").unwrap();

    let mut cmd = cargo_bin_cmd!("hilite");
    cmd.args(["-", "-l", "cocosql", "--config"])
        .arg(&config)
        .write_stdin("SELECT 1");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("the limit is 256"));
}
