//! Runs the `learngl` binary against a temporary documents directory.

mod common;

use common::write_docs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn docs() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_docs(
        dir.path(),
        &[
            ("intro", "# 소개\n\n`glClear`로 화면을 지웁니다.\n"),
            ("broken", "<Info>\n닫히지 않은 블록\n"),
        ],
    );
    dir
}

fn learngl(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_learngl"))
        .arg("--docs-dir")
        .arg(dir.path())
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run learngl binary")
}

#[test]
fn test_render_prints_html() {
    let dir = docs();
    let output = learngl(&dir, &["render", "intro"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("<h1>소개</h1>\n<div class=\"paragraph\">"));
    assert!(stdout.contains("<span class=\"function-doc-title\">glClear</span>"));
}

#[test]
fn test_render_missing_exits_with_failure() {
    let dir = docs();
    let output = learngl(&dir, &["render", "nowhere"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("문서를 불러올 수 없습니다."));
}

#[test]
fn test_render_compile_error() {
    let dir = docs();
    let output = learngl(&dir, &["render", "broken"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("MDX 파싱 오류: line 1: <Info> is never closed"));
}

#[test]
fn test_check_reports_each_document() {
    let dir = docs();
    let output = learngl(&dir, &["check", "intro", "broken", "nowhere"]);
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "ok     intro");
    assert!(lines[1].starts_with("error  broken: MDX 파싱 오류: "));
    assert_eq!(lines[2], "error  nowhere: 문서를 불러올 수 없습니다.");
    assert_eq!(lines[3], "3 checked, 2 failed");
}

#[test]
fn test_check_all_ok() {
    let dir = docs();
    let output = learngl(&dir, &["check", "intro"]);
    assert!(output.status.success());
}

#[test]
fn test_unsafe_identifier_rejected() {
    let dir = docs();
    let output = learngl(&dir, &["render", "../intro"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_config_file() {
    let dir = docs();
    let output = learngl(&dir, &["--config", "/nonexistent/learngl.json", "functions"]);
    assert_eq!(output.status.code(), Some(1));
}
