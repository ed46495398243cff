//! CLI integration tests.
//!
//! Tests the yaml-sort commands by invoking the binary as a subprocess.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn yaml_sort_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_yaml-sort"))
}

fn run_command(args: &[&str], input: &str) -> (i32, String, String) {
    let bin = yaml_sort_path();
    let mut child = Command::new(&bin)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to spawn yaml-sort at {:?}: {}", bin, e));

    {
        // The binary may exit before reading stdin, e.g. on a bad --schema.
        let stdin = child.stdin.as_mut().unwrap();
        if let Err(e) = stdin.write_all(input.as_bytes()) {
            assert_eq!(e.kind(), ErrorKind::BrokenPipe, "writing stdin: {}", e);
        }
    }

    let output = child.wait_with_output().unwrap();
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Sort Command Tests
// ============================================================================

#[test]
fn test_sort_stdin_to_stdout() {
    let (code, stdout, stderr) = run_command(&["sort"], "b: 1\na: 2\n");
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert_eq!(stdout, "a: 2\nb: 1\n");
}

#[test]
fn test_sort_nested_stdin() {
    let (code, stdout, _) = run_command(&["sort"], "z:\n  b: 1\n  a: 2\na: 3\n");
    assert_eq!(code, 0);
    assert_eq!(stdout, "a: 3\nz:\n  a: 2\n  b: 1\n");
}

#[test]
fn test_sort_empty_stdin() {
    let (code, stdout, stderr) = run_command(&["sort"], "");
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(
        stderr.contains("is empty. YAML loader cannot load empty content"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_sort_parse_error() {
    let (code, stdout, stderr) = run_command(&["sort", "--filename", "bad.yml"], "a: [1, 2\n");
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("bad.yml"), "stderr: {}", stderr);
}

#[test]
fn test_sort_rewrites_files_in_place() {
    let dir = TempDir::new().unwrap();
    let unsorted = write_file(dir.path(), "a.yml", "b: 1\na: 2\n");
    let sorted = write_file(dir.path(), "b.yml", "a: 1\n");

    let (code, stdout, _) = run_command(
        &["sort", unsorted.to_str().unwrap(), sorted.to_str().unwrap()],
        "",
    );
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert_eq!(fs::read_to_string(&unsorted).unwrap(), "a: 2\nb: 1\n");
    assert_eq!(fs::read_to_string(&sorted).unwrap(), "a: 1\n");
}

#[test]
fn test_sort_continues_after_failure() {
    let dir = TempDir::new().unwrap();
    let empty = write_file(dir.path(), "empty.yml", "");
    let good = write_file(dir.path(), "good.yml", "y: 1\nx: 2\n");

    let (code, _, stderr) = run_command(
        &["sort", empty.to_str().unwrap(), good.to_str().unwrap()],
        "",
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("empty.yml"), "stderr: {}", stderr);
    assert_eq!(fs::read_to_string(&good).unwrap(), "x: 2\ny: 1\n");
    assert_eq!(fs::read_to_string(&empty).unwrap(), "");
}

#[test]
fn test_sort_stdout_flag_leaves_files() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "a.yml", "b: 1\na: 2\n");

    let (code, stdout, _) = run_command(&["sort", "--stdout", path.to_str().unwrap()], "");
    assert_eq!(code, 0);
    assert_eq!(stdout, "a: 2\nb: 1\n");
    assert_eq!(fs::read_to_string(&path).unwrap(), "b: 1\na: 2\n");
}

#[test]
fn test_sort_unsafe_allows_js_types() {
    let input = "r: !!js/regexp /a+/\n";
    let (code, _, _) = run_command(&["sort"], input);
    assert_eq!(code, 1);

    let (code, stdout, _) = run_command(&["sort", "--unsafe"], input);
    assert_eq!(code, 0);
    assert_eq!(stdout, "r: !<tag:yaml.org,2002:js/regexp> /a+/\n");
}

#[test]
fn test_sort_schema_flag() {
    let (code, stdout, _) = run_command(&["sort", "--schema", "FAILSAFE_SCHEMA"], "b: 1\na: true\n");
    assert_eq!(code, 0);
    assert_eq!(stdout, "a: true\nb: 1\n");

    let (code, stdout, _) = run_command(&["sort"], "b: '1'\na: 'true'\n");
    assert_eq!(code, 0);
    assert_eq!(stdout, "a: 'true'\nb: '1'\n");
}

#[test]
fn test_sort_line_width() {
    let (code, stdout, _) = run_command(
        &["sort", "--line-width", "10"],
        "k: alpha beta gamma delta\n",
    );
    assert_eq!(code, 0);
    assert_eq!(stdout, "k: >-\n  alpha beta\n  gamma\n  delta\n");
}

// ============================================================================
// Check Command Tests
// ============================================================================

#[test]
fn test_check_sorted_stdin() {
    let (code, stdout, _) = run_command(&["check"], "a: 2\nb: 1\n");
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn test_check_unsorted_stdin() {
    let (code, stdout, stderr) = run_command(&["check", "--filename", "x.yml"], "b: 1\na: 2\n");
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("File: x.yml must be processed"), "stderr: {}", stderr);
}

#[test]
fn test_check_never_writes_files() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "a.yml", "b: 1\na: 2\n");

    let (code, _, stderr) = run_command(&["check", path.to_str().unwrap()], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("must be processed"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "b: 1\na: 2\n");
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_invalid_schema_exit_code() {
    let (code, stdout, stderr) = run_command(&["sort", "--schema", "not_a_real_schema"], "a: 1\n");
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(
        stderr.contains("Schema not_a_real_schema is not valid"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_invalid_schema_ignores_unread_stdin() {
    // Larger than a pipe buffer, so the write outlives the process.
    let input = "key: value\n".repeat(100_000);
    let (code, stdout, stderr) = run_command(&["check", "--schema", "bogus"], &input);
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Schema bogus is not valid"), "stderr: {}", stderr);
}

#[test]
fn test_schemas_command() {
    let (code, stdout, _) = run_command(&["schemas"], "");
    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "failsafe_schema\njson_schema\ncore_schema\ndefault_safe_schema\ndefault_full_schema\n"
    );
}

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run_command(&["--version"], "");
    assert_eq!(code, 0);
    assert!(stdout.contains("yaml-sort"));
}
