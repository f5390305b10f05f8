//! End-to-end tests against the built `rashell` binary: stdin, `-c`,
//! script files, and exit codes observed the way a caller of the real
//! binary would see them.

use std::io::Write;
use std::process::{Command, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_rashell");

#[test]
fn dash_c_runs_a_script_and_returns_its_exit_code() {
    let output = Command::new(BIN).arg("-c").arg("exit 17").output().unwrap();
    assert_eq!(output.status.code(), Some(17));
}

#[test]
fn dash_c_prints_command_output_to_stdout() {
    let output = Command::new(BIN).arg("-c").arg("echo hello").output().unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn reads_a_script_from_stdin_when_no_other_source_is_given() {
    let mut child = Command::new(BIN).stdin(Stdio::piped()).stdout(Stdio::piped()).spawn().unwrap();
    child.stdin.take().unwrap().write_all(b"echo from_stdin\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "from_stdin\n");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn runs_a_script_file_argument() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("script.sh");
    std::fs::write(&path, "echo from_file\nexit 2\n").unwrap();
    let output = Command::new(BIN).arg(path.to_str().unwrap()).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "from_file\n");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn errexit_flag_stops_on_first_failure() {
    let output = Command::new(BIN)
        .arg("-e")
        .arg("-c")
        .arg("false\necho should_not_print")
        .output()
        .unwrap();
    assert!(!String::from_utf8_lossy(&output.stdout).contains("should_not_print"));
    assert_ne!(output.status.code(), Some(0));
}

#[test]
fn script_args_become_positional_parameters() {
    let output = Command::new(BIN)
        .arg("--args")
        .arg("one two")
        .arg("-c")
        .arg("echo $1 $2")
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "one two\n");
}
