//! Library-level integration tests: real forked processes, real files,
//! driven through `Executor`/`Shell` directly rather than the CLI binary.

use rashell::{Executor, Shell};
use std::io::Write;

fn run(source: &str) -> (i32, Shell) {
    let mut shell = Shell::new("test");
    let mut executor = Executor::new();
    let status = executor.execute(source, &mut shell);
    (status, shell)
}

#[test]
fn and_or_short_circuits() {
    let (status, _) = run("true && true && exit 3");
    assert_eq!(status, 3);

    let (status, _) = run("false && exit 9; exit 4");
    assert_eq!(status, 4);
}

#[test]
fn pipeline_status_is_last_stage_by_default() {
    let (status, _) = run("false | true");
    assert_eq!(status, 0);
}

#[test]
fn pipefail_reports_rightmost_nonzero() {
    // Rightmost-nonzero among [false, true, false, true] is the third stage.
    let (status, _) = run("set -o pipefail; false | true | false | true");
    assert_eq!(status, 1);

    // Rightmost-nonzero among [true, false, true] is the second stage.
    let (status, _) = run("set -o pipefail; true | false | true");
    assert_eq!(status, 1);

    // Without pipefail, only the last stage's status matters.
    let (status, _) = run("true | false | true");
    assert_eq!(status, 0);
}

#[test]
fn redirection_writes_to_a_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let script = format!("echo hello > {}", path.display());
    let (status, _) = run(&script);
    assert_eq!(status, 0);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "hello\n");
}

#[test]
fn append_redirection_does_not_truncate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let script = format!("echo one > {p}\necho two >> {p}", p = path.display());
    let (status, _) = run(&script);
    assert_eq!(status, 0);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "one\ntwo\n");
}

#[test]
fn heredoc_body_reaches_the_command() {
    let (status, _) = run("read line <<EOF\nhello there\nEOF\n[ \"$line\" = \"hello there\" ]");
    assert_eq!(status, 0);
}

#[test]
fn noclobber_blocks_overwrite_of_an_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    std::fs::write(&path, "preexisting\n").unwrap();
    let script = format!("set -o noclobber; echo new > {}", path.display());
    let (status, _) = run(&script);
    assert_ne!(status, 0);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "preexisting\n");
}

#[test]
fn for_loop_sums_words() {
    let (status, shell) = run("total=0; for n in 1 2 3 4; do total=$((total + n)); done; exit $total");
    assert_eq!(status, 10);
    let _ = shell;
}

#[test]
fn break_and_continue_respect_levels() {
    let script = r#"
        count=0
        for i in 1 2 3; do
            for j in 1 2 3; do
                if [ "$j" = 2 ]; then
                    continue 2
                fi
                count=$((count + 1))
            done
        done
        exit $count
    "#;
    let (status, _) = run(script);
    assert_eq!(status, 3);
}

#[test]
fn while_loop_with_pipeline_condition() {
    let (status, _) = run("i=0; while [ $i -lt 5 ]; do i=$((i + 1)); done; exit $i");
    assert_eq!(status, 5);
}

#[test]
fn case_statement_matches_glob_patterns() {
    let script = r#"
        match=no
        case "hello.txt" in
            *.txt) match=yes ;;
            *) match=no ;;
        esac
        [ "$match" = "yes" ]
    "#;
    let (status, _) = run(script);
    assert_eq!(status, 0);
}

#[test]
fn function_call_sees_its_own_positional_params() {
    let script = r#"
        greet() {
            echo "hi $1"
            return 7
        }
        greet world
        exit $?
    "#;
    let (status, _) = run(script);
    assert_eq!(status, 7);
}

#[test]
fn command_substitution_captures_stdout() {
    let (status, shell) = run("x=$(echo captured); [ \"$x\" = captured ]");
    assert_eq!(status, 0);
    let _ = shell;
}

#[test]
fn conditional_command_string_equality_uses_glob_semantics() {
    let (status, _) = run(r#"[[ "hello.txt" == *.txt ]]"#);
    assert_eq!(status, 0);
    let (status, _) = run(r#"[[ "hello.txt" == *.rs ]]"#);
    assert_eq!(status, 1);
}

#[test]
fn conditional_command_numeric_comparison() {
    let (status, _) = run("[[ 10 -gt 2 ]]");
    assert_eq!(status, 0);
}

#[test]
fn conditional_command_file_existence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("present.txt");
    std::fs::write(&path, "x").unwrap();
    let script = format!("[[ -f {} ]]", path.display());
    let (status, _) = run(&script);
    assert_eq!(status, 0);

    let missing = dir.path().join("absent.txt");
    let script = format!("[[ -f {} ]]", missing.display());
    let (status, _) = run(&script);
    assert_eq!(status, 1);
}

#[test]
fn errexit_stops_the_script_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("reached.txt");
    let script = format!(
        "set -e\nfalse\ntouch {}",
        marker.display()
    );
    run(&script);
    assert!(!marker.exists());
}

#[test]
fn errexit_is_suppressed_in_if_conditions() {
    let script = "set -e\nif false; then exit 1; fi\nexit 42";
    let (status, _) = run(script);
    assert_eq!(status, 42);
}

#[test]
fn source_runs_a_script_file_in_the_current_shell() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lib.sh");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "FOO=from_source").unwrap();
    drop(f);

    let script = format!(". {}\n[ \"$FOO\" = from_source ]", path.display());
    let (status, _) = run(&script);
    assert_eq!(status, 0);
}

#[test]
fn background_job_is_registered_in_the_job_table() {
    let (status, shell) = run("sleep 0 &\ntrue");
    assert_eq!(status, 0);
    assert!(shell.last_bg_pid.is_some());
}

#[test]
fn break_unwinds_a_single_loop_level() {
    let script = r#"
        count=0
        for i in 1 2 3; do
            count=$((count + 1))
            if [ "$i" = 2 ]; then
                break
            fi
        done
        exit $count
    "#;
    let (status, _) = run(script);
    assert_eq!(status, 2);
}

#[test]
fn continue_skips_the_rest_of_the_loop_body() {
    let script = r#"
        count=0
        for i in 1 2 3; do
            if [ "$i" = 2 ]; then
                continue
            fi
            count=$((count + 1))
        done
        exit $count
    "#;
    let (status, _) = run(script);
    assert_eq!(status, 2);
}

#[test]
fn backgrounding_a_builtin_is_rejected() {
    let (status, _) = run("cd /tmp &");
    assert_eq!(status, 1);
}

#[test]
fn nounset_errors_on_an_unset_variable() {
    let (status, _) = run("set -o nounset; echo $undefined_var");
    assert_eq!(status, 1);

    // The `:-`/`:=`/`:?`/`:+` forms define their own unset handling and
    // stay exempt from nounset.
    let (status, _) = run("set -o nounset; [ \"${undefined_var:-fallback}\" = fallback ]");
    assert_eq!(status, 0);
}

#[test]
fn fd_variable_redirection_binds_the_allocated_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fdout.txt");
    let script = format!("exec {{myfd}}> {p}\necho via_fd >&$myfd", p = path.display());
    let (status, _) = run(&script);
    assert_eq!(status, 0);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "via_fd\n");
}
