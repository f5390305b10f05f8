//! `test`/`[` (spec.md §4.4 "other built-ins"; exit code 2 for "misuse of
//! built-in" per spec.md §6/§7's error taxonomy). A small recursive-descent
//! evaluator over the argv form of the POSIX test expression grammar —
//! the `[[ … ]]` conditional-command form already has its own parsed
//! `ConditionalExpressionNode` (`src/ast/types.rs`) evaluated directly by
//! the executor; this module only handles the untyped-argv `test`/`[`
//! form, grounded on the teacher's `src/commands/test_cmd/`.

use std::path::Path;

use crate::builtins::BuiltinContext;
use crate::errors::ExecError;

pub fn test(_ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    Ok(run(args))
}

pub fn bracket_test(_ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    match args.last() {
        Some(last) if last == "]" => Ok(run(&args[..args.len() - 1])),
        _ => {
            eprintln!("[: missing ']'");
            Ok(2)
        }
    }
}

fn run(args: &[String]) -> i32 {
    let mut p = TestParser { args, pos: 0 };
    match p.parse_or() {
        Some(true) if p.pos == p.args.len() => 0,
        Some(false) if p.pos == p.args.len() => 1,
        _ => 2,
    }
}

struct TestParser<'a> {
    args: &'a [String],
    pos: usize,
}

impl<'a> TestParser<'a> {
    fn peek(&self) -> Option<&str> {
        self.args.get(self.pos).map(String::as_str)
    }

    fn advance(&mut self) -> Option<&str> {
        let v = self.args.get(self.pos).map(String::as_str);
        if v.is_some() {
            self.pos += 1;
        }
        v
    }

    fn parse_or(&mut self) -> Option<bool> {
        let mut left = self.parse_and()?;
        while self.peek() == Some("-o") {
            self.advance();
            let right = self.parse_and()?;
            left = left || right;
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<bool> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some("-a") {
            self.advance();
            let right = self.parse_unary()?;
            left = left && right;
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<bool> {
        if self.peek() == Some("!") {
            self.advance();
            return self.parse_unary().map(|v| !v);
        }
        if self.peek() == Some("(") {
            self.advance();
            let inner = self.parse_or()?;
            if self.peek() == Some(")") {
                self.advance();
            }
            return Some(inner);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<bool> {
        let first = self.advance()?.to_string();
        if let Some(result) = unary_file_test(&first, self) {
            return result;
        }
        // Binary: STR op STR
        if let Some(op) = self.peek() {
            if is_binary_op(op) {
                let op = op.to_string();
                self.advance();
                let right = self.advance().unwrap_or("").to_string();
                return Some(apply_binary(&first, &op, &right));
            }
        }
        Some(!first.is_empty())
    }
}

fn is_binary_op(op: &str) -> bool {
    matches!(
        op,
        "=" | "==" | "!=" | "<" | ">" | "-eq" | "-ne" | "-lt" | "-le" | "-gt" | "-ge"
            | "-nt" | "-ot" | "-ef"
    )
}

fn apply_binary(left: &str, op: &str, right: &str) -> bool {
    match op {
        "=" | "==" => left == right,
        "!=" => left != right,
        "<" => left < right,
        ">" => left > right,
        "-eq" => num(left) == num(right),
        "-ne" => num(left) != num(right),
        "-lt" => num(left) < num(right),
        "-le" => num(left) <= num(right),
        "-gt" => num(left) > num(right),
        "-ge" => num(left) >= num(right),
        "-nt" => mtime(left) > mtime(right),
        "-ot" => mtime(left) < mtime(right),
        "-ef" => same_file(left, right),
        _ => false,
    }
}

fn num(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}

fn mtime(path: &str) -> std::time::SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
}

fn same_file(a: &str, b: &str) -> bool {
    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => {
            use std::os::unix::fs::MetadataExt;
            ma.dev() == mb.dev() && ma.ino() == mb.ino()
        }
        _ => false,
    }
}

/// Unary file-test / string operators (`-z`, `-n`, `-e`, `-f`, `-d`, …).
/// Returns `None` if `op` isn't a recognized unary operator, so the caller
/// falls through to binary/bare-string handling.
fn unary_file_test(op: &str, p: &mut TestParser) -> Option<Option<bool>> {
    let result = match op {
        "-z" => return Some(Some(p.advance().unwrap_or("").is_empty())),
        "-n" => return Some(Some(!p.advance().unwrap_or("").is_empty())),
        "-e" => Path::new(p.advance()?).exists(),
        "-f" => Path::new(p.advance()?).is_file(),
        "-d" => Path::new(p.advance()?).is_dir(),
        "-s" => std::fs::metadata(p.advance()?).map(|m| m.len() > 0).unwrap_or(false),
        "-r" => std::fs::metadata(p.advance()?).is_ok(),
        "-w" => std::fs::metadata(p.advance()?)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false),
        "-x" => is_executable(p.advance()?),
        "-L" | "-h" => std::fs::symlink_metadata(p.advance()?)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false),
        "-p" => std::fs::metadata(p.advance()?)
            .map(|m| {
                use std::os::unix::fs::FileTypeExt;
                m.file_type().is_fifo()
            })
            .unwrap_or(false),
        _ => return None,
    };
    Some(Some(result))
}

fn is_executable(path: &str) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numeric_comparison() {
        assert_eq!(run(&s(&["2", "-gt", "1"])), 0);
        assert_eq!(run(&s(&["1", "-gt", "2"])), 1);
    }

    #[test]
    fn string_equality() {
        assert_eq!(run(&s(&["foo", "=", "foo"])), 0);
        assert_eq!(run(&s(&["foo", "!=", "bar"])), 0);
    }

    #[test]
    fn empty_arg_is_false() {
        assert_eq!(run(&[]), 1);
    }

    #[test]
    fn negation() {
        assert_eq!(run(&s(&["!", "", ])), 0);
    }
}
