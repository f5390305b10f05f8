//! `read` (spec.md §4.4 "other built-ins"; spec.md §5 names it as a
//! stdin-blocking suspension point). Grounded on the teacher's
//! `src/interpreter/builtins/read_cmd.rs` option set (`-r`, `-p`, `-a`),
//! narrowed to scalar targets since `Shell` has no array variables.

use std::io::BufRead;

use crate::builtins::BuiltinContext;
use crate::errors::ExecError;

pub fn read(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let mut raw = false;
    let mut prompt: Option<String> = None;
    let mut names = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-r" => raw = true,
            "-p" => {
                i += 1;
                prompt = args.get(i).cloned();
            }
            "-s" | "-n" | "-t" => {
                // Accepted for compatibility; `-n`/`-t` take an argument
                // this synchronous implementation has no use for (no
                // non-blocking read, no terminal echo suppression).
                if args[i] == "-n" || args[i] == "-t" {
                    i += 1;
                }
            }
            name => names.push(name.to_string()),
        }
        i += 1;
    }
    if names.is_empty() {
        names.push("REPLY".to_string());
    }

    if let Some(p) = &prompt {
        eprint!("{}", p);
    }

    let mut line = String::new();
    let stdin = std::io::stdin();
    let mut lock = stdin.lock();
    let bytes_read = loop {
        match read_logical_line(&mut lock, &mut line, raw) {
            Ok(n) => break n,
            Err(_) => break 0,
        }
    };
    if bytes_read == 0 && line.is_empty() {
        return Ok(1); // EOF
    }

    let ifs = ctx.shell.get_var("IFS").unwrap_or(" \t\n").to_string();
    let fields = split_on_ifs(&line, &ifs, names.len());

    for (idx, name) in names.iter().enumerate() {
        let value = fields.get(idx).cloned().unwrap_or_default();
        ctx.shell.set_var(name, value);
    }
    Ok(0)
}

/// Reads one line, honoring backslash-newline continuation unless `raw`.
fn read_logical_line(r: &mut impl BufRead, out: &mut String, raw: bool) -> std::io::Result<usize> {
    let mut total = 0;
    loop {
        let mut chunk = String::new();
        let n = r.read_line(&mut chunk)?;
        total += n;
        if n == 0 {
            return Ok(total);
        }
        let had_newline = chunk.ends_with('\n');
        if had_newline {
            chunk.pop();
        }
        if !raw && chunk.ends_with('\\') {
            chunk.pop();
            out.push_str(&chunk);
            if had_newline {
                continue;
            }
            return Ok(total);
        }
        out.push_str(&chunk);
        return Ok(total);
    }
}

fn split_on_ifs(line: &str, ifs: &str, max_fields: usize) -> Vec<String> {
    if ifs.is_empty() {
        return vec![line.to_string()];
    }
    let is_ifs = |c: char| ifs.contains(c);
    let trimmed = line.trim_matches(is_ifs);
    if max_fields <= 1 {
        return vec![trimmed.to_string()];
    }
    let mut fields = Vec::new();
    let mut rest = trimmed;
    while fields.len() + 1 < max_fields {
        match rest.find(is_ifs) {
            Some(pos) => {
                fields.push(rest[..pos].to_string());
                rest = rest[pos..].trim_start_matches(is_ifs);
            }
            None => break,
        }
    }
    fields.push(rest.to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_remaining_into_last_field() {
        let fields = split_on_ifs("a b c d", " ", 2);
        assert_eq!(fields, vec!["a".to_string(), "b c d".to_string()]);
    }

    #[test]
    fn single_field_keeps_whole_line() {
        let fields = split_on_ifs("  a b  ", " ", 1);
        assert_eq!(fields, vec!["a b".to_string()]);
    }
}
