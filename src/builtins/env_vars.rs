//! `export`/`unset`/`readonly`/`local`/`declare` (spec.md §4.4 "other
//! built-ins"). Grounded on the teacher's
//! `src/interpreter/builtins/export_cmd.rs` and `declare_cmd.rs`, scoped
//! down to the scalar-variable subset this crate's `Shell` models (no
//! associative/indexed array declarations — the teacher's fuller
//! `declare_array_parsing.rs` machinery has no counterpart here since
//! `Shell::env`/`locals` are `HashMap<String, String>`, not arrays; see
//! DESIGN.md).

use crate::builtins::BuiltinContext;
use crate::errors::{ExecError, ShellError};

fn split_assignment(arg: &str) -> Option<(&str, &str)> {
    let eq = arg.find('=')?;
    let name = &arg[..eq];
    if name.is_empty() || !name.chars().next().unwrap().is_ascii_alphabetic() && name.chars().next() != Some('_') {
        return None;
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, &arg[eq + 1..]))
}

pub fn export(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.is_empty() || args == ["-p"] {
        let mut names: Vec<&String> = ctx.shell.exported.iter().collect();
        names.sort();
        for name in names {
            if let Some(value) = ctx.shell.env.get(name) {
                println!("export {}=\"{}\"", name, value);
            }
        }
        return Ok(0);
    }
    for arg in args {
        if arg == "-p" {
            continue;
        }
        if let Some((name, value)) = split_assignment(arg) {
            ctx.shell.set_var(name, value);
            ctx.shell.export(name);
        } else {
            if ctx.shell.get_var(arg).is_none() {
                ctx.shell.env.entry(arg.clone()).or_insert_with(String::new);
            }
            ctx.shell.export(arg);
        }
    }
    Ok(0)
}

pub fn unset(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let mut function_mode = false;
    for arg in args {
        match arg.as_str() {
            "-v" => continue,
            "-f" => function_mode = true,
            _ => {
                if function_mode {
                    ctx.shell.functions.remove(arg);
                } else if ctx.shell.readonly.contains(arg) {
                    eprintln!("{}: unset: {}: cannot unset: readonly variable", ctx.shell.shell_name, arg);
                    return Ok(1);
                } else {
                    ctx.shell.unset_var(arg);
                }
            }
        }
    }
    Ok(0)
}

pub fn readonly(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.is_empty() {
        let mut names: Vec<&String> = ctx.shell.readonly.iter().collect();
        names.sort();
        for name in names {
            if let Some(value) = ctx.shell.get_var(name) {
                println!("readonly {}=\"{}\"", name, value);
            }
        }
        return Ok(0);
    }
    for arg in args {
        if let Some((name, value)) = split_assignment(arg) {
            ctx.shell.set_var(name, value);
            ctx.shell.readonly.insert(name.to_string());
        } else {
            ctx.shell.readonly.insert(arg.clone());
        }
    }
    Ok(0)
}

/// `local name[=value]…`: valid only inside a function body; this crate's
/// `Shell` doesn't keep a separate per-function scope stack (spec.md §3
/// doesn't name one beyond the positional-parameter stack), so `local`
/// writes into `Shell::locals` — visible to the current process but never
/// exported to children, matching bash's "local vars aren't exported
/// unless separately `export`ed" behavior.
pub fn local(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if ctx.shell.in_function_depth == 0 {
        return Err(ShellError::BuiltinUsage("local: can only be used in a function".to_string()).into());
    }
    for arg in args {
        if let Some((name, value)) = split_assignment(arg) {
            ctx.shell.locals.insert(name.to_string(), value.to_string());
        } else {
            ctx.shell.locals.entry(arg.clone()).or_insert_with(String::new);
        }
    }
    Ok(0)
}

/// `declare`/`typeset [-x|-r|-i] name[=value]…`: the scalar subset (`-x`
/// export, `-r` readonly); `-a`/`-A` (array/assoc-array) are accepted and
/// parsed but produce a scalar binding, since `Shell` has no array type
/// (documented in DESIGN.md).
pub fn declare(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let mut want_export = false;
    let mut want_readonly = false;
    let mut print_only = false;
    for arg in args {
        match arg.as_str() {
            "-x" => want_export = true,
            "-r" => want_readonly = true,
            "-p" => print_only = true,
            "-a" | "-A" | "-i" | "-g" => {}
            _ if arg.starts_with('-') => {}
            _ => {
                if print_only {
                    if let Some(value) = ctx.shell.get_var(arg) {
                        println!("declare -- {}=\"{}\"", arg, value);
                    }
                    continue;
                }
                if let Some((name, value)) = split_assignment(arg) {
                    ctx.shell.set_var(name, value);
                    if want_export {
                        ctx.shell.export(name);
                    }
                    if want_readonly {
                        ctx.shell.readonly.insert(name.to_string());
                    }
                } else {
                    ctx.shell.env.entry(arg.clone()).or_insert_with(String::new);
                    if want_export {
                        ctx.shell.export(arg);
                    }
                    if want_readonly {
                        ctx.shell.readonly.insert(arg.clone());
                    }
                }
            }
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_assignment_rejects_bad_names() {
        assert!(split_assignment("=foo").is_none());
        assert!(split_assignment("1abc=foo").is_none());
        assert_eq!(split_assignment("FOO=bar"), Some(("FOO", "bar")));
    }
}
