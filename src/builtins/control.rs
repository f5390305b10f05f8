//! The control built-ins the core itself owns (spec.md §4.4): `exit`,
//! `return`, `.`/`source`, `eval`, `exec`, `true`/`false`/`:`, plus
//! `command`/`builtin` (named in spec.md §4.4 step 3 as the mechanism for
//! bypassing function/alias resolution).
//!
//! `exit`/`return` don't compute a status and hand it back through the
//! normal `Ok(i32)` channel — they unwind the executor's recursive walk by
//! returning the `ExitError`/`ReturnError` control-flow errors from
//! `crate::errors`, exactly the teacher's `ControlFlowError` shape
//! (SPEC_FULL.md §4.7.1).

use crate::builtins::BuiltinContext;
use crate::errors::{BreakError, ContinueError, ExecError, ExitError, ReturnError, ShellError};

fn parse_status(args: &[String], default: i32) -> Result<i32, ExecError> {
    match args.first() {
        None => Ok(default),
        Some(s) => s
            .parse::<i32>()
            .map(|n| n & 0xff)
            .map_err(|_| ShellError::BuiltinUsage(format!("exit: {}: numeric argument required", s)).into()),
    }
}

/// `exit [n]` (spec.md §4.4): terminates the shell with `n` (default: last
/// exit code).
pub fn exit(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let status = parse_status(args, ctx.shell.last_exit_code)?;
    Err(ExitError { status }.into())
}

/// `return [n]` (spec.md §4.4): returns from the current function with
/// `n`; the executor treats a `ReturnError` surfacing at top level (no
/// enclosing function/source frame) identically to `exit`.
pub fn return_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let status = parse_status(args, ctx.shell.last_exit_code)?;
    Err(ReturnError { status }.into())
}

/// `.`/`source FILE [args…]` (spec.md §4.4): tokenize, parse, and execute
/// the file's contents in the current shell context (no subshell); `args`
/// become the positional parameters for the duration.
pub fn dot_source(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let path = args
        .first()
        .ok_or_else(|| ShellError::BuiltinUsage(".: filename argument required".to_string()))?;

    let resolved = resolve_source_path(path, ctx.shell)
        .ok_or_else(|| ShellError::NoSuchFile(path.clone()))?;
    let contents = std::fs::read_to_string(&resolved)
        .map_err(|e| ShellError::NoSuchFile(format!("{}: {}", path, e)))?;
    let script = crate::parser::parse(&contents)
        .map_err(|e| ShellError::Other(format!("{}: {}", path, e)))?;

    let pushed = args.len() > 1;
    if pushed {
        ctx.shell
            .positional_stack
            .push(crate::shell::PositionalParams { params: args[1..].to_vec() });
    }
    let result = ctx.invoker.run_script(&script, ctx.shell);
    if pushed {
        ctx.shell.positional_stack.pop();
    }
    result
}

fn resolve_source_path(path: &str, shell: &crate::shell::Shell) -> Option<std::path::PathBuf> {
    use std::path::Path;
    if path.contains('/') {
        let p = Path::new(path);
        return if p.exists() { Some(p.to_path_buf()) } else { None };
    }
    let cwd_candidate = shell.cwd().join(path);
    if cwd_candidate.exists() {
        return Some(cwd_candidate);
    }
    let path_var = shell.get_var("PATH").unwrap_or("").to_string();
    for dir in path_var.split(':') {
        if dir.is_empty() {
            continue;
        }
        let candidate = Path::new(dir).join(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// `eval args…` (spec.md §4.4): concatenate args with single-space
/// separators and re-submit to the top-level execute entry point.
pub fn eval(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.is_empty() {
        return Ok(0);
    }
    let joined = args.join(" ");
    ctx.invoker.run_source(&joined, ctx.shell)
}

/// `exec [cmd args…]` (spec.md §4.4). The "apply redirections to the shell
/// itself and return 0" half of this built-in happens in the executor
/// *before* it reaches the builtin dispatch table at all (spec.md's
/// point: a generic "fork for builtins with redirections" rule would
/// defeat `exec`'s entire purpose of making them stick). This stub only
/// exists so `has("exec")`/`type exec` answer correctly; it is never
/// actually invoked with a non-empty argv — `Executor::dispatch_command`
/// intercepts `exec` by name first.
pub fn exec_cmd(_ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.is_empty() {
        Ok(0)
    } else {
        Err(ShellError::Other(
            "exec: internal error: should have been intercepted by the executor".to_string(),
        )
        .into())
    }
}

pub fn true_cmd(_ctx: &mut BuiltinContext, _args: &[String]) -> Result<i32, ExecError> {
    Ok(0)
}

pub fn false_cmd(_ctx: &mut BuiltinContext, _args: &[String]) -> Result<i32, ExecError> {
    Ok(1)
}

/// `command [-v|-V] name args…` (spec.md §4.4 "other built-ins"):
/// dispatch bypassing function resolution; `-v` prints the resolved path
/// or builtin/alias name instead of running it.
pub fn command_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let mut args = args.iter();
    let Some(first) = args.next() else { return Ok(0) };

    if first == "-v" || first == "-V" {
        let Some(name) = args.next() else {
            return Err(ShellError::BuiltinUsage("command: -v: option requires an argument".to_string()).into());
        };
        if let Some(alias) = ctx.shell.aliases.get(name) {
            println!("alias {}='{}'", name, alias);
            return Ok(0);
        }
        if crate::builtins::BuiltinRegistry::new().has(name) {
            println!("{}", name);
            return Ok(0);
        }
        return match ctx.invoker.resolve_path(name, ctx.shell) {
            Some(p) => {
                println!("{}", p.display());
                Ok(0)
            }
            None => Ok(1),
        };
    }

    let rest: Vec<String> = args.cloned().collect();
    ctx.invoker.dispatch_command(first, &rest, ctx.shell, true)
}

/// `builtin name args…` (spec.md §4.4): force builtin lookup, bypassing
/// both function and external resolution.
pub fn builtin_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let Some(name) = args.first() else { return Ok(0) };
    let rest = args[1..].to_vec();
    ctx.invoker.dispatch_command(name, &rest, ctx.shell, true)
}

fn parse_levels(name: &str, args: &[String]) -> Result<u32, ExecError> {
    match args.first() {
        None => Ok(1),
        Some(s) => {
            let n = s
                .parse::<i64>()
                .map_err(|_| ShellError::BuiltinUsage(format!("{}: {}: numeric argument required", name, s)))?;
            if n < 1 {
                Ok(1)
            } else {
                Ok(n as u32)
            }
        }
    }
}

/// `break [n]` (spec.md GLOSSARY/§3 `Break`): unwinds out of `n` enclosing
/// loops, raised as a control-flow error exactly like `exit`/`return`
/// above and caught by `run_for`/`run_cstyle_for`/`run_while_until`.
pub fn break_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let levels = parse_levels("break", args)?;
    Err(BreakError { levels, status: ctx.shell.last_exit_code }.into())
}

/// `continue [n]` (spec.md GLOSSARY/§3 `Continue`): unwinds out of `n - 1`
/// enclosing loops and restarts the nth.
pub fn continue_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let levels = parse_levels("continue", args)?;
    Err(ContinueError { levels, status: ctx.shell.last_exit_code }.into())
}
