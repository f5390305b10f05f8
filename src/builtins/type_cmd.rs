//! `type`/`which`/`hash` (spec.md §4.4 "other built-ins"): name resolution
//! reporting — function, alias, builtin, or external path. Grounded on
//! the teacher's `src/interpreter/type_command.rs`, reduced to this
//! crate's simpler (no command-hash-cache) resolution order.

use crate::builtins::{BuiltinContext, BuiltinRegistry};
use crate::errors::ExecError;

fn classify(ctx: &mut BuiltinContext, name: &str) -> Option<String> {
    if ctx.shell.functions.contains_key(name) {
        return Some(format!("{} is a function", name));
    }
    if let Some(alias) = ctx.shell.aliases.get(name) {
        return Some(format!("{} is aliased to `{}'", name, alias));
    }
    if BuiltinRegistry::new().has(name) {
        return Some(format!("{} is a shell builtin", name));
    }
    ctx.invoker
        .resolve_path(name, ctx.shell)
        .map(|p| format!("{} is {}", name, p.display()))
}

pub fn type_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let path_only = args.first().map(String::as_str) == Some("-p");
    let names: Vec<&String> = if path_only { args[1..].iter().collect() } else { args.iter().collect() };
    let mut status = 0;
    for name in names {
        if path_only {
            match ctx.invoker.resolve_path(name, ctx.shell) {
                Some(p) => println!("{}", p.display()),
                None => status = 1,
            }
            continue;
        }
        match classify(ctx, name) {
            Some(line) => println!("{}", line),
            None => {
                eprintln!("{}: type: {}: not found", ctx.shell.shell_name, name);
                status = 1;
            }
        }
    }
    Ok(status)
}

pub fn which(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let mut status = 0;
    for name in args {
        match ctx.invoker.resolve_path(name, ctx.shell) {
            Some(p) => println!("{}", p.display()),
            None => {
                println!("{}: not found", name);
                status = 1;
            }
        }
    }
    Ok(status)
}

/// `hash [-r] [name…]`: this crate re-resolves `PATH` on every external
/// dispatch rather than caching resolved paths (no long-lived interactive
/// session to amortize the cache across), so `hash` is a reporting-only
/// no-op beyond `-r` (documented in DESIGN.md).
pub fn hash(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.first().map(String::as_str) == Some("-r") {
        return Ok(0);
    }
    for name in args {
        if ctx.invoker.resolve_path(name, ctx.shell).is_none() {
            eprintln!("{}: hash: {}: not found", ctx.shell.shell_name, name);
            return Ok(1);
        }
    }
    Ok(0)
}
