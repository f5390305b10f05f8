//! `alias`/`unalias` (spec.md §3 `Shell.aliases`, §4.4 "other built-ins").

use crate::builtins::BuiltinContext;
use crate::errors::ExecError;

pub fn alias(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.is_empty() {
        let mut names: Vec<&String> = ctx.shell.aliases.keys().collect();
        names.sort();
        for name in names {
            println!("alias {}='{}'", name, ctx.shell.aliases[name]);
        }
        return Ok(0);
    }

    let mut status = 0;
    for arg in args {
        if let Some(eq) = arg.find('=') {
            let (name, value) = (&arg[..eq], &arg[eq + 1..]);
            let value = value.trim_matches(|c| c == '\'' || c == '"');
            ctx.shell.aliases.insert(name.to_string(), value.to_string());
        } else if let Some(value) = ctx.shell.aliases.get(arg) {
            println!("alias {}='{}'", arg, value);
        } else {
            eprintln!("{}: alias: {}: not found", ctx.shell.shell_name, arg);
            status = 1;
        }
    }
    Ok(status)
}

pub fn unalias(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.first().map(String::as_str) == Some("-a") {
        ctx.shell.aliases.clear();
        return Ok(0);
    }
    let mut status = 0;
    for arg in args {
        if ctx.shell.aliases.remove(arg).is_none() {
            eprintln!("{}: unalias: {}: not found", ctx.shell.shell_name, arg);
            status = 1;
        }
    }
    Ok(status)
}
