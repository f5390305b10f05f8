//! `cd`/`pwd` (spec.md §4.4 "other built-ins"; `cd` is also invoked
//! directly by the executor's auto-`cd` convenience, spec.md §4.4 step 4).
//!
//! Grounded on the teacher's directory-stack handling in
//! `src/interpreter/builtins/dirs_cmd.rs`, adapted from the in-memory
//! `FileSystem` trait to real `std::env::set_current_dir`.

use crate::builtins::BuiltinContext;
use crate::errors::{ExecError, ShellError};

pub fn cd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let shell = &mut *ctx.shell;
    let target = match args.first().map(String::as_str) {
        None | Some("") => shell.get_var("HOME").unwrap_or("/").to_string(),
        Some("-") => match shell.get_var("OLDPWD") {
            Some(p) => {
                let p = p.to_string();
                println!("{}", p);
                p
            }
            None => {
                eprintln!("{}: cd: OLDPWD not set", shell.shell_name);
                return Ok(1);
            }
        },
        Some(other) => other.to_string(),
    };

    let candidate = if target.starts_with('/') {
        std::path::PathBuf::from(&target)
    } else {
        shell.cwd().join(&target)
    };

    let canonical = match std::fs::canonicalize(&candidate) {
        Ok(p) => p,
        Err(_) => {
            eprintln!("{}: cd: {}: No such file or directory", shell.shell_name, target);
            return Ok(1);
        }
    };
    if !canonical.is_dir() {
        eprintln!("{}: cd: {}: Not a directory", shell.shell_name, target);
        return Ok(1);
    }

    if let Err(e) = std::env::set_current_dir(&canonical) {
        eprintln!("{}: cd: {}: {}", shell.shell_name, target, e);
        return Ok(1);
    }

    let old_pwd = shell.cwd();
    shell.env.insert("OLDPWD".to_string(), old_pwd.to_string_lossy().into_owned());
    shell.exported.insert("OLDPWD".to_string());
    shell.env.insert("PWD".to_string(), canonical.to_string_lossy().into_owned());
    shell.exported.insert("PWD".to_string());
    if let Some(top) = shell.dir_stack.last_mut() {
        *top = canonical;
    }
    Ok(0)
}

pub fn pwd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.iter().any(|a| a == "-P") {
        match std::fs::canonicalize(ctx.shell.cwd()) {
            Ok(p) => println!("{}", p.display()),
            Err(e) => {
                return Err(ShellError::Other(format!("pwd: {}", e)).into());
            }
        }
    } else {
        println!("{}", ctx.shell.cwd().display());
    }
    Ok(0)
}
