//! `pushd`/`popd`/`dirs` (spec.md §3 "directory stack", §4.4 "other
//! built-ins"). Grounded on the teacher's
//! `src/interpreter/builtins/dirs_cmd.rs`, adapted to real
//! `set_current_dir` instead of an in-memory cwd field.

use crate::builtins::BuiltinContext;
use crate::errors::ExecError;
use crate::shell::Shell;

fn print_stack(shell: &Shell) {
    let line: Vec<String> = shell
        .dir_stack
        .iter()
        .rev()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    println!("{}", line.join(" "));
}

pub fn pushd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let shell = &mut *ctx.shell;
    let Some(target) = args.first() else {
        if shell.dir_stack.len() < 2 {
            eprintln!("{}: pushd: no other directory", shell.shell_name);
            return Ok(1);
        }
        let top = shell.dir_stack.remove(shell.dir_stack.len() - 1);
        shell.dir_stack.insert(0, top);
        let new_top = shell.dir_stack.last().unwrap().clone();
        chdir(shell, &new_top)?;
        print_stack(shell);
        return Ok(0);
    };
    let candidate = if target.starts_with('/') {
        std::path::PathBuf::from(target)
    } else {
        shell.cwd().join(target)
    };
    let canonical = match std::fs::canonicalize(&candidate) {
        Ok(p) => p,
        Err(_) => {
            eprintln!("{}: pushd: {}: No such file or directory", shell.shell_name, target);
            return Ok(1);
        }
    };
    chdir(shell, &canonical)?;
    shell.dir_stack.push(canonical);
    print_stack(shell);
    Ok(0)
}

pub fn popd(ctx: &mut BuiltinContext, _args: &[String]) -> Result<i32, ExecError> {
    let shell = &mut *ctx.shell;
    if shell.dir_stack.len() < 2 {
        eprintln!("{}: popd: directory stack empty", shell.shell_name);
        return Ok(1);
    }
    shell.dir_stack.pop();
    let new_top = shell.dir_stack.last().unwrap().clone();
    chdir(shell, &new_top)?;
    print_stack(shell);
    Ok(0)
}

pub fn dirs(ctx: &mut BuiltinContext, _args: &[String]) -> Result<i32, ExecError> {
    print_stack(ctx.shell);
    Ok(0)
}

fn chdir(shell: &mut Shell, path: &std::path::Path) -> Result<(), ExecError> {
    std::env::set_current_dir(path)
        .map_err(|e| crate::errors::ShellError::Other(format!("cd: {}: {}", path.display(), e)))?;
    let old = shell.cwd();
    shell.env.insert("OLDPWD".to_string(), old.to_string_lossy().into_owned());
    shell.env.insert("PWD".to_string(), path.to_string_lossy().into_owned());
    Ok(())
}
