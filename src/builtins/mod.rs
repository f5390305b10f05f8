//! `BuiltinRegistry` (spec.md §6): `has(name) -> bool`, `invoke(ctx, name,
//! args) -> i32`. spec.md §1 scopes individual built-in *bodies* out of the
//! core except the control built-ins named in §4.4 — but a shell that
//! cannot run `cd`, `echo`, `test`, `export`, etc. cannot execute the
//! end-to-end scenarios in spec.md §8, and those built-ins are exactly the
//! teacher's `src/interpreter/builtins/*.rs` + `src/commands/*` set. This
//! module keeps the teacher's one-file-per-builtin layout, adapted from
//! `InterpreterState`/`ExecResult` to this crate's `Shell`/`ExecError`.
//!
//! Dispatch is a name -> function-pointer table rather than a trait object
//! per builtin (the teacher's `BuiltinFn` closures in
//! `src/interpreter/builtins/mod.rs` are the same shape); `BuiltinContext`
//! bundles the mutable `Shell` plus the callback surface `eval`/`source`/eval
//! need to re-enter the executor without a circular module dependency.

mod control;
mod cd_pwd;
mod echo_printf;
mod env_vars;
mod set_shopt;
mod alias_cmd;
mod read_cmd;
mod test_cmd;
mod type_cmd;
mod jobs_cmd;
mod trap_cmd;
mod dirs_cmd;
mod misc;

use std::collections::HashMap;

use crate::ast::types::ScriptNode;
use crate::errors::ExecError;
use crate::shell::Shell;

/// Callback surface the executor provides so `eval`, `source`/`.`,
/// `command`, and subshell-running builtins can re-enter execution without
/// `src/builtins` depending on `src/executor` directly.
pub trait Invoker {
    /// Tokenizes, parses, and executes `source` as shell text in the
    /// current shell context (spec.md §4.4 `eval`).
    fn run_source(&mut self, source: &str, shell: &mut Shell) -> Result<i32, ExecError>;

    /// Executes an already-parsed script in the current shell context
    /// (spec.md §4.4 `.`/`source FILE`).
    fn run_script(&mut self, script: &ScriptNode, shell: &mut Shell) -> Result<i32, ExecError>;

    /// Resolves and runs `name args…` through the normal dispatch path
    /// (function lookup unless `skip_functions`, then builtin, then
    /// external) — used by `command` and `builtin` (spec.md §4.4 step
    /// 3-7) to re-enter dispatch without looping back through
    /// alias/function resolution a second time.
    fn dispatch_command(
        &mut self,
        name: &str,
        args: &[String],
        shell: &mut Shell,
        skip_functions: bool,
    ) -> Result<i32, ExecError>;

    /// `PATH` resolution for `command -v` / `type` / `which` / `hash`:
    /// returns the absolute path of the first executable match, if any.
    fn resolve_path(&self, name: &str, shell: &Shell) -> Option<std::path::PathBuf>;
}

/// Everything a builtin body needs: mutable shell state, argv (passed
/// separately to `invoke`, duplicated here for convenience), and the
/// re-entrant execution callback.
pub struct BuiltinContext<'a> {
    pub shell: &'a mut Shell,
    pub invoker: &'a mut dyn Invoker,
}

pub type BuiltinFn = fn(&mut BuiltinContext, &[String]) -> Result<i32, ExecError>;

/// `BuiltinRegistry` (spec.md §4.4, §6).
pub struct BuiltinRegistry {
    table: HashMap<&'static str, BuiltinFn>,
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut table: HashMap<&'static str, BuiltinFn> = HashMap::new();

        // Control built-ins the core itself owns (spec.md §4.4).
        table.insert("exit", control::exit);
        table.insert("return", control::return_cmd);
        table.insert(".", control::dot_source);
        table.insert("source", control::dot_source);
        table.insert("eval", control::eval);
        table.insert("exec", control::exec_cmd);
        table.insert("true", control::true_cmd);
        table.insert(":", control::true_cmd);
        table.insert("false", control::false_cmd);
        table.insert("command", control::command_cmd);
        table.insert("builtin", control::builtin_cmd);
        table.insert("break", control::break_cmd);
        table.insert("continue", control::continue_cmd);

        // Navigation / environment.
        table.insert("cd", cd_pwd::cd);
        table.insert("pwd", cd_pwd::pwd);
        table.insert("pushd", dirs_cmd::pushd);
        table.insert("popd", dirs_cmd::popd);
        table.insert("dirs", dirs_cmd::dirs);

        table.insert("echo", echo_printf::echo);
        table.insert("printf", echo_printf::printf);

        table.insert("export", env_vars::export);
        table.insert("unset", env_vars::unset);
        table.insert("readonly", env_vars::readonly);
        table.insert("local", env_vars::local);
        table.insert("declare", env_vars::declare);
        table.insert("typeset", env_vars::declare);

        table.insert("set", set_shopt::set_cmd);
        table.insert("shopt", set_shopt::shopt_cmd);

        table.insert("alias", alias_cmd::alias);
        table.insert("unalias", alias_cmd::unalias);

        table.insert("read", read_cmd::read);

        table.insert("test", test_cmd::test);
        table.insert("[", test_cmd::bracket_test);

        table.insert("type", type_cmd::type_cmd);
        table.insert("which", type_cmd::which);
        table.insert("hash", type_cmd::hash);

        table.insert("jobs", jobs_cmd::jobs);
        table.insert("fg", jobs_cmd::fg);
        table.insert("bg", jobs_cmd::bg);
        table.insert("wait", jobs_cmd::wait_cmd);
        table.insert("disown", jobs_cmd::disown);
        table.insert("kill", jobs_cmd::kill_cmd);

        table.insert("trap", trap_cmd::trap);

        table.insert("umask", misc::umask);
        table.insert("times", misc::times);
        table.insert("getopts", misc::getopts);
        table.insert("shift", misc::shift);

        Self { table }
    }

    pub fn has(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn invoke(
        &self,
        ctx: &mut BuiltinContext,
        name: &str,
        args: &[String],
    ) -> Result<i32, ExecError> {
        match self.table.get(name) {
            Some(f) => f(ctx, args),
            None => Err(crate::errors::ShellError::CommandNotFound(name.to_string()).into()),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_knows_control_builtins() {
        let reg = BuiltinRegistry::new();
        for name in ["exit", "return", ".", "eval", "exec", "true", "false", ":"] {
            assert!(reg.has(name), "missing builtin {name}");
        }
    }

    #[test]
    fn registry_rejects_unknown_name() {
        let reg = BuiltinRegistry::new();
        assert!(!reg.has("nosuchbuiltin_xyz"));
    }
}
